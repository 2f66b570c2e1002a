//! Source-map extraction.
//!
//! Transformed module code may end with a `//# sourceMappingURL=` comment.
//! Companions hand the map to the host separately, so the comment is
//! stripped before wrapping. Pure string work, no I/O.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

const SOURCE_MAP_PREFIX: &str = "//# sourceMappingURL=";
const INLINE_PREFIX: &str = "data:application/json";

/// Split `code` into cleaned code and an optional source map.
///
/// Only a trailing comment (the last `sourceMappingURL` line) is considered.
/// Inline base64 `data:` payloads are decoded to JSON text; references to
/// external map files are stripped but yield no map.
pub fn split_source_map(code: &str) -> (String, Option<String>) {
    let Some(start) = code.rfind(SOURCE_MAP_PREFIX) else {
        return (code.to_string(), None);
    };

    // The comment must start a line, otherwise it is part of some other text.
    if start > 0 && code.as_bytes()[start - 1] != b'\n' {
        return (code.to_string(), None);
    }

    let after = &code[start + SOURCE_MAP_PREFIX.len()..];
    let (url, rest) = match after.find('\n') {
        Some(end) => (&after[..end], &after[end + 1..]),
        None => (after, ""),
    };

    // Anything after the comment line means it was not trailing.
    if !rest.trim().is_empty() {
        return (code.to_string(), None);
    }

    let mut cleaned = code[..start].to_string();
    while cleaned.ends_with('\n') && cleaned.len() > 1 && cleaned[..cleaned.len() - 1].ends_with('\n')
    {
        cleaned.pop();
    }

    let map = decode_inline(url.trim());
    (cleaned, map)
}

fn decode_inline(url: &str) -> Option<String> {
    if !url.starts_with(INLINE_PREFIX) {
        return None;
    }
    let payload = url.split("base64,").nth(1)?;
    let bytes = BASE64.decode(payload.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_without_map_passes_through() {
        let (code, map) = split_source_map("module.exports = 1;\n");
        assert_eq!(code, "module.exports = 1;\n");
        assert!(map.is_none());
    }

    #[test]
    fn inline_map_is_decoded_and_stripped() {
        let json = r#"{"version":3,"sources":["a.js"]}"#;
        let encoded = BASE64.encode(json);
        let code = format!(
            "module.exports = 1;\n//# sourceMappingURL=data:application/json;base64,{encoded}\n"
        );
        let (cleaned, map) = split_source_map(&code);
        assert_eq!(cleaned, "module.exports = 1;\n");
        assert_eq!(map.as_deref(), Some(json));
    }

    #[test]
    fn external_map_reference_is_stripped_without_map() {
        let code = "module.exports = 1;\n//# sourceMappingURL=out.js.map\n";
        let (cleaned, map) = split_source_map(code);
        assert_eq!(cleaned, "module.exports = 1;\n");
        assert!(map.is_none());
    }

    #[test]
    fn mid_file_mention_is_not_treated_as_a_map() {
        let code = "var s = \"x\"; //# sourceMappingURL=fake\nmodule.exports = s;\n";
        let (cleaned, map) = split_source_map(code);
        assert_eq!(cleaned, code);
        assert!(map.is_none());
    }

    #[test]
    fn comment_line_not_at_end_is_ignored() {
        let code = "//# sourceMappingURL=early.map\nmodule.exports = 1;\n";
        let (cleaned, map) = split_source_map(code);
        assert_eq!(cleaned, code);
        assert!(map.is_none());
    }

    #[test]
    fn malformed_base64_strips_but_yields_no_map() {
        let code = "x;\n//# sourceMappingURL=data:application/json;base64,@@@@\n";
        let (cleaned, map) = split_source_map(code);
        assert_eq!(cleaned, "x;\n");
        assert!(map.is_none());
    }
}
