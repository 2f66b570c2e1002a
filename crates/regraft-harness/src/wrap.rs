//! Module wrapper codec.
//!
//! Converts one resolved module into a self-registering snippet. Executing
//! the snippet only inserts the module into the browser-side registry; the
//! module body runs later, when something requires it.

use std::collections::BTreeMap;

use regraft_graph::ModuleId;

/// Wrap `source` into a `registerModule` call for `id`.
///
/// The identifier and the dependency mapping are embedded as JSON literals,
/// which is valid JavaScript data and handles all escaping. The source is
/// spliced verbatim into the factory body on its own lines so line numbers
/// survive for debugging.
pub fn wrap_module(id: &ModuleId, source: &str, deps: &BTreeMap<String, ModuleId>) -> String {
    let id_json = serde_json::to_string(id.as_str()).expect("string keys always encode");
    let deps_json = serde_json::to_string(deps).expect("string maps always encode");
    format!(
        "registerModule({id_json}, function(require, module, exports){{\n{source}\n}}, {deps_json});\n"
    )
}
