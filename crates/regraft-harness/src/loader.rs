//! Runtime loader script.
//!
//! The loader is a fixed bootstrap emitted once per graph generation, before
//! every other created file. It defines the browser-side module registry and
//! the two entry functions: `require(id)` resolves and executes one module
//! against the registry (CommonJS semantics, cycle-safe), and `loadTests()`
//! requires every served companion test file as a simultaneous root.
//!
//! The loader only consumes data inserted by wrapper snippets (see
//! [`crate::wrap`]); it has no knowledge of the harness-side cache.

use regraft_graph::ModuleId;

/// Suffix appended to an original path to name its compiled companion.
/// `loadTests()` strips the same suffix to recover module identifiers.
pub const COMPANION_SUFFIX: &str = ".graft.js";

/// Default CommonJS-in-browser bootstrap.
///
/// Instantiation pre-registers a placeholder `module.exports` before running
/// the factory, so dependency cycles observe a partial exports object
/// instead of recursing forever.
pub const DEFAULT_PRELUDE: &str = r#"// regraft loader: module registry and CommonJS resolver.
(function (global) {
  "use strict";

  var registry = Object.create(null);
  var instances = Object.create(null);

  global.registerModule = function (id, factory, deps) {
    registry[id] = { factory: factory, deps: deps || {} };
  };

  function instantiate(id) {
    var cached = instances[id];
    if (cached) {
      return cached.exports;
    }
    var entry = registry[id];
    if (!entry) {
      throw new Error("regraft: module not registered: " + id);
    }
    var module = { exports: {} };
    instances[id] = module;
    var scopedRequire = function (specifier) {
      var resolved = entry.deps[specifier];
      return instantiate(resolved === undefined ? specifier : resolved);
    };
    entry.factory.call(module.exports, scopedRequire, module, module.exports);
    return module.exports;
  }

  global.require = function (id) {
    return instantiate(id);
  };

  global.loadTests = function () {
    var harness = global.__harness__ || {};
    var served = harness.tests || [];
    var names = Array.isArray(served) ? served : Object.keys(served);
    var suffix = ".graft.js";
    for (var i = 0; i < names.length; i++) {
      var name = names[i];
      if (name.length > suffix.length &&
          name.indexOf(suffix, name.length - suffix.length) !== -1) {
        instantiate(name.slice(0, name.length - suffix.length));
      }
    }
  };
})(typeof window !== "undefined" ? window : this);
"#;

/// Destination path for the compiled companion of an original file.
pub fn companion_path(original: &std::path::Path) -> std::path::PathBuf {
    let mut name = original.as_os_str().to_os_string();
    name.push(COMPANION_SUFFIX);
    std::path::PathBuf::from(name)
}

/// The loader text for this generation: the override if one is configured,
/// the embedded prelude otherwise. Always emitted fresh, never patched.
pub fn loader_script(prelude_override: Option<&str>) -> String {
    prelude_override.unwrap_or(DEFAULT_PRELUDE).to_string()
}

/// Trailer script forcing execution of non-test entry modules.
///
/// `loadTests()` only runs companions of test files, so entries picked up
/// via entry patterns need an explicit require, ordered after everything
/// else.
pub fn trailer_script<'a>(entries: impl IntoIterator<Item = &'a ModuleId>) -> String {
    let mut script = String::from("// regraft trailer: execute non-test entry modules.\n");
    for id in entries {
        let id_json = serde_json::to_string(id.as_str()).expect("string keys always encode");
        script.push_str(&format!("require({id_json});\n"));
    }
    script
}
