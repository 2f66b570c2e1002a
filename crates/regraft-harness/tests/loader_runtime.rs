//! Executes the loader prelude and wrapped modules in an embedded JS engine.
//!
//! The string-level tests in `wrap` and `loader` check shape; these check
//! behavior: registration really is side-effect free, `require` runs the
//! factory with CommonJS semantics, exports are memoized, dependency cycles
//! terminate with partial exports, and `loadTests()` recovers module ids
//! from served companion names.

use std::collections::BTreeMap;

use boa_engine::{Context, JsValue, Source};
use regraft_harness::{DEFAULT_PRELUDE, ModuleId, wrap_module};

fn deps(pairs: &[(&str, &str)]) -> BTreeMap<String, ModuleId> {
    pairs
        .iter()
        .map(|(spec, id)| (spec.to_string(), ModuleId::new(*id)))
        .collect()
}

fn engine_with_prelude() -> Context {
    let mut context = Context::default();
    context
        .eval(Source::from_bytes(DEFAULT_PRELUDE))
        .expect("prelude evaluates");
    context
}

fn eval(context: &mut Context, js: &str) -> JsValue {
    context
        .eval(Source::from_bytes(js))
        .unwrap_or_else(|err| panic!("script failed: {err}\n{js}"))
}

fn eval_is_true(context: &mut Context, js: &str) -> bool {
    eval(context, js).as_boolean() == Some(true)
}

#[test]
fn require_runs_the_wrapped_factory_and_returns_its_exports() {
    let mut context = engine_with_prelude();
    let snippet = wrap_module(
        &ModuleId::new("/p/src/util.js"),
        "module.exports = 41 + 1;",
        &deps(&[]),
    );
    eval(&mut context, &snippet);
    let value = eval(&mut context, "require(\"/p/src/util.js\")");
    assert_eq!(value.as_number(), Some(42.0));
}

#[test]
fn registration_alone_does_not_execute_the_module_body() {
    let mut context = engine_with_prelude();
    eval(&mut context, "var ran = false;");
    let snippet = wrap_module(
        &ModuleId::new("/p/src/effect.js"),
        "ran = true; module.exports = 1;",
        &deps(&[]),
    );
    eval(&mut context, &snippet);
    assert!(eval_is_true(&mut context, "ran === false"));
    eval(&mut context, "require(\"/p/src/effect.js\")");
    assert!(eval_is_true(&mut context, "ran === true"));
}

#[test]
fn scoped_require_resolves_through_the_dependency_mapping() {
    let mut context = engine_with_prelude();
    let util = wrap_module(
        &ModuleId::new("/p/src/util.js"),
        "module.exports = 7;",
        &deps(&[]),
    );
    let entry = wrap_module(
        &ModuleId::new("/p/src/entry.js"),
        "module.exports = require('./util') * 2;",
        &deps(&[("./util", "/p/src/util.js")]),
    );
    eval(&mut context, &util);
    eval(&mut context, &entry);
    let value = eval(&mut context, "require(\"/p/src/entry.js\")");
    assert_eq!(value.as_number(), Some(14.0));
}

#[test]
fn exports_are_memoized_across_requires() {
    let mut context = engine_with_prelude();
    eval(&mut context, "var runs = 0;");
    let snippet = wrap_module(
        &ModuleId::new("/p/src/counted.js"),
        "runs += 1; module.exports = { stamp: runs };",
        &deps(&[]),
    );
    eval(&mut context, &snippet);
    assert!(eval_is_true(
        &mut context,
        "require(\"/p/src/counted.js\") === require(\"/p/src/counted.js\")"
    ));
    assert_eq!(eval(&mut context, "runs").as_number(), Some(1.0));
}

#[test]
fn dependency_cycles_terminate_with_partial_exports() {
    let mut context = engine_with_prelude();
    let a = wrap_module(
        &ModuleId::new("/p/src/a.js"),
        "exports.name = 'a'; exports.peer = require('./b').name;",
        &deps(&[("./b", "/p/src/b.js")]),
    );
    let b = wrap_module(
        &ModuleId::new("/p/src/b.js"),
        "exports.name = 'b'; exports.peer = require('./a').name;",
        &deps(&[("./a", "/p/src/a.js")]),
    );
    eval(&mut context, &a);
    eval(&mut context, &b);
    // b runs mid-instantiation of a and observes a's partial exports.
    assert!(eval_is_true(
        &mut context,
        "require(\"/p/src/a.js\").peer === \"b\""
    ));
    assert!(eval_is_true(
        &mut context,
        "require(\"/p/src/b.js\").peer === \"a\""
    ));
}

#[test]
fn load_tests_strips_companion_names_and_skips_everything_else() {
    let mut context = engine_with_prelude();
    eval(&mut context, "var executed = [];");
    for id in ["/p/src/a.test.js", "/p/src/b.test.js"] {
        let snippet = wrap_module(
            &ModuleId::new(id),
            &format!("executed.push({});", serde_json::to_string(id).unwrap()),
            &deps(&[]),
        );
        eval(&mut context, &snippet);
    }
    eval(
        &mut context,
        r#"var __harness__ = { tests: [
            "/p/src/a.test.js.graft.js",
            "/p/styles/app.css",
            "/p/src/b.test.js.graft.js"
        ] };"#,
    );
    eval(&mut context, "loadTests()");
    assert!(eval_is_true(
        &mut context,
        "executed.join() === \"/p/src/a.test.js,/p/src/b.test.js\""
    ));
}
