use esrt::interpreter::{EngineError, EngineOptions, ErrorKind, Interpreter};
use esrt::types::JsValue;

fn run(src: &str) -> JsValue {
    let mut interp = Interpreter::new();
    match interp.run_source(src) {
        Ok(v) => v,
        Err(EngineError::Exception(e)) => panic!("uncaught {}", interp.format_value(&e.value)),
        Err(e) => panic!("{e}"),
    }
}

fn thrown(interp: &mut Interpreter, src: &str) -> String {
    match interp.run_source(src) {
        Err(EngineError::Exception(e)) => interp.format_value(&e.value),
        other => panic!("expected an exception, got {other:?}"),
    }
}

#[test]
fn eval_returns_non_strings_unchanged() {
    assert_eq!(run("eval(42)"), JsValue::Number(42.0));
    assert_eq!(run("var o = {}; eval(o) === o"), JsValue::Boolean(true));
    assert_eq!(run("eval()"), JsValue::Undefined);
}

#[test]
fn eval_evaluates_source() {
    assert_eq!(run("eval('1+1')"), JsValue::Number(2.0));
    assert_eq!(run("eval('var q = 3; q * 2')"), JsValue::Number(6.0));
    assert_eq!(run("eval('')"), JsValue::Undefined);
}

#[test]
fn sloppy_direct_eval_declares_in_caller_scope() {
    assert_eq!(
        run("function f() { eval('var x = 5;'); return x; } f()"),
        JsValue::Number(5.0)
    );
    assert_eq!(
        run("function f() { eval('var x = 5;'); } f(); typeof x"),
        JsValue::string("undefined")
    );
    assert_eq!(run("eval('function made() { return 7; }'); made()"), JsValue::Number(7.0));
}

#[test]
fn strict_eval_does_not_leak_declarations() {
    assert_eq!(
        run("function f() { 'use strict'; eval('var x = 5;'); return typeof x; } f()"),
        JsValue::string("undefined")
    );
    assert_eq!(
        run("eval(\"'use strict'; var y = 1;\"); typeof y"),
        JsValue::string("undefined")
    );
    // A strict eval still reads and writes the caller's existing bindings
    assert_eq!(
        run("function f() { 'use strict'; var n = 1; eval('n = n + 1'); return n; } f()"),
        JsValue::Number(2.0)
    );
}

#[test]
fn indirect_eval_runs_in_global_scope() {
    assert_eq!(
        run("var x = 'global'; function f() { var x = 'local'; var e = eval; return e('x'); } f()"),
        JsValue::string("global")
    );
    assert_eq!(
        run("var x = 'global'; function f() { var x = 'local'; return (0, eval)('x'); } f()"),
        JsValue::string("global")
    );
    // The strictness of the call site does not carry over
    assert_eq!(
        run("function g() { 'use strict'; var e = eval; e('var fromStrict = 1'); } g(); typeof fromStrict"),
        JsValue::string("number")
    );
}

#[test]
fn indirect_eval_ignores_global_catch_and_with_scopes() {
    assert_eq!(
        run("var r;
             try { throw 1; } catch (e) {
                 try { r = (0, eval)('e'); } catch (x) { r = x instanceof ReferenceError; }
             }
             r"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        run("var p = 'global'; var r; with ({ p: 'with-scope' }) { r = (0, eval)('p'); } r"),
        JsValue::string("global")
    );
    // A direct eval in the same position still sees the block scope
    assert_eq!(
        run("var r; try { throw 1; } catch (e) { r = eval('e'); } r"),
        JsValue::Number(1.0)
    );
}

#[test]
fn eval_parse_failures_have_distinct_kinds() {
    assert_eq!(
        run("try { eval('1 +'); } catch (e) { e instanceof SyntaxError; }"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        run("try { eval('1 = 2'); } catch (e) { e instanceof ReferenceError && !(e instanceof SyntaxError); }"),
        JsValue::Boolean(true)
    );
}

#[test]
fn eval_declared_vars_are_deletable() {
    assert_eq!(run("eval('var d = 1'); delete d"), JsValue::Boolean(true));
    assert_eq!(run("var g = 1; delete g"), JsValue::Boolean(false));
    assert_eq!(
        run("function f() { var local = 1; return delete local; } f()"),
        JsValue::Boolean(false)
    );
}

#[test]
fn context_stack_is_restored_after_throw() {
    let mut interp = Interpreter::new();
    let msg = thrown(
        &mut interp,
        "function f() { eval(\"'use strict'; throw new TypeError('inner')\"); } f()",
    );
    assert_eq!(msg, "TypeError: inner");
    assert_eq!(interp.context_depth(), 0);
    assert!(interp.call_stack().is_empty());
}

#[test]
fn exception_carries_throw_site_call_stack() {
    let mut interp = Interpreter::new();
    match interp.run_source("function a() { b(); } function b() { null.x; } a()") {
        Err(EngineError::Exception(e)) => {
            let names: Vec<_> = e.call_stack.iter().map(|f| f.function_name.clone()).collect();
            assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
            assert_eq!(
                interp.format_value(&e.value),
                "TypeError: Cannot read property 'x' of null"
            );
        }
        other => panic!("expected exception, got {other:?}"),
    }
}

#[test]
fn host_eval_surfaces_exceptions() {
    let mut interp = Interpreter::new();
    interp
        .invoke_eval(&JsValue::Undefined, &[JsValue::string("var hosted = 1")], false)
        .unwrap();
    assert!(interp.global_binding_names().contains(&"hosted".to_string()));
    let err = interp
        .invoke_eval(&JsValue::Undefined, &[JsValue::string("missing")], true)
        .unwrap_err();
    assert_eq!(interp.format_value(&err.value), "ReferenceError: missing is not defined");
}

#[test]
fn local_arguments_objects_are_recycled() {
    let mut interp = Interpreter::new();
    let v = interp
        .run_source(
            "function h() { return arguments.length + ':' + arguments[0]; }
             h('x') + ',' + h()",
        )
        .unwrap();
    // The recycled instance shows nothing of its previous use
    assert_eq!(v, JsValue::string("1:x,0:undefined"));
    let stats = interp.arguments_pool_stats();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.reused, 1);
    assert_eq!(stats.available, 1);
}

#[test]
fn escaping_arguments_objects_are_never_recycled() {
    let mut interp = Interpreter::new();
    let v = interp
        .run_source(
            "function g() { return arguments; }
             var first = g(1, 2);
             var second = g(3);
             first !== second && first[0] === 1 && first.length === 2 && second[0] === 3",
        )
        .unwrap();
    assert_eq!(v, JsValue::Boolean(true));
    assert_eq!(interp.arguments_pool_stats().reused, 0);
}

#[test]
fn arguments_alias_parameters_only_in_sloppy_code() {
    assert_eq!(
        run("function f(a) { arguments[0] = 9; return a; } f(1)"),
        JsValue::Number(9.0)
    );
    assert_eq!(
        run("function f(a) { a = 4; return arguments[0]; } f(1)"),
        JsValue::Number(4.0)
    );
    assert_eq!(
        run("function f(a) { 'use strict'; arguments[0] = 9; return a; } f(1)"),
        JsValue::Number(1.0)
    );
    // Parameters without a matching argument are not mapped
    assert_eq!(
        run("function f(a, b) { b = 2; return arguments.length + ':' + arguments[1]; } f(1)"),
        JsValue::string("1:undefined")
    );
}

#[test]
fn strict_code_cannot_rebind_arguments() {
    let mut interp = Interpreter::new();
    assert!(matches!(
        interp.run_source("function f() { 'use strict'; arguments = 1; }"),
        Err(EngineError::Parse(_))
    ));
    assert_eq!(
        run("function f() { 'use strict'; return typeof arguments; } f()"),
        JsValue::string("object")
    );
}

#[test]
fn call_depth_overflow_is_catchable() {
    let mut interp = Interpreter::with_options(EngineOptions {
        max_call_depth: 32,
        ..EngineOptions::default()
    });
    let v = interp
        .run_source(
            "function r() { return r(); }
             try { r(); } catch (e) { e.name + ': ' + e.message; }",
        )
        .unwrap();
    assert_eq!(v, JsValue::string("RangeError: Maximum call stack size exceeded"));
    assert_eq!(interp.context_depth(), 0);
}

#[test]
fn recursive_direct_eval_hits_the_depth_limit() {
    let mut interp = Interpreter::with_options(EngineOptions {
        max_call_depth: 32,
        ..EngineOptions::default()
    });
    let v = interp
        .run_source("var s = 'eval(s)'; try { eval(s); } catch (e) { e.name; }")
        .unwrap();
    assert_eq!(v, JsValue::string("RangeError"));
    assert_eq!(interp.context_depth(), 0);
    assert!(interp.call_stack().is_empty());
}

#[test]
fn errors_have_matching_kinds() {
    let mut interp = Interpreter::new();
    for kind in ErrorKind::ALL {
        let src = format!("try {{ throw new {kind}('m'); }} catch (e) {{ e instanceof {kind} && e instanceof Error; }}");
        assert_eq!(interp.run_source(&src).unwrap(), JsValue::Boolean(true), "{kind}");
    }
}

#[test]
fn completion_records_are_reused_across_runs() {
    let mut interp = Interpreter::new();
    interp.run_source("1").unwrap();
    interp.run_source("2").unwrap();
    interp.run_source("eval('3')").unwrap();
    let stats = interp.completion_pool_stats();
    assert_eq!(stats.created, 2);
    assert_eq!(stats.reused, 2);
}
