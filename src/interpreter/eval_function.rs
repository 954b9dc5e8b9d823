//! The global `eval` function (ES5 §15.1.2.1) and entering eval code
//! (§10.4.2).

use super::context::{ContextScope, ExecutionContext};
use super::declaration::DeclarationKind;
use super::environment::LexicalEnvironment;
use super::exception::{CallFrame, ErrorKind, JavaScriptException};
use super::types::JsResult;
use super::Interpreter;
use crate::ast::ArgumentsUsage;
use crate::parser::{ParseErrorKind, parse_script};
use crate::types::JsValue;
use tracing::debug;

impl Interpreter {
    /// Evaluates `args[0]` as eval code. `direct` is true only for a call
    /// spelled `eval(...)` that resolved to the intrinsic eval function.
    pub(crate) fn perform_eval(&mut self, args: &[JsValue], direct: bool) -> JsResult<JsValue> {
        let source = match args.first() {
            Some(JsValue::String(s)) => s.to_rust_string(),
            Some(other) => return Ok(other.clone()),
            None => return Ok(JsValue::Undefined),
        };
        // Direct calls skip [[Call]], so the depth limit is enforced here
        if direct && self.call_stack.len() >= self.options.max_call_depth {
            return Err(self.create_error(
                ErrorKind::RangeError,
                "Maximum call stack size exceeded",
            ));
        }
        let caller_strict = direct && self.is_strict();
        debug!(direct, caller_strict, len = source.len(), "eval");

        let program = match parse_script(&source, caller_strict) {
            Ok(program) => program,
            Err(e) => {
                debug!(error = %e, "eval parse failure");
                let kind = if e.kind == ParseErrorKind::InvalidAssignmentTarget {
                    ErrorKind::ReferenceError
                } else {
                    ErrorKind::SyntaxError
                };
                return Err(self.create_error(kind, &e.message));
            }
        };
        let strict = program.strict || caller_strict;

        let mut scope = ContextScope::new(self);
        if direct {
            scope.push_frame(CallFrame {
                function_name: "eval".into(),
            });
        } else {
            let global = scope.global_execution_context();
            scope.push(global);
        }
        if strict {
            let env = LexicalEnvironment::new_declarative(Some(scope.lexical_environment()));
            let this = scope.this_binding();
            scope.push(ExecutionContext::new(env, this, true));
        }

        let var_env = scope.variable_environment();
        let rented = scope.instantiate_declarations(
            &var_env,
            DeclarationKind::Eval,
            &program.hoisting,
            strict,
            None,
        )?;
        let completion = scope.exec_statements(&program.body);

        // Eval completions travel through the pool like program completions
        let mut record = scope.completion_pool.rent();
        record.fill(completion);
        let result = if record.is_throw() {
            Err(record.take_value().unwrap_or_default())
        } else {
            Ok(record.take_value().unwrap_or_default())
        };
        scope.completion_pool.give_back(record);

        scope.release_unescaped_arguments(&var_env, rented, ArgumentsUsage::Local, &result);
        result
    }

    /// Host entry point for eval. A Throw completion surfaces as a
    /// [`JavaScriptException`] carrying the call stack at the throw site.
    pub fn invoke_eval(
        &mut self,
        this: &JsValue,
        args: &[JsValue],
        direct: bool,
    ) -> Result<JsValue, JavaScriptException> {
        let mut scope = ContextScope::new(self);
        if direct {
            // A host-initiated direct eval runs against the current context
            // with the supplied receiver as its this binding.
            let mut ctx = scope.running_context().clone();
            ctx.this_binding = this.clone();
            scope.push(ctx);
        }
        match scope.perform_eval(args, direct) {
            Ok(value) => Ok(value),
            Err(value) => Err(scope.take_exception(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_str(interp: &mut Interpreter, src: &str, direct: bool) -> Result<JsValue, JavaScriptException> {
        interp.invoke_eval(&JsValue::Undefined, &[JsValue::string(src)], direct)
    }

    #[test]
    fn non_string_is_returned_unchanged() {
        let mut interp = Interpreter::new();
        let v = interp
            .invoke_eval(&JsValue::Undefined, &[JsValue::Number(42.0)], false)
            .unwrap();
        assert_eq!(v, JsValue::Number(42.0));
        let v = interp.invoke_eval(&JsValue::Undefined, &[], true).unwrap();
        assert_eq!(v, JsValue::Undefined);
    }

    #[test]
    fn evaluates_expressions() {
        let mut interp = Interpreter::new();
        assert_eq!(eval_str(&mut interp, "1+1", false).unwrap(), JsValue::Number(2.0));
        assert_eq!(eval_str(&mut interp, "", true).unwrap(), JsValue::Undefined);
    }

    #[test]
    fn parse_failures_map_to_error_kinds() {
        let mut interp = Interpreter::new();
        let err = eval_str(&mut interp, "1 +", false).unwrap_err();
        assert!(interp.format_value(&err.value).starts_with("SyntaxError"));
        let err = eval_str(&mut interp, "1 = 2", false).unwrap_err();
        assert!(interp.format_value(&err.value).starts_with("ReferenceError"));
        // Only assignment targets are remapped; update targets stay syntax errors
        let err = eval_str(&mut interp, "1++", false).unwrap_err();
        assert!(interp.format_value(&err.value).starts_with("SyntaxError"));
        assert_eq!(interp.context_depth(), 0);
    }

    #[test]
    fn throw_unwinds_pushed_contexts() {
        let mut interp = Interpreter::new();
        let err = eval_str(&mut interp, "'use strict'; var x = 1; throw x;", false).unwrap_err();
        assert_eq!(err.value, JsValue::Number(1.0));
        assert_eq!(interp.context_depth(), 0);
        assert!(!interp.global_binding_names().contains(&"x".to_string()));
    }

    #[test]
    fn indirect_sloppy_eval_declares_globals() {
        let mut interp = Interpreter::new();
        eval_str(&mut interp, "var fromEval = 3;", false).unwrap();
        assert!(interp.global_binding_names().contains(&"fromEval".to_string()));
        assert_eq!(interp.run_source("delete fromEval").unwrap(), JsValue::Boolean(true));
    }

    #[test]
    fn completion_records_go_back_to_the_pool() {
        let mut interp = Interpreter::new();
        eval_str(&mut interp, "1", false).unwrap();
        eval_str(&mut interp, "2", false).unwrap();
        assert_eq!(interp.completion_pool_stats().reused, 1);
    }
}
