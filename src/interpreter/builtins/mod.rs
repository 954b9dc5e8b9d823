mod error;
mod function;
mod object;

use super::*;

impl Interpreter {
    pub(crate) fn setup_globals(&mut self) {
        // §15.1.1 Value Properties of the Global Object
        {
            let mut global = self.global_object.borrow_mut();
            for (name, value) in [
                ("undefined", JsValue::Undefined),
                ("NaN", JsValue::Number(f64::NAN)),
                ("Infinity", JsValue::Number(f64::INFINITY)),
            ] {
                global.insert_property(
                    name.to_string(),
                    PropertyDescriptor::data(value, false, false, false),
                );
            }
        }

        self.setup_function_prototype();
        self.setup_object_constructor();
        self.setup_error_constructors();

        let eval_fn = self.register_global_fn(JsFunction::native("eval", 1, |interp, _this, args| {
            interp.perform_eval(args, false)
        }));
        self.eval_function_id = eval_fn.as_object().map(|o| o.id);

        self.register_global_fn(JsFunction::native("print", 1, |interp, _this, args| {
            let line = interp.join_for_output(args)?;
            println!("{line}");
            Ok(JsValue::Undefined)
        }));

        let console = self.create_object();
        let log_fn = self.create_function(JsFunction::native("log", 0, |interp, _this, args| {
            let line = interp.join_for_output(args)?;
            println!("{line}");
            Ok(JsValue::Undefined)
        }));
        console.borrow_mut().insert_builtin("log".to_string(), log_fn);
        let console_id = console.borrow().id.unwrap_or_default();
        self.global_object
            .borrow_mut()
            .insert_builtin("console".to_string(), JsValue::Object(JsObject { id: console_id }));
    }

    /// Creates a native function and binds it as a non-enumerable property of
    /// the global object.
    fn register_global_fn(&mut self, func: JsFunction) -> JsValue {
        let name = func.name().to_string();
        let val = self.create_function(func);
        self.global_object
            .borrow_mut()
            .insert_builtin(name, val.clone());
        val
    }

    fn join_for_output(&mut self, args: &[JsValue]) -> JsResult<String> {
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(self.to_string(arg)?.to_rust_string());
        }
        Ok(parts.join(" "))
    }

    pub(crate) fn set_builtin(&mut self, target: &ObjectRef, func: JsFunction) {
        let name = func.name().to_string();
        let val = self.create_function(func);
        target.borrow_mut().insert_builtin(name, val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_value_properties_are_read_only() {
        let mut interp = Interpreter::new();
        assert_eq!(interp.run_source("undefined = 1; typeof undefined").unwrap(), JsValue::string("undefined"));
        assert_eq!(interp.run_source("NaN !== NaN").unwrap(), JsValue::Boolean(true));
        assert!(interp.run_source("'use strict'; Infinity = 0;").is_err());
    }

    #[test]
    fn builtins_are_not_enumerable() {
        let interp = Interpreter::new();
        let names = interp.global_binding_names();
        assert!(!names.contains(&"eval".to_string()));
        assert!(!names.contains(&"print".to_string()));
    }

    #[test]
    fn print_and_console_exist() {
        let mut interp = Interpreter::new();
        assert_eq!(interp.run_source("typeof print").unwrap(), JsValue::string("function"));
        assert_eq!(
            interp.run_source("typeof console.log").unwrap(),
            JsValue::string("function")
        );
    }
}
