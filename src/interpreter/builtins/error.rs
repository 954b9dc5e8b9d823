use super::*;

impl Interpreter {
    // §15.11 Error Objects
    pub(super) fn setup_error_constructors(&mut self) {
        let base_proto = self.setup_error_kind(ErrorKind::Error, self.object_prototype.clone());
        self.set_builtin(
            &base_proto,
            JsFunction::native("toString", 0, |interp, this, _args| {
                let JsValue::Object(o) = this else {
                    return Err(interp.create_error(
                        ErrorKind::TypeError,
                        "Error.prototype.toString requires that 'this' be an Object",
                    ));
                };
                let (name, msg) = match interp.get_object(o.id) {
                    Some(obj) => {
                        let obj = obj.borrow();
                        (obj.get_property("name"), obj.get_property("message"))
                    }
                    None => (JsValue::Undefined, JsValue::Undefined),
                };
                let name = if name.is_undefined() {
                    "Error".to_string()
                } else {
                    interp.to_string(&name)?.to_rust_string()
                };
                let msg = if msg.is_undefined() {
                    String::new()
                } else {
                    interp.to_string(&msg)?.to_rust_string()
                };
                let text = match (name.is_empty(), msg.is_empty()) {
                    (true, _) => msg,
                    (_, true) => name,
                    _ => format!("{name}: {msg}"),
                };
                Ok(JsValue::string(&text))
            }),
        );
        for kind in ErrorKind::ALL {
            if kind != ErrorKind::Error {
                self.setup_error_kind(kind, Some(base_proto.clone()));
            }
        }
    }

    fn setup_error_kind(&mut self, kind: ErrorKind, parent: Option<ObjectRef>) -> ObjectRef {
        let proto = self.create_object();
        {
            let mut p = proto.borrow_mut();
            p.prototype = parent;
            p.class_name = "Error".to_string();
            p.insert_builtin("name".to_string(), JsValue::string(kind.name()));
            p.insert_builtin("message".to_string(), JsValue::string(""));
        }
        self.error_prototypes.insert(kind, proto.clone());

        let ctor = self.create_function(JsFunction::native(kind.name(), 1, move |interp, _this, args| {
            let message = match args.first() {
                None | Some(JsValue::Undefined) => None,
                Some(v) => Some(interp.to_string(v)?.to_rust_string()),
            };
            Ok(interp.make_error_object(kind, message.as_deref()))
        }));
        let proto_id = proto.borrow().id.unwrap_or_default();
        if let Some(ctor_obj) = ctor.as_object().and_then(|o| self.get_object(o.id)) {
            ctor_obj.borrow_mut().insert_property(
                "prototype".to_string(),
                PropertyDescriptor::data(JsValue::Object(JsObject { id: proto_id }), false, false, false),
            );
        }
        proto
            .borrow_mut()
            .insert_builtin("constructor".to_string(), ctor.clone());
        self.global_object
            .borrow_mut()
            .insert_builtin(kind.name().to_string(), ctor);
        proto
    }

    fn make_error_object(&mut self, kind: ErrorKind, message: Option<&str>) -> JsValue {
        let obj = self.create_object();
        let mut o = obj.borrow_mut();
        o.class_name = "Error".to_string();
        o.prototype = self.error_prototypes.get(&kind).cloned();
        if let Some(message) = message {
            o.insert_builtin("message".to_string(), JsValue::string(message));
        }
        let mut stack = match message {
            Some(m) if !m.is_empty() => format!("{kind}: {m}"),
            _ => kind.to_string(),
        };
        for frame in self.call_stack.iter().rev() {
            stack.push_str(&format!("\n    at {frame}"));
        }
        o.insert_builtin("stack".to_string(), JsValue::string(&stack));
        let id = o.id.unwrap_or_default();
        JsValue::Object(JsObject { id })
    }

    /// A runtime error about to be thrown by the engine itself.
    pub(crate) fn create_error(&mut self, kind: ErrorKind, message: &str) -> JsValue {
        self.record_throw_site();
        self.make_error_object(kind, Some(message))
    }

    pub(crate) fn binding_error_value(&mut self, err: BindingError) -> JsValue {
        self.create_error(err.kind(), &err.to_string())
    }

    pub(crate) fn record_throw_site(&mut self) {
        self.thrown_call_stack = Some(self.call_stack.clone());
    }

    pub(crate) fn clear_throw_site(&mut self) {
        self.thrown_call_stack = None;
    }

    /// Wraps a value that escaped to the host, with the call stack as it
    /// was where it was thrown.
    pub(crate) fn take_exception(&mut self, value: JsValue) -> JavaScriptException {
        let call_stack = self
            .thrown_call_stack
            .take()
            .unwrap_or_else(|| self.call_stack.clone());
        JavaScriptException { value, call_stack }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> JsValue {
        Interpreter::new().run_source(src).unwrap()
    }

    #[test]
    fn constructors_build_linked_errors() {
        assert_eq!(run("new TypeError('x') instanceof Error"), JsValue::Boolean(true));
        assert_eq!(run("TypeError('bad').message"), JsValue::string("bad"));
        assert_eq!(run("new RangeError('r').toString()"), JsValue::string("RangeError: r"));
        assert_eq!(run("new Error().toString()"), JsValue::string("Error"));
    }

    #[test]
    fn engine_errors_are_catchable_instances() {
        assert_eq!(
            run("try { null.x; } catch (e) { e instanceof TypeError && e.name; }"),
            JsValue::string("TypeError")
        );
    }

    #[test]
    fn stack_lists_active_frames() {
        let v = run("function inner() { return new Error('m').stack; } function outer() { return inner(); } outer()");
        assert_eq!(v, JsValue::string("Error: m\n    at Error\n    at inner\n    at outer"));
    }

    #[test]
    fn uncaught_exception_keeps_throw_site_stack() {
        let mut interp = Interpreter::new();
        match interp.run_source("function boom() { throw 1; } boom();") {
            Err(EngineError::Exception(e)) => {
                assert_eq!(e.value, JsValue::Number(1.0));
                let names: Vec<_> = e.call_stack.iter().map(|f| f.function_name.as_str()).collect();
                assert_eq!(names, vec!["boom"]);
            }
            other => panic!("expected exception, got {other:?}"),
        }
    }
}
