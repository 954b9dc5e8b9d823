use super::*;

impl Interpreter {
    // §15.3.4 Properties of the Function Prototype Object
    pub(super) fn setup_function_prototype(&mut self) {
        let Some(proto) = self.function_prototype.clone() else {
            return;
        };
        self.set_builtin(
            &proto,
            JsFunction::native("call", 1, |interp, this, args| {
                let this_arg = args.first().cloned().unwrap_or_default();
                let rest = args.get(1..).unwrap_or_default();
                interp.call_function(this, &this_arg, rest)
            }),
        );
        self.set_builtin(
            &proto,
            JsFunction::native("apply", 2, |interp, this, args| {
                let this_arg = args.first().cloned().unwrap_or_default();
                let list = match args.get(1) {
                    None | Some(JsValue::Undefined) | Some(JsValue::Null) => Vec::new(),
                    Some(JsValue::Object(o)) => interp.array_like_to_vec(o.id)?,
                    Some(_) => {
                        return Err(interp.create_error(
                            ErrorKind::TypeError,
                            "CreateListFromArrayLike called on non-object",
                        ));
                    }
                };
                interp.call_function(this, &this_arg, &list)
            }),
        );
    }

    fn array_like_to_vec(&mut self, id: u64) -> JsResult<Vec<JsValue>> {
        let Some(obj) = self.get_object(id) else {
            return Ok(Vec::new());
        };
        let length = obj.borrow().get_property("length");
        let len = number_ops::to_uint32(self.to_number(&length)?) as usize;
        let o = obj.borrow();
        Ok((0..len).map(|i| o.get_property(&i.to_string())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> JsValue {
        Interpreter::new().run_source(src).unwrap()
    }

    #[test]
    fn call_supplies_receiver_and_arguments() {
        assert_eq!(
            run("function f(a, b) { return this.base + a + b; } f.call({base: 1}, 2, 3)"),
            JsValue::Number(6.0)
        );
    }

    #[test]
    fn apply_spreads_array_like() {
        assert_eq!(
            run("function f(a, b) { return a * b; } f.apply(null, [6, 7])"),
            JsValue::Number(42.0)
        );
        assert_eq!(
            run("function g() { return arguments.length; } g.apply(null, {length: 2})"),
            JsValue::Number(2.0)
        );
    }

    #[test]
    fn functions_share_prototype_methods() {
        assert_eq!(
            run("function a() {} function b() {} a.call === b.apply.call && typeof a.apply"),
            JsValue::string("function")
        );
    }
}
