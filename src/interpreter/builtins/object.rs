use super::*;

impl Interpreter {
    // §15.2 Object Objects
    pub(super) fn setup_object_constructor(&mut self) {
        let ctor = self.create_function(JsFunction::native("Object", 1, |interp, _this, args| {
            match args.first() {
                None | Some(JsValue::Undefined) | Some(JsValue::Null) => {
                    let obj = interp.create_object();
                    let id = obj.borrow().id.unwrap_or_default();
                    Ok(JsValue::Object(JsObject { id }))
                }
                // Primitives come back as they are: there are no wrapper objects
                Some(other) => Ok(other.clone()),
            }
        }));
        let Some(proto) = self.object_prototype.clone() else {
            return;
        };
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

        self.set_builtin(
            &proto,
            JsFunction::native("hasOwnProperty", 1, |interp, this, args| {
                let key = interp.to_string(&args.first().cloned().unwrap_or_default())?;
                let JsValue::Object(o) = this else {
                    return Ok(JsValue::Boolean(false));
                };
                let found = interp
                    .get_object(o.id)
                    .is_some_and(|obj| obj.borrow().has_own_property(&key.to_rust_string()));
                Ok(JsValue::Boolean(found))
            }),
        );
        // §15.2.4.2
        self.set_builtin(
            &proto,
            JsFunction::native("toString", 0, |interp, this, _args| {
                let class = match this {
                    JsValue::Undefined => "Undefined".to_string(),
                    JsValue::Null => "Null".to_string(),
                    JsValue::Boolean(_) => "Boolean".to_string(),
                    JsValue::Number(_) => "Number".to_string(),
                    JsValue::String(_) => "String".to_string(),
                    JsValue::Object(o) => interp
                        .get_object(o.id)
                        .map(|obj| obj.borrow().class_name.clone())
                        .unwrap_or_else(|| "Object".to_string()),
                };
                Ok(JsValue::string(&format!("[object {class}]")))
            }),
        );
        self.set_builtin(
            &proto,
            JsFunction::native("valueOf", 0, |_interp, this, _args| Ok(this.clone())),
        );
        self.global_object
            .borrow_mut()
            .insert_builtin("Object".to_string(), ctor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> JsValue {
        Interpreter::new().run_source(src).unwrap()
    }

    #[test]
    fn has_own_property_ignores_prototype() {
        assert_eq!(run("({a: 1}).hasOwnProperty('a')"), JsValue::Boolean(true));
        assert_eq!(run("({}).hasOwnProperty('toString')"), JsValue::Boolean(false));
    }

    #[test]
    fn to_string_reports_class() {
        assert_eq!(run("Object.prototype.toString.call([])"), JsValue::string("[object Array]"));
        assert_eq!(
            run("(function () { return Object.prototype.toString.call(arguments); })()"),
            JsValue::string("[object Arguments]")
        );
        assert_eq!(run("Object.prototype.toString.call(null)"), JsValue::string("[object Null]"));
    }

    #[test]
    fn constructor_round_trip() {
        assert_eq!(run("new Object() instanceof Object"), JsValue::Boolean(true));
        assert_eq!(run("var o = {}; Object(o) === o"), JsValue::Boolean(true));
        assert_eq!(run("({}).constructor === Object"), JsValue::Boolean(true));
    }
}
