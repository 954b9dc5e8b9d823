use super::*;

/// The result of evaluating an identifier or a property accessor (§8.7).
#[derive(Clone, Debug)]
pub(crate) enum Reference {
    /// `base` is `None` when the name did not resolve.
    Environment { base: Option<EnvRef>, name: String },
    Property { base: JsValue, name: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PreferredType {
    Number,
    String,
}

impl Interpreter {
    pub(crate) fn eval_expr(&mut self, expr: &Expression) -> JsResult<JsValue> {
        match expr {
            Expression::Literal(lit) => Ok(self.eval_literal(lit)),
            Expression::Identifier(_) | Expression::Member(..) => {
                let r = self.eval_reference(expr)?;
                self.get_value(&r)
            }
            Expression::This => Ok(self.this_binding()),
            Expression::Array(elements) => self.eval_array_literal(elements),
            Expression::Object(props) => self.eval_object_literal(props),
            Expression::Function(node) => self.eval_function_expression(node),
            Expression::Unary(op, operand) => {
                let val = self.eval_expr(operand)?;
                self.eval_unary(*op, &val)
            }
            Expression::Binary(op, left, right) => {
                let lval = self.eval_expr(left)?;
                let rval = self.eval_expr(right)?;
                self.eval_binary(*op, &lval, &rval)
            }
            Expression::Logical(op, left, right) => {
                let lval = self.eval_expr(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !to_boolean(&lval),
                    LogicalOp::Or => to_boolean(&lval),
                };
                if short_circuit {
                    Ok(lval)
                } else {
                    self.eval_expr(right)
                }
            }
            Expression::Update(op, prefix, target) => self.eval_update(*op, *prefix, target),
            Expression::Assign(op, target, value) => self.eval_assign(*op, target, value),
            Expression::Conditional(test, consequent, alternate) => {
                let t = self.eval_expr(test)?;
                if to_boolean(&t) {
                    self.eval_expr(consequent)
                } else {
                    self.eval_expr(alternate)
                }
            }
            Expression::Call(callee, args) => self.eval_call(callee, args),
            Expression::New(callee, args) => self.eval_new(callee, args),
            Expression::Typeof(operand) => self.eval_typeof(operand),
            Expression::Void(operand) => {
                self.eval_expr(operand)?;
                Ok(JsValue::Undefined)
            }
            Expression::Delete(operand) => self.eval_delete(operand),
            Expression::Sequence(exprs) => {
                let mut last = JsValue::Undefined;
                for e in exprs {
                    last = self.eval_expr(e)?;
                }
                Ok(last)
            }
        }
    }

    fn eval_literal(&mut self, lit: &Literal) -> JsValue {
        match lit {
            Literal::Null => JsValue::Null,
            Literal::Boolean(b) => JsValue::Boolean(*b),
            Literal::Number(n) => JsValue::Number(*n),
            Literal::String(s) => JsValue::string(s),
        }
    }

    /// Identifier resolution (§10.3.1) against the running lexical
    /// environment.
    pub(crate) fn resolve_binding(&self, name: &str) -> Reference {
        let env = self.lexical_environment();
        Reference::Environment {
            base: LexicalEnvironment::resolve(&env, name),
            name: name.to_string(),
        }
    }

    pub(crate) fn eval_reference(&mut self, expr: &Expression) -> JsResult<Reference> {
        match expr {
            Expression::Identifier(name) => Ok(self.resolve_binding(name)),
            Expression::Member(object, property) => {
                let base = self.eval_expr(object)?;
                let key = match property {
                    MemberProperty::Dot(name) => JsValue::string(name),
                    MemberProperty::Computed(e) => self.eval_expr(e)?,
                };
                if base.is_nullish() {
                    let key = to_js_string(&key);
                    return Err(self.create_error(
                        ErrorKind::TypeError,
                        &format!("Cannot read property '{key}' of {base}"),
                    ));
                }
                let name = self.to_string(&key)?.to_rust_string();
                Ok(Reference::Property { base, name })
            }
            _ => Err(self.create_error(ErrorKind::ReferenceError, "Invalid assignment target")),
        }
    }

    // §8.7.1 GetValue
    pub(crate) fn get_value(&mut self, r: &Reference) -> JsResult<JsValue> {
        match r {
            Reference::Environment { base: None, name } => Err(self.create_error(
                ErrorKind::ReferenceError,
                &format!("{name} is not defined"),
            )),
            Reference::Environment {
                base: Some(env),
                name,
            } => {
                let strict = self.is_strict();
                let result = env.record.borrow().get_binding_value(name, strict);
                result.map_err(|e| self.binding_error_value(e))
            }
            Reference::Property { base, name } => self.get_property_of(base, name),
        }
    }

    pub(crate) fn get_property_of(&mut self, base: &JsValue, name: &str) -> JsResult<JsValue> {
        match base {
            JsValue::Object(o) => Ok(self
                .get_object(o.id)
                .map(|obj| obj.borrow().get_property(name))
                .unwrap_or_default()),
            JsValue::String(s) => {
                if name == "length" {
                    return Ok(JsValue::Number(s.len() as f64));
                }
                if let Some(i) = array_index(name)
                    && let Some(unit) = s.code_units.get(i)
                {
                    return Ok(JsValue::String(JsString {
                        code_units: vec![*unit],
                    }));
                }
                Ok(self.get_prototype_property(name))
            }
            JsValue::Undefined | JsValue::Null => Err(self.create_error(
                ErrorKind::TypeError,
                &format!("Cannot read property '{name}' of {base}"),
            )),
            JsValue::Boolean(_) | JsValue::Number(_) => Ok(self.get_prototype_property(name)),
        }
    }

    // Primitives have no wrapper objects; their properties come from
    // Object.prototype.
    fn get_prototype_property(&self, name: &str) -> JsValue {
        self.object_prototype
            .as_ref()
            .map(|p| p.borrow().get_property(name))
            .unwrap_or_default()
    }

    // §8.7.2 PutValue
    pub(crate) fn put_value(&mut self, r: &Reference, value: JsValue) -> JsResult<()> {
        let strict = self.is_strict();
        match r {
            Reference::Environment { base: None, name } => {
                if strict {
                    return Err(self.create_error(
                        ErrorKind::ReferenceError,
                        &format!("{name} is not defined"),
                    ));
                }
                let result = self
                    .global_env
                    .record
                    .borrow_mut()
                    .set_mutable_binding(name, value, false);
                result.map_err(|e| self.binding_error_value(e))
            }
            Reference::Environment {
                base: Some(env),
                name,
            } => {
                let result = env
                    .record
                    .borrow_mut()
                    .set_mutable_binding(name, value, strict);
                result.map_err(|e| self.binding_error_value(e))
            }
            Reference::Property { base, name } => match base {
                JsValue::Object(o) => {
                    let accepted = self
                        .get_object(o.id)
                        .is_some_and(|obj| obj.borrow_mut().put(name, value));
                    if !accepted && strict {
                        return Err(self.create_error(
                            ErrorKind::TypeError,
                            &format!("Cannot assign to read only property '{name}'"),
                        ));
                    }
                    Ok(())
                }
                JsValue::Undefined | JsValue::Null => Err(self.create_error(
                    ErrorKind::TypeError,
                    &format!("Cannot set property '{name}' of {base}"),
                )),
                _ if strict => Err(self.create_error(
                    ErrorKind::TypeError,
                    &format!("Cannot create property '{name}' on primitive value"),
                )),
                _ => Ok(()),
            },
        }
    }

    fn eval_array_literal(&mut self, elements: &[Option<Expression>]) -> JsResult<JsValue> {
        let mut values = Vec::with_capacity(elements.len());
        for elem in elements {
            values.push(match elem {
                Some(e) => Some(self.eval_expr(e)?),
                None => None,
            });
        }
        let obj = self.create_object();
        let mut o = obj.borrow_mut();
        o.class_name = "Array".to_string();
        for (i, v) in values.into_iter().enumerate() {
            if let Some(v) = v {
                o.insert_value(i.to_string(), v);
            }
        }
        o.insert_property(
            "length".to_string(),
            PropertyDescriptor::data(JsValue::Number(elements.len() as f64), true, false, false),
        );
        let id = o.id.unwrap_or_default();
        Ok(JsValue::Object(JsObject { id }))
    }

    fn eval_object_literal(&mut self, props: &[Property]) -> JsResult<JsValue> {
        let obj = self.create_object();
        for prop in props {
            let value = self.eval_expr(&prop.value)?;
            obj.borrow_mut().define_own_property(
                prop.key.to_property_name(),
                PropertyDescriptor::data_default(value),
            );
        }
        let id = obj.borrow().id.unwrap_or_default();
        Ok(JsValue::Object(JsObject { id }))
    }

    // §13 FunctionExpression. A named expression sees its own name through
    // an immutable binding in an environment of its own.
    fn eval_function_expression(&mut self, node: &Rc<FunctionNode>) -> JsResult<JsValue> {
        let scope = self.lexical_environment();
        let Some(name) = &node.name else {
            return Ok(self.create_function(JsFunction::User {
                node: node.clone(),
                scope,
            }));
        };
        let func_env = LexicalEnvironment::new_declarative(Some(scope));
        let created = match func_env.record.borrow_mut().as_declarative_mut() {
            Some(rec) => rec.create_immutable_binding(name, JsValue::Undefined),
            None => Ok(()),
        };
        created.map_err(|e| self.binding_error_value(e))?;
        let closure = self.create_function(JsFunction::User {
            node: node.clone(),
            scope: func_env.clone(),
        });
        let initialized = match func_env.record.borrow_mut().as_declarative_mut() {
            Some(rec) => rec.initialize_immutable_binding(name, closure.clone()),
            None => Ok(()),
        };
        initialized.map_err(|e| self.binding_error_value(e))?;
        Ok(closure)
    }

    fn eval_unary(&mut self, op: UnaryOp, val: &JsValue) -> JsResult<JsValue> {
        Ok(match op {
            UnaryOp::Minus => JsValue::Number(number_ops::unary_minus(self.to_number(val)?)),
            UnaryOp::Plus => JsValue::Number(self.to_number(val)?),
            UnaryOp::Not => JsValue::Boolean(!to_boolean(val)),
            UnaryOp::BitNot => JsValue::Number(number_ops::bitwise_not(self.to_number(val)?)),
        })
    }

    pub(crate) fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &JsValue,
        right: &JsValue,
    ) -> JsResult<JsValue> {
        let number = |n: f64| Ok(JsValue::Number(n));
        match op {
            BinaryOp::Add => {
                let lprim = self.to_primitive(left, None)?;
                let rprim = self.to_primitive(right, None)?;
                if lprim.is_string() || rprim.is_string() {
                    let ls = to_js_string(&lprim);
                    let rs = to_js_string(&rprim);
                    return Ok(JsValue::String(ls.concat(&rs)));
                }
                number(to_number(&lprim) + to_number(&rprim))
            }
            BinaryOp::Sub => number(self.to_number(left)? - self.to_number(right)?),
            BinaryOp::Mul => number(self.to_number(left)? * self.to_number(right)?),
            BinaryOp::Div => number(self.to_number(left)? / self.to_number(right)?),
            BinaryOp::Mod => number(self.to_number(left)? % self.to_number(right)?),
            BinaryOp::Eq => Ok(JsValue::Boolean(self.loose_equals(left, right)?)),
            BinaryOp::NotEq => Ok(JsValue::Boolean(!self.loose_equals(left, right)?)),
            BinaryOp::StrictEq => Ok(JsValue::Boolean(strict_equality(left, right))),
            BinaryOp::StrictNotEq => Ok(JsValue::Boolean(!strict_equality(left, right))),
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
                let lprim = self.to_primitive(left, Some(PreferredType::Number))?;
                let rprim = self.to_primitive(right, Some(PreferredType::Number))?;
                let result = match op {
                    BinaryOp::Lt => abstract_relational(&lprim, &rprim) == Some(true),
                    BinaryOp::Gt => abstract_relational(&rprim, &lprim) == Some(true),
                    BinaryOp::LtEq => abstract_relational(&rprim, &lprim) == Some(false),
                    _ => abstract_relational(&lprim, &rprim) == Some(false),
                };
                Ok(JsValue::Boolean(result))
            }
            BinaryOp::LShift => number(number_ops::left_shift(
                self.to_number(left)?,
                self.to_number(right)?,
            )),
            BinaryOp::RShift => number(number_ops::signed_right_shift(
                self.to_number(left)?,
                self.to_number(right)?,
            )),
            BinaryOp::URShift => number(number_ops::unsigned_right_shift(
                self.to_number(left)?,
                self.to_number(right)?,
            )),
            BinaryOp::BitAnd => number(number_ops::bitwise_and(
                self.to_number(left)?,
                self.to_number(right)?,
            )),
            BinaryOp::BitOr => number(number_ops::bitwise_or(
                self.to_number(left)?,
                self.to_number(right)?,
            )),
            BinaryOp::BitXor => number(number_ops::bitwise_xor(
                self.to_number(left)?,
                self.to_number(right)?,
            )),
            BinaryOp::In => {
                let JsValue::Object(o) = right else {
                    return Err(self.create_error(
                        ErrorKind::TypeError,
                        "Cannot use 'in' operator to search in a non-object",
                    ));
                };
                let key = self.to_string(left)?.to_rust_string();
                let found = self
                    .get_object(o.id)
                    .is_some_and(|obj| obj.borrow().has_property(&key));
                Ok(JsValue::Boolean(found))
            }
            BinaryOp::Instanceof => self.instance_of(left, right).map(JsValue::Boolean),
        }
    }

    // §15.3.5.3 [[HasInstance]]
    fn instance_of(&mut self, value: &JsValue, constructor: &JsValue) -> JsResult<bool> {
        let func = match constructor {
            JsValue::Object(c) => self.get_object(c.id).filter(|f| f.borrow().is_callable()),
            _ => None,
        };
        let Some(func) = func else {
            return Err(self.create_error(
                ErrorKind::TypeError,
                "Right-hand side of 'instanceof' is not callable",
            ));
        };
        let JsValue::Object(v) = value else {
            return Ok(false);
        };
        let JsValue::Object(proto) = func.borrow().get_property("prototype") else {
            return Err(self.create_error(
                ErrorKind::TypeError,
                "Function has non-object prototype in instanceof check",
            ));
        };
        let mut current = self.get_object(v.id).and_then(|o| o.borrow().prototype.clone());
        while let Some(obj) = current {
            if obj.borrow().id == Some(proto.id) {
                return Ok(true);
            }
            current = obj.borrow().prototype.clone();
        }
        Ok(false)
    }

    // §11.9.3 The Abstract Equality Comparison Algorithm
    pub(crate) fn loose_equals(&mut self, left: &JsValue, right: &JsValue) -> JsResult<bool> {
        match (left, right) {
            (JsValue::Object(a), JsValue::Object(b)) => Ok(a.id == b.id),
            (JsValue::Object(_), JsValue::Number(_) | JsValue::String(_)) => {
                let prim = self.to_primitive(left, None)?;
                self.loose_equals(&prim, right)
            }
            (JsValue::Number(_) | JsValue::String(_), JsValue::Object(_)) => {
                let prim = self.to_primitive(right, None)?;
                self.loose_equals(left, &prim)
            }
            (JsValue::Object(_), JsValue::Boolean(b)) => {
                self.loose_equals(left, &JsValue::Number(*b as u8 as f64))
            }
            (JsValue::Boolean(b), JsValue::Object(_)) => {
                self.loose_equals(&JsValue::Number(*b as u8 as f64), right)
            }
            _ => Ok(abstract_equality(left, right)),
        }
    }

    fn eval_update(&mut self, op: UpdateOp, prefix: bool, target: &Expression) -> JsResult<JsValue> {
        let r = self.eval_reference(target)?;
        let current = self.get_value(&r)?;
        let old = self.to_number(&current)?;
        let new = match op {
            UpdateOp::Increment => old + 1.0,
            UpdateOp::Decrement => old - 1.0,
        };
        self.put_value(&r, JsValue::Number(new))?;
        Ok(JsValue::Number(if prefix { new } else { old }))
    }

    fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Expression,
        value: &Expression,
    ) -> JsResult<JsValue> {
        let r = self.eval_reference(target)?;
        let result = match op.binary_op() {
            None => self.eval_expr(value)?,
            Some(bin) => {
                let lval = self.get_value(&r)?;
                let rval = self.eval_expr(value)?;
                self.eval_binary(bin, &lval, &rval)?
            }
        };
        self.put_value(&r, result.clone())?;
        Ok(result)
    }

    fn eval_arguments(&mut self, args: &[Expression]) -> JsResult<Vec<JsValue>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }
        Ok(values)
    }

    // §11.2.3 Function Calls
    fn eval_call(&mut self, callee: &Expression, args: &[Expression]) -> JsResult<JsValue> {
        let (func, this) = match callee {
            Expression::Identifier(_) | Expression::Member(..) => {
                let r = self.eval_reference(callee)?;
                let func = self.get_value(&r)?;
                let this = match &r {
                    Reference::Property { base, .. } => base.clone(),
                    Reference::Environment {
                        base: Some(env), ..
                    } => env.record.borrow().implicit_this_value(),
                    Reference::Environment { base: None, .. } => JsValue::Undefined,
                };
                (func, this)
            }
            other => (self.eval_expr(other)?, JsValue::Undefined),
        };
        let arg_values = self.eval_arguments(args)?;
        if !self.is_callable(&func) {
            return Err(self.create_error(
                ErrorKind::TypeError,
                &format!("{} is not a function", describe_callee(callee)),
            ));
        }
        // §15.1.2.1.1 Direct Call to Eval
        if callee.is_identifier("eval") && self.is_intrinsic_eval(&func) {
            return self.perform_eval(&arg_values, true);
        }
        self.call_function(&func, &this, &arg_values)
    }

    fn eval_new(&mut self, callee: &Expression, args: &[Expression]) -> JsResult<JsValue> {
        let constructor = self.eval_expr(callee)?;
        let arg_values = self.eval_arguments(args)?;
        if !self.is_callable(&constructor) {
            return Err(self.create_error(
                ErrorKind::TypeError,
                &format!("{} is not a constructor", describe_callee(callee)),
            ));
        }
        self.construct(&constructor, &arg_values)
    }

    fn eval_typeof(&mut self, operand: &Expression) -> JsResult<JsValue> {
        if let Expression::Identifier(name) = operand
            && let r @ Reference::Environment { base: Some(_), .. } = self.resolve_binding(name)
        {
            let val = self.get_value(&r)?;
            return Ok(JsValue::string(typeof_val(&val, &self.objects)));
        }
        if matches!(operand, Expression::Identifier(_)) {
            return Ok(JsValue::string("undefined"));
        }
        let val = self.eval_expr(operand)?;
        Ok(JsValue::string(typeof_val(&val, &self.objects)))
    }

    // §11.4.1 The delete Operator
    fn eval_delete(&mut self, operand: &Expression) -> JsResult<JsValue> {
        match operand {
            Expression::Identifier(name) => {
                let deleted = match self.resolve_binding(name) {
                    Reference::Environment {
                        base: Some(env), ..
                    } => env.record.borrow_mut().delete_binding(name),
                    _ => true,
                };
                Ok(JsValue::Boolean(deleted))
            }
            Expression::Member(..) => {
                let Reference::Property { base, name } = self.eval_reference(operand)? else {
                    return Ok(JsValue::Boolean(true));
                };
                let JsValue::Object(o) = base else {
                    return Ok(JsValue::Boolean(true));
                };
                let deleted = self
                    .get_object(o.id)
                    .is_none_or(|obj| obj.borrow_mut().delete(&name));
                if !deleted && self.is_strict() {
                    return Err(self.create_error(
                        ErrorKind::TypeError,
                        &format!("Cannot delete property '{name}'"),
                    ));
                }
                Ok(JsValue::Boolean(deleted))
            }
            other => {
                self.eval_expr(other)?;
                Ok(JsValue::Boolean(true))
            }
        }
    }

    // §9.1 ToPrimitive; `None` is the default hint, which is Number for
    // every object this engine creates.
    pub(crate) fn to_primitive(
        &mut self,
        val: &JsValue,
        hint: Option<PreferredType>,
    ) -> JsResult<JsValue> {
        let JsValue::Object(o) = val else {
            return Ok(val.clone());
        };
        let order = match hint {
            Some(PreferredType::String) => ["toString", "valueOf"],
            _ => ["valueOf", "toString"],
        };
        for name in order {
            let method = self
                .get_object(o.id)
                .map(|obj| obj.borrow().get_property(name))
                .unwrap_or_default();
            if self.is_callable(&method) {
                let result = self.call_function(&method, val, &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(self.create_error(
            ErrorKind::TypeError,
            "Cannot convert object to primitive value",
        ))
    }

    pub(crate) fn to_number(&mut self, val: &JsValue) -> JsResult<f64> {
        let prim = self.to_primitive(val, Some(PreferredType::Number))?;
        Ok(to_number(&prim))
    }

    pub(crate) fn to_string(&mut self, val: &JsValue) -> JsResult<JsString> {
        let prim = self.to_primitive(val, Some(PreferredType::String))?;
        Ok(to_js_string(&prim))
    }

    pub(crate) fn is_callable(&self, val: &JsValue) -> bool {
        match val {
            JsValue::Object(o) => self
                .get_object(o.id)
                .is_some_and(|obj| obj.borrow().is_callable()),
            _ => false,
        }
    }

    fn is_intrinsic_eval(&self, val: &JsValue) -> bool {
        matches!(val, JsValue::Object(o) if Some(o.id) == self.eval_function_id)
    }
}

fn describe_callee(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(name) => name.clone(),
        Expression::Member(object, MemberProperty::Dot(prop)) => {
            format!("{}.{prop}", describe_callee(object))
        }
        Expression::Member(object, MemberProperty::Computed(_)) => {
            format!("{}[...]", describe_callee(object))
        }
        Expression::This => "this".to_string(),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> JsValue {
        Interpreter::new().run_source(src).unwrap()
    }

    fn run_err(src: &str) -> String {
        let mut interp = Interpreter::new();
        match interp.run_source(src) {
            Err(crate::interpreter::EngineError::Exception(e)) => interp.format_value(&e.value),
            other => panic!("expected exception, got {other:?}"),
        }
    }

    #[test]
    fn arithmetic_and_concatenation() {
        assert_eq!(run("1 + 2 * 3"), JsValue::Number(7.0));
        assert_eq!(run("'a' + 1"), JsValue::string("a1"));
        assert_eq!(run("7 % 3"), JsValue::Number(1.0));
        assert_eq!(run("1 << 3 | 1"), JsValue::Number(9.0));
    }

    #[test]
    fn equality() {
        assert_eq!(run("null == undefined"), JsValue::Boolean(true));
        assert_eq!(run("'1' === 1"), JsValue::Boolean(false));
        assert_eq!(run("var o = {}; o == o"), JsValue::Boolean(true));
        assert_eq!(run("({}) == '[object Object]'"), JsValue::Boolean(true));
    }

    #[test]
    fn unresolvable_read_throws() {
        assert_eq!(run_err("missing"), "ReferenceError: missing is not defined");
        assert_eq!(run("typeof missing"), JsValue::string("undefined"));
        assert_eq!(run("delete missing"), JsValue::Boolean(true));
    }

    #[test]
    fn unresolvable_write_depends_on_strictness() {
        assert_eq!(run("implicitGlobal = 4; this.implicitGlobal"), JsValue::Number(4.0));
        assert_eq!(
            run_err("'use strict'; undeclared = 1;"),
            "ReferenceError: undeclared is not defined"
        );
    }

    #[test]
    fn calling_non_function_names_the_callee() {
        assert_eq!(run_err("var o = {}; o.m()"), "TypeError: o.m is not a function");
    }

    #[test]
    fn member_access_on_null() {
        assert_eq!(run_err("var n = null; n.x"), "TypeError: Cannot read property 'x' of null");
    }

    #[test]
    fn string_indexing() {
        assert_eq!(run("'abc'.length"), JsValue::Number(3.0));
        assert_eq!(run("'abc'[1]"), JsValue::string("b"));
    }

    #[test]
    fn named_function_expression_binding_is_immutable() {
        assert_eq!(
            run("var f = function g() { g = 1; return typeof g; }; f()"),
            JsValue::string("function")
        );
        assert!(run_err("var f = function g() { 'use strict'; g = 1; }; f()").starts_with("TypeError"));
        assert_eq!(run("typeof g"), JsValue::string("undefined"));
    }

    #[test]
    fn compound_assignment_and_update() {
        assert_eq!(run("var x = 5; x += 2; x++; ++x"), JsValue::Number(9.0));
        assert_eq!(run("var o = {n: 1}; o.n *= 3; o['n']--"), JsValue::Number(3.0));
    }

    #[test]
    fn instanceof_and_in() {
        assert_eq!(run("function F() {} new F() instanceof F"), JsValue::Boolean(true));
        assert_eq!(run("'x' in {x: 1}"), JsValue::Boolean(true));
        assert!(run_err("'x' in 1").starts_with("TypeError"));
    }

    #[test]
    fn to_primitive_uses_value_of() {
        assert_eq!(
            run("var o = { valueOf: function () { return 41; } }; o + 1"),
            JsValue::Number(42.0)
        );
    }

    #[test]
    fn strict_delete_of_non_configurable_property_throws() {
        assert!(run_err("'use strict'; delete Object.prototype;").starts_with("TypeError"));
        assert_eq!(run("delete Object.prototype"), JsValue::Boolean(false));
    }
}
