//! [[Call]] and [[Construct]] for function objects (ES5 §13.2.1, §13.2.2).

use super::arguments::CallArguments;
use super::context::{ContextScope, ExecutionContext};
use super::declaration::DeclarationKind;
use super::environment::LexicalEnvironment;
use super::exception::{CallFrame, ErrorKind};
use super::types::{JsFunction, JsResult};
use super::{Completion, Interpreter};
use crate::types::{JsObject, JsValue};

impl Interpreter {
    pub fn call_function(
        &mut self,
        func: &JsValue,
        this: &JsValue,
        args: &[JsValue],
    ) -> JsResult<JsValue> {
        let callable = match func {
            JsValue::Object(o) => self
                .get_object(o.id)
                .and_then(|obj| obj.borrow().callable.clone()),
            _ => None,
        };
        let Some(callable) = callable else {
            return Err(self.create_error(ErrorKind::TypeError, "object is not a function"));
        };
        if self.call_stack.len() >= self.options.max_call_depth {
            return Err(self.create_error(
                ErrorKind::RangeError,
                "Maximum call stack size exceeded",
            ));
        }

        let frame = CallFrame {
            function_name: callable.name().to_string(),
        };
        match callable {
            JsFunction::Native(_, _, f) => {
                let mut scope = ContextScope::new(self);
                scope.push_frame(frame);
                f(&mut *scope, this, args)
            }
            JsFunction::User { node, scope: closure } => {
                let strict = node.strict;
                let this_binding = if !strict && this.is_nullish() {
                    JsValue::Object(self.global_object_handle())
                } else {
                    this.clone()
                };
                let local_env = LexicalEnvironment::new_declarative(Some(closure));
                let mut scope = ContextScope::new(self);
                scope.push(ExecutionContext::new(local_env.clone(), this_binding, strict));
                scope.push_frame(frame);

                let call = CallArguments {
                    callee: func,
                    node: &node,
                    args,
                };
                let rented = scope.instantiate_declarations(
                    &local_env,
                    DeclarationKind::Function,
                    &node.hoisting,
                    strict,
                    Some(&call),
                )?;
                let result = match scope.exec_statements(&node.body) {
                    Completion::Return(v) => Ok(v),
                    Completion::Throw(v) => Err(v),
                    _ => Ok(JsValue::Undefined),
                };
                scope.release_unescaped_arguments(&local_env, rented, node.arguments_usage, &result);
                result
            }
        }
    }

    // §13.2.2 [[Construct]]
    pub fn construct(&mut self, func: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let JsValue::Object(f) = func else {
            return Err(self.create_error(ErrorKind::TypeError, "object is not a constructor"));
        };
        let proto = match self.get_object(f.id) {
            Some(obj) if obj.borrow().is_callable() => obj.borrow().get_property("prototype"),
            _ => {
                return Err(
                    self.create_error(ErrorKind::TypeError, "object is not a constructor")
                );
            }
        };
        let obj = self.create_object();
        if let JsValue::Object(p) = proto {
            obj.borrow_mut().prototype = self.get_object(p.id);
        }
        let id = obj.borrow().id.unwrap_or_default();
        let this = JsValue::Object(JsObject { id });
        let result = self.call_function(func, &this, args)?;
        if result.is_object() {
            Ok(result)
        } else {
            Ok(this)
        }
    }
}
