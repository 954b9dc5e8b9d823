//! Declaration binding instantiation (ES5 §10.5).

use super::arguments::CallArguments;
use super::environment::{Bindings, EnvRef};
use super::exception::ErrorKind;
use super::types::{JsFunction, JsResult, PropertyDescriptor};
use super::Interpreter;
use crate::ast::HoistingScope;
use crate::types::JsValue;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DeclarationKind {
    Global,
    Function,
    Eval,
}

impl Interpreter {
    /// Binds parameters, function declarations, the arguments object and
    /// `var` names into `env`, in that order. Returns whether an arguments
    /// object was rented for the invocation.
    pub(crate) fn instantiate_declarations(
        &mut self,
        env: &EnvRef,
        kind: DeclarationKind,
        hoisting: &HoistingScope,
        strict: bool,
        call: Option<&CallArguments<'_>>,
    ) -> JsResult<bool> {
        let deletable = kind == DeclarationKind::Eval;

        if let Some(call) = call {
            for (i, name) in call.node.params.iter().enumerate() {
                let value = call.args.get(i).cloned().unwrap_or_default();
                let mut record = env.record.borrow_mut();
                if !record.has_binding(name) {
                    record
                        .create_mutable_binding(name, JsValue::Undefined, false)
                        .map_err(|e| self.binding_error_value(e))?;
                }
                record
                    .set_mutable_binding(name, value, strict)
                    .map_err(|e| self.binding_error_value(e))?;
            }
        }

        for fd in &hoisting.function_declarations {
            let Some(name) = fd.name.as_deref() else {
                continue;
            };
            let func = self.create_function(JsFunction::User {
                node: fd.clone(),
                scope: env.clone(),
            });
            let exists = env.record.borrow().has_binding(name);
            if !exists {
                env.record
                    .borrow_mut()
                    .create_mutable_binding(name, JsValue::Undefined, deletable)
                    .map_err(|e| self.binding_error_value(e))?;
            } else if Rc::ptr_eq(env, &self.global_env) {
                self.redeclare_global_function(name, deletable)?;
            }
            env.record
                .borrow_mut()
                .set_mutable_binding(name, func, strict)
                .map_err(|e| self.binding_error_value(e))?;
        }

        let mut rented = false;
        if let Some(call) = call
            && !env.record.borrow().has_binding("arguments")
        {
            let args_obj = self.create_arguments_object(call, env, strict);
            rented = true;
            let mut record = env.record.borrow_mut();
            let bound = match record.as_declarative_mut() {
                Some(rec) if strict => rec.create_immutable_binding("arguments", args_obj),
                Some(rec) => rec.create_mutable_binding("arguments", args_obj, false),
                None => Ok(()),
            };
            drop(record);
            bound.map_err(|e| self.binding_error_value(e))?;
        }

        for name in &hoisting.variable_declarations {
            let mut record = env.record.borrow_mut();
            if !record.has_binding(name) {
                record
                    .create_mutable_binding(name, JsValue::Undefined, deletable)
                    .map_err(|e| self.binding_error_value(e))?;
            }
        }

        Ok(rented)
    }

    /// §10.5 step 5.e: a global function declaration may replace an
    /// existing global property only if that property is configurable, or
    /// already a writable enumerable data property.
    fn redeclare_global_function(&mut self, name: &str, deletable: bool) -> JsResult<()> {
        let existing = self.global_object.borrow().get_own_property(name);
        match existing {
            Some(prop) if prop.configurable => {
                self.global_object.borrow_mut().define_own_property(
                    name.to_string(),
                    PropertyDescriptor::data(JsValue::Undefined, true, true, deletable),
                );
                Ok(())
            }
            Some(prop) if !(prop.writable && prop.enumerable) => Err(self.create_error(
                ErrorKind::TypeError,
                &format!("Cannot redefine global function '{name}'"),
            )),
            _ => Ok(()),
        }
    }
}
