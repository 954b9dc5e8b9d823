//! Arguments objects (ES5 §10.6) and the pool they are rented from.

use super::environment::EnvRef;
use super::types::{ObjectRef, ParameterMap, PropertyDescriptor};
use super::Interpreter;
use crate::ast::{ArgumentsUsage, FunctionNode};
use crate::types::{JsObject, JsValue};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Recycles arguments objects whose invocation has finished without
/// leaking a reference to them. Reuse keeps the object's table slot, so a
/// recycled instance is indistinguishable from a fresh one except by id.
#[derive(Default)]
pub struct ArgumentsPool {
    free: Vec<ObjectRef>,
    capacity: usize,
    created: usize,
    reused: usize,
}

impl ArgumentsPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
            created: 0,
            reused: 0,
        }
    }

    fn take_free(&mut self) -> Option<ObjectRef> {
        let obj = self.free.pop()?;
        self.reused += 1;
        Some(obj)
    }

    /// Accepts a rented object back. Objects that were never rented are
    /// left alone. Returns the object when the pool is already full.
    pub fn give_back(&mut self, obj: ObjectRef) -> Option<ObjectRef> {
        if !obj.borrow().rented {
            return None;
        }
        obj.borrow_mut().reset();
        if self.free.len() < self.capacity {
            self.free.push(obj);
            None
        } else {
            Some(obj)
        }
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn reused(&self) -> usize {
        self.reused
    }
}

/// What a function invocation contributes to its arguments object.
pub(crate) struct CallArguments<'a> {
    pub callee: &'a JsValue,
    pub node: &'a FunctionNode,
    pub args: &'a [JsValue],
}

impl Interpreter {
    fn rent_arguments_object(&mut self) -> ObjectRef {
        let obj = match self.arguments_pool.take_free() {
            Some(obj) => obj,
            None => {
                self.arguments_pool.created += 1;
                self.create_object()
            }
        };
        {
            let mut o = obj.borrow_mut();
            o.prototype = self.object_prototype.clone();
            o.rented = true;
        }
        trace!(
            available = self.arguments_pool.available(),
            "rent arguments object"
        );
        obj
    }

    // §10.6 CreateArgumentsObject
    pub(crate) fn create_arguments_object(
        &mut self,
        call: &CallArguments<'_>,
        env: &EnvRef,
        strict: bool,
    ) -> JsValue {
        let obj = self.rent_arguments_object();
        let mut o = obj.borrow_mut();
        o.class_name = "Arguments".to_string();
        o.insert_property(
            "length".to_string(),
            PropertyDescriptor::data(JsValue::Number(call.args.len() as f64), true, false, true),
        );
        for (i, val) in call.args.iter().enumerate() {
            o.insert_value(i.to_string(), val.clone());
        }
        if !strict {
            // Later duplicates of a parameter name win the mapping
            let mut mapped = FxHashMap::default();
            let mut seen = rustc_hash::FxHashSet::default();
            let bound = call.node.params.len().min(call.args.len());
            for index in (0..bound).rev() {
                let name = &call.node.params[index];
                if seen.insert(name.as_str()) {
                    mapped.insert(index.to_string(), name.clone());
                }
            }
            if !mapped.is_empty() {
                o.parameter_map = Some(ParameterMap {
                    env: env.clone(),
                    mapped,
                });
            }
            o.insert_builtin("callee".to_string(), call.callee.clone());
        }
        let id = o.id.unwrap_or_default();
        JsValue::Object(JsObject { id })
    }

    /// Returns the arguments object bound in `env` to the pool when the
    /// body only used it locally and it is not the completion value.
    pub(crate) fn release_unescaped_arguments(
        &mut self,
        env: &EnvRef,
        rented: bool,
        usage: ArgumentsUsage,
        result: &Result<JsValue, JsValue>,
    ) {
        if !rented || usage == ArgumentsUsage::Escaping {
            return;
        }
        let Some(JsValue::Object(args)) = env
            .record
            .borrow()
            .as_declarative()
            .and_then(|r| r.arguments_value().cloned())
        else {
            return;
        };
        let escaped = match result {
            Ok(JsValue::Object(o)) | Err(JsValue::Object(o)) => o.id == args.id,
            _ => false,
        };
        if escaped {
            return;
        }
        if let Some(rec) = env.record.borrow_mut().as_declarative_mut() {
            rec.release_arguments();
        }
        self.release_arguments_object(args);
    }

    fn release_arguments_object(&mut self, args: JsObject) {
        let Some(obj) = self.get_object(args.id) else {
            return;
        };
        if let Some(overflow) = self.arguments_pool.give_back(obj) {
            // Pool full: the slot goes back to the object table instead
            let id = overflow.borrow().id;
            if let Some(id) = id {
                self.free_object_slot(id);
            }
        }
        trace!(
            available = self.arguments_pool.available(),
            "release arguments object"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rented_object() -> ObjectRef {
        let obj = Rc::new(RefCell::new(super::super::types::JsObjectData::new()));
        obj.borrow_mut().id = Some(11);
        obj.borrow_mut().rented = true;
        obj.borrow_mut().insert_value("0".into(), JsValue::Number(1.0));
        obj
    }

    #[test]
    fn give_back_clears_and_keeps_slot_id() {
        let mut pool = ArgumentsPool::new(4);
        let obj = rented_object();
        assert!(pool.give_back(obj.clone()).is_none());
        assert_eq!(pool.available(), 1);
        let o = obj.borrow();
        assert!(o.properties.is_empty());
        assert!(!o.rented);
        assert_eq!(o.id, Some(11));
    }

    #[test]
    fn never_rented_objects_are_ignored() {
        let mut pool = ArgumentsPool::new(4);
        let obj = Rc::new(RefCell::new(super::super::types::JsObjectData::new()));
        obj.borrow_mut().insert_value("keep".into(), JsValue::Null);
        assert!(pool.give_back(obj.clone()).is_none());
        assert_eq!(pool.available(), 0);
        assert!(obj.borrow().has_own_property("keep"));
    }

    #[test]
    fn give_back_is_idempotent() {
        let mut pool = ArgumentsPool::new(4);
        let obj = rented_object();
        pool.give_back(obj.clone());
        pool.give_back(obj);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn full_pool_hands_object_back() {
        let mut pool = ArgumentsPool::new(0);
        let obj = rented_object();
        assert!(pool.give_back(obj).is_some());
        assert_eq!(pool.available(), 0);
    }
}
