use super::environment::{Bindings, EnvRef};
use crate::ast::FunctionNode;
use crate::types::JsValue;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type JsResult<T> = Result<T, JsValue>;

pub type ObjectRef = Rc<RefCell<JsObjectData>>;

pub type NativeFn = Rc<dyn Fn(&mut super::Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue>>;

pub enum JsFunction {
    User {
        node: Rc<FunctionNode>,
        scope: EnvRef,
    },
    Native(String, usize, NativeFn),
}

impl JsFunction {
    pub fn native(
        name: impl Into<String>,
        arity: usize,
        f: impl Fn(&mut super::Interpreter, &JsValue, &[JsValue]) -> JsResult<JsValue> + 'static,
    ) -> Self {
        JsFunction::Native(name.into(), arity, Rc::new(f))
    }

    pub fn name(&self) -> &str {
        match self {
            JsFunction::User { node, .. } => node.name.as_deref().unwrap_or(""),
            JsFunction::Native(name, _, _) => name,
        }
    }
}

impl Clone for JsFunction {
    fn clone(&self) -> Self {
        match self {
            JsFunction::User { node, scope } => JsFunction::User {
                node: node.clone(),
                scope: scope.clone(),
            },
            JsFunction::Native(name, arity, f) => {
                JsFunction::Native(name.clone(), *arity, f.clone())
            }
        }
    }
}

impl std::fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsFunction::User { node, .. } => write!(f, "JsFunction::User({:?})", node.name),
            JsFunction::Native(name, arity, _) => {
                write!(f, "JsFunction::Native({name:?}, {arity})")
            }
        }
    }
}

/// A data property (§8.6.1). Accessor properties are not modelled.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyDescriptor {
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value,
            writable,
            enumerable,
            configurable,
        }
    }

    pub fn data_default(value: JsValue) -> Self {
        Self::data(value, true, true, true)
    }
}

/// Sloppy-mode arguments aliasing (§10.6): index keys mapped onto the formal
/// parameter bindings of the function environment.
#[derive(Clone)]
pub struct ParameterMap {
    pub env: EnvRef,
    pub mapped: FxHashMap<String, String>,
}

impl std::fmt::Debug for ParameterMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterMap").field("mapped", &self.mapped).finish()
    }
}

impl ParameterMap {
    fn get(&self, key: &str) -> Option<JsValue> {
        let param = self.mapped.get(key)?;
        self.env.record.borrow().get_binding_value(param, false).ok()
    }

    fn set(&self, key: &str, value: &JsValue) {
        if let Some(param) = self.mapped.get(key) {
            let _ = self
                .env
                .record
                .borrow_mut()
                .set_mutable_binding(param, value.clone(), false);
        }
    }
}

pub struct JsObjectData {
    pub id: Option<u64>,
    pub properties: FxHashMap<String, PropertyDescriptor>,
    pub property_order: Vec<String>,
    pub prototype: Option<ObjectRef>,
    pub callable: Option<JsFunction>,
    pub class_name: String,
    pub extensible: bool,
    pub parameter_map: Option<ParameterMap>,
    /// Set while the object is on loan from the arguments pool.
    pub rented: bool,
}

impl JsObjectData {
    pub(crate) fn new() -> Self {
        Self {
            id: None,
            properties: FxHashMap::default(),
            property_order: Vec::new(),
            prototype: None,
            callable: None,
            class_name: "Object".to_string(),
            extensible: true,
            parameter_map: None,
            rented: false,
        }
    }

    /// Drops every property and internal slot except the table id.
    pub(crate) fn reset(&mut self) {
        self.properties.clear();
        self.property_order.clear();
        self.prototype = None;
        self.callable = None;
        self.class_name = "Object".to_string();
        self.extensible = true;
        self.parameter_map = None;
        self.rented = false;
    }

    pub fn is_callable(&self) -> bool {
        self.callable.is_some()
    }

    // §8.12.3 [[Get]]
    pub fn get_property(&self, key: &str) -> JsValue {
        if let Some(ref map) = self.parameter_map
            && let Some(val) = map.get(key)
        {
            return val;
        }
        if let Some(desc) = self.properties.get(key) {
            return desc.value.clone();
        }
        if let Some(proto) = &self.prototype {
            return proto.borrow().get_property(key);
        }
        JsValue::Undefined
    }

    pub fn get_own_property(&self, key: &str) -> Option<PropertyDescriptor> {
        let mut desc = self.properties.get(key)?.clone();
        if let Some(ref map) = self.parameter_map
            && let Some(val) = map.get(key)
        {
            desc.value = val;
        }
        Some(desc)
    }

    // §8.12.2 [[GetProperty]]
    pub fn get_property_descriptor(&self, key: &str) -> Option<PropertyDescriptor> {
        if let Some(desc) = self.get_own_property(key) {
            return Some(desc);
        }
        self.prototype
            .as_ref()
            .and_then(|proto| proto.borrow().get_property_descriptor(key))
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    // §8.12.6 [[HasProperty]]
    pub fn has_property(&self, key: &str) -> bool {
        if self.properties.contains_key(key) {
            return true;
        }
        if let Some(proto) = &self.prototype {
            return proto.borrow().has_property(key);
        }
        false
    }

    // §8.12.4 [[CanPut]] restricted to data properties
    pub fn can_put(&self, key: &str) -> bool {
        if let Some(desc) = self.properties.get(key) {
            return desc.writable;
        }
        match self
            .prototype
            .as_ref()
            .and_then(|proto| proto.borrow().get_property_descriptor(key))
        {
            Some(inherited) => self.extensible && inherited.writable,
            None => self.extensible,
        }
    }

    /// §8.12.5 [[Put]]. Returns false when the write was rejected; the caller
    /// decides whether that throws.
    pub fn put(&mut self, key: &str, value: JsValue) -> bool {
        if !self.can_put(key) {
            return false;
        }
        if let Some(ref map) = self.parameter_map {
            map.set(key, &value);
        }
        match self.properties.get_mut(key) {
            Some(desc) => desc.value = value,
            None => self.insert_value(key.to_string(), value),
        }
        true
    }

    /// §8.12.9 [[DefineOwnProperty]] for data descriptors.
    pub fn define_own_property(&mut self, key: String, desc: PropertyDescriptor) -> bool {
        if let Some(current) = self.properties.get(&key) {
            if !current.configurable {
                if desc.configurable || desc.enumerable != current.enumerable {
                    return false;
                }
                if !current.writable
                    && (desc.writable || !crate::interpreter::same_value(&desc.value, &current.value))
                {
                    return false;
                }
            }
        } else if !self.extensible {
            return false;
        }
        if let Some(ref mut map) = self.parameter_map
            && map.mapped.contains_key(&key)
        {
            map.set(&key, &desc.value);
            if !desc.writable {
                map.mapped.remove(&key);
            }
        }
        self.insert_property(key, desc);
        true
    }

    // §8.12.7 [[Delete]]
    pub fn delete(&mut self, key: &str) -> bool {
        match self.properties.get(key) {
            None => true,
            Some(desc) if !desc.configurable => false,
            Some(_) => {
                self.properties.remove(key);
                self.property_order.retain(|k| k != key);
                if let Some(ref mut map) = self.parameter_map {
                    map.mapped.remove(key);
                }
                true
            }
        }
    }

    pub fn own_enumerable_keys(&self) -> Vec<String> {
        self.property_order
            .iter()
            .filter(|k| self.properties.get(*k).is_some_and(|d| d.enumerable))
            .cloned()
            .collect()
    }

    pub fn enumerable_keys_with_proto(&self) -> Vec<String> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut keys = Vec::new();
        // Own properties shadow inherited ones, enumerable or not
        for k in &self.property_order {
            if seen.insert(k.clone()) && self.properties.get(k).is_some_and(|d| d.enumerable) {
                keys.push(k.clone());
            }
        }
        if let Some(ref proto) = self.prototype {
            for k in proto.borrow().enumerable_keys_with_proto() {
                if seen.insert(k.clone()) {
                    keys.push(k);
                }
            }
        }
        keys
    }

    pub fn insert_value(&mut self, key: String, value: JsValue) {
        self.insert_property(key, PropertyDescriptor::data_default(value));
    }

    pub fn insert_builtin(&mut self, key: String, value: JsValue) {
        self.insert_property(key, PropertyDescriptor::data(value, true, false, true));
    }

    pub fn insert_property(&mut self, key: String, desc: PropertyDescriptor) {
        if !self.properties.contains_key(&key) {
            self.property_order.push(key.clone());
        }
        self.properties.insert(key, desc);
    }

    pub fn get_property_value(&self, key: &str) -> Option<JsValue> {
        self.properties.get(key).map(|d| d.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_with_proto(proto: Option<ObjectRef>) -> JsObjectData {
        let mut o = JsObjectData::new();
        o.prototype = proto;
        o
    }

    #[test]
    fn get_walks_prototype_chain() {
        let proto = Rc::new(RefCell::new(JsObjectData::new()));
        proto.borrow_mut().insert_value("inherited".into(), JsValue::Number(1.0));
        let obj = object_with_proto(Some(proto));
        assert!(obj.has_property("inherited"));
        assert!(!obj.has_own_property("inherited"));
        assert!(matches!(obj.get_property("inherited"), JsValue::Number(n) if n == 1.0));
        assert!(obj.get_property("missing").is_undefined());
    }

    #[test]
    fn put_respects_read_only_properties() {
        let proto = Rc::new(RefCell::new(JsObjectData::new()));
        proto.borrow_mut().insert_property(
            "ro".into(),
            PropertyDescriptor::data(JsValue::Number(1.0), false, true, true),
        );
        let mut obj = object_with_proto(Some(proto));
        assert!(!obj.put("ro", JsValue::Number(2.0)));
        assert!(!obj.has_own_property("ro"));
        assert!(obj.put("rw", JsValue::Number(3.0)));
        assert_eq!(obj.own_enumerable_keys(), vec!["rw".to_string()]);
    }

    #[test]
    fn delete_honours_configurable() {
        let mut obj = JsObjectData::new();
        obj.insert_property(
            "fixed".into(),
            PropertyDescriptor::data(JsValue::Null, true, true, false),
        );
        obj.insert_value("loose".into(), JsValue::Null);
        assert!(!obj.delete("fixed"));
        assert!(obj.delete("loose"));
        assert!(obj.delete("never-there"));
        assert_eq!(obj.property_order, vec!["fixed".to_string()]);
    }

    #[test]
    fn define_rejects_changes_to_frozen_property() {
        let mut obj = JsObjectData::new();
        obj.insert_property(
            "k".into(),
            PropertyDescriptor::data(JsValue::Number(1.0), false, false, false),
        );
        assert!(!obj.define_own_property(
            "k".into(),
            PropertyDescriptor::data(JsValue::Number(2.0), false, false, false)
        ));
        assert!(obj.define_own_property(
            "k".into(),
            PropertyDescriptor::data(JsValue::Number(1.0), false, false, false)
        ));
    }

    #[test]
    fn non_extensible_rejects_new_properties() {
        let mut obj = JsObjectData::new();
        obj.extensible = false;
        assert!(!obj.put("x", JsValue::Null));
        assert!(!obj.define_own_property("x".into(), PropertyDescriptor::data_default(JsValue::Null)));
    }

    #[test]
    fn enumeration_skips_shadowed_and_hidden_keys() {
        let proto = Rc::new(RefCell::new(JsObjectData::new()));
        proto.borrow_mut().insert_value("a".into(), JsValue::Null);
        proto.borrow_mut().insert_value("b".into(), JsValue::Null);
        let mut obj = object_with_proto(Some(proto));
        obj.insert_builtin("a".into(), JsValue::Null);
        obj.insert_value("c".into(), JsValue::Null);
        assert_eq!(obj.enumerable_keys_with_proto(), vec!["c".to_string(), "b".to_string()]);
    }
}
