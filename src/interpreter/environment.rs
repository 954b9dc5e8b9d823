//! Environment records and the lexical environment chain (ES5 §10.2).

use super::exception::BindingError;
use super::types::ObjectRef;
use crate::types::{JsObject, JsValue};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

const ARGUMENTS: &str = "arguments";

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub value: JsValue,
    pub mutable: bool,
    pub deletable: bool,
}

impl Binding {
    fn is_uninitialized(&self) -> bool {
        !self.mutable && self.value.is_undefined()
    }
}

/// The capability set shared by every environment record variant.
pub trait Bindings {
    fn has_binding(&self, name: &str) -> bool;

    fn create_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        deletable: bool,
    ) -> Result<(), BindingError>;

    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), BindingError>;

    fn get_binding_value(&self, name: &str, strict: bool) -> Result<JsValue, BindingError>;

    fn delete_binding(&mut self, name: &str) -> bool;

    fn implicit_this_value(&self) -> JsValue;

    fn get_all_binding_names(&self) -> Vec<String>;
}

#[derive(Debug, Default)]
pub struct DeclarativeEnvironmentRecord {
    bindings: FxHashMap<String, Binding>,
    order: Vec<String>,
    arguments: Option<Binding>,
}

impl DeclarativeEnvironmentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, name: &str) -> Option<&Binding> {
        if name == ARGUMENTS {
            return self.arguments.as_ref();
        }
        self.bindings.get(name)
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Binding> {
        if name == ARGUMENTS {
            return self.arguments.as_mut();
        }
        self.bindings.get_mut(name)
    }

    fn insert(&mut self, name: &str, binding: Binding) -> Result<(), BindingError> {
        if self.has_binding(name) {
            return Err(BindingError::AlreadyDeclared(name.to_string()));
        }
        if name == ARGUMENTS {
            self.arguments = Some(binding);
        } else {
            self.order.push(name.to_string());
            self.bindings.insert(name.to_string(), binding);
        }
        Ok(())
    }

    pub fn create_immutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
    ) -> Result<(), BindingError> {
        self.insert(
            name,
            Binding {
                value,
                mutable: false,
                deletable: false,
            },
        )
    }

    /// Gives an immutable binding its one real value. A binding that
    /// already holds one keeps it.
    pub fn initialize_immutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
    ) -> Result<(), BindingError> {
        let binding = self
            .lookup_mut(name)
            .ok_or_else(|| BindingError::NotDefined(name.to_string()))?;
        if binding.mutable || !binding.value.is_undefined() {
            return Err(BindingError::Immutable(name.to_string()));
        }
        binding.value = value;
        Ok(())
    }

    pub fn arguments_value(&self) -> Option<&JsValue> {
        self.arguments.as_ref().map(|b| &b.value)
    }

    /// Empties the arguments slot and hands back the object it held.
    pub fn release_arguments(&mut self) -> Option<JsValue> {
        match self.arguments.take() {
            Some(Binding {
                value: value @ JsValue::Object(_),
                ..
            }) => Some(value),
            other => {
                self.arguments = other;
                None
            }
        }
    }
}

impl Bindings for DeclarativeEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        if name == ARGUMENTS {
            return self.arguments.is_some();
        }
        self.bindings.contains_key(name)
    }

    fn create_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        deletable: bool,
    ) -> Result<(), BindingError> {
        self.insert(
            name,
            Binding {
                value,
                mutable: true,
                deletable,
            },
        )
    }

    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), BindingError> {
        let binding = self
            .lookup_mut(name)
            .ok_or_else(|| BindingError::NotDefined(name.to_string()))?;
        if binding.mutable {
            binding.value = value;
        } else if strict {
            return Err(BindingError::Immutable(name.to_string()));
        }
        Ok(())
    }

    fn get_binding_value(&self, name: &str, strict: bool) -> Result<JsValue, BindingError> {
        let binding = self
            .lookup(name)
            .ok_or_else(|| BindingError::NotDefined(name.to_string()))?;
        if binding.is_uninitialized() && strict {
            return Err(BindingError::Uninitialized(name.to_string()));
        }
        Ok(binding.value.clone())
    }

    fn delete_binding(&mut self, name: &str) -> bool {
        match self.lookup(name) {
            None => true,
            Some(b) if !b.deletable => false,
            Some(_) => {
                if name == ARGUMENTS {
                    self.arguments = None;
                } else {
                    self.bindings.remove(name);
                    self.order.retain(|n| n != name);
                }
                true
            }
        }
    }

    fn implicit_this_value(&self) -> JsValue {
        JsValue::Undefined
    }

    fn get_all_binding_names(&self) -> Vec<String> {
        self.order.clone()
    }
}

/// Binds identifiers to the properties of an object: the global object,
/// or the operand of a `with` statement.
pub struct ObjectEnvironmentRecord {
    object: JsObject,
    data: ObjectRef,
    provide_this: bool,
}

impl ObjectEnvironmentRecord {
    pub fn new(object: JsObject, data: ObjectRef, provide_this: bool) -> Self {
        Self {
            object,
            data,
            provide_this,
        }
    }

    pub fn binding_object(&self) -> &ObjectRef {
        &self.data
    }
}

impl Bindings for ObjectEnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        self.data.borrow().has_property(name)
    }

    fn create_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        deletable: bool,
    ) -> Result<(), BindingError> {
        use super::types::PropertyDescriptor;
        let mut data = self.data.borrow_mut();
        if data.has_own_property(name) {
            return Err(BindingError::AlreadyDeclared(name.to_string()));
        }
        if data.define_own_property(
            name.to_string(),
            PropertyDescriptor::data(value, true, true, deletable),
        ) {
            Ok(())
        } else {
            Err(BindingError::ReadOnly(name.to_string()))
        }
    }

    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), BindingError> {
        let accepted = self.data.borrow_mut().put(name, value);
        if !accepted && strict {
            return Err(BindingError::ReadOnly(name.to_string()));
        }
        Ok(())
    }

    fn get_binding_value(&self, name: &str, strict: bool) -> Result<JsValue, BindingError> {
        let data = self.data.borrow();
        if !data.has_property(name) {
            if strict {
                return Err(BindingError::NotDefined(name.to_string()));
            }
            return Ok(JsValue::Undefined);
        }
        Ok(data.get_property(name))
    }

    fn delete_binding(&mut self, name: &str) -> bool {
        self.data.borrow_mut().delete(name)
    }

    fn implicit_this_value(&self) -> JsValue {
        if self.provide_this {
            JsValue::Object(self.object.clone())
        } else {
            JsValue::Undefined
        }
    }

    fn get_all_binding_names(&self) -> Vec<String> {
        self.data.borrow().own_enumerable_keys()
    }
}

pub enum EnvironmentRecord {
    Declarative(DeclarativeEnvironmentRecord),
    Object(ObjectEnvironmentRecord),
}

impl EnvironmentRecord {
    fn as_bindings(&self) -> &dyn Bindings {
        match self {
            EnvironmentRecord::Declarative(r) => r,
            EnvironmentRecord::Object(r) => r,
        }
    }

    fn as_bindings_mut(&mut self) -> &mut dyn Bindings {
        match self {
            EnvironmentRecord::Declarative(r) => r,
            EnvironmentRecord::Object(r) => r,
        }
    }

    pub fn as_declarative_mut(&mut self) -> Option<&mut DeclarativeEnvironmentRecord> {
        match self {
            EnvironmentRecord::Declarative(r) => Some(r),
            EnvironmentRecord::Object(_) => None,
        }
    }

    pub fn as_declarative(&self) -> Option<&DeclarativeEnvironmentRecord> {
        match self {
            EnvironmentRecord::Declarative(r) => Some(r),
            EnvironmentRecord::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectEnvironmentRecord> {
        match self {
            EnvironmentRecord::Object(r) => Some(r),
            EnvironmentRecord::Declarative(_) => None,
        }
    }
}

impl Bindings for EnvironmentRecord {
    fn has_binding(&self, name: &str) -> bool {
        self.as_bindings().has_binding(name)
    }

    fn create_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        deletable: bool,
    ) -> Result<(), BindingError> {
        self.as_bindings_mut()
            .create_mutable_binding(name, value, deletable)
    }

    fn set_mutable_binding(
        &mut self,
        name: &str,
        value: JsValue,
        strict: bool,
    ) -> Result<(), BindingError> {
        self.as_bindings_mut().set_mutable_binding(name, value, strict)
    }

    fn get_binding_value(&self, name: &str, strict: bool) -> Result<JsValue, BindingError> {
        self.as_bindings().get_binding_value(name, strict)
    }

    fn delete_binding(&mut self, name: &str) -> bool {
        self.as_bindings_mut().delete_binding(name)
    }

    fn implicit_this_value(&self) -> JsValue {
        self.as_bindings().implicit_this_value()
    }

    fn get_all_binding_names(&self) -> Vec<String> {
        self.as_bindings().get_all_binding_names()
    }
}

pub type EnvRef = Rc<LexicalEnvironment>;

/// A record plus a fixed link to the enclosing environment. Only the
/// record's bindings change after creation.
pub struct LexicalEnvironment {
    pub record: RefCell<EnvironmentRecord>,
    pub outer: Option<EnvRef>,
}

impl LexicalEnvironment {
    pub fn new_declarative(outer: Option<EnvRef>) -> EnvRef {
        Rc::new(LexicalEnvironment {
            record: RefCell::new(EnvironmentRecord::Declarative(
                DeclarativeEnvironmentRecord::new(),
            )),
            outer,
        })
    }

    pub fn new_object(
        object: JsObject,
        data: ObjectRef,
        provide_this: bool,
        outer: Option<EnvRef>,
    ) -> EnvRef {
        Rc::new(LexicalEnvironment {
            record: RefCell::new(EnvironmentRecord::Object(ObjectEnvironmentRecord::new(
                object,
                data,
                provide_this,
            ))),
            outer,
        })
    }

    /// GetIdentifierReference (§10.2.2.1): the nearest environment whose
    /// record binds `name`.
    pub fn resolve(env: &EnvRef, name: &str) -> Option<EnvRef> {
        let mut current = Some(env.clone());
        while let Some(e) = current {
            if e.record.borrow().has_binding(name) {
                return Some(e);
            }
            current = e.outer.clone();
        }
        None
    }

    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.outer.clone();
        while let Some(e) = current {
            depth += 1;
            current = e.outer.clone();
        }
        depth
    }
}

impl fmt::Debug for LexicalEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record.borrow();
        let kind = match &*record {
            EnvironmentRecord::Declarative(_) => "declarative",
            EnvironmentRecord::Object(_) => "object",
        };
        f.debug_struct("LexicalEnvironment")
            .field("kind", &kind)
            .field("bindings", &record.get_all_binding_names())
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::types::JsObjectData;

    fn num(n: f64) -> JsValue {
        JsValue::Number(n)
    }

    #[test]
    fn mutable_binding_round_trip() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_mutable_binding("x", num(1.0), false).unwrap();
        assert_eq!(rec.get_binding_value("x", true).unwrap(), num(1.0));
        rec.set_mutable_binding("x", num(2.0), true).unwrap();
        assert_eq!(rec.get_binding_value("x", false).unwrap(), num(2.0));
    }

    #[test]
    fn duplicate_create_fails() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_mutable_binding("x", JsValue::Undefined, false).unwrap();
        assert_eq!(
            rec.create_mutable_binding("x", JsValue::Undefined, false),
            Err(BindingError::AlreadyDeclared("x".into()))
        );
    }

    #[test]
    fn immutable_write_is_asymmetric() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_immutable_binding("k", num(1.0)).unwrap();
        assert_eq!(
            rec.set_mutable_binding("k", num(2.0), true),
            Err(BindingError::Immutable("k".into()))
        );
        rec.set_mutable_binding("k", num(3.0), false).unwrap();
        assert_eq!(rec.get_binding_value("k", true).unwrap(), num(1.0));
    }

    #[test]
    fn uninitialized_immutable_read() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_immutable_binding("k", JsValue::Undefined).unwrap();
        assert_eq!(rec.get_binding_value("k", false).unwrap(), JsValue::Undefined);
        assert_eq!(
            rec.get_binding_value("k", true),
            Err(BindingError::Uninitialized("k".into()))
        );
        rec.initialize_immutable_binding("k", num(7.0)).unwrap();
        assert_eq!(rec.get_binding_value("k", true).unwrap(), num(7.0));
        assert!(rec.initialize_immutable_binding("k", num(8.0)).is_err());
    }

    #[test]
    fn delete_semantics() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_mutable_binding("fixed", num(1.0), false).unwrap();
        rec.create_mutable_binding("loose", num(2.0), true).unwrap();
        assert!(!rec.delete_binding("fixed"));
        assert_eq!(rec.get_binding_value("fixed", true).unwrap(), num(1.0));
        assert!(rec.delete_binding("loose"));
        assert!(!rec.has_binding("loose"));
        assert!(rec.delete_binding("absent"));
        assert_eq!(rec.get_all_binding_names(), vec!["fixed".to_string()]);
    }

    #[test]
    fn arguments_slot_is_separate() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        assert!(!rec.has_binding("arguments"));
        rec.create_mutable_binding("a", num(1.0), false).unwrap();
        rec.create_mutable_binding("arguments", num(9.0), false).unwrap();
        assert!(rec.has_binding("arguments"));
        assert_eq!(rec.get_all_binding_names(), vec!["a".to_string()]);
        assert_eq!(rec.get_binding_value("arguments", true).unwrap(), num(9.0));
        // Primitive values in the slot are not pooled instances
        assert_eq!(rec.release_arguments(), None);
        assert!(rec.has_binding("arguments"));
    }

    #[test]
    fn release_arguments_empties_slot() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        let obj = JsValue::Object(JsObject { id: 3 });
        rec.create_immutable_binding("arguments", obj.clone()).unwrap();
        assert_eq!(rec.release_arguments(), Some(obj));
        assert!(!rec.has_binding("arguments"));
    }

    #[test]
    fn implicit_this_is_undefined() {
        let rec = DeclarativeEnvironmentRecord::new();
        assert_eq!(rec.implicit_this_value(), JsValue::Undefined);
    }

    fn object_record(provide_this: bool) -> ObjectEnvironmentRecord {
        let data = Rc::new(RefCell::new(JsObjectData::new()));
        data.borrow_mut().id = Some(5);
        ObjectEnvironmentRecord::new(JsObject { id: 5 }, data, provide_this)
    }

    #[test]
    fn object_record_reads_properties() {
        let mut rec = object_record(false);
        rec.create_mutable_binding("g", num(1.0), false).unwrap();
        assert!(rec.has_binding("g"));
        assert!(!rec.delete_binding("g"));
        assert_eq!(rec.get_binding_value("missing", false).unwrap(), JsValue::Undefined);
        assert_eq!(
            rec.get_binding_value("missing", true),
            Err(BindingError::NotDefined("missing".into()))
        );
        assert_eq!(rec.implicit_this_value(), JsValue::Undefined);
    }

    #[test]
    fn object_record_read_only_property() {
        use crate::interpreter::types::PropertyDescriptor;
        let mut rec = object_record(true);
        rec.binding_object().borrow_mut().insert_property(
            "NaN".into(),
            PropertyDescriptor::data(num(f64::NAN), false, false, false),
        );
        assert!(rec.set_mutable_binding("NaN", num(1.0), false).is_ok());
        assert_eq!(
            rec.set_mutable_binding("NaN", num(1.0), true),
            Err(BindingError::ReadOnly("NaN".into()))
        );
        assert_eq!(rec.implicit_this_value(), JsValue::Object(JsObject { id: 5 }));
    }

    #[test]
    fn resolve_walks_outward() {
        let outer = LexicalEnvironment::new_declarative(None);
        outer
            .record
            .borrow_mut()
            .create_mutable_binding("x", num(1.0), false)
            .unwrap();
        let inner = LexicalEnvironment::new_declarative(Some(outer.clone()));
        let found = LexicalEnvironment::resolve(&inner, "x").unwrap();
        assert!(Rc::ptr_eq(&found, &outer));
        assert!(LexicalEnvironment::resolve(&inner, "y").is_none());
        assert_eq!(inner.depth(), 2);
    }
}
