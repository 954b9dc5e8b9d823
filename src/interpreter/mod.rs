use crate::ast::*;
use crate::parser;
use crate::types::{JsObject, JsString, JsValue, number_ops};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

mod types;
pub use types::*;

mod environment;
pub use environment::{
    Binding, Bindings, DeclarativeEnvironmentRecord, EnvRef, EnvironmentRecord,
    LexicalEnvironment, ObjectEnvironmentRecord,
};

mod completion;
pub use completion::{Completion, CompletionPool, CompletionRecord, CompletionType};

mod exception;
pub use exception::{BindingError, CallFrame, EngineError, ErrorKind, JavaScriptException};

mod options;
pub use options::EngineOptions;

mod context;
pub use context::ExecutionContext;
use context::ContextScope;

mod arguments;
pub use arguments::ArgumentsPool;

mod helpers;
pub(crate) use helpers::*;

mod builtins;
mod call;
mod declaration;
mod eval;
mod eval_function;
mod exec;

use declaration::DeclarationKind;

/// Counters for one of the engine's object pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub available: usize,
    pub created: usize,
    pub reused: usize,
}

pub struct Interpreter {
    options: EngineOptions,
    global_env: EnvRef,
    global_object: ObjectRef,
    global_context: ExecutionContext,
    objects: Vec<Option<ObjectRef>>,
    free_slots: Vec<usize>,
    object_prototype: Option<ObjectRef>,
    function_prototype: Option<ObjectRef>,
    error_prototypes: FxHashMap<ErrorKind, ObjectRef>,
    eval_function_id: Option<u64>,
    contexts: Vec<ExecutionContext>,
    call_stack: Vec<CallFrame>,
    thrown_call_stack: Option<Vec<CallFrame>>,
    arguments_pool: ArgumentsPool,
    completion_pool: CompletionPool,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        // The three intrinsics everything else links to take the first slots
        let object_prototype = Rc::new(RefCell::new(JsObjectData::new()));
        let function_prototype = Rc::new(RefCell::new(JsObjectData::new()));
        let global_object = Rc::new(RefCell::new(JsObjectData::new()));
        for (id, obj) in [&object_prototype, &function_prototype, &global_object]
            .into_iter()
            .enumerate()
        {
            obj.borrow_mut().id = Some(id as u64);
        }
        {
            let mut fp = function_prototype.borrow_mut();
            fp.prototype = Some(object_prototype.clone());
            fp.class_name = "Function".to_string();
            fp.callable = Some(JsFunction::native("", 0, |_, _, _| Ok(JsValue::Undefined)));
        }
        {
            let mut g = global_object.borrow_mut();
            g.prototype = Some(object_prototype.clone());
            g.class_name = "global".to_string();
        }

        let global_handle = JsObject { id: 2 };
        let global_env =
            LexicalEnvironment::new_object(global_handle, global_object.clone(), false, None);
        let global_context =
            ExecutionContext::new(global_env.clone(), JsValue::Object(global_handle), false);

        let mut interp = Self {
            global_env,
            global_object: global_object.clone(),
            global_context,
            objects: vec![
                Some(object_prototype.clone()),
                Some(function_prototype.clone()),
                Some(global_object),
            ],
            free_slots: Vec::new(),
            object_prototype: Some(object_prototype),
            function_prototype: Some(function_prototype),
            error_prototypes: FxHashMap::default(),
            eval_function_id: None,
            contexts: Vec::new(),
            call_stack: Vec::new(),
            thrown_call_stack: None,
            arguments_pool: ArgumentsPool::new(options.arguments_pool_capacity),
            completion_pool: CompletionPool::new(options.completion_pool_capacity),
            options,
        };
        interp.setup_globals();
        interp
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub(crate) fn allocate_object_slot(&mut self, obj: ObjectRef) -> u64 {
        let id = match self.free_slots.pop() {
            Some(idx) => {
                self.objects[idx] = Some(obj.clone());
                idx as u64
            }
            None => {
                self.objects.push(Some(obj.clone()));
                (self.objects.len() - 1) as u64
            }
        };
        obj.borrow_mut().id = Some(id);
        id
    }

    /// Drops the table's reference to an object that nothing can reach any
    /// more. The slot is handed out again by the next allocation.
    pub(crate) fn free_object_slot(&mut self, id: u64) {
        let idx = id as usize;
        if let Some(slot) = self.objects.get_mut(idx)
            && slot.take().is_some()
        {
            self.free_slots.push(idx);
        }
    }

    pub(crate) fn get_object(&self, id: u64) -> Option<ObjectRef> {
        self.objects.get(id as usize).and_then(|slot| slot.clone())
    }

    pub(crate) fn create_object(&mut self) -> ObjectRef {
        let mut data = JsObjectData::new();
        data.prototype = self.object_prototype.clone();
        let obj = Rc::new(RefCell::new(data));
        self.allocate_object_slot(obj.clone());
        obj
    }

    // §13.2 Creating Function Objects
    pub(crate) fn create_function(&mut self, func: JsFunction) -> JsValue {
        let (fn_name, fn_length) = match &func {
            JsFunction::User { node, .. } => {
                (node.name.clone().unwrap_or_default(), node.params.len())
            }
            JsFunction::Native(name, arity, _) => (name.clone(), *arity),
        };
        let is_user = matches!(func, JsFunction::User { .. });
        let mut obj_data = JsObjectData::new();
        obj_data.prototype = self.function_prototype.clone();
        obj_data.callable = Some(func);
        obj_data.class_name = "Function".to_string();
        obj_data.insert_property(
            "length".to_string(),
            PropertyDescriptor::data(JsValue::Number(fn_length as f64), false, false, false),
        );
        obj_data.insert_property(
            "name".to_string(),
            PropertyDescriptor::data(JsValue::string(&fn_name), false, false, true),
        );
        let obj = Rc::new(RefCell::new(obj_data));
        let func_id = self.allocate_object_slot(obj.clone());
        let func_val = JsValue::Object(JsObject { id: func_id });
        // Only user functions can be constructors
        if is_user {
            let proto = self.create_object();
            proto
                .borrow_mut()
                .insert_builtin("constructor".to_string(), func_val.clone());
            let proto_id = proto.borrow().id.unwrap_or_default();
            obj.borrow_mut().insert_property(
                "prototype".to_string(),
                PropertyDescriptor::data(JsValue::Object(JsObject { id: proto_id }), true, false, false),
            );
        }
        func_val
    }

    pub(crate) fn global_object_handle(&self) -> JsObject {
        JsObject {
            id: self.global_object.borrow().id.unwrap_or_default(),
        }
    }

    /// Frames of the functions currently executing, outermost first.
    pub fn call_stack(&self) -> &[CallFrame] {
        &self.call_stack
    }

    /// Parses and runs `source` as global code (§10.4.1).
    pub fn run_source(&mut self, source: &str) -> Result<JsValue, EngineError> {
        let program = parser::parse_script(source, self.options.strict)?;
        let mut record = self.execute_program(&program);
        let thrown = record.is_throw();
        let value = record.take_value().unwrap_or_default();
        self.release_completion(record);
        if thrown {
            return Err(self.take_exception(value).into());
        }
        Ok(value)
    }

    /// Runs an already parsed program and hands its completion to the host
    /// in a pooled record. Pass the record to [`Self::release_completion`]
    /// once it has been read.
    pub fn execute_program(&mut self, program: &Program) -> CompletionRecord {
        self.thrown_call_stack = None;
        let strict = program.strict || self.options.strict;
        debug!(strict, statements = program.body.len(), "run global code");

        let mut scope = ContextScope::new(self);
        if strict {
            let ctx = ExecutionContext {
                strict: true,
                ..scope.global_context.clone()
            };
            scope.push(ctx);
        }
        let global_env = scope.global_env.clone();
        let completion = match scope.instantiate_declarations(
            &global_env,
            DeclarationKind::Global,
            &program.hoisting,
            strict,
            None,
        ) {
            Ok(_) => scope.exec_statements(&program.body),
            Err(e) => Completion::Throw(e),
        };
        let mut record = scope.completion_pool.rent();
        record.fill(completion);
        record
    }

    pub fn release_completion(&mut self, record: CompletionRecord) {
        self.completion_pool.give_back(record);
    }

    pub fn format_value(&self, val: &JsValue) -> String {
        if let JsValue::Object(o) = val
            && let Some(obj) = self.get_object(o.id)
        {
            let obj = obj.borrow();
            if obj.is_callable() {
                let name = obj.get_property("name");
                return format!("function {name}() {{ [code] }}");
            }
            if obj.class_name == "Error" {
                let name = obj.get_property("name");
                let message = obj.get_property("message");
                return match (name, message) {
                    (JsValue::String(n), JsValue::String(m)) if m.is_empty() => n.to_rust_string(),
                    (JsValue::String(n), JsValue::String(m)) if n.is_empty() => m.to_rust_string(),
                    (JsValue::String(n), JsValue::String(m)) => {
                        format!("{}: {}", n.to_rust_string(), m.to_rust_string())
                    }
                    (name, _) => format!("{name}"),
                };
            }
            return format!("[object {}]", obj.class_name);
        }
        format!("{val}")
    }

    /// Enumerable names bound in the global environment, in creation order.
    pub fn global_binding_names(&self) -> Vec<String> {
        self.global_env.record.borrow().get_all_binding_names()
    }

    pub fn completion_pool_stats(&self) -> PoolStats {
        PoolStats {
            available: self.completion_pool.available(),
            created: self.completion_pool.rented() - self.completion_pool.reused(),
            reused: self.completion_pool.reused(),
        }
    }

    pub fn arguments_pool_stats(&self) -> PoolStats {
        PoolStats {
            available: self.arguments_pool.available(),
            created: self.arguments_pool.created(),
            reused: self.arguments_pool.reused(),
        }
    }
}
