//! The execution context stack (ES5 §10.3).

use super::Interpreter;
use super::environment::EnvRef;
use super::exception::CallFrame;
use crate::types::JsValue;
use std::ops::{Deref, DerefMut};
use tracing::trace;

#[derive(Clone, Debug)]
pub struct ExecutionContext {
    pub lexical_environment: EnvRef,
    pub variable_environment: EnvRef,
    pub this_binding: JsValue,
    pub strict: bool,
}

impl ExecutionContext {
    pub fn new(env: EnvRef, this_binding: JsValue, strict: bool) -> Self {
        Self {
            lexical_environment: env.clone(),
            variable_environment: env,
            this_binding,
            strict,
        }
    }
}

impl Interpreter {
    pub(crate) fn running_context(&self) -> &ExecutionContext {
        // The global context sits at the bottom and is never popped
        self.contexts.last().unwrap_or(&self.global_context)
    }

    fn running_context_mut(&mut self) -> &mut ExecutionContext {
        match self.contexts.last_mut() {
            Some(ctx) => ctx,
            None => &mut self.global_context,
        }
    }

    pub(crate) fn lexical_environment(&self) -> EnvRef {
        self.running_context().lexical_environment.clone()
    }

    pub(crate) fn variable_environment(&self) -> EnvRef {
        self.running_context().variable_environment.clone()
    }

    pub(crate) fn this_binding(&self) -> JsValue {
        self.running_context().this_binding.clone()
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.running_context().strict
    }

    /// The context indirect eval runs in. Built from the global
    /// environment itself, since `with` and `catch` in global code swap the
    /// lexical environment of the bottom context.
    pub(crate) fn global_execution_context(&self) -> ExecutionContext {
        ExecutionContext::new(
            self.global_env.clone(),
            JsValue::Object(self.global_object_handle()),
            false,
        )
    }

    /// Number of contexts above the global one.
    pub fn context_depth(&self) -> usize {
        self.contexts.len()
    }

    fn push_context(&mut self, ctx: ExecutionContext) {
        self.contexts.push(ctx);
        trace!(depth = self.contexts.len(), "push execution context");
    }

    fn pop_context(&mut self) {
        self.contexts.pop();
        trace!(depth = self.contexts.len(), "pop execution context");
    }

    /// Runs `f` with `env` as the running context's lexical environment,
    /// as `with` and `catch` do (§12.10, §12.14).
    pub(crate) fn with_lexical_environment<T>(
        &mut self,
        env: EnvRef,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let prev = std::mem::replace(&mut self.running_context_mut().lexical_environment, env);
        let result = f(self);
        self.running_context_mut().lexical_environment = prev;
        result
    }
}

/// Borrows the interpreter for the extent of one call or eval. Everything
/// pushed through the scope is popped when it drops, on every exit path.
pub(crate) struct ContextScope<'a> {
    interp: &'a mut Interpreter,
    contexts: usize,
    frames: usize,
}

impl<'a> ContextScope<'a> {
    pub(crate) fn new(interp: &'a mut Interpreter) -> Self {
        Self {
            interp,
            contexts: 0,
            frames: 0,
        }
    }

    pub(crate) fn push(&mut self, ctx: ExecutionContext) {
        self.interp.push_context(ctx);
        self.contexts += 1;
    }

    pub(crate) fn push_frame(&mut self, frame: CallFrame) {
        self.interp.call_stack.push(frame);
        self.frames += 1;
    }
}

impl Deref for ContextScope<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Interpreter {
        self.interp
    }
}

impl DerefMut for ContextScope<'_> {
    fn deref_mut(&mut self) -> &mut Interpreter {
        self.interp
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        for _ in 0..self.contexts {
            self.interp.pop_context();
        }
        for _ in 0..self.frames {
            self.interp.call_stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::environment::LexicalEnvironment;

    #[test]
    fn scope_pops_everything_it_pushed() {
        let mut interp = Interpreter::new();
        let env = LexicalEnvironment::new_declarative(Some(interp.lexical_environment()));
        {
            let mut scope = ContextScope::new(&mut interp);
            scope.push(ExecutionContext::new(env.clone(), JsValue::Null, true));
            scope.push(ExecutionContext::new(env.clone(), JsValue::Null, false));
            scope.push_frame(CallFrame {
                function_name: "f".into(),
            });
            assert_eq!(scope.context_depth(), 2);
            assert!(!scope.is_strict());
            assert_eq!(scope.call_stack().len(), 1);
        }
        assert_eq!(interp.context_depth(), 0);
        assert!(interp.call_stack().is_empty());
        assert!(interp.this_binding().is_object());
    }

    #[test]
    fn lexical_environment_is_restored() {
        let mut interp = Interpreter::new();
        let global = interp.lexical_environment();
        let inner = LexicalEnvironment::new_declarative(Some(global.clone()));
        let seen = interp.with_lexical_environment(inner.clone(), |i| i.lexical_environment());
        assert!(std::rc::Rc::ptr_eq(&seen, &inner));
        assert!(std::rc::Rc::ptr_eq(&interp.lexical_environment(), &global));
    }
}
