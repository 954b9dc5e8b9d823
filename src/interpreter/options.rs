/// Per-engine configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Treat global code as strict even without a `"use strict"` directive.
    pub strict: bool,
    /// Nested calls beyond this depth throw a RangeError.
    pub max_call_depth: usize,
    pub arguments_pool_capacity: usize,
    pub completion_pool_capacity: usize,
}

impl EngineOptions {
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;
    pub const DEFAULT_POOL_CAPACITY: usize = 32;
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
            arguments_pool_capacity: Self::DEFAULT_POOL_CAPACITY,
            completion_pool_capacity: Self::DEFAULT_POOL_CAPACITY,
        }
    }
}
