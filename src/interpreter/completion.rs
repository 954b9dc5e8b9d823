//! Completion values (ES5 §8.9) and the pool their records are rented from.

use crate::types::JsValue;
use tracing::trace;

/// The result of executing a statement. `Break` and `Continue` carry the
/// target label and the value produced so far.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    Normal(Option<JsValue>),
    Return(JsValue),
    Throw(JsValue),
    Break(Option<String>, Option<JsValue>),
    Continue(Option<String>, Option<JsValue>),
}

impl Completion {
    pub fn empty() -> Self {
        Completion::Normal(None)
    }

    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    pub fn completion_type(&self) -> CompletionType {
        match self {
            Completion::Normal(_) => CompletionType::Normal,
            Completion::Return(_) => CompletionType::Return,
            Completion::Throw(_) => CompletionType::Throw,
            Completion::Break(..) => CompletionType::Break,
            Completion::Continue(..) => CompletionType::Continue,
        }
    }

    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Completion::Normal(v) | Completion::Break(_, v) | Completion::Continue(_, v) => {
                v.as_ref()
            }
            Completion::Return(v) | Completion::Throw(v) => Some(v),
        }
    }

    /// Fills an empty value slot with `value` (§12.1 step 3 and friends).
    pub fn update_empty(self, value: Option<JsValue>) -> Self {
        match self {
            Completion::Normal(None) => Completion::Normal(value),
            Completion::Break(label, None) => Completion::Break(label, value),
            Completion::Continue(label, None) => Completion::Continue(label, value),
            other => other,
        }
    }
}

impl From<JsValue> for Completion {
    fn from(value: JsValue) -> Self {
        Completion::Normal(Some(value))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CompletionType {
    #[default]
    Normal,
    Return,
    Throw,
    Break,
    Continue,
}

/// A completion handed across the host boundary. Records that came out of
/// a [`CompletionPool`] go back into it once their value has been read.
#[derive(Debug, Default)]
pub struct CompletionRecord {
    pub completion_type: CompletionType,
    pub value: Option<JsValue>,
    pub target: Option<String>,
    pooled: bool,
}

impl CompletionRecord {
    pub fn new(completion: Completion) -> Self {
        let mut record = Self::default();
        record.fill(completion);
        record
    }

    pub fn fill(&mut self, completion: Completion) {
        self.completion_type = completion.completion_type();
        let (value, target) = match completion {
            Completion::Normal(v) => (v, None),
            Completion::Return(v) | Completion::Throw(v) => (Some(v), None),
            Completion::Break(label, v) | Completion::Continue(label, v) => (v, label),
        };
        self.value = value;
        self.target = target;
    }

    pub fn is_pooled(&self) -> bool {
        self.pooled
    }

    pub fn is_throw(&self) -> bool {
        self.completion_type == CompletionType::Throw
    }

    /// Reads the value out, leaving the record empty.
    pub fn take_value(&mut self) -> Option<JsValue> {
        self.value.take()
    }

    fn clear(&mut self) {
        self.completion_type = CompletionType::Normal;
        self.value = None;
        self.target = None;
    }
}

#[derive(Debug)]
pub struct CompletionPool {
    free: Vec<CompletionRecord>,
    capacity: usize,
    rented: usize,
    reused: usize,
}

impl CompletionPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
            rented: 0,
            reused: 0,
        }
    }

    pub fn rent(&mut self) -> CompletionRecord {
        self.rented += 1;
        match self.free.pop() {
            Some(record) => {
                self.reused += 1;
                record
            }
            None => CompletionRecord {
                pooled: true,
                ..CompletionRecord::default()
            },
        }
    }

    /// Takes a record back. Records the pool never handed out are dropped.
    pub fn give_back(&mut self, mut record: CompletionRecord) {
        if !record.pooled {
            return;
        }
        if record.value.is_some() {
            trace!("completion record returned with an unread value");
        }
        record.clear();
        if self.free.len() < self.capacity {
            self.free.push(record);
        }
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn rented(&self) -> usize {
        self.rented
    }

    pub fn reused(&self) -> usize {
        self.reused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_empty_only_fills_missing_values() {
        let one = Some(JsValue::Number(1.0));
        assert_eq!(Completion::empty().update_empty(one.clone()), Completion::Normal(one.clone()));
        assert_eq!(
            Completion::Break(None, None).update_empty(one.clone()),
            Completion::Break(None, one.clone())
        );
        let ret = Completion::Return(JsValue::Null);
        assert_eq!(ret.clone().update_empty(one), ret);
    }

    #[test]
    fn record_captures_target_and_value() {
        let record = CompletionRecord::new(Completion::Continue(
            Some("outer".into()),
            Some(JsValue::Boolean(true)),
        ));
        assert_eq!(record.completion_type, CompletionType::Continue);
        assert_eq!(record.target.as_deref(), Some("outer"));
        assert_eq!(record.value, Some(JsValue::Boolean(true)));
        assert!(!record.is_pooled());
    }

    #[test]
    fn pool_reuses_returned_records() {
        let mut pool = CompletionPool::new(2);
        let mut record = pool.rent();
        record.fill(Completion::Throw(JsValue::Number(3.0)));
        assert!(record.is_throw());
        assert_eq!(record.take_value(), Some(JsValue::Number(3.0)));
        pool.give_back(record);
        assert_eq!(pool.available(), 1);
        let again = pool.rent();
        assert_eq!(again.completion_type, CompletionType::Normal);
        assert!(again.value.is_none());
        assert_eq!(pool.reused(), 1);
    }

    #[test]
    fn foreign_records_are_ignored() {
        let mut pool = CompletionPool::new(2);
        pool.give_back(CompletionRecord::new(Completion::empty()));
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn capacity_bounds_the_free_list() {
        let mut pool = CompletionPool::new(1);
        let a = pool.rent();
        let b = pool.rent();
        pool.give_back(a);
        pool.give_back(b);
        assert_eq!(pool.available(), 1);
    }
}
