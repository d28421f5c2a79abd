use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// History of segment start offsets, in seconds
///
/// Only the tail is ever mutated. An empty stack reads as position 0,
/// and popping an empty stack returns 0 rather than failing; use
/// [`PositionStack::is_empty`] to detect emptiness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionStack {
    marks: Vec<f64>,
}

impl PositionStack {
    pub fn new() -> Self {
        Self { marks: Vec::new() }
    }

    /// Restore a stack from a saved sequence (bottom first)
    pub fn from_positions(marks: Vec<f64>) -> Self {
        Self { marks }
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Top of the stack, or 0 when empty
    pub fn current_position(&self) -> f64 {
        self.marks.last().copied().unwrap_or(0.0)
    }

    pub fn push(&mut self, pos: f64) {
        self.marks.push(pos);
    }

    /// Remove and return the top, or 0 when empty
    pub fn pop(&mut self) -> f64 {
        self.marks.pop().unwrap_or(0.0)
    }

    pub fn positions(&self) -> &[f64] {
        &self.marks
    }

    /// Serialize as a JSON array of numbers
    pub fn serialize(&self) -> String {
        // A Vec<f64> always serializes; non-finite values become null
        serde_json::to_string(&self.marks).unwrap_or_else(|_| "[]".to_string())
    }

    /// Replace the whole stack from a JSON array
    ///
    /// On error the current contents are left untouched.
    pub fn deserialize(&mut self, text: &str) -> serde_json::Result<()> {
        let marks: Vec<f64> = serde_json::from_str(text)?;
        self.marks = marks;
        Ok(())
    }
}

/// Shared handle to the position stack
///
/// The segment player and the autosave coordinator both hold one of these,
/// so a transcript load that replaces the marks is seen by both.
#[derive(Debug, Clone, Default)]
pub struct SharedMarks {
    inner: Arc<Mutex<PositionStack>>,
}

impl SharedMarks {
    pub fn new(stack: PositionStack) -> Self {
        Self {
            inner: Arc::new(Mutex::new(stack)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PositionStack> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn current_position(&self) -> f64 {
        self.lock().current_position()
    }

    pub fn push(&self, pos: f64) {
        self.lock().push(pos);
    }

    pub fn pop(&self) -> f64 {
        self.lock().pop()
    }

    pub fn serialize(&self) -> String {
        self.lock().serialize()
    }

    /// Swap in a new stack wholesale
    pub fn replace(&self, stack: PositionStack) {
        *self.lock() = stack;
    }

    pub fn snapshot(&self) -> PositionStack {
        self.lock().clone()
    }

    /// Run `f` with exclusive access, for read-modify-write sequences
    pub fn with<R>(&self, f: impl FnOnce(&mut PositionStack) -> R) -> R {
        f(&mut self.lock())
    }
}
