//! Identifier providers for new notes.
//!
//! The only contract is uniqueness for the lifetime of a store. [`UuidIds`]
//! is the default; [`SequentialIds`] yields `n1`, `n2`, ... and is meant for
//! fixtures and tests.

use crate::model::NoteId;
use uuid::Uuid;

pub trait IdGenerator: Send {
    fn generate_id(&mut self) -> NoteId;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn generate_id(&mut self) -> NoteId {
        NoteId::new(Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("n")
    }
}

impl IdGenerator for SequentialIds {
    fn generate_id(&mut self) -> NoteId {
        let id = NoteId::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}
