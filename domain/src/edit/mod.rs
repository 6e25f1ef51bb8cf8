//! Edit domain: exact-string substitution with uniqueness checks and
//! all-or-nothing chains.

pub mod engine;

pub use engine::{
    ChainError, EditChain, EditError, EditOperation, Replacement, StepOutcome, ValidatedEdits,
    apply_edit, numbered_snippet,
};
