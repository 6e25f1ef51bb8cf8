//! Pure string-substitution engine behind Edit and MultiEdit.
//!
//! A chain of edits is checked in two phases. [`EditChain::validate`] runs
//! every step against an immutable copy; each step produces a fresh string
//! and the previous one is dropped. Only a fully feasible chain yields a
//! [`ValidatedEdits`], whose [`ValidatedEdits::apply`] hands back the final
//! content for the caller's single write.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One requested substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOperation {
    pub old_string: String,
    pub new_string: String,
    #[serde(default)]
    pub replace_all: bool,
}

impl EditOperation {
    pub fn new(old_string: impl Into<String>, new_string: impl Into<String>) -> Self {
        Self {
            old_string: old_string.into(),
            new_string: new_string.into(),
            replace_all: false,
        }
    }

    pub fn replace_all(mut self) -> Self {
        self.replace_all = true;
        self
    }

    fn is_create(&self) -> bool {
        self.old_string.is_empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("No edits provided")]
    NoEdits,

    #[error("old_string and new_string must be different")]
    IdenticalStrings,

    #[error("old_string must not be empty")]
    EmptyOldString,

    #[error("old_string not found in file")]
    NotFound,

    #[error("old_string found {count} times. Use replace_all=true or make old_string unique")]
    Ambiguous { count: usize },

    #[error("an empty old_string creates a new file and is only allowed in the first edit")]
    CreateNotFirst,

    #[error("cannot create file: it already exists and is not empty")]
    FileExists,

    #[error("file does not exist; use an empty old_string in the first edit to create it")]
    MissingFile,
}

/// Failure of one step inside a chain (1-based index).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("In edit {step}, {error}")]
pub struct ChainError {
    pub step: usize,
    pub error: EditError,
}

/// Result of a single substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub content: String,
    /// Number of occurrences replaced
    pub count: usize,
    /// Byte offset of the first replaced occurrence
    pub first_offset: usize,
}

impl Replacement {
    /// Zero-based line index of the first change.
    pub fn first_changed_line(&self) -> usize {
        self.content[..self.first_offset].matches('\n').count()
    }
}

/// Apply one substitution to `content`.
///
/// Without `replace_all` the target must occur exactly once.
pub fn apply_edit(content: &str, op: &EditOperation) -> Result<Replacement, EditError> {
    if op.old_string == op.new_string {
        return Err(EditError::IdenticalStrings);
    }
    if op.old_string.is_empty() {
        return Err(EditError::EmptyOldString);
    }

    let Some(first_offset) = content.find(&op.old_string) else {
        return Err(EditError::NotFound);
    };
    let count = content.matches(op.old_string.as_str()).count();
    if count > 1 && !op.replace_all {
        return Err(EditError::Ambiguous { count });
    }

    let content = if op.replace_all {
        content.replace(&op.old_string, &op.new_string)
    } else {
        content.replacen(&op.old_string, &op.new_string, 1)
    };

    Ok(Replacement {
        content,
        count,
        first_offset,
    })
}

/// What one step of a chain did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Created,
    Replaced(usize),
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::Created => f.write_str("Created new file"),
            StepOutcome::Replaced(1) => f.write_str("Replaced 1 occurrence"),
            StepOutcome::Replaced(n) => write!(f, "Replaced {} occurrences", n),
        }
    }
}

/// An ordered batch of edits applied all-or-nothing.
#[derive(Debug, Clone)]
pub struct EditChain {
    edits: Vec<EditOperation>,
}

impl EditChain {
    pub fn new(edits: Vec<EditOperation>) -> Result<Self, EditError> {
        if edits.is_empty() {
            return Err(EditError::NoEdits);
        }
        Ok(Self { edits })
    }

    pub fn edits(&self) -> &[EditOperation] {
        &self.edits
    }

    /// Simulate the whole chain. `original` is `None` when the file is absent.
    pub fn validate(&self, original: Option<&str>) -> Result<ValidatedEdits<'_>, ChainError> {
        let mut current: String = original.unwrap_or_default().to_string();
        let mut steps = Vec::with_capacity(self.edits.len());

        for (index, op) in self.edits.iter().enumerate() {
            let step = index + 1;
            let fail = |error| ChainError { step, error };

            if op.old_string == op.new_string {
                return Err(fail(EditError::IdenticalStrings));
            }

            if op.is_create() {
                if index != 0 {
                    return Err(fail(EditError::CreateNotFirst));
                }
                if original.is_some_and(|c| !c.is_empty()) {
                    return Err(fail(EditError::FileExists));
                }
                current = op.new_string.clone();
                steps.push(StepOutcome::Created);
                continue;
            }

            if index == 0 && original.is_none() {
                return Err(fail(EditError::MissingFile));
            }

            let replacement = apply_edit(&current, op).map_err(fail)?;
            current = replacement.content;
            steps.push(StepOutcome::Replaced(replacement.count));
        }

        Ok(ValidatedEdits {
            chain: self,
            steps,
            content: current,
        })
    }
}

/// A chain proven feasible against a specific starting content.
#[derive(Debug)]
pub struct ValidatedEdits<'a> {
    chain: &'a EditChain,
    steps: Vec<StepOutcome>,
    content: String,
}

impl ValidatedEdits<'_> {
    pub fn steps(&self) -> &[StepOutcome] {
        &self.steps
    }

    /// Human-readable per-step summary lines.
    pub fn summary_lines(&self) -> Vec<String> {
        self.chain
            .edits
            .iter()
            .zip(&self.steps)
            .enumerate()
            .map(|(i, (op, outcome))| match outcome {
                StepOutcome::Created => format!("{}. {}", i + 1, outcome),
                StepOutcome::Replaced(_) => format!(
                    "{}. {}: {:?} with {:?}",
                    i + 1,
                    outcome,
                    crate::core::string::truncate_with_ellipsis(&op.old_string, 50),
                    crate::core::string::truncate_with_ellipsis(&op.new_string, 50)
                ),
            })
            .collect()
    }

    /// Final content to persist.
    pub fn apply(self) -> String {
        self.content
    }
}

/// Render lines `center ± context` in `cat -n` format (1-based numbers).
pub fn numbered_snippet(content: &str, center: usize, context: usize) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let start = center.saturating_sub(context);
    let end = (center + context + 1).min(lines.len());
    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>6}\t{}", start + i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}
