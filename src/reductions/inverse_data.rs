//! Correlation tables recorded by a reduction for inverting solutions.

use std::collections::HashMap;

use crate::expr::{ExprId, VariableData};

/// Real replacement variables standing in for one non-real variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitIds {
    /// Id of the variable carrying the real part, if any.
    pub real: Option<ExprId>,
    /// Id of the variable carrying the imaginary part, if any.
    pub imag: Option<ExprId>,
}

/// What a reduction remembers about the problem it rewrote.
#[derive(Debug, Clone, Default)]
pub struct InverseData {
    /// Every variable of the original problem, by id.
    pub id2var: HashMap<ExprId, VariableData>,
    /// Replacement ids for each split (non-real) variable.
    pub real2imag: HashMap<ExprId, SplitIds>,
    /// Replacement id back to the original variable's id.
    pub replaced_by: HashMap<ExprId, ExprId>,
    /// Original constraint id to the id of the constraint replacing it.
    pub cons_id_map: HashMap<ExprId, ExprId>,
}

impl InverseData {
    /// Empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember an original variable.
    pub fn record_variable(&mut self, var: &VariableData) {
        self.id2var.entry(var.id).or_insert_with(|| var.clone());
    }

    /// Record the replacements of a split variable.
    pub fn record_split(&mut self, original: ExprId, split: SplitIds) {
        for id in [split.real, split.imag].into_iter().flatten() {
            self.replaced_by.insert(id, original);
        }
        self.real2imag.insert(original, split);
    }

    /// Record that `original` was rewritten into `replacement`.
    pub fn record_constraint(&mut self, original: ExprId, replacement: ExprId) {
        self.cons_id_map.insert(original, replacement);
    }

    /// Replacements of a split variable.
    pub fn split_of(&self, original: ExprId) -> Option<&SplitIds> {
        self.real2imag.get(&original)
    }

    /// Original variable a replacement id stands for.
    pub fn original_of(&self, replacement: ExprId) -> Option<ExprId> {
        self.replaced_by.get(&replacement).copied()
    }
}
