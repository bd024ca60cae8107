//! Dependency extraction and the dependency graph.
//!
//! Extraction is syntactic: every reference token in a formula counts, whether or
//! not the referenced cell exists. It uses the same lexer as the evaluator.
//!
//! # Edge Direction
//!
//! ```text
//! A → B  means  "B depends on A"  (A is a precedent of B)
//! ```

use std::collections::{HashMap, HashSet};

use super::cell_ref::CellRef;
use super::lexer::{Token, tokenize};

/// Extract all cell references from a formula, in order of appearance.
///
/// Duplicates are kept. The leading `=` is optional.
pub fn extract_dependencies(formula: &str) -> Vec<CellRef> {
    let expr = formula.strip_prefix('=').unwrap_or(formula);
    tokenize(expr)
        .into_iter()
        .filter_map(|token| match token {
            Token::CellRef(cell_ref) => Some(cell_ref),
            _ => None,
        })
        .collect()
}

/// Dependency graph between formula cells and the cells they reference.
///
/// Keeps both directions:
/// - `dependents[A]` = formula cells whose formula mentions A
/// - `precedents[B]` = cells mentioned by B's formula
///
/// The two maps always mirror each other and never hold empty sets. They are only
/// changed through [`DependencyGraph::replace_edges`] and
/// [`DependencyGraph::clear_cell`].
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    dependents: HashMap<CellRef, HashSet<CellRef>>,
    precedents: HashMap<CellRef, HashSet<CellRef>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cells whose formula references `cell`.
    pub fn dependents(&self, cell: &CellRef) -> impl Iterator<Item = &CellRef> + '_ {
        self.dependents.get(cell).into_iter().flatten()
    }

    /// Cells referenced by `cell`'s formula.
    pub fn precedents(&self, cell: &CellRef) -> impl Iterator<Item = &CellRef> + '_ {
        self.precedents.get(cell).into_iter().flatten()
    }

    pub fn has_dependents(&self, cell: &CellRef) -> bool {
        self.dependents.contains_key(cell)
    }

    /// Number of cells referenced by at least one formula.
    pub fn referenced_cell_count(&self) -> usize {
        self.dependents.len()
    }

    /// Number of formula cells that reference at least one cell.
    pub fn formula_cell_count(&self) -> usize {
        self.precedents.len()
    }

    /// Replace all edges of `dependent` in one step.
    ///
    /// Removes `dependent` from the dependent set of every old precedent, then adds
    /// it to the dependent set of every new one. An empty `new_precedents` clears
    /// the cell.
    pub fn replace_edges(
        &mut self,
        dependent: CellRef,
        new_precedents: impl IntoIterator<Item = CellRef>,
    ) {
        if let Some(old) = self.precedents.remove(&dependent) {
            for precedent in old {
                if let Some(set) = self.dependents.get_mut(&precedent) {
                    set.remove(&dependent);
                    if set.is_empty() {
                        self.dependents.remove(&precedent);
                    }
                }
            }
        }

        let new_precedents: HashSet<CellRef> = new_precedents.into_iter().collect();
        if new_precedents.is_empty() {
            return;
        }

        for precedent in &new_precedents {
            self.dependents
                .entry(*precedent)
                .or_default()
                .insert(dependent);
        }
        self.precedents.insert(dependent, new_precedents);
    }

    /// Remove all edges for a cell whose formula was removed.
    pub fn clear_cell(&mut self, cell: CellRef) {
        self.replace_edges(cell, std::iter::empty());
    }

    /// Every cell reachable from `start` by following dependents.
    ///
    /// `start` itself is included only when it lies on a cycle.
    pub fn affected_cells(&self, start: &CellRef) -> HashSet<CellRef> {
        let mut affected = HashSet::new();
        let mut pending = vec![*start];
        while let Some(cell) = pending.pop() {
            for dependent in self.dependents(&cell) {
                if affected.insert(*dependent) {
                    pending.push(*dependent);
                }
            }
        }
        affected
    }

    /// Panics if the two adjacency maps disagree. Test helper.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for (precedent, dependents) in &self.dependents {
            assert!(!dependents.is_empty(), "empty dependent set for {precedent}");
            for dependent in dependents {
                assert!(
                    self.precedents
                        .get(dependent)
                        .is_some_and(|set| set.contains(precedent)),
                    "{dependent} missing precedent {precedent}"
                );
            }
        }
        for (dependent, precedents) in &self.precedents {
            assert!(!precedents.is_empty(), "empty precedent set for {dependent}");
            for precedent in precedents {
                assert!(
                    self.dependents
                        .get(precedent)
                        .is_some_and(|set| set.contains(dependent)),
                    "{precedent} missing dependent {dependent}"
                );
            }
        }
    }
}
