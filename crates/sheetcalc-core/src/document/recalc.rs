//! Recalculation of formula cells after an edit.

use log::{debug, trace, warn};
use sheetcalc_engine::engine::{
    CellError, CellRef, CellValue, detect_cycle, evaluate_to_value, plan_recalc,
};
use std::collections::HashSet;

use super::{Document, RecalcMode};

/// Summary of one recalculation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecalcReport {
    /// Number of formula cells that were re-evaluated.
    pub cells_recomputed: usize,
    /// Cells found on a dependency cycle and marked `#CYCLE!`, sorted.
    /// Always empty in depth-first mode.
    pub cycle_members: Vec<CellRef>,
}

impl Document {
    /// Re-evaluate a formula cell from the current store and save the result.
    ///
    /// Returns false if the cell has no formula.
    pub(crate) fn evaluate_cell(&mut self, cell_ref: &CellRef) -> bool {
        let Some(formula) = self.cells.get(cell_ref).and_then(|c| c.formula.clone()) else {
            return false;
        };
        let value = evaluate_to_value(&formula, &self.cells);
        trace!("{cell_ref} {formula} -> {}", value.display());
        self.cells.set_value(cell_ref, value);
        true
    }

    /// Push a change of `changed` to every formula cell that depends on it.
    pub(crate) fn propagate(&mut self, changed: &CellRef) -> RecalcReport {
        let report = match self.settings.recalc {
            RecalcMode::Topological => self.propagate_topological(changed),
            RecalcMode::DepthFirst => self.propagate_depth_first(changed),
        };
        debug!(
            "{changed} changed: {} cells recomputed, {} on cycles",
            report.cells_recomputed,
            report.cycle_members.len()
        );
        report
    }

    fn propagate_topological(&mut self, changed: &CellRef) -> RecalcReport {
        let affected = self.graph.affected_cells(changed);
        self.run_plan(&affected)
    }

    /// Iterative depth-first walk from `changed`. Each reachable formula cell is
    /// evaluated at most once, in discovery order.
    fn propagate_depth_first(&mut self, changed: &CellRef) -> RecalcReport {
        let mut visited = HashSet::from([*changed]);
        let mut pending = vec![*changed];
        let mut cells_recomputed = 0;

        while let Some(current) = pending.pop() {
            let mut dependents: Vec<CellRef> = self.graph.dependents(&current).copied().collect();
            dependents.sort();
            for dependent in dependents {
                if !visited.insert(dependent) {
                    continue;
                }
                if self.evaluate_cell(&dependent) {
                    cells_recomputed += 1;
                    pending.push(dependent);
                }
            }
        }

        RecalcReport {
            cells_recomputed,
            cycle_members: Vec::new(),
        }
    }

    /// Re-evaluate every formula cell in dependency order.
    pub fn recalculate_all(&mut self) -> RecalcReport {
        let formulas: HashSet<CellRef> = self
            .cells
            .iter()
            .filter(|(_, cell)| cell.has_formula())
            .map(|(cell_ref, _)| *cell_ref)
            .collect();
        let report = self.run_plan(&formulas);
        debug!(
            "full recalculation: {} cells recomputed, {} on cycles",
            report.cells_recomputed,
            report.cycle_members.len()
        );
        report
    }

    fn run_plan(&mut self, cells: &HashSet<CellRef>) -> RecalcReport {
        let plan = plan_recalc(&self.graph, cells);

        if let Some(first) = plan.cycle_members.first() {
            match detect_cycle(first, &self.graph) {
                Some(path) => warn!("circular dependency: {}", join_refs(&path)),
                None => warn!("circular dependency through {first}"),
            }
        }
        for cell_ref in &plan.cycle_members {
            self.cells
                .set_value(cell_ref, CellValue::Error(CellError::CyclicDependency));
        }

        let mut cells_recomputed = 0;
        for cell_ref in &plan.order {
            if self.evaluate_cell(cell_ref) {
                cells_recomputed += 1;
            }
        }

        RecalcReport {
            cells_recomputed,
            cycle_members: plan.cycle_members,
        }
    }
}

fn join_refs(cells: &[CellRef]) -> String {
    cells
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
