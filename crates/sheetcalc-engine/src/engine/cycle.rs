//! Circular dependency detection and recalculation ordering.
//!
//! [`plan_recalc`] orders a set of formula cells so that every cell comes after
//! all of its precedents in the set (Kahn's algorithm). Cells that cannot be
//! ordered are split into cycle members and cells that merely sit downstream of a
//! cycle; the latter are still ordered, after the cycle members.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::cell_ref::CellRef;
use super::deps::DependencyGraph;

/// Evaluation order for a recalculation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecalcPlan {
    /// Cells to evaluate, precedents first.
    pub order: Vec<CellRef>,
    /// Cells on a dependency cycle, sorted. These are not evaluated.
    pub cycle_members: Vec<CellRef>,
}

impl RecalcPlan {
    pub fn has_cycles(&self) -> bool {
        !self.cycle_members.is_empty()
    }
}

/// Order `cells` for evaluation.
///
/// Only edges between members of `cells` count. Ties are broken by (row, col) so
/// the order is deterministic.
pub fn plan_recalc(graph: &DependencyGraph, cells: &HashSet<CellRef>) -> RecalcPlan {
    let (mut order, leftover) = kahn_order(graph, cells);
    if leftover.is_empty() {
        return RecalcPlan {
            order,
            cycle_members: Vec::new(),
        };
    }

    let mut cycle_members: Vec<CellRef> = leftover
        .iter()
        .filter(|cell| reaches_itself(graph, cell, &leftover))
        .copied()
        .collect();
    cycle_members.sort();

    let on_cycle: HashSet<CellRef> = cycle_members.iter().copied().collect();
    let downstream: HashSet<CellRef> = leftover.difference(&on_cycle).copied().collect();
    let (rest, unordered) = kahn_order(graph, &downstream);
    debug_assert!(unordered.is_empty(), "cycle members were not all removed");
    order.extend(rest);

    RecalcPlan {
        order,
        cycle_members,
    }
}

/// Kahn's algorithm restricted to `cells`. Returns the ordered prefix and the
/// cells that never reached in-degree zero.
fn kahn_order(
    graph: &DependencyGraph,
    cells: &HashSet<CellRef>,
) -> (Vec<CellRef>, HashSet<CellRef>) {
    let mut in_degree: HashMap<CellRef, usize> = cells
        .iter()
        .map(|cell| {
            let count = graph
                .precedents(cell)
                .filter(|p| cells.contains(p))
                .count();
            (*cell, count)
        })
        .collect();

    let mut ready: BTreeSet<CellRef> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(cell, _)| *cell)
        .collect();

    let mut order = Vec::with_capacity(cells.len());
    while let Some(cell) = ready.pop_first() {
        order.push(cell);
        for dependent in graph.dependents(&cell) {
            if let Some(deg) = in_degree.get_mut(dependent) {
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    let ordered: HashSet<CellRef> = order.iter().copied().collect();
    let leftover = cells.difference(&ordered).copied().collect();
    (order, leftover)
}

/// Whether `start` can reach itself following dependents inside `within`.
fn reaches_itself(graph: &DependencyGraph, start: &CellRef, within: &HashSet<CellRef>) -> bool {
    let mut visited = HashSet::new();
    let mut pending = vec![*start];
    while let Some(cell) = pending.pop() {
        for dependent in graph.dependents(&cell) {
            if dependent == start {
                return true;
            }
            if within.contains(dependent) && visited.insert(*dependent) {
                pending.push(*dependent);
            }
        }
    }
    false
}

/// Find a circular dependency reachable from `start` through precedents.
/// Returns the path, ending with the cell that closes the loop.
///
/// Each cell is explored at most once.
pub fn detect_cycle(start: &CellRef, graph: &DependencyGraph) -> Option<Vec<CellRef>> {
    let mut visiting = HashSet::new();
    let mut done = HashSet::new();
    let mut path = Vec::new();

    if detect_cycle_dfs(start, graph, &mut visiting, &mut done, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn detect_cycle_dfs(
    current: &CellRef,
    graph: &DependencyGraph,
    visiting: &mut HashSet<CellRef>,
    done: &mut HashSet<CellRef>,
    path: &mut Vec<CellRef>,
) -> bool {
    if visiting.contains(current) {
        path.push(*current);
        return true;
    }
    // Already explored without reaching a cycle.
    if done.contains(current) {
        return false;
    }

    let mut precedents: Vec<CellRef> = graph.precedents(current).copied().collect();
    if precedents.is_empty() {
        done.insert(*current);
        return false;
    }
    precedents.sort();

    visiting.insert(*current);
    path.push(*current);

    for precedent in &precedents {
        if detect_cycle_dfs(precedent, graph, visiting, done, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(current);
    done.insert(*current);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn r(name: &str) -> CellRef {
        CellRef::parse(name).unwrap()
    }

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (dependent, precedents) in edges {
            graph.replace_edges(r(dependent), precedents.iter().map(|p| r(p)));
        }
        graph
    }

    fn set(names: &[&str]) -> HashSet<CellRef> {
        names.iter().map(|n| r(n)).collect()
    }

    #[test]
    fn test_plan_chain() {
        let g = graph(&[("B1", &["A1"]), ("C1", &["B1"])]);
        let plan = plan_recalc(&g, &g.affected_cells(&r("A1")));
        assert_eq!(plan.order, vec![r("B1"), r("C1")]);
        assert!(!plan.has_cycles());
    }

    #[test]
    fn test_plan_diamond_puts_join_last() {
        // A1 → B1, A1 → C1, {B1, C1} → D1
        let g = graph(&[("B1", &["A1"]), ("C1", &["A1"]), ("D1", &["B1", "C1"])]);
        let plan = plan_recalc(&g, &g.affected_cells(&r("A1")));
        assert_eq!(plan.order, vec![r("B1"), r("C1"), r("D1")]);
    }

    #[test]
    fn test_plan_separates_cycle_from_downstream() {
        // A1 ⇄ B1, C1 reads B1
        let g = graph(&[("A1", &["B1"]), ("B1", &["A1"]), ("C1", &["B1"])]);
        let plan = plan_recalc(&g, &set(&["A1", "B1", "C1"]));
        assert_eq!(plan.cycle_members, vec![r("A1"), r("B1")]);
        assert_eq!(plan.order, vec![r("C1")]);
    }

    #[test]
    fn test_plan_self_reference() {
        let g = graph(&[("A1", &["A1"])]);
        let plan = plan_recalc(&g, &g.affected_cells(&r("A1")));
        assert_eq!(plan.cycle_members, vec![r("A1")]);
        assert!(plan.order.is_empty());
    }

    #[test]
    fn test_plan_ignores_edges_outside_the_set() {
        let g = graph(&[("B1", &["A1"]), ("C1", &["B1"])]);
        let plan = plan_recalc(&g, &set(&["C1"]));
        assert_eq!(plan.order, vec![r("C1")]);
    }

    #[test]
    fn test_detect_cycle_no_cycle() {
        let g = graph(&[("C1", &["A1", "B1"])]);
        assert!(detect_cycle(&r("C1"), &g).is_none());
    }

    /// Rows 2..=depth each hold `A{r}` and `B{r}`, both reading row `r - 1`.
    fn ladder(depth: usize) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for row in 2..=depth {
            let above = [r(&format!("A{}", row - 1)), r(&format!("B{}", row - 1))];
            g.replace_edges(r(&format!("A{row}")), above);
            g.replace_edges(r(&format!("B{row}")), above);
        }
        g
    }

    #[test]
    fn test_detect_cycle_behind_ladder_visits_each_cell_once() {
        let depth = 60;
        let mut g = ladder(depth);
        // D100 reads the top of a ladder with 2^59 distinct paths, and sorts
        // those precedents ahead of E100, so the ladder is walked first.
        g.replace_edges(
            r("D100"),
            [r(&format!("A{depth}")), r(&format!("B{depth}")), r("E100")],
        );
        g.replace_edges(r("E100"), [r("D100")]);

        let path = detect_cycle(&r("E100"), &g).unwrap();
        assert_eq!(path, vec![r("E100"), r("D100"), r("E100")]);
    }

    #[test]
    fn test_detect_cycle_ladder_without_cycle() {
        let g = ladder(60);
        assert!(detect_cycle(&r("A60"), &g).is_none());
    }

    #[test]
    fn test_detect_cycle_indirect() {
        let g = graph(&[("A1", &["B1"]), ("B1", &["C1"]), ("C1", &["A1"])]);
        assert_eq!(
            detect_cycle(&r("A1"), &g),
            Some(vec![r("A1"), r("B1"), r("C1"), r("A1")])
        );
    }
}
