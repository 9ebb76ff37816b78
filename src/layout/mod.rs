//! Column layout for prerequisite graphs.
//!
//! Courses with no resolvable prerequisites sit in column 0. Every course is
//! placed strictly to the right of each of its prerequisites, so column index
//! equals the length of the longest prerequisite chain below the course.
//! Within a column, the slot order is the order in which nodes arrived and
//! determines the y coordinate.

pub mod routing;

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::graph::{EdgeKind, GraphError, GraphStore};

pub use routing::{fix_edges, recalculate_edge, route_edge};

/// Non-fatal findings of a layout pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutReport {
    #[serde(serialize_with = "serialize_errors")]
    pub cycles: Vec<GraphError>,
    /// Nodes no seed reached (only members of unrooted cycles); parked in
    /// column 0 and laid out from there.
    pub unplaced: Vec<String>,
}

impl LayoutReport {
    pub fn is_clean(&self) -> bool {
        self.cycles.is_empty() && self.unplaced.is_empty()
    }
}

fn serialize_errors<S>(errors: &[GraphError], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(errors.iter().map(ToString::to_string))
}

/// Places the node at `slot` of `col` in pixel space and reroutes its edges.
pub fn reposition_node(store: &mut GraphStore, col: usize, slot: usize) -> Result<(), GraphError> {
    let pitch = store.config().cell_pitch();
    let spacing = store.config().node_spacing;
    let Some(id) = store.columns().get(col).and_then(|members| members.get(slot)).cloned() else {
        return Ok(());
    };
    let node = store
        .node_mut(&id)
        .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;
    node.column = Some(col);
    node.rect.x = spacing + pitch * col as f32;
    node.rect.y = spacing + pitch * slot as f32;
    fix_edges(store, &id);
    Ok(())
}

/// Moves a node to the end of column `col`.
///
/// A node that already has a column only moves when `allow_override` is set.
/// Moving out of a column shifts every later member up one slot. Returns
/// whether the node moved.
pub fn set_col_num(
    store: &mut GraphStore,
    id: &str,
    col: usize,
    allow_override: bool,
) -> Result<bool, GraphError> {
    let current = store
        .node(id)
        .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?
        .column;
    if current == Some(col) {
        return Ok(false);
    }
    if current.is_some() && !allow_override {
        return Ok(false);
    }

    let columns = store.columns_mut();
    while columns.len() < col + 1 {
        columns.push(Vec::new());
    }

    if let Some(old) = current {
        let members = &mut store.columns_mut()[old];
        if let Some(old_slot) = members.iter().position(|member| member == id) {
            members.remove(old_slot);
            let remaining = members.len();
            for slot in old_slot..remaining {
                reposition_node(store, old, slot)?;
            }
        }
    }

    debug!(node = id, from = ?current, to = col, "placing node");
    let members = &mut store.columns_mut()[col];
    members.push(id.to_string());
    let slot = members.len() - 1;
    reposition_node(store, col, slot)?;
    Ok(true)
}

/// Depth-first propagation state shared across one layout pass.
struct ColumnWalk {
    path: Vec<String>,
    expanded: HashMap<String, usize>,
    report: LayoutReport,
}

impl ColumnWalk {
    fn new() -> Self {
        Self {
            path: Vec::new(),
            expanded: HashMap::new(),
            report: LayoutReport::default(),
        }
    }

    /// Places `id` at `col` (or keeps it where it is if it already sits
    /// farther right) and pushes each course that lists it as a prerequisite
    /// one column beyond it.
    fn layout_from_node(
        &mut self,
        store: &mut GraphStore,
        id: &str,
        col: usize,
    ) -> Result<(), GraphError> {
        if let Some(pos) = self.path.iter().position(|visited| visited == id) {
            let mut chain = self.path[pos..].to_vec();
            chain.push(id.to_string());
            warn!(node = id, chain = %chain.join(" -> "), "cyclic prerequisite chain");
            self.report.cycles.push(GraphError::CyclicPrerequisite {
                node: id.to_string(),
                chain,
            });
            return Ok(());
        }

        let current = store
            .node(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?
            .column;
        let target = match current {
            Some(existing) if existing >= col => existing,
            _ => col,
        };
        if current != Some(target) {
            // Only a deeper chain may move an already placed node.
            set_col_num(store, id, target, current.is_some())?;
        }
        if self.expanded.get(id) == Some(&target) {
            return Ok(());
        }
        self.expanded.insert(id.to_string(), target);

        let dependents: Vec<_> = store
            .incident_edges(id)
            .iter()
            .filter_map(|&edge_id| {
                let edge = store.edge(edge_id)?;
                (edge.end == id && edge.kind == EdgeKind::Prerequisite)
                    .then(|| (edge_id, edge.start.clone()))
            })
            .collect();

        self.path.push(id.to_string());
        for (edge_id, dependent) in dependents {
            self.layout_from_node(store, &dependent, target + 1)?;
            recalculate_edge(store, edge_id);
        }
        self.path.pop();
        Ok(())
    }
}

/// Lays out from a single node; exposed for incremental use and tests.
pub fn layout_from_node(
    store: &mut GraphStore,
    id: &str,
    col: usize,
) -> Result<LayoutReport, GraphError> {
    let mut walk = ColumnWalk::new();
    walk.layout_from_node(store, id, col)?;
    Ok(walk.report)
}

/// Assigns every node a column, starting from the nodes already seeded in
/// column 0.
pub fn layout_columns(store: &mut GraphStore) -> Result<LayoutReport, GraphError> {
    let mut walk = ColumnWalk::new();

    let seeds = store.column(0).map(<[String]>::to_vec).unwrap_or_default();
    for seed in &seeds {
        walk.layout_from_node(store, seed, 0)?;
    }

    let metas: Vec<(String, Vec<String>)> = store
        .nodes()
        .iter()
        .filter_map(|node| Some((node.id.clone(), node.contains.clone()?)))
        .collect();
    for (id, contains) in metas {
        let farthest = contains
            .iter()
            .filter_map(|member| store.node(member)?.column)
            .max()
            .unwrap_or(0);
        debug!(node = %id, column = farthest, "placing meta node");
        walk.layout_from_node(store, &id, farthest)?;
    }

    let config = store.config().clone();
    let advanced: Vec<String> = store
        .nodes()
        .iter()
        .filter(|node| !node.is_meta() && is_graduate_level(&node.id, &config))
        .map(|node| node.id.clone())
        .collect();
    for id in advanced {
        let last = store.columns().len().saturating_sub(1);
        set_col_num(store, &id, last, true)?;
    }

    // Walking from a parked node surfaces its cycle and pushes the courses
    // that depend on it to later columns.
    let pending: Vec<String> = store
        .nodes()
        .iter()
        .filter(|node| node.column.is_none())
        .map(|node| node.id.clone())
        .collect();
    for id in pending {
        if store.node(&id).is_some_and(|node| node.column.is_some()) {
            continue;
        }
        warn!(node = %id, "node unreachable from any root; parking in column 0");
        set_col_num(store, &id, 0, false)?;
        walk.layout_from_node(store, &id, 0)?;
        walk.report.unplaced.push(id);
    }

    Ok(walk.report)
}

/// True when the course number digit at `level_digit_index` meets the
/// configured graduate level.
pub fn is_graduate_level(id: &str, config: &LayoutConfig) -> bool {
    let Some(threshold) = config.graduate_level else {
        return false;
    };
    id.as_bytes()
        .get(config.level_digit_index)
        .and_then(|byte| (*byte as char).to_digit(10))
        .is_some_and(|level| level >= threshold)
}

/// Lists every broken layout invariant: slot duplicates, nodes whose column
/// disagrees with their slot list, unplaced nodes and prerequisite edges
/// that do not point strictly leftwards.
pub fn validate_layout(store: &GraphStore) -> Vec<String> {
    let mut problems = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for (col, members) in store.columns().iter().enumerate() {
        for member in members {
            if let Some(previous) = seen.insert(member.as_str(), col) {
                problems.push(format!(
                    "node {member} appears in column {previous} and column {col}"
                ));
            }
            match store.node(member).and_then(|node| node.column) {
                Some(assigned) if assigned == col => {}
                other => problems.push(format!(
                    "node {member} listed in column {col} but assigned {other:?}"
                )),
            }
        }
    }

    for node in store.nodes() {
        if !seen.contains_key(node.id.as_str()) {
            problems.push(format!("node {} is not in any column", node.id));
        }
    }

    for (_, edge) in store.edges() {
        if edge.kind != EdgeKind::Prerequisite {
            continue;
        }
        let start = store.node(&edge.start).and_then(|node| node.column);
        let end = store.node(&edge.end).and_then(|node| node.column);
        if let (Some(start), Some(end)) = (start, end)
            && start <= end
        {
            problems.push(format!(
                "{} (column {start}) should sit right of its prerequisite {} (column {end})",
                edge.start, edge.end
            ));
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;

    fn store_with(ids: &[&str]) -> GraphStore {
        let mut store = GraphStore::new(&LayoutConfig::default());
        for id in ids {
            store.create_node(id, None).unwrap();
        }
        store
    }

    fn column_ids(store: &GraphStore, col: usize) -> Vec<&str> {
        store
            .column(col)
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn reposition_uses_cell_pitch() {
        let mut store = store_with(&["A", "B"]);
        set_col_num(&mut store, "A", 2, false).unwrap();
        set_col_num(&mut store, "B", 2, false).unwrap();
        let b = store.node("B").unwrap();
        assert_eq!(b.rect.x, 12.0 + 76.0 * 2.0);
        assert_eq!(b.rect.y, 12.0 + 76.0);
        assert_eq!(store.columns().len(), 3);
    }

    #[test]
    fn same_column_is_a_no_op() {
        let mut store = store_with(&["A", "B"]);
        store.create_edge("B", "A", EdgeKind::Prerequisite).unwrap();
        set_col_num(&mut store, "A", 0, false).unwrap();
        let edge = store.incident_edges("A")[0];
        let revision = store.edge(edge).unwrap().revision;
        assert!(!set_col_num(&mut store, "A", 0, true).unwrap());
        assert_eq!(column_ids(&store, 0), vec!["A"]);
        assert_eq!(store.edge(edge).unwrap().revision, revision);
    }

    #[test]
    fn placed_node_needs_override_to_move() {
        let mut store = store_with(&["A"]);
        set_col_num(&mut store, "A", 0, false).unwrap();
        assert!(!set_col_num(&mut store, "A", 1, false).unwrap());
        assert_eq!(store.node("A").unwrap().column, Some(0));
        assert!(set_col_num(&mut store, "A", 1, true).unwrap());
        assert_eq!(store.node("A").unwrap().column, Some(1));
        assert!(store.column(0).unwrap().is_empty());
    }

    #[test]
    fn removal_repacks_following_slots() {
        let mut store = store_with(&["A", "B", "C"]);
        for id in ["A", "B", "C"] {
            set_col_num(&mut store, id, 0, false).unwrap();
        }
        set_col_num(&mut store, "A", 1, true).unwrap();
        assert_eq!(column_ids(&store, 0), vec!["B", "C"]);
        assert_eq!(store.slot_of("C"), Some(1));
        assert_eq!(store.node("B").unwrap().rect.y, 12.0);
        assert_eq!(store.node("C").unwrap().rect.y, 12.0 + 76.0);
    }

    #[test]
    fn unknown_node_is_an_error() {
        let mut store = store_with(&[]);
        assert_eq!(
            set_col_num(&mut store, "X", 0, false).unwrap_err(),
            GraphError::UnknownNode("X".to_string())
        );
    }

    #[test]
    fn longest_chain_wins() {
        // C requires A and B, B requires A.
        let mut store = store_with(&["A", "B", "C"]);
        store.create_edge("C", "A", EdgeKind::Prerequisite).unwrap();
        store.create_edge("B", "A", EdgeKind::Prerequisite).unwrap();
        store.create_edge("C", "B", EdgeKind::Prerequisite).unwrap();
        set_col_num(&mut store, "A", 0, false).unwrap();

        let report = layout_columns(&mut store).unwrap();
        assert!(report.is_clean());
        assert_eq!(store.node("B").unwrap().column, Some(1));
        assert_eq!(store.node("C").unwrap().column, Some(2));
        assert!(store.column(1).unwrap().iter().all(|id| id != "C"));
        assert!(validate_layout(&store).is_empty());
    }

    #[test]
    fn corequisites_do_not_rank() {
        let mut store = store_with(&["A", "B"]);
        store.create_edge("B", "A", EdgeKind::Corequisite).unwrap();
        set_col_num(&mut store, "A", 0, false).unwrap();
        set_col_num(&mut store, "B", 0, false).unwrap();
        layout_columns(&mut store).unwrap();
        assert_eq!(column_ids(&store, 0), vec!["A", "B"]);
    }

    #[test]
    fn cycle_is_reported_and_layout_terminates() {
        let mut store = store_with(&["ROOT", "A", "B"]);
        store.create_edge("A", "ROOT", EdgeKind::Prerequisite).unwrap();
        store.create_edge("B", "A", EdgeKind::Prerequisite).unwrap();
        store.create_edge("A", "B", EdgeKind::Prerequisite).unwrap();
        set_col_num(&mut store, "ROOT", 0, false).unwrap();

        let report = layout_columns(&mut store).unwrap();
        assert_eq!(report.cycles.len(), 1);
        match &report.cycles[0] {
            GraphError::CyclicPrerequisite { node, chain } => {
                assert_eq!(node, "A");
                assert_eq!(chain, &vec!["A".to_string(), "B".to_string(), "A".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(report.unplaced.is_empty());
        assert_eq!(store.node("A").unwrap().column, Some(1));
        assert_eq!(store.node("B").unwrap().column, Some(2));
    }

    #[test]
    fn unrooted_cycle_is_parked_in_column_zero() {
        let mut store = store_with(&["A", "B"]);
        store.create_edge("A", "B", EdgeKind::Prerequisite).unwrap();
        store.create_edge("B", "A", EdgeKind::Prerequisite).unwrap();
        let report = layout_columns(&mut store).unwrap();
        assert_eq!(report.unplaced, vec!["A".to_string()]);
        assert_eq!(report.cycles.len(), 1);
        assert_eq!(column_ids(&store, 0), vec!["A"]);
        assert_eq!(column_ids(&store, 1), vec!["B"]);
    }

    #[test]
    fn courses_behind_an_unrooted_cycle_follow_it() {
        // A and B require each other; C requires A.
        let mut store = store_with(&["A", "B", "C"]);
        store.create_edge("A", "B", EdgeKind::Prerequisite).unwrap();
        store.create_edge("B", "A", EdgeKind::Prerequisite).unwrap();
        store.create_edge("C", "A", EdgeKind::Prerequisite).unwrap();

        let report = layout_columns(&mut store).unwrap();
        assert_eq!(report.cycles.len(), 1);
        assert_eq!(report.unplaced, vec!["A".to_string()]);
        let a = store.node("A").unwrap().column.unwrap();
        let c = store.node("C").unwrap().column.unwrap();
        assert!(c > a);
        assert!(
            validate_layout(&store)
                .iter()
                .all(|problem| !problem.starts_with("C "))
        );
    }

    #[test]
    fn meta_node_follows_farthest_member() {
        let mut store = store_with(&["A", "B", "C"]);
        store
            .create_node("ELECTIVES", Some(vec!["B".into(), "C".into(), "GONE".into()]))
            .unwrap();
        store.create_edge("B", "A", EdgeKind::Prerequisite).unwrap();
        store.create_edge("C", "B", EdgeKind::Prerequisite).unwrap();
        set_col_num(&mut store, "A", 0, false).unwrap();

        layout_columns(&mut store).unwrap();
        assert_eq!(store.node("ELECTIVES").unwrap().column, Some(2));
    }

    #[test]
    fn meta_node_with_no_resolvable_members_goes_to_column_zero() {
        let mut store = store_with(&[]);
        store.create_node("EMPTY", Some(vec!["NOPE".into()])).unwrap();
        let report = layout_columns(&mut store).unwrap();
        assert!(report.is_clean());
        assert_eq!(store.node("EMPTY").unwrap().column, Some(0));
    }

    #[test]
    fn graduate_courses_move_to_last_column() {
        let mut store = store_with(&["CSCI-1100", "CSCI-2200", "CSCI-6100"]);
        store
            .create_edge("CSCI-2200", "CSCI-1100", EdgeKind::Prerequisite)
            .unwrap();
        set_col_num(&mut store, "CSCI-1100", 0, false).unwrap();
        set_col_num(&mut store, "CSCI-6100", 0, false).unwrap();

        layout_columns(&mut store).unwrap();
        assert_eq!(store.node("CSCI-6100").unwrap().column, Some(1));
        assert_eq!(column_ids(&store, 0), vec!["CSCI-1100"]);
        assert_eq!(column_ids(&store, 1), vec!["CSCI-2200", "CSCI-6100"]);
    }

    #[test]
    fn graduate_level_parsing() {
        let config = LayoutConfig::default();
        assert!(is_graduate_level("CSCI-6100", &config));
        assert!(is_graduate_level("MATH-9999", &config));
        assert!(!is_graduate_level("CSCI-4100", &config));
        assert!(!is_graduate_level("CSCI", &config));
        assert!(!is_graduate_level("CSCI-X100", &config));
        let disabled = LayoutConfig {
            graduate_level: None,
            ..LayoutConfig::default()
        };
        assert!(!is_graduate_level("CSCI-6100", &disabled));
    }

    #[test]
    fn validate_flags_misordered_prerequisites() {
        let mut store = store_with(&["A", "B"]);
        store.create_edge("B", "A", EdgeKind::Prerequisite).unwrap();
        set_col_num(&mut store, "A", 0, false).unwrap();
        set_col_num(&mut store, "B", 0, false).unwrap();
        let problems = validate_layout(&store);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("prerequisite A"));
    }
}
