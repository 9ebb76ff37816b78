use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LayoutConfig;
use crate::graph::{EdgeKind, GraphError, GraphStore};
use crate::ir::GraphPayload;
use crate::layout::{LayoutReport, layout_columns, set_col_num};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read graph payload: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid graph payload: {0}")]
    Parse(String),
    #[error("graph source failed: {0}")]
    Source(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Per-record problems found while loading; none of them abort the load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub duplicates: Vec<String>,
    /// Relations naming a course outside the dataset.
    pub skipped_edges: usize,
    pub layout: LayoutReport,
}

/// Where an asynchronous load stands, as seen by the view.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Loaded(LoadReport),
    Failed(String),
}

/// Parses a payload as JSON, falling back to JSON5 for hand-edited files.
pub fn parse_payload(input: &str) -> Result<GraphPayload, LoadError> {
    match serde_json::from_str(input) {
        Ok(payload) => Ok(payload),
        Err(strict) => json5::from_str(input).map_err(|_| LoadError::Parse(strict.to_string())),
    }
}

pub fn read_payload(path: &Path) -> Result<GraphPayload, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    parse_payload(&contents)
}

/// Builds a laid-out store from a payload.
///
/// Meta nodes are created first, then every course, then the relations, so
/// a relation may name any node in the payload regardless of order.
pub fn load_graph(
    payload: &GraphPayload,
    config: &LayoutConfig,
) -> Result<(GraphStore, LoadReport), LoadError> {
    let mut store = GraphStore::new(config);
    let mut report = LoadReport::default();

    for meta in &payload.meta_nodes {
        if let Err(err) = store.create_node(&meta.id, Some(meta.contains.clone())) {
            warn!(error = %err, "skipping meta node");
            report.duplicates.push(meta.id.clone());
        }
    }

    let mut accepted = Vec::with_capacity(payload.nodes.len());
    for course in &payload.nodes {
        match store.create_node(&course.id, None) {
            Ok(_) => accepted.push(course),
            Err(err) => {
                warn!(error = %err, "skipping course");
                report.duplicates.push(course.id.clone());
            }
        }
    }

    for course in accepted {
        let mut has_valid_edge = false;
        for prerequisite in &course.prerequisite_formula {
            match store.create_edge(&course.id, prerequisite, EdgeKind::Prerequisite) {
                Some(_) => has_valid_edge = true,
                None => {
                    debug!(course = %course.id, prerequisite = %prerequisite, "prerequisite outside dataset");
                    report.skipped_edges += 1;
                }
            }
        }
        for corequisite in &course.corequisite_formula {
            if store
                .create_edge(&course.id, corequisite, EdgeKind::Corequisite)
                .is_none()
            {
                debug!(course = %course.id, corequisite = %corequisite, "corequisite outside dataset");
                report.skipped_edges += 1;
            }
        }
        if course.prerequisite_formula.is_empty() || !has_valid_edge {
            set_col_num(&mut store, &course.id, 0, false)?;
        }
    }

    report.layout = layout_columns(&mut store)?;
    info!(
        nodes = store.nodes().len(),
        edges = store.edge_count(),
        columns = store.columns().len(),
        skipped_edges = report.skipped_edges,
        "graph loaded"
    );
    Ok((store, report))
}
