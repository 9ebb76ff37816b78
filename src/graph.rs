use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::LayoutConfig;
use crate::layout::routing::route_edge;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node '{0}' already exists")]
    DuplicateNode(String),
    #[error("unknown node '{0}'")]
    UnknownNode(String),
    #[error("cyclic prerequisite chain starting at node {node}: {}", .chain.join(" -> "))]
    CyclicPrerequisite { node: String, chain: Vec<String> },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Line endpoints, local to the owning edge's bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LineSegment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EdgeGeometry {
    pub bounds: Rect,
    pub line: LineSegment,
}

impl EdgeGeometry {
    /// The line in surface coordinates.
    pub fn absolute_line(&self) -> LineSegment {
        LineSegment {
            x1: self.bounds.x + self.line.x1,
            y1: self.bounds.y + self.line.y1,
            x2: self.bounds.x + self.line.x2,
            y2: self.bounds.y + self.line.y2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Prerequisite,
    Corequisite,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Prerequisite => f.write_str("prerequisite"),
            EdgeKind::Corequisite => f.write_str("corequisite"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub rect: Rect,
    /// `None` until the layout places the node.
    pub column: Option<usize>,
    /// Present only on meta nodes.
    pub contains: Option<Vec<String>>,
}

impl Node {
    pub fn is_meta(&self) -> bool {
        self.contains.is_some()
    }

    pub fn center(&self) -> (f32, f32) {
        self.rect.center()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeId(pub usize);

/// A relation from the course that declares it (`start`) to the course it
/// names (`end`). For prerequisites `end` is the prerequisite.
#[derive(Debug, Clone)]
pub struct Edge {
    pub start: String,
    pub end: String,
    pub kind: EdgeKind,
    pub geometry: EdgeGeometry,
    /// Number of times the geometry has been recomputed.
    pub revision: u64,
}

#[derive(Debug, Clone)]
pub struct GraphStore {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    incident: HashMap<String, Vec<EdgeId>>,
    columns: Vec<Vec<String>>,
    config: LayoutConfig,
}

impl GraphStore {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            incident: HashMap::new(),
            columns: Vec::new(),
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn create_node(
        &mut self,
        id: &str,
        contains: Option<Vec<String>>,
    ) -> Result<&Node, GraphError> {
        if self.index.contains_key(id) {
            return Err(GraphError::DuplicateNode(id.to_string()));
        }
        let size = self.config.node_size();
        let idx = self.nodes.len();
        self.nodes.push(Node {
            id: id.to_string(),
            label: id.to_string(),
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: size,
                height: size,
            },
            column: None,
            contains,
        });
        self.index.insert(id.to_string(), idx);
        Ok(&self.nodes[idx])
    }

    /// Returns `None` without touching any incidence list when either
    /// endpoint is unknown.
    pub fn create_edge(&mut self, start: &str, end: &str, kind: EdgeKind) -> Option<EdgeId> {
        let start_rect = self.node(start)?.rect;
        let end_rect = self.node(end)?.rect;
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            start: start.to_string(),
            end: end.to_string(),
            kind,
            geometry: route_edge(&start_rect, &end_rect, self.config.edge_thickness),
            revision: 1,
        });
        self.incident.entry(start.to_string()).or_default().push(id);
        if start != end {
            self.incident.entry(end.to_string()).or_default().push(id);
        }
        Some(id)
    }

    pub fn incident_edges(&self, id: &str) -> &[EdgeId] {
        self.incident.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.index.get(id).map(|&idx| &mut self.nodes[idx])
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.0)
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().enumerate().map(|(idx, edge)| (EdgeId(idx), edge))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn columns(&self) -> &[Vec<String>] {
        &self.columns
    }

    pub fn column(&self, col: usize) -> Option<&[String]> {
        self.columns.get(col).map(Vec::as_slice)
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<Vec<String>> {
        &mut self.columns
    }

    pub fn slot_of(&self, id: &str) -> Option<usize> {
        let col = self.node(id)?.column?;
        self.columns.get(col)?.iter().position(|member| member == id)
    }
}
