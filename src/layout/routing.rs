//! Straight-line edge routing between two node viewports.
//!
//! Every edge is drawn as a viewport spanning the two node centres, padded by
//! half the edge thickness on each side, with a single line running corner to
//! corner. Geometry is recomputed explicitly whenever an endpoint moves; this
//! module only reads node rects and writes edge geometry.

use crate::graph::{EdgeGeometry, EdgeId, GraphStore, LineSegment, Rect};

pub fn route_edge(start: &Rect, end: &Rect, thickness: f32) -> EdgeGeometry {
    let (start_x, start_y) = start.center();
    let (end_x, end_y) = end.center();

    let min_x = start_x.min(end_x);
    let max_x = start_x.max(end_x);
    let min_y = start_y.min(end_y);
    let max_y = start_y.max(end_y);

    let span_x = max_x - min_x;
    let span_y = max_y - min_y;
    let half = thickness / 2.0;

    let bounds = Rect {
        x: min_x - half,
        y: min_y - half,
        width: span_x + thickness,
        height: span_y + thickness,
    };

    // x1/y1 always belong to the start node.
    let (x1, x2) = if start_x == min_x {
        (half, span_x + half)
    } else {
        (span_x + half, half)
    };
    let (y1, y2) = if start_y == min_y {
        (half, span_y + half)
    } else {
        (span_y + half, half)
    };

    EdgeGeometry {
        bounds,
        line: LineSegment { x1, y1, x2, y2 },
    }
}

/// Recomputes one edge from its endpoints' current rects.
pub fn recalculate_edge(store: &mut GraphStore, id: EdgeId) {
    let Some(edge) = store.edge(id) else {
        return;
    };
    let (Some(start), Some(end)) = (store.node(&edge.start), store.node(&edge.end)) else {
        return;
    };
    let geometry = route_edge(&start.rect, &end.rect, store.config().edge_thickness);
    if let Some(edge) = store.edge_mut(id) {
        edge.geometry = geometry;
        edge.revision += 1;
    }
}

/// Recomputes every edge incident to `node_id` and returns their ids.
pub fn fix_edges(store: &mut GraphStore, node_id: &str) -> Vec<EdgeId> {
    let edges = store.incident_edges(node_id).to_vec();
    for &edge in &edges {
        recalculate_edge(store, edge);
    }
    edges
}
