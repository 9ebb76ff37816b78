//! Pointer-driven node dragging.
//!
//! A drag moves a node freely in pixel space; it never changes the node's
//! column or slot.

use tracing::debug;

use crate::config::InteractionConfig;
use crate::graph::{EdgeId, GraphStore};
use crate::layout::fix_edges;

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        node: String,
        /// Last pointer position seen; deltas are taken against it.
        anchor: (f32, f32),
    },
}

/// What a single pointer move changed.
#[derive(Debug, Clone, PartialEq)]
pub struct DragUpdate {
    pub node: String,
    pub delta: (f32, f32),
    pub rerouted: Vec<EdgeId>,
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    state: DragState,
    config: InteractionConfig,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            state: DragState::Idle,
            config,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn drag_node(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { node, .. } => Some(node),
            DragState::Idle => None,
        }
    }

    /// Starts dragging the node whose centre is nearest to `pos`, provided
    /// the pointer lies within one node radius of that centre.
    ///
    /// A press during a drag whose release was missed re-anchors the drag at
    /// `pos`, so the next move only carries the new pointer delta.
    pub fn pointer_down(&mut self, store: &GraphStore, pos: (f32, f32)) -> Option<&str> {
        if let DragState::Dragging { anchor, .. } = &mut self.state {
            *anchor = pos;
        }
        let radius = store.config().node_radius;
        let nearest = closest_node(store, pos)?;
        if nearest.1 > radius {
            return None;
        }
        debug!(node = nearest.0, x = pos.0, y = pos.1, "drag start");
        self.state = DragState::Dragging {
            node: nearest.0.to_string(),
            anchor: pos,
        };
        self.drag_node()
    }

    pub fn pointer_move(&mut self, store: &mut GraphStore, pos: (f32, f32)) -> Option<DragUpdate> {
        let DragState::Dragging { node, anchor } = &mut self.state else {
            return None;
        };
        let delta = (pos.0 - anchor.0, pos.1 - anchor.1);
        let dragged = store.node_mut(node)?;
        dragged.rect.x += delta.0;
        dragged.rect.y += delta.1;
        let rerouted = fix_edges(store, node);
        *anchor = pos;
        Some(DragUpdate {
            node: node.clone(),
            delta,
            rerouted,
        })
    }

    pub fn pointer_up(&mut self) {
        if let DragState::Dragging { node, .. } = &self.state {
            debug!(node = %node, "drag end");
        }
        self.state = DragState::Idle;
    }

    /// Ends the drag only when configured to release on leave.
    pub fn pointer_leave(&mut self) {
        if self.config.release_on_leave {
            self.pointer_up();
        }
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

/// Nearest node centre to `pos` and its distance.
pub fn closest_node(store: &GraphStore, pos: (f32, f32)) -> Option<(&str, f32)> {
    store
        .nodes()
        .iter()
        .map(|node| {
            let (cx, cy) = node.center();
            (node.id.as_str(), (cx - pos.0).hypot(cy - pos.1))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
