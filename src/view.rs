//! The interactive graph component: a store, its drawing and the drag
//! controller bound to one render surface.

use tracing::error;

use crate::config::Config;
use crate::graph::GraphStore;
use crate::interaction::InteractionController;
use crate::ir::GraphPayload;
use crate::loader::{LoadError, LoadState, load_graph};
use crate::render::{GraphRenderer, PointerEvent, RenderSurface};

pub struct GraphView<S: RenderSurface> {
    surface: S,
    store: GraphStore,
    renderer: GraphRenderer,
    controller: InteractionController,
    state: LoadState,
    config: Config,
}

impl<S: RenderSurface> GraphView<S> {
    pub fn new(surface: S, config: Config) -> Self {
        Self {
            surface,
            store: GraphStore::new(&config.layout),
            renderer: GraphRenderer::new(&config.theme, &config.layout),
            controller: InteractionController::new(config.interaction.clone()),
            state: LoadState::Pending,
            config,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn renderer(&self) -> &GraphRenderer {
        &self.renderer
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Completion callback of the payload fetch.
    ///
    /// A successful load replaces any earlier drawing on the surface. A failed
    /// fetch leaves the graph empty and records the failure in
    /// [`LoadState::Failed`].
    pub fn finish_load(&mut self, result: Result<GraphPayload, LoadError>) -> &LoadState {
        let loaded = result.and_then(|payload| load_graph(&payload, &self.config.layout));
        match loaded {
            Ok((store, report)) => {
                self.store = store;
                self.renderer = GraphRenderer::new(&self.config.theme, &self.config.layout);
                self.controller = InteractionController::new(self.config.interaction.clone());
                self.surface.clear();
                self.renderer.draw(&mut self.surface, &self.store);
                self.state = LoadState::Loaded(report);
            }
            Err(err) => {
                error!(error = %err, "graph load failed");
                self.state = LoadState::Failed(err.to_string());
            }
        }
        &self.state
    }

    pub fn on_pointer_down(&mut self, event: &PointerEvent) -> Option<String> {
        let pos = self.surface.pointer_position(event);
        self.controller
            .pointer_down(&self.store, pos)
            .map(str::to_string)
    }

    pub fn on_pointer_move(&mut self, event: &PointerEvent) -> bool {
        let pos = self.surface.pointer_position(event);
        match self.controller.pointer_move(&mut self.store, pos) {
            Some(update) => {
                self.renderer
                    .apply_drag(&mut self.surface, &self.store, &update);
                true
            }
            None => false,
        }
    }

    pub fn on_pointer_up(&mut self, _event: &PointerEvent) {
        self.controller.pointer_up();
    }

    pub fn on_pointer_leave(&mut self, _event: &PointerEvent) {
        self.controller.pointer_leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::SvgScene;

    fn view() -> GraphView<SvgScene> {
        GraphView::new(SvgScene::new(800.0, 600.0).with_origin(10.0, 10.0), Config::default())
    }

    fn payload() -> GraphPayload {
        GraphPayload::new().course("A", &[]).course("B", &["A"])
    }

    #[test]
    fn starts_pending_and_empty() {
        let view = view();
        assert!(matches!(view.state(), LoadState::Pending));
        assert!(view.surface().is_empty());
    }

    #[test]
    fn failed_fetch_is_visible() {
        let mut view = view();
        let state = view.finish_load(Err(LoadError::Source("connection refused".into())));
        match state {
            LoadState::Failed(message) => assert!(message.contains("connection refused")),
            other => panic!("unexpected state {other:?}"),
        }
        assert!(view.store().nodes().is_empty());
    }

    #[test]
    fn reloading_replaces_the_previous_drawing() {
        let mut view = view();
        view.finish_load(Ok(payload()));
        let shapes = view.surface().len();
        let layers = view.surface().children(view.surface().root()).len();

        view.finish_load(Ok(payload()));
        assert_eq!(view.surface().len(), shapes);
        assert_eq!(view.surface().children(view.surface().root()).len(), layers);
        assert_eq!(view.surface().to_svg().matches("id=\"A\"").count(), 1);
    }

    #[test]
    fn drag_updates_surface_through_pointer_query() {
        let mut view = view();
        view.finish_load(Ok(payload()));
        assert!(matches!(view.state(), LoadState::Loaded(_)));

        // A's centre is (44, 44) in surface space, (54, 54) in client space.
        let picked = view.on_pointer_down(&PointerEvent::new(54.0, 54.0));
        assert_eq!(picked.as_deref(), Some("A"));
        assert!(view.on_pointer_move(&PointerEvent::new(64.0, 74.0)));
        view.on_pointer_up(&PointerEvent::new(64.0, 74.0));
        assert!(!view.on_pointer_move(&PointerEvent::new(100.0, 100.0)));

        let shape = view.renderer().node_shape("A").unwrap();
        assert_eq!(view.surface().number(shape, "x"), Some(22.0));
        assert_eq!(view.surface().number(shape, "y"), Some(32.0));

        let edge = view.store().incident_edges("A")[0];
        let line = view.renderer().edge_line(edge).unwrap();
        let geometry = view.store().edge(edge).unwrap().geometry;
        assert_eq!(view.surface().number(line, "x2"), Some(geometry.line.x2));
    }
}
