use prereq_graph::loader::{LoadState, parse_payload};
use prereq_graph::{Config, GraphView, PointerEvent, SvgScene, Theme};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
    release_on_leave: Option<bool>,
}

fn build_config(options: GraphRenderOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("modern") {
        config.theme = Theme::modern();
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(width) = options.width {
        config.render.width = width;
    }
    if let Some(height) = options.height {
        config.render.height = height;
    }
    if let Some(release) = options.release_on_leave {
        config.interaction.release_on_leave = release;
    }
    config
}

fn parse_options(options_json: Option<String>) -> Result<GraphRenderOptions, JsValue> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| JsValue::from_str(&error.to_string())),
        None => Ok(GraphRenderOptions::default()),
    }
}

#[wasm_bindgen]
pub fn render_prereq_svg(payload_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let graph = PrereqGraph::new(payload_json, options_json)?;
    Ok(graph.svg())
}

/// An interactive graph bound to host pointer events.
#[wasm_bindgen]
pub struct PrereqGraph {
    view: GraphView<SvgScene>,
}

#[wasm_bindgen]
impl PrereqGraph {
    #[wasm_bindgen(constructor)]
    pub fn new(payload_json: &str, options_json: Option<String>) -> Result<PrereqGraph, JsValue> {
        let config = build_config(parse_options(options_json)?);
        let scene = SvgScene::new(config.render.width, config.render.height);
        let mut view = GraphView::new(scene, config);
        if let LoadState::Failed(message) = view.finish_load(parse_payload(payload_json)) {
            return Err(JsValue::from_str(message));
        }
        Ok(Self { view })
    }

    /// Returns the id of the node picked up, if any.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> Option<String> {
        self.view.on_pointer_down(&PointerEvent::new(x, y))
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.view.on_pointer_move(&PointerEvent::new(x, y))
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.view.on_pointer_up(&PointerEvent::new(x, y));
    }

    pub fn pointer_leave(&mut self, x: f32, y: f32) {
        self.view.on_pointer_leave(&PointerEvent::new(x, y));
    }

    pub fn svg(&self) -> String {
        self.view.surface().to_svg()
    }
}
