//! Drawing through an abstract scene graph.
//!
//! [`RenderSurface`] is the only capability the graph needs from a host:
//! create groups and shapes, set attributes, and translate pointer events
//! into surface coordinates. [`SvgScene`] is an in-memory implementation
//! that serialises to SVG; [`GraphRenderer`] issues the drawing commands.

use crate::config::{LayoutConfig, RenderConfig};
use crate::graph::{EdgeId, GraphStore};
use crate::interaction::DragUpdate;
use crate::text_metrics::fit_font_size;
use crate::theme::Theme;
use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Attribute key carrying a text shape's content.
pub const TEXT_CONTENT: &str = "#text";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// A positioned sub-canvas with its own local coordinates.
    Viewport,
    Circle,
    Line,
    Rect,
    Text,
}

impl ShapeKind {
    fn tag(self) -> &'static str {
        match self {
            ShapeKind::Viewport => "svg",
            ShapeKind::Circle => "circle",
            ShapeKind::Line => "line",
            ShapeKind::Rect => "rect",
            ShapeKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Number(f32),
    Text(String),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            AttrValue::Number(value) => Some(*value),
            AttrValue::Text(text) => text.parse().ok(),
        }
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        AttrValue::Number(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Number(value) => f.write_str(&format_number(*value)),
            AttrValue::Text(text) => f.write_str(text),
        }
    }
}

/// A raw pointer event in host (client) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f32,
    pub client_y: f32,
}

impl PointerEvent {
    pub fn new(client_x: f32, client_y: f32) -> Self {
        Self { client_x, client_y }
    }
}

pub trait RenderSurface {
    fn root(&self) -> ShapeId;
    fn create_group(&mut self, parent: ShapeId) -> ShapeId;
    fn create_shape(&mut self, parent: ShapeId, kind: ShapeKind) -> ShapeId;
    fn set_attribute(&mut self, shape: ShapeId, key: &str, value: AttrValue);
    fn pointer_position(&self, event: &PointerEvent) -> (f32, f32);
    /// Removes every shape below the root; root attributes are kept.
    fn clear(&mut self);
}

#[derive(Debug, Clone)]
struct Element {
    tag: &'static str,
    attrs: Vec<(String, AttrValue)>,
    children: Vec<ShapeId>,
}

/// In-memory scene that renders to an SVG document.
#[derive(Debug, Clone)]
pub struct SvgScene {
    elements: Vec<Element>,
    /// Client position of the surface's top-left corner.
    origin: (f32, f32),
}

impl SvgScene {
    pub fn new(width: f32, height: f32) -> Self {
        let mut scene = Self {
            elements: vec![Element {
                tag: "svg",
                attrs: Vec::new(),
                children: Vec::new(),
            }],
            origin: (0.0, 0.0),
        };
        let root = scene.root();
        scene.set_attribute(root, "xmlns", "http://www.w3.org/2000/svg".into());
        scene.set_attribute(root, "width", width.into());
        scene.set_attribute(root, "height", height.into());
        scene
    }

    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.origin = (x, y);
        self
    }

    pub fn attribute(&self, shape: ShapeId, key: &str) -> Option<&AttrValue> {
        self.elements
            .get(shape.0)?
            .attrs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn number(&self, shape: ShapeId, key: &str) -> Option<f32> {
        self.attribute(shape, key)?.as_number()
    }

    pub fn children(&self, shape: ShapeId) -> &[ShapeId] {
        self.elements
            .get(shape.0)
            .map(|element| element.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        self.write_element(self.root(), &mut svg);
        svg
    }

    fn push(&mut self, parent: ShapeId, tag: &'static str) -> ShapeId {
        let id = ShapeId(self.elements.len());
        self.elements.push(Element {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        });
        if let Some(parent) = self.elements.get_mut(parent.0) {
            parent.children.push(id);
        }
        id
    }

    fn write_element(&self, shape: ShapeId, out: &mut String) {
        let element = &self.elements[shape.0];
        out.push('<');
        out.push_str(element.tag);
        let mut text = None;
        for (key, value) in &element.attrs {
            if key == TEXT_CONTENT {
                text = Some(value);
                continue;
            }
            out.push_str(&format!(" {}=\"{}\"", key, escape_xml(&value.to_string())));
        }
        if element.children.is_empty() && text.is_none() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = text {
            out.push_str(&escape_xml(&text.to_string()));
        }
        for child in &element.children {
            self.write_element(*child, out);
        }
        out.push_str("</");
        out.push_str(element.tag);
        out.push('>');
    }
}

impl RenderSurface for SvgScene {
    fn root(&self) -> ShapeId {
        ShapeId(0)
    }

    fn create_group(&mut self, parent: ShapeId) -> ShapeId {
        self.push(parent, "g")
    }

    fn create_shape(&mut self, parent: ShapeId, kind: ShapeKind) -> ShapeId {
        self.push(parent, kind.tag())
    }

    fn set_attribute(&mut self, shape: ShapeId, key: &str, value: AttrValue) {
        let Some(element) = self.elements.get_mut(shape.0) else {
            return;
        };
        match element.attrs.iter_mut().find(|(name, _)| name == key) {
            Some((_, existing)) => *existing = value,
            None => element.attrs.push((key.to_string(), value)),
        }
    }

    fn pointer_position(&self, event: &PointerEvent) -> (f32, f32) {
        (event.client_x - self.origin.0, event.client_y - self.origin.1)
    }

    fn clear(&mut self) {
        self.elements.truncate(1);
        if let Some(root) = self.elements.first_mut() {
            root.children.clear();
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeShapes {
    viewport: ShapeId,
}

#[derive(Debug, Clone, Copy)]
struct EdgeShapes {
    viewport: ShapeId,
    line: ShapeId,
}

/// Draws a graph store into a surface and keeps shapes in step with it.
#[derive(Debug, Clone)]
pub struct GraphRenderer {
    theme: Theme,
    config: LayoutConfig,
    layers: Option<(ShapeId, ShapeId)>,
    nodes: HashMap<String, NodeShapes>,
    edges: HashMap<EdgeId, EdgeShapes>,
}

impl GraphRenderer {
    pub fn new(theme: &Theme, config: &LayoutConfig) -> Self {
        Self {
            theme: theme.clone(),
            config: config.clone(),
            layers: None,
            nodes: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    pub fn node_shape(&self, id: &str) -> Option<ShapeId> {
        self.nodes.get(id).map(|shapes| shapes.viewport)
    }

    pub fn edge_shape(&self, id: EdgeId) -> Option<ShapeId> {
        self.edges.get(&id).map(|shapes| shapes.viewport)
    }

    pub fn edge_line(&self, id: EdgeId) -> Option<ShapeId> {
        self.edges.get(&id).map(|shapes| shapes.line)
    }

    /// Creates shapes for everything not drawn yet, then syncs every shape.
    pub fn draw<S: RenderSurface>(&mut self, surface: &mut S, store: &GraphStore) {
        let (edge_layer, node_layer) = self.ensure_layers(surface);

        for (id, edge) in store.edges() {
            if self.edges.contains_key(&id) {
                continue;
            }
            let viewport = surface.create_shape(edge_layer, ShapeKind::Viewport);
            surface.set_attribute(viewport, "overflow", "visible".into());
            let line = surface.create_shape(viewport, ShapeKind::Line);
            surface.set_attribute(line, "stroke-width", self.config.edge_thickness.into());
            surface.set_attribute(line, "stroke", self.theme.edge_color(edge.kind).into());
            self.edges.insert(id, EdgeShapes { viewport, line });
        }

        for node in store.nodes() {
            if self.nodes.contains_key(&node.id) {
                continue;
            }
            let viewport = self.draw_node(surface, node_layer, &node.id, &node.label);
            self.nodes.insert(node.id.clone(), NodeShapes { viewport });
        }

        for node in store.nodes() {
            self.sync_node(surface, store, &node.id);
        }
        for (id, _) in store.edges() {
            self.sync_edge(surface, store, id);
        }
    }

    fn ensure_layers<S: RenderSurface>(&mut self, surface: &mut S) -> (ShapeId, ShapeId) {
        if let Some(layers) = self.layers {
            return layers;
        }
        let root = surface.root();
        let background = surface.create_shape(root, ShapeKind::Rect);
        surface.set_attribute(background, "width", "100%".into());
        surface.set_attribute(background, "height", "100%".into());
        surface.set_attribute(background, "fill", self.theme.background.as_str().into());
        // Edges sit underneath nodes.
        let edge_layer = surface.create_group(root);
        surface.set_attribute(edge_layer, "id", "edges".into());
        let node_layer = surface.create_group(root);
        surface.set_attribute(node_layer, "id", "nodes".into());
        self.layers = Some((edge_layer, node_layer));
        (edge_layer, node_layer)
    }

    fn draw_node<S: RenderSurface>(
        &self,
        surface: &mut S,
        layer: ShapeId,
        id: &str,
        label: &str,
    ) -> ShapeId {
        let radius = self.config.node_radius;
        let stroke = self.config.stroke_thickness;
        let size = self.config.node_size();
        let center = radius + stroke;

        let viewport = surface.create_shape(layer, ShapeKind::Viewport);
        surface.set_attribute(viewport, "id", id.into());
        surface.set_attribute(viewport, "width", size.into());
        surface.set_attribute(viewport, "height", size.into());

        let circle = surface.create_shape(viewport, ShapeKind::Circle);
        surface.set_attribute(circle, "cx", center.into());
        surface.set_attribute(circle, "cy", center.into());
        surface.set_attribute(circle, "r", radius.into());
        surface.set_attribute(circle, "stroke", self.theme.node_stroke.as_str().into());
        surface.set_attribute(circle, "stroke-width", stroke.into());
        surface.set_attribute(circle, "fill", self.theme.node_fill.as_str().into());

        let font_size = fit_font_size(
            label,
            &self.theme.font_family,
            self.config.font_size,
            self.config.min_font_size,
            radius * 2.0 - stroke * 2.0,
        );
        let text = surface.create_shape(viewport, ShapeKind::Text);
        surface.set_attribute(text, "x", center.into());
        surface.set_attribute(text, "y", center.into());
        surface.set_attribute(text, "font-family", self.theme.font_family.as_str().into());
        surface.set_attribute(text, "font-size", format!("{}px", format_number(font_size)).into());
        surface.set_attribute(text, "fill", self.theme.node_text_color.as_str().into());
        surface.set_attribute(text, "text-anchor", "middle".into());
        surface.set_attribute(text, "alignment-baseline", "central".into());
        surface.set_attribute(text, "style", "user-select: none".into());
        surface.set_attribute(text, TEXT_CONTENT, label.into());
        viewport
    }

    pub fn sync_node<S: RenderSurface>(&self, surface: &mut S, store: &GraphStore, id: &str) {
        let (Some(shapes), Some(node)) = (self.nodes.get(id), store.node(id)) else {
            return;
        };
        surface.set_attribute(shapes.viewport, "x", node.rect.x.into());
        surface.set_attribute(shapes.viewport, "y", node.rect.y.into());
        let column = node.column.map(|col| col as f32).unwrap_or(-1.0);
        surface.set_attribute(shapes.viewport, "data-column", column.into());
    }

    pub fn sync_edge<S: RenderSurface>(&self, surface: &mut S, store: &GraphStore, id: EdgeId) {
        let (Some(shapes), Some(edge)) = (self.edges.get(&id), store.edge(id)) else {
            return;
        };
        let bounds = edge.geometry.bounds;
        let line = edge.geometry.line;
        surface.set_attribute(shapes.viewport, "x", bounds.x.into());
        surface.set_attribute(shapes.viewport, "y", bounds.y.into());
        surface.set_attribute(shapes.viewport, "width", bounds.width.into());
        surface.set_attribute(shapes.viewport, "height", bounds.height.into());
        surface.set_attribute(shapes.line, "x1", line.x1.into());
        surface.set_attribute(shapes.line, "y1", line.y1.into());
        surface.set_attribute(shapes.line, "x2", line.x2.into());
        surface.set_attribute(shapes.line, "y2", line.y2.into());
    }

    /// Pushes one drag step to the surface.
    pub fn apply_drag<S: RenderSurface>(
        &self,
        surface: &mut S,
        store: &GraphStore,
        update: &DragUpdate,
    ) {
        self.sync_node(surface, store, &update.node);
        for edge in &update.rerouted {
            self.sync_edge(surface, store, *edge);
        }
    }
}

/// Smallest canvas that shows every node with a trailing margin.
pub fn content_extent(store: &GraphStore) -> (f32, f32) {
    let margin = store.config().node_spacing;
    store.nodes().iter().fold((0.0f32, 0.0f32), |(w, h), node| {
        (
            w.max(node.rect.x + node.rect.width + margin),
            h.max(node.rect.y + node.rect.height + margin),
        )
    })
}

/// Lays the whole store out on a fresh scene sized to fit it.
pub fn render_svg(store: &GraphStore, theme: &Theme, render: &RenderConfig) -> String {
    let (content_w, content_h) = content_extent(store);
    let mut scene = SvgScene::new(render.width.max(content_w), render.height.max(content_h));
    let mut renderer = GraphRenderer::new(theme, store.config());
    renderer.draw(&mut scene, store);
    scene.to_svg()
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("Invalid render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn format_number(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
