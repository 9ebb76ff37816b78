pub mod config;
pub mod graph;
pub mod interaction;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod loader;
pub mod render;
pub mod text_metrics;
pub mod theme;
pub mod view;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, InteractionConfig, LayoutConfig, RenderConfig, load_config};
pub use graph::{Edge, EdgeGeometry, EdgeId, EdgeKind, GraphError, GraphStore, Node, Rect};
pub use interaction::{DragState, DragUpdate, InteractionController};
pub use ir::{CoursePayload, GraphPayload, MetaNodePayload};
pub use layout::{LayoutReport, layout_columns, validate_layout};
pub use loader::{LoadError, LoadReport, LoadState, load_graph, parse_payload};
pub use render::{GraphRenderer, PointerEvent, RenderSurface, SvgScene, render_svg};
pub use theme::Theme;
pub use view::GraphView;
