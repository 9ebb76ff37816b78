use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_radius: f32,
    pub stroke_thickness: f32,
    pub edge_thickness: f32,
    pub node_spacing: f32,
    pub font_size: f32,
    pub min_font_size: f32,
    /// Courses at or above this level are pushed into the last column.
    /// `None` disables the rule.
    pub graduate_level: Option<u32>,
    /// Byte offset of the level digit inside a course id (`CSCI-6100` -> 5).
    pub level_digit_index: usize,
}

impl LayoutConfig {
    /// Side length of the square viewport every node occupies.
    pub fn node_size(&self) -> f32 {
        (self.node_radius + self.stroke_thickness) * 2.0
    }

    /// Distance between the origins of two neighbouring columns or slots.
    pub fn cell_pitch(&self) -> f32 {
        self.node_size() + self.node_spacing
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_radius: 30.0,
            stroke_thickness: 2.0,
            edge_thickness: 2.0,
            node_spacing: 12.0,
            font_size: 12.0,
            min_font_size: 6.0,
            graduate_level: Some(6),
            level_digit_index: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionConfig {
    /// End an active drag when the pointer leaves the surface.
    pub release_on_leave: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 2500.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub interaction: InteractionConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::classic(),
            layout: LayoutConfig::default(),
            interaction: InteractionConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    interaction: Option<InteractionConfig>,
    render: Option<RenderConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    node_fill: Option<String>,
    node_stroke: Option<String>,
    node_text_color: Option<String>,
    prerequisite_color: Option<String>,
    corequisite_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_radius: Option<f32>,
    stroke_thickness: Option<f32>,
    edge_thickness: Option<f32>,
    node_spacing: Option<f32>,
    font_size: Option<f32>,
    min_font_size: Option<f32>,
    #[serde(default, deserialize_with = "explicit_null")]
    graduate_level: Option<Option<u32>>,
    level_digit_index: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => anyhow::bail!("unknown theme '{other}'"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.node_fill {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.node_stroke {
            config.theme.node_stroke = v;
        }
        if let Some(v) = vars.node_text_color {
            config.theme.node_text_color = v;
        }
        if let Some(v) = vars.prerequisite_color {
            config.theme.prerequisite_color = v;
        }
        if let Some(v) = vars.corequisite_color {
            config.theme.corequisite_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_radius {
            config.layout.node_radius = v;
        }
        if let Some(v) = layout.stroke_thickness {
            config.layout.stroke_thickness = v;
        }
        if let Some(v) = layout.edge_thickness {
            config.layout.edge_thickness = v;
        }
        if let Some(v) = layout.node_spacing {
            config.layout.node_spacing = v;
        }
        if let Some(v) = layout.font_size {
            config.layout.font_size = v;
        }
        if let Some(v) = layout.min_font_size {
            config.layout.min_font_size = v;
        }
        if let Some(v) = layout.graduate_level {
            config.layout.graduate_level = v;
        }
        if let Some(v) = layout.level_digit_index {
            config.layout.level_digit_index = v;
        }
    }

    if let Some(interaction) = parsed.interaction {
        config.interaction = interaction;
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
    }

    Ok(config)
}
