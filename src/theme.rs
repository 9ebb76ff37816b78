use crate::graph::EdgeKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub node_fill: String,
    pub node_stroke: String,
    pub node_text_color: String,
    pub prerequisite_color: String,
    pub corequisite_color: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            node_fill: "rgb(200,200,255)".to_string(),
            node_stroke: "black".to_string(),
            node_text_color: "black".to_string(),
            prerequisite_color: "red".to_string(),
            corequisite_color: "green".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            node_fill: "#F8FAFF".to_string(),
            node_stroke: "#7A8AA6".to_string(),
            node_text_color: "#1C2430".to_string(),
            prerequisite_color: "#D9485F".to_string(),
            corequisite_color: "#2F9E6E".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn edge_color(&self, kind: EdgeKind) -> &str {
        match kind {
            EdgeKind::Prerequisite => &self.prerequisite_color,
            EdgeKind::Corequisite => &self.corequisite_color,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
