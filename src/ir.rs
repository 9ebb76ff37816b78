use serde::{Deserialize, Serialize};

/// Graph description served by the prerequisite data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(default, alias = "CSCI_nodes")]
    pub nodes: Vec<CoursePayload>,
    #[serde(default)]
    pub meta_nodes: Vec<MetaNodePayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoursePayload {
    #[serde(alias = "course_uid")]
    pub id: String,
    #[serde(default, alias = "prereq_formula")]
    pub prerequisite_formula: Vec<String>,
    #[serde(default, alias = "coreq_formula")]
    pub corequisite_formula: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaNodePayload {
    #[serde(alias = "meta_uid")]
    pub id: String,
    #[serde(default)]
    pub contains: Vec<String>,
}

impl GraphPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn course(mut self, id: &str, prerequisites: &[&str]) -> Self {
        self.nodes.push(CoursePayload {
            id: id.to_string(),
            prerequisite_formula: prerequisites.iter().map(|s| s.to_string()).collect(),
            corequisite_formula: Vec::new(),
        });
        self
    }

    pub fn corequisites(mut self, id: &str, corequisites: &[&str]) -> Self {
        if let Some(course) = self.nodes.iter_mut().find(|course| course.id == id) {
            course
                .corequisite_formula
                .extend(corequisites.iter().map(|s| s.to_string()));
        }
        self
    }

    pub fn meta(mut self, id: &str, contains: &[&str]) -> Self {
        self.meta_nodes.push(MetaNodePayload {
            id: id.to_string(),
            contains: contains.iter().map(|s| s.to_string()).collect(),
        });
        self
    }
}
