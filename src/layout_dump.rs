use crate::graph::{EdgeGeometry, EdgeKind, GraphStore, Rect};
use crate::loader::LoadReport;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub columns: Vec<Vec<String>>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub report: LoadReport,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub column: Option<usize>,
    pub slot: Option<usize>,
    pub rect: Rect,
    pub contains: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub start: String,
    pub end: String,
    pub kind: EdgeKind,
    pub geometry: EdgeGeometry,
}

impl LayoutDump {
    pub fn from_store(store: &GraphStore, report: &LoadReport) -> Self {
        let nodes = store
            .nodes()
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                column: node.column,
                slot: store.slot_of(&node.id),
                rect: node.rect,
                contains: node.contains.clone(),
            })
            .collect();

        let edges = store
            .edges()
            .map(|(_, edge)| EdgeDump {
                start: edge.start.clone(),
                end: edge.end.clone(),
                kind: edge.kind,
                geometry: edge.geometry,
            })
            .collect();

        LayoutDump {
            columns: store.columns().to_vec(),
            nodes,
            edges,
            report: report.clone(),
        }
    }
}

pub fn write_layout_dump(path: &Path, store: &GraphStore, report: &LoadReport) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_store(store, report);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::GraphPayload;
    use crate::loader::load_graph;

    #[test]
    fn dump_serialises_columns_and_geometry() {
        let payload = GraphPayload::new()
            .course("A", &[])
            .course("B", &["A"])
            .meta("AB", &["A", "B"]);
        let (store, report) = load_graph(&payload, &LayoutConfig::default()).unwrap();
        let value = serde_json::to_value(LayoutDump::from_store(&store, &report)).unwrap();

        assert_eq!(value["columns"][0][0], "A");
        assert_eq!(value["columns"][1], serde_json::json!(["B", "AB"]));
        let meta = value["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|node| node["id"] == "AB")
            .unwrap();
        assert_eq!(meta["column"], 1);
        assert_eq!(meta["slot"], 1);
        assert_eq!(value["edges"][0]["kind"], "prerequisite");
        assert_eq!(value["edges"][0]["geometry"]["bounds"]["width"], 78.0);
        assert_eq!(value["report"]["skipped_edges"], 0);
    }
}
