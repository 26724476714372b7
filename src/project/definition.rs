use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// The complete, canonical block graph, ready for compilation.
/// This is the target structure for any editor format conversion.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub blocks: Vec<BlockInstance>,
    pub connections: Vec<Connection>,
}

/// A block placed in a project, referencing a catalog template.
#[derive(Debug, Clone, Default)]
pub struct BlockInstance {
    pub id: String,
    pub template: String,
    pub fields: AHashMap<String, serde_json::Value>,
    /// Soft-disabled: the block's own lines are emitted as comments.
    pub ignored: bool,
    pub layout: Option<Layout>,
}

/// Position and size on the editing canvas. Irrelevant to compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Named outgoing edge slot of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connector {
    /// Sequential continuation.
    Bottom,
    /// Nested body of a control block.
    Right,
}

impl Connector {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "bottom" => Some(Connector::Bottom),
            "right" => Some(Connector::Right),
            _ => None,
        }
    }
}

/// Defines a directed edge between two blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub from: String,
    pub from_connector: Connector,
    pub to: String,
}

impl Project {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
