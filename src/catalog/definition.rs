use serde::{Deserialize, Serialize};

/// The structural role a block plays in the generated program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Program entry point.
    Header,
    /// A plain statement block with a single continuation.
    Classic,
    /// A control block whose body hangs off its right connector.
    Condition,
    /// A control block whose body hangs off its right connector.
    Loop,
    /// Any type string this crate does not know; compiled like `Classic`.
    #[serde(other)]
    Other,
}

impl BlockType {
    /// Whether the block owns a nested body reached through its `right` connector.
    pub fn has_body(self) -> bool {
        matches!(self, BlockType::Condition | BlockType::Loop)
    }
}

/// Describes one user-editable field of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default = "default_field_kind")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub placeholder: String,
}

fn default_field_kind() -> String {
    "text".to_string()
}

/// A reusable block template as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(rename = "code", default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl BlockDefinition {
    /// Returns `true` when the template declares a field with this name.
    pub fn declares_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

/// A named group of block definitions, optionally contributed by a mod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub blocks: Vec<BlockDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_name: Option<String>,
}

/// The top-level shape of a catalog or mod file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Display name of a mod; unused for the main catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
}
