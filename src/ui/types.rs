use crate::error::ProjectConversionError;
use crate::project::{BlockInstance, Connection, Connector, IntoProject, Layout, Project};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A block as saved by the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiBlock {
    pub id: String,
    pub template: String,
    /// Copy of the template's type made by the editor; the catalog is authoritative.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub fields: AHashMap<String, serde_json::Value>,
    #[serde(default)]
    pub ignored: bool,
}

/// An edge as saved by the editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConnection {
    pub from: String,
    #[serde(rename = "fromConnector", alias = "from_connector")]
    pub from_connector: String,
    pub to: String,
    #[serde(
        default,
        rename = "toConnector",
        alias = "to_connector",
        skip_serializing_if = "Option::is_none"
    )]
    pub to_connector: Option<String>,
}

/// Complete editor project document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiProject {
    #[serde(default)]
    pub blocks: Vec<UiBlock>,
    #[serde(default)]
    pub connections: Vec<UiConnection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
}

impl UiProject {
    pub fn from_json(json: &str) -> Result<Self, ProjectConversionError> {
        serde_json::from_str(json).map_err(|e| ProjectConversionError::JsonParseError(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProjectConversionError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            ProjectConversionError::JsonParseError(format!(
                "Could not read '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }
}

impl IntoProject for UiProject {
    fn into_project(self) -> Result<Project, ProjectConversionError> {
        let mut seen = AHashSet::new();
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for block in self.blocks {
            if !seen.insert(block.id.clone()) {
                return Err(ProjectConversionError::DuplicateBlockId(block.id));
            }
            blocks.push(BlockInstance {
                id: block.id,
                template: block.template,
                fields: block.fields,
                ignored: block.ignored,
                layout: Some(Layout {
                    x: block.x,
                    y: block.y,
                    width: block.width,
                    height: block.height,
                }),
            });
        }

        let connections = self
            .connections
            .into_iter()
            .enumerate()
            .map(|(connection_index, conn)| {
                let from_connector = Connector::parse(&conn.from_connector).ok_or_else(|| {
                    ProjectConversionError::UnknownConnector {
                        connection_index,
                        connector: conn.from_connector.clone(),
                    }
                })?;
                Ok(Connection {
                    from: conn.from,
                    from_connector,
                    to: conn.to,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Project {
            blocks,
            connections,
        })
    }
}
