use super::{BlockDefinition, BlockType, Catalog, CatalogDocument, Category, FieldDescriptor};
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const CORE_MOD_ID: &str = "core";
const CORE_MOD_NAME: &str = "Core";

impl Catalog {
    /// Parses a catalog document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document = parse_document(json, Path::new("<inline>"))?;
        Ok(Self::new(document.categories))
    }

    /// Reads a single catalog file without mods or defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let document = read_document(path.as_ref())?;
        Ok(Self::new(document.categories))
    }

    /// Loads the main catalog and merges mod catalogs as configured.
    ///
    /// A missing main catalog is created on disk from [`Catalog::default_catalog`].
    /// Mod files that cannot be read are skipped.
    pub fn load(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut document = if config.path.exists() {
            read_document(&config.path)?
        } else {
            let document = default_document();
            write_document(&config.path, &document)?;
            debug!(path = %config.path.display(), "Wrote default block catalog");
            document
        };

        for category in &mut document.categories {
            stamp_mod(category, CORE_MOD_ID, CORE_MOD_NAME);
        }
        let mut catalog = Self::new(document.categories);

        if config.allow_mods {
            catalog.extend(load_mods(&config.mods_dir));
        } else {
            debug!("Mod loading disabled");
        }
        Ok(catalog)
    }

    /// The built-in catalog: a `start` header and a single `action` block.
    pub fn default_catalog() -> Self {
        Self::new(default_document().categories)
    }
}

fn load_mods(mods_dir: &Path) -> Vec<Category> {
    let entries = match fs::read_dir(mods_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut mod_files: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    mod_files.sort();

    let mut categories = Vec::new();
    for path in mod_files {
        let mod_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match read_document(&path) {
            Ok(document) => {
                let mod_name = document.name.clone().unwrap_or_else(|| mod_id.clone());
                for mut category in document.categories {
                    stamp_mod(&mut category, &mod_id, &mod_name);
                    categories.push(category);
                }
            }
            Err(e) => warn!(mod_id = %mod_id, error = %e, "Skipping mod catalog"),
        }
    }
    categories
}

fn stamp_mod(category: &mut Category, mod_id: &str, mod_name: &str) {
    category.mod_id.get_or_insert_with(|| mod_id.to_string());
    category.mod_name.get_or_insert_with(|| mod_name.to_string());
}

fn read_document(path: &Path) -> Result<CatalogDocument, CatalogError> {
    let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&json, path)
}

fn parse_document(json: &str, path: &Path) -> Result<CatalogDocument, CatalogError> {
    serde_json::from_str(json).map_err(|e| CatalogError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write_document(path: &Path, document: &CatalogDocument) -> Result<(), CatalogError> {
    let io_err = |source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_string_pretty(document).map_err(|e| CatalogError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, json).map_err(io_err)
}

fn default_document() -> CatalogDocument {
    CatalogDocument {
        name: None,
        categories: vec![Category {
            id: "main".to_string(),
            name: "Main".to_string(),
            color: "#3498db".to_string(),
            collapsed: false,
            blocks: vec![
                BlockDefinition {
                    id: "start".to_string(),
                    name: "Start".to_string(),
                    block_type: BlockType::Header,
                    color: "#2196F3".to_string(),
                    fields: Vec::new(),
                    code: "print(\"Program started\")\n".to_string(),
                    width: Some(150.0),
                    height: Some(60.0),
                },
                BlockDefinition {
                    id: "action".to_string(),
                    name: "Action".to_string(),
                    block_type: BlockType::Classic,
                    color: "#FF9800".to_string(),
                    fields: vec![FieldDescriptor {
                        name: "action_text".to_string(),
                        label: "Action text".to_string(),
                        kind: "text".to_string(),
                        required: true,
                        placeholder: "Enter text".to_string(),
                    }],
                    code: "print(\"{action_text}\")\n".to_string(),
                    width: Some(180.0),
                    height: Some(80.0),
                },
            ],
            mod_id: None,
            mod_name: None,
        }],
    }
}
