//! Prelude module for convenient imports
//!
//! Re-exports the types most hosts need to load a catalog, compile a project and run it.
//!
//! # Example
//!
//! ```rust,no_run
//! use turtcd::prelude::*;
//!
//! # fn run_example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::from_file("turtcd.json")?;
//! let catalog = Catalog::load(&config.catalog)?;
//! let project = UiProject::from_file("projects/demo.json")?.into_project()?;
//!
//! let output = Compiler::builder(&catalog)
//!     .with_config(&config.compiler)
//!     .build()
//!     .compile_with_diagnostics(&project);
//! for diagnostic in &output.diagnostics {
//!     eprintln!("skipped: {}", diagnostic);
//! }
//! println!("{}", output.source);
//! # Ok(())
//! # }
//! ```

// Catalog
pub use crate::catalog::{BlockCatalog, BlockDefinition, BlockType, Catalog, Category};

// Project model and editor format
pub use crate::project::{BlockInstance, Connection, Connector, IntoProject, Project};
pub use crate::ui::UiProject;

// Compilation
pub use crate::compiler::{CompilationOutput, Compiler, Diagnostic, IndentStyle};

// Execution
pub use crate::sandbox::{EngineRoots, PolicyLevel};
pub use crate::session::{SessionConfig, SessionId, SessionManager, SessionState};

// Configuration
pub use crate::config::EngineConfig;

// Error types
pub use crate::error::{
    CatalogError, ConfigError, PolicyError, ProjectConversionError, SessionError,
};
