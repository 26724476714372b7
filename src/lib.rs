//! # turtcd - Block Program Compiler and Execution Engine
//!
//! **turtcd** turns visual block programs into indented source text and runs that source
//! in interactive, sandboxed interpreter sessions.
//!
//! ## Core Workflow
//!
//! 1.  **Load a catalog**: block templates come from a [`Catalog`](catalog::Catalog), either
//!     the built-in default, a JSON file, or a main file plus mod files.
//! 2.  **Convert to a `Project`**: editor documents ([`UiProject`](ui::UiProject)) or your own
//!     structs implement [`IntoProject`](project::IntoProject).
//! 3.  **Compile**: [`Compiler::builder`](compiler::Compiler::builder) walks the block graph
//!     from its header block and emits the program.
//! 4.  **Run**: a [`SessionManager`](session::SessionManager) spawns the program behind a
//!     sandbox prelude, streams its output and feeds it input.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use turtcd::prelude::*;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Catalog::default_catalog();
//!     let project = UiProject::from_file("projects/hello.json")?.into_project()?;
//!
//!     let source = Compiler::builder(&catalog).build().compile(&project);
//!
//!     let sessions = SessionManager::new(SessionConfig::default());
//!     let id = sessions.start(&source, PolicyLevel::Limited, Path::new("projects/hello"))?;
//!     while sessions.state(&id)? == SessionState::Running {
//!         print!("{}", sessions.read(&id)?);
//!         std::thread::sleep(Duration::from_millis(50));
//!     }
//!     print!("{}", sessions.read(&id)?);
//!     sessions.stop(&id)?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod compiler;
pub mod config;
pub mod error;
pub mod prelude;
pub mod project;
pub mod sandbox;
pub mod session;
pub mod ui;
