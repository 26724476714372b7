//! File-mutation sandbox for spawned programs.
//!
//! The sandbox is a prelude of generated source that runs ahead of the user's program in
//! the same interpreter and rebinds the runtime's file-mutation entry points. It is a
//! policy layer inside the child process, not an OS-level boundary: anything that reaches
//! the kernel without going through those entry points is not seen.

mod prelude;

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Enforcement strength for a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyLevel {
    /// No restriction.
    Full,
    /// Mutations are refused inside the trusted project path and the engine's own directories.
    Limited,
    /// Every mutation is refused.
    Restricted,
}

impl FromStr for PolicyLevel {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(PolicyLevel::Full),
            "limited" => Ok(PolicyLevel::Limited),
            "restricted" => Ok(PolicyLevel::Restricted),
            _ => Err(PolicyError::UnknownLevel(s.to_string())),
        }
    }
}

impl fmt::Display for PolicyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyLevel::Full => "full",
            PolicyLevel::Limited => "limited",
            PolicyLevel::Restricted => "restricted",
        };
        f.write_str(name)
    }
}

/// Directories that belong to the hosting application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineRoots {
    /// Installation root; the directory itself and the files directly inside it are protected.
    pub app_root: PathBuf,
    pub projects_dir: PathBuf,
    pub compiled_dir: PathBuf,
    pub source_dir: PathBuf,
}

impl EngineRoots {
    pub fn from_app_root(app_root: impl Into<PathBuf>) -> Self {
        let app_root = app_root.into();
        Self {
            projects_dir: app_root.join("projects"),
            compiled_dir: app_root.join("compiled"),
            source_dir: app_root.join("source"),
            app_root,
        }
    }
}

impl Default for EngineRoots {
    fn default() -> Self {
        Self::from_app_root(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

/// How much of the file tree under a protected path is covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootScope {
    /// The path and everything beneath it.
    Tree,
    /// The path and its immediate children only.
    Shallow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedRoot {
    pub path: PathBuf,
    pub scope: RootScope,
}

/// A resolved sandbox policy, ready to be rendered as a prelude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxPolicy {
    Full,
    Limited { protected: Vec<ProtectedRoot> },
    Restricted,
}

impl SandboxPolicy {
    pub fn new(level: PolicyLevel, trusted_project_path: &Path, roots: &EngineRoots) -> Self {
        match level {
            PolicyLevel::Full => SandboxPolicy::Full,
            PolicyLevel::Restricted => SandboxPolicy::Restricted,
            PolicyLevel::Limited => {
                let candidates = [
                    (trusted_project_path, RootScope::Tree),
                    (roots.projects_dir.as_path(), RootScope::Tree),
                    (roots.compiled_dir.as_path(), RootScope::Tree),
                    (roots.source_dir.as_path(), RootScope::Tree),
                    (roots.app_root.as_path(), RootScope::Shallow),
                ];
                let protected = candidates
                    .into_iter()
                    .filter(|(path, _)| !path.as_os_str().is_empty())
                    .map(|(path, scope)| ProtectedRoot {
                        path: path.to_path_buf(),
                        scope,
                    })
                    .collect();
                SandboxPolicy::Limited { protected }
            }
        }
    }

    pub fn level(&self) -> PolicyLevel {
        match self {
            SandboxPolicy::Full => PolicyLevel::Full,
            SandboxPolicy::Limited { .. } => PolicyLevel::Limited,
            SandboxPolicy::Restricted => PolicyLevel::Restricted,
        }
    }

    /// Renders the policy as source text to run before the user's program.
    /// `Full` renders as an empty string.
    pub fn prelude(&self) -> String {
        prelude::render(self)
    }
}

/// Builds the sandbox prelude for a policy level. Pure: performs no I/O.
pub fn build_prelude(level: PolicyLevel, trusted_project_path: &Path, roots: &EngineRoots) -> String {
    SandboxPolicy::new(level, trusted_project_path, roots).prelude()
}
