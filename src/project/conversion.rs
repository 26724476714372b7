use super::definition::Project;
use crate::error::ProjectConversionError;

/// A trait for editor documents that can be converted into a canonical `Project`.
///
/// This keeps the compiler independent of any particular save format. Implement it on
/// your own document structs to feed them to the [`Compiler`](crate::compiler::Compiler).
///
/// # Example
///
/// ```rust,no_run
/// use turtcd::prelude::*;
/// use turtcd::error::ProjectConversionError;
///
/// struct Step { id: String, template: String, next: Option<String> }
/// struct Script { steps: Vec<Step> }
///
/// impl IntoProject for Script {
///     fn into_project(self) -> Result<Project, ProjectConversionError> {
///         let mut project = Project::default();
///         for step in self.steps {
///             if let Some(next) = &step.next {
///                 project.connections.push(Connection {
///                     from: step.id.clone(),
///                     from_connector: Connector::Bottom,
///                     to: next.clone(),
///                 });
///             }
///             project.blocks.push(BlockInstance {
///                 id: step.id,
///                 template: step.template,
///                 ..Default::default()
///             });
///         }
///         Ok(project)
///     }
/// }
/// ```
pub trait IntoProject {
    /// Consumes the document and converts it into a compiler-ready project.
    fn into_project(self) -> Result<Project, ProjectConversionError>;
}

impl IntoProject for Project {
    fn into_project(self) -> Result<Project, ProjectConversionError> {
        Ok(self)
    }
}
