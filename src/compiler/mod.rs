use crate::catalog::BlockCatalog;
use crate::config::CompilerConfig;
use crate::project::Project;
use std::fmt;

mod builder;
mod template;

use builder::CodeBuilder;

pub const DEFAULT_PLACEHOLDER: &str = "# No blocks in project";
pub const DEFAULT_COMMENT_MARKER: &str = "# ";

/// One unit of indentation in the generated source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentStyle {
    Spaces(usize),
    Tab,
}

impl IndentStyle {
    pub fn unit(self) -> String {
        match self {
            IndentStyle::Spaces(n) => " ".repeat(n),
            IndentStyle::Tab => "\t".to_string(),
        }
    }
}

impl Default for IndentStyle {
    fn default() -> Self {
        IndentStyle::Spaces(4)
    }
}

/// Something the compiler skipped. Never fatal: the output simply omits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The project has blocks but none of them resolves to a header template.
    NoEntryBlock,
    /// A connection points at a block id that is not in the project.
    MissingBlock { block_id: String },
    /// The block references a template the catalog does not know.
    UnresolvedTemplate { block_id: String, template: String },
    /// The block was reached a second time (cycle or converging edges).
    Revisited { block_id: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoEntryBlock => write!(f, "no header block found"),
            Diagnostic::MissingBlock { block_id } => {
                write!(f, "connection targets missing block '{}'", block_id)
            }
            Diagnostic::UnresolvedTemplate { block_id, template } => write!(
                f,
                "block '{}' references unknown template '{}'",
                block_id, template
            ),
            Diagnostic::Revisited { block_id } => {
                write!(f, "block '{}' already emitted", block_id)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilationOutput {
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompilerOptions {
    indent: IndentStyle,
    comment_marker: String,
    placeholder: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            indent: IndentStyle::default(),
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Turns a block graph into indented source text.
///
/// A compiler borrows its catalog and keeps no state between calls; the same project
/// always compiles to byte-identical output.
pub struct Compiler<'c, C: BlockCatalog + ?Sized> {
    catalog: &'c C,
    options: CompilerOptions,
}

pub struct CompilerBuilder<'c, C: BlockCatalog + ?Sized> {
    catalog: &'c C,
    options: CompilerOptions,
}

impl<'c, C: BlockCatalog + ?Sized> CompilerBuilder<'c, C> {
    pub fn new(catalog: &'c C) -> Self {
        Self {
            catalog,
            options: CompilerOptions::default(),
        }
    }
    pub fn indent(mut self, indent: IndentStyle) -> Self {
        self.options.indent = indent;
        self
    }
    pub fn comment_marker(mut self, marker: impl Into<String>) -> Self {
        self.options.comment_marker = marker.into();
        self
    }
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.options.placeholder = placeholder.into();
        self
    }
    pub fn with_config(mut self, config: &CompilerConfig) -> Self {
        self.options.indent = if config.use_tabs {
            IndentStyle::Tab
        } else {
            IndentStyle::Spaces(config.indent_width)
        };
        self.options.comment_marker = config.comment_marker.clone();
        self
    }
    pub fn build(self) -> Compiler<'c, C> {
        Compiler {
            catalog: self.catalog,
            options: self.options,
        }
    }
}

impl<'c, C: BlockCatalog + ?Sized> Compiler<'c, C> {
    pub fn builder(catalog: &'c C) -> CompilerBuilder<'c, C> {
        CompilerBuilder::new(catalog)
    }

    /// Compiles a project into source text.
    ///
    /// Unresolved templates, dangling connections and cycles degrade to partial output;
    /// use [`Compiler::compile_with_diagnostics`] to find out what was skipped.
    pub fn compile(&self, project: &Project) -> String {
        self.compile_with_diagnostics(project).source
    }

    pub fn compile_with_diagnostics(&self, project: &Project) -> CompilationOutput {
        if project.is_empty() {
            return CompilationOutput {
                source: self.options.placeholder.clone(),
                diagnostics: Vec::new(),
            };
        }

        let Some(entry) = CodeBuilder::find_entry(project, self.catalog) else {
            return CompilationOutput {
                source: String::new(),
                diagnostics: vec![Diagnostic::NoEntryBlock],
            };
        };

        let (lines, diagnostics) =
            CodeBuilder::new(project, self.catalog, &self.options).build(&entry.id);
        CompilationOutput {
            source: lines.join("\n"),
            diagnostics,
        }
    }
}
