use super::template::{layout_lines, render};
use super::{CompilerOptions, Diagnostic};
use crate::catalog::{BlockCatalog, BlockDefinition};
use crate::project::{BlockInstance, Connection, Connector, Project};
use ahash::{AHashMap, AHashSet};
use tracing::debug;

/// Walks a project's block graph and emits indented source lines.
///
/// The walk is depth-first over an explicit stack: a control block's body subtree is
/// emitted completely before its continuation, and every block is emitted at most once.
pub(super) struct CodeBuilder<'a, C: BlockCatalog + ?Sized> {
    catalog: &'a C,
    options: &'a CompilerOptions,
    blocks: AHashMap<&'a str, &'a BlockInstance>,
    outgoing: AHashMap<(&'a str, Connector), &'a Connection>,
    visited: AHashSet<&'a str>,
    lines: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, C: BlockCatalog + ?Sized> CodeBuilder<'a, C> {
    pub(super) fn new(project: &'a Project, catalog: &'a C, options: &'a CompilerOptions) -> Self {
        let mut blocks = AHashMap::with_capacity(project.blocks.len());
        for block in &project.blocks {
            blocks.entry(block.id.as_str()).or_insert(block);
        }

        // The first connection declared for a (block, connector) pair is authoritative.
        let mut outgoing = AHashMap::with_capacity(project.connections.len());
        for conn in &project.connections {
            outgoing
                .entry((conn.from.as_str(), conn.from_connector))
                .or_insert(conn);
        }

        Self {
            catalog,
            options,
            blocks,
            outgoing,
            visited: AHashSet::new(),
            lines: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Finds the first block whose template is a header.
    pub(super) fn find_entry(project: &'a Project, catalog: &C) -> Option<&'a BlockInstance> {
        project.blocks.iter().find(|b| {
            catalog
                .get_definition(&b.template)
                .is_some_and(|d| d.block_type == crate::catalog::BlockType::Header)
        })
    }

    pub(super) fn build(mut self, entry: &'a str) -> (Vec<String>, Vec<Diagnostic>) {
        let mut stack: Vec<(&'a str, usize)> = vec![(entry, 0)];

        while let Some((block_id, depth)) = stack.pop() {
            if !self.visited.insert(block_id) {
                self.report(Diagnostic::Revisited {
                    block_id: block_id.to_string(),
                });
                continue;
            }
            let Some(block) = self.blocks.get(block_id).copied() else {
                self.report(Diagnostic::MissingBlock {
                    block_id: block_id.to_string(),
                });
                continue;
            };
            let Some(definition) = self.catalog.get_definition(&block.template) else {
                self.report(Diagnostic::UnresolvedTemplate {
                    block_id: block_id.to_string(),
                    template: block.template.clone(),
                });
                continue;
            };

            self.emit(block, definition, depth);

            // Pushed in reverse: the body is popped (and fully walked) before the continuation.
            if let Some(next) = self.target(block_id, Connector::Bottom) {
                stack.push((next, depth));
            }
            if definition.block_type.has_body() {
                if let Some(body) = self.target(block_id, Connector::Right) {
                    stack.push((body, depth + 1));
                }
            }
        }

        (self.lines, self.diagnostics)
    }

    fn emit(&mut self, block: &BlockInstance, definition: &BlockDefinition, depth: usize) {
        let rendered = render(definition, block);
        let indent = self.options.indent.unit().repeat(depth);
        let marker = block
            .ignored
            .then_some(self.options.comment_marker.as_str());
        self.lines
            .extend(layout_lines(&rendered, &indent, marker));
    }

    fn target(&self, block_id: &'a str, connector: Connector) -> Option<&'a str> {
        self.outgoing
            .get(&(block_id, connector))
            .map(|conn| conn.to.as_str())
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        debug!(%diagnostic, "Compiler skipped a block");
        self.diagnostics.push(diagnostic);
    }
}
