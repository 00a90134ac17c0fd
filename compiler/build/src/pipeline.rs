//! The pipeline seam toward the external elaborator.
//!
//! The orchestrator only schedules; parsing, scope resolution and type
//! checking are performed by a collaborator implementing [`Pipeline`].
//! Query answers (hover, definitions, …) come from the same seam and
//! default to empty.

use diagnostics::{error::Result, Diagnostic, ErrorCode, Reporter};
use span::Span;
use std::path::{Path, PathBuf};
use term::Term;

/// What the parse stage yields to the scheduler: the imports the module
/// consumes, already parsed.
pub struct ModuleOutline {
    pub imports: Vec<PathBuf>,
}

pub trait Pipeline: Send {
    /// Parse the source, yielding its import outline.
    fn parse(&mut self, root: &Path, source: &Path, reporter: &Reporter) -> Result<ModuleOutline>;

    /// Resolve the module's names.
    fn resolve(&mut self, source: &Path, reporter: &Reporter) -> Result<()>;

    /// Type-check the module.
    fn type_check(&mut self, source: &Path, reporter: &Reporter) -> Result<()>;

    fn definition(&self, source: &Path, offset: u32) -> Option<(PathBuf, Span)> {
        let _ = (source, offset);
        None
    }

    fn references(&self, source: &Path, offset: u32) -> Vec<(PathBuf, Span)> {
        let _ = (source, offset);
        Vec::new()
    }

    fn hover(&self, source: &Path, offset: u32) -> Option<String> {
        let _ = (source, offset);
        None
    }

    /// The elaborated term under the given offset, if any.
    fn term_at(&self, source: &Path, offset: u32) -> Option<Term> {
        let _ = (source, offset);
        None
    }

    /// Code-lens anchors: a span and the lens title.
    fn lenses(&self, source: &Path) -> Vec<(Span, String)> {
        let _ = source;
        Vec::new()
    }
}

/// A dependency-only pipeline.
///
/// It consumes the already-parsed import statements in their lexical form
/// (`import A.B`, optionally behind `open`) and maps them onto sibling
/// source files; resolution and checking are left to the elaborator seam.
pub struct ImportScanner;

impl Pipeline for ImportScanner {
    fn parse(&mut self, _root: &Path, source: &Path, reporter: &Reporter) -> Result<ModuleOutline> {
        let content = std::fs::read_to_string(source).map_err(|error| {
            Diagnostic::error()
                .code(ErrorCode::E020)
                .message(format!("could not read the source file: {error}"))
                .path(source.to_owned())
                .report(reporter)
        })?;

        let base = source.parent().unwrap_or_else(|| Path::new(""));
        let mut imports = Vec::new();

        for line in content.lines() {
            let line = line.trim_start();
            let line = line.strip_prefix("open ").unwrap_or(line);
            let Some(rest) = line.strip_prefix("import ") else {
                continue;
            };
            let module = rest.split_whitespace().next().unwrap_or_default();
            if module.is_empty() {
                continue;
            }

            let mut target = base.to_owned();
            for segment in module.split('.') {
                target.push(segment);
            }
            imports.push(target.with_extension(utility::FILE_EXTENSION));
        }

        Ok(ModuleOutline { imports })
    }

    fn resolve(&mut self, _source: &Path, _reporter: &Reporter) -> Result<()> {
        Ok(())
    }

    fn type_check(&mut self, _source: &Path, _reporter: &Reporter) -> Result<()> {
        Ok(())
    }
}
