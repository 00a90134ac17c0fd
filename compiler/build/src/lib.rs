//! The incremental build orchestrator.
//!
//! It tracks the file-dependency graph of a workspace of libraries,
//! schedules recompilation on file-system events, routes diagnostics
//! toward the editor channel and keeps at most one compilation per library
//! running. The actual compilation stages live behind the [`Pipeline`]
//! seam; reuse decisions behind the [`Advisor`] seam.

use diagnostics::{reporter::Buffer, Diagnostic, ErrorCode, Reporter, Role};
use package::{LibraryConfig, ManifestError};
use std::{
    mem,
    path::{Path, PathBuf},
};
use utility::{Conjunction, HashMap, HashSet, ListingExt};

pub use advisor::{Advisor, DefaultAdvisor};
pub use graph::{BuildGraph, CompileState};
pub use library::LibraryOwner;
pub use pipeline::{ImportScanner, ModuleOutline, Pipeline};

pub mod advisor;
pub mod graph;
pub mod library;
pub mod pipeline;
pub mod prim;


/// How deep mock-library discovery descends below a workspace folder.
const MOCK_DISCOVERY_DEPTH: usize = 1;

/// One registered library with its build state.
pub struct LibraryState {
    owner: LibraryOwner,
    graph: BuildGraph,
    /// The per-library scratch area, cleared at the start of each pass.
    diagnostics: Buffer,
    last_published: HashSet<PathBuf>,
}

impl LibraryState {
    fn new(owner: LibraryOwner) -> Self {
        let mut graph = BuildGraph::default();
        for source in owner.sources() {
            graph.insert(source.clone());
        }

        Self {
            owner,
            graph,
            diagnostics: Buffer::default(),
            last_published: HashSet::default(),
        }
    }

    pub fn owner(&self) -> &LibraryOwner {
        &self.owner
    }

    pub fn graph(&self) -> &BuildGraph {
        &self.graph
    }
}

/// A `publishDiagnostics` payload for one file. An empty list clears the
/// file's stale markers.
pub struct PublishBatch {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

/// The result of loading one library.
pub struct LoadOutcome {
    pub library: String,
    /// The compile state per file, the per-file highlight map of a pass.
    pub files: Vec<(PathBuf, CompileState)>,
    /// Ordered: diagnostics of imports precede those of their dependents.
    pub published: Vec<PublishBatch>,
}

pub struct Orchestrator {
    libraries: Vec<LibraryState>,
    pipeline: Box<dyn Pipeline>,
    advisor: Box<dyn Advisor>,
}

impl Orchestrator {
    pub fn new(pipeline: Box<dyn Pipeline>, advisor: Box<dyn Advisor>) -> Self {
        Self {
            libraries: Vec::new(),
            pipeline,
            advisor,
        }
    }

    pub fn libraries(&self) -> impl Iterator<Item = &LibraryState> {
        self.libraries.iter()
    }

    pub fn pipeline(&self) -> &dyn Pipeline {
        self.pipeline.as_ref()
    }

    /// Register the library at or above `path`; without a manifest, mock a
    /// single-file library for every discovered source beneath it.
    pub fn register_library(&mut self, path: &Path) -> Result<(), ManifestError> {
        match package::locate_library_root(path) {
            Some(root) => {
                if self
                    .libraries
                    .iter()
                    .any(|library| library.owner.identity() == root)
                {
                    return Ok(());
                }

                let config = LibraryConfig::from_library_root(&root)?;
                self.libraries
                    .push(LibraryState::new(LibraryOwner::disk(root, config)));
            }
            None => {
                for file in package::collect_source_files(path, MOCK_DISCOVERY_DEPTH) {
                    if self.find_source(&file).is_none() {
                        self.libraries
                            .push(LibraryState::new(LibraryOwner::mock(file)));
                    }
                }
            }
        }

        Ok(())
    }

    /// The library owning the given source file.
    pub fn find_source(&self, path: &Path) -> Option<&LibraryState> {
        self.libraries
            .iter()
            .find(|library| library.owner.contains(path))
    }

    fn find_source_index(&self, path: &Path) -> Option<usize> {
        self.libraries
            .iter()
            .position(|library| library.owner.contains(path))
    }

    pub fn file_created(&mut self, path: PathBuf) {
        match self
            .libraries
            .iter_mut()
            .find(|library| library.owner.claims(&path))
        {
            Some(library) => {
                if library.owner.attach_source(path.clone()) {
                    library.graph.insert(path);
                }
            }
            None => self
                .libraries
                .push(LibraryState::new(LibraryOwner::mock(path))),
        }
    }

    pub fn file_deleted(&mut self, path: &Path) {
        let Some(index) = self.find_source_index(path) else {
            return;
        };

        if self.libraries[index].owner.is_mock() {
            self.libraries.remove(index);
        } else {
            let library = &mut self.libraries[index];
            library.owner.detach_source(path);
            library.graph.remove(path);
        }
    }

    pub fn file_modified(&mut self, path: &Path) {
        if let Some(index) = self.find_source_index(path) {
            self.libraries[index].graph.mark_fresh(path);
        }
    }

    /// Run the compiler pipeline over every library and collect the
    /// diagnostics to publish.
    pub fn reload(&mut self) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();

        for library in &mut self.libraries {
            outcomes.push(load_library(
                library,
                self.pipeline.as_mut(),
                self.advisor.as_mut(),
            ));
        }

        outcomes
    }
}

fn load_library(
    library: &mut LibraryState,
    pipeline: &mut dyn Pipeline,
    advisor: &mut dyn Advisor,
) -> LoadOutcome {
    library.diagnostics.lock().unwrap().clear();
    let reporter = Reporter::buffer(library.diagnostics.clone());

    // shared across compilations of this library
    let _factory = prim::factory(library.owner.identity());

    for source in library.owner.sources() {
        library.graph.insert(source.clone());
    }

    let mut modified: Vec<PathBuf> = library
        .graph
        .nodes()
        .filter(|(_, state)| *state == CompileState::Fresh)
        .map(|(path, _)| path.to_owned())
        .collect();
    modified.sort();

    let affected: Vec<Vec<PathBuf>> = modified
        .iter()
        .map(|path| library.graph.mark_fresh(path))
        .collect();
    advisor.notify_incremental_job(&modified, &affected);

    // parse pass: (re)discover import edges. Recomputed after the
    // freshening above so newly reset dependents are included.
    let mut worklist: Vec<PathBuf> = library
        .graph
        .nodes()
        .filter(|(_, state)| *state == CompileState::Fresh)
        .map(|(path, _)| path.to_owned())
        .collect();
    worklist.sort();

    let root = library.owner.identity().to_owned();
    for source in &worklist {
        if !advisor.should_recompile(source, CompileState::Fresh) {
            continue;
        }

        match pipeline.parse(&root, source, &reporter) {
            Ok(outline) => {
                library.graph.set_imports(source, outline.imports);
                library.graph.set_state(source, CompileState::Parsed);
            }
            Err(_) => fail(&mut library.graph, source),
        }
    }

    // import cycles are elaboration errors, the graph stays a DAG
    for cycle in library.graph.cycles() {
        error_cycle(&cycle).report(&reporter);
        for source in &cycle {
            library.graph.set_state(source, CompileState::Failed);
        }
        for source in &cycle {
            for dependent in library.graph.dependents(source) {
                if !cycle.contains(&dependent) {
                    library.graph.mark_fresh(&dependent);
                }
            }
        }
    }

    // resolve and type-check in dependency order
    let order = library.graph.compilation_order();
    for source in &order {
        let Some(state) = library.graph.state(source) else {
            continue;
        };
        if !advisor.should_recompile(source, state) {
            continue;
        }

        // a failed import blocks the dependent, which stays as it is
        let blocked = library
            .graph
            .imports(source)
            .any(|import| library.graph.state(import) == Some(CompileState::Failed));
        if blocked {
            continue;
        }

        let mut state = state;
        if state == CompileState::Parsed {
            state = match pipeline.resolve(source, &reporter) {
                Ok(()) => CompileState::Resolved,
                Err(_) => CompileState::Failed,
            };
        }
        if state == CompileState::Resolved {
            state = match pipeline.type_check(source, &reporter) {
                Ok(()) => CompileState::TypeChecked,
                Err(_) => CompileState::Failed,
            };
        }

        if state == CompileState::Failed {
            fail(&mut library.graph, source);
        } else {
            library.graph.set_state(source, state);
        }
    }

    let published = publish(library, &order);

    let mut files: Vec<_> = library
        .graph
        .nodes()
        .map(|(path, state)| (path.to_owned(), state))
        .collect();
    files.sort_by(|(left, _), (right, _)| left.cmp(right));

    LoadOutcome {
        library: library.owner.name(),
        files,
        published,
    }
}

/// Group the pass's diagnostics by originating file, expand inline hints
/// into their own entries and emit clearing batches for files that had
/// diagnostics last pass but none now.
fn publish(library: &mut LibraryState, order: &[PathBuf]) -> Vec<PublishBatch> {
    let diagnostics = mem::take(&mut *library.diagnostics.lock().unwrap());

    let mut by_file: HashMap<PathBuf, Vec<Diagnostic>> = HashMap::default();
    for diagnostic in diagnostics {
        // diagnostics without a file of origin are not publishable
        let Some(path) = diagnostic.path.clone() else {
            continue;
        };
        by_file
            .entry(path)
            .or_default()
            .extend(expand_inline_hints(diagnostic));
    }

    let mut batches = Vec::new();
    for path in order {
        if let Some(diagnostics) = by_file.remove(path) {
            batches.push(PublishBatch {
                path: path.clone(),
                diagnostics,
            });
        }
    }
    let mut leftover: Vec<_> = by_file.into_iter().collect();
    leftover.sort_by(|(left, _), (right, _)| left.cmp(right));
    for (path, diagnostics) in leftover {
        batches.push(PublishBatch { path, diagnostics });
    }

    let current: HashSet<PathBuf> = batches.iter().map(|batch| batch.path.clone()).collect();
    let mut stale: Vec<_> = library
        .last_published
        .difference(&current)
        .cloned()
        .collect();
    stale.sort();
    for path in stale {
        batches.push(PublishBatch {
            path,
            diagnostics: Vec::new(),
        });
    }

    library.last_published = current;
    batches
}

/// Inline hints — labeled secondary highlights — become their own
/// per-position entries next to their carrier.
fn expand_inline_hints(diagnostic: Diagnostic) -> Vec<Diagnostic> {
    let mut hints = Vec::new();

    for highlight in &diagnostic.highlights {
        if highlight.role == Role::Secondary {
            if let Some(label) = &highlight.label {
                let mut hint = Diagnostic::debug()
                    .message(label.clone())
                    .primary_span(highlight.span);
                if let Some(path) = &diagnostic.path {
                    hint = hint.path(path.clone());
                }
                hints.push(hint);
            }
        }
    }

    let mut expanded = vec![diagnostic];
    expanded.append(&mut hints);
    expanded
}

/// Fail a node; its dependents reset to `Fresh` for the next pass.
fn fail(graph: &mut BuildGraph, source: &Path) {
    graph.set_state(source, CompileState::Failed);
    for dependent in graph.dependents(source) {
        graph.mark_fresh(&dependent);
    }
}

fn error_cycle(cycle: &[PathBuf]) -> Diagnostic {
    Diagnostic::error()
        .code(ErrorCode::E014)
        .message(format!(
            "the modules {} import each other cyclically",
            cycle
                .iter()
                .map(|path| format!("\u{2018}{}\u{2019}", path.display()))
                .list(Conjunction::And)
        ))
        .path(cycle[0].clone())
}
