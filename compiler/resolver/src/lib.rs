//! The module resolver.
//!
//! It maintains the per-file scope: which names are visible, under which
//! qualifications, from which imports, with which accessibility. Hard
//! errors abort the running operation and are reported to the context's
//! reporter; warnings accumulate and are flushed after the operation
//! succeeds.

use diagnostics::{error::Result, Reporter};
use span::Span;
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};
use utility::{Atom, HashMap, HashSet, ANONYMOUS_PREFIX};

#[cfg(test)]
mod test;

mod error;

/// An abstract handle identifying a definition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DefId(u64);

impl DefId {
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The identity of a module export, stable across filtered views.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ModuleId(u64);

impl ModuleId {
    fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A fully qualified module path. The empty path denotes the enclosing
/// module itself.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ModulePath {
    segments: Vec<Atom>,
}

impl ModulePath {
    pub fn this() -> Self {
        Self::default()
    }

    pub fn new(segments: impl IntoIterator<Item = Atom>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    pub fn is_this(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn concat(&self, other: &Self) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .chain(&other.segments)
                .copied()
                .collect(),
        }
    }

    pub fn segments(&self) -> &[Atom] {
        &self.segments
    }

    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_this() {
            return f.write_str("this");
        }

        for (index, segment) in self.segments.iter().enumerate() {
            if index != 0 {
                f.write_str("::")?;
            }
            segment.fmt(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Accessibility {
    Public,
    Private,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Origin {
    Defined,
    Imported,
}

/// A visible symbol: its target plus provenance.
#[derive(Clone, Copy, Debug)]
pub struct SymbolEntry {
    pub target: DefId,
    pub origin: Origin,
    pub accessibility: Accessibility,
}

/// All available symbols of a scope:
/// `unqualified name → (component path → data)`.
///
/// The outer mapping is many-to-one per name: multiple modules may
/// contribute the same unqualified name, which is then ambiguous and must
/// be used qualified.
#[derive(Clone)]
pub struct ModuleSymbol<T> {
    table: HashMap<Atom, HashMap<ModulePath, T>>,
}

impl<T> Default for ModuleSymbol<T> {
    fn default() -> Self {
        Self {
            table: HashMap::default(),
        }
    }
}

impl<T> ModuleSymbol<T> {
    pub fn contains_name(&self, name: Atom) -> bool {
        self.table.contains_key(&name)
    }

    /// Is the exact `(component path, name)` pair present?
    pub fn contains_definitely(&self, path: &ModulePath, name: Atom) -> bool {
        self.table
            .get(&name)
            .is_some_and(|candidates| candidates.contains_key(path))
    }

    /// Insert without overwriting. Returns false if the pair was taken.
    pub fn add(&mut self, path: ModulePath, name: Atom, data: T) -> bool {
        let candidates = self.table.entry(name).or_default();
        if candidates.contains_key(&path) {
            return false;
        }
        candidates.insert(path, data);
        true
    }

    pub fn get(&self, name: Atom) -> Option<&HashMap<ModulePath, T>> {
        self.table.get(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Atom, &ModulePath, &T)> {
        self.table.iter().flat_map(|(name, candidates)| {
            candidates.iter().map(move |(path, data)| (*name, path, data))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = Atom> + '_ {
        self.table.keys().copied()
    }
}

/// The view of a module's public names visible to consumers.
#[derive(Clone)]
pub struct ModuleExport {
    id: ModuleId,
    symbols: ModuleSymbol<DefId>,
}

impl Default for ModuleExport {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleExport {
    pub fn new() -> Self {
        Self {
            id: ModuleId::fresh(),
            symbols: ModuleSymbol::default(),
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn symbols(&self) -> &ModuleSymbol<DefId> {
        &self.symbols
    }

    /// Record an exported symbol. Returns false on an exact collision.
    pub fn export(&mut self, path: ModulePath, name: Atom, target: DefId) -> bool {
        self.symbols.add(path, name, target)
    }

    fn contains_unqualified(&self, name: Atom) -> bool {
        self.symbols.contains_name(name)
    }

    /// Apply a use/hide filter and the renames, yielding a derived view
    /// with the same identity plus the problems encountered.
    pub fn use_hide(&self, use_hide: &UseHide) -> Filtered {
        let mut problems = Vec::new();

        for &name in &use_hide.list {
            if !self.contains_unqualified(name) {
                problems.push(FilterProblem::UnknownFilterName(name));
            }
        }

        let mut filtered = ModuleSymbol::default();
        for (name, path, &target) in self.symbols.iter() {
            let listed = use_hide.list.contains(&name);
            let keep = match use_hide.strategy {
                Strategy::Using => listed,
                Strategy::Hiding => !listed,
            };
            if keep {
                filtered.add(path.clone(), name, target);
            }
        }

        let mut renamed = ModuleSymbol::default();
        let renames: HashMap<Atom, Atom> = use_hide
            .renames
            .iter()
            .map(|rename| (rename.from, rename.to))
            .collect();

        for rename in &use_hide.renames {
            if !filtered.contains_name(rename.from) {
                problems.push(FilterProblem::UnknownRenameSource(rename.from));
            }
        }

        for (name, path, &target) in filtered.iter() {
            let new_name = renames.get(&name).copied().unwrap_or(name);
            if new_name != name && filtered.contains_name(new_name) {
                problems.push(FilterProblem::RenameCollision {
                    from: name,
                    to: new_name,
                });
            }
            renamed.add(path.clone(), new_name, target);
        }

        Filtered {
            export: Self {
                id: self.id,
                symbols: renamed,
            },
            problems,
        }
    }
}

pub struct Filtered {
    pub export: ModuleExport,
    pub problems: Vec<FilterProblem>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FilterProblem {
    UnknownFilterName(Atom),
    UnknownRenameSource(Atom),
    RenameCollision { from: Atom, to: Atom },
}

impl FilterProblem {
    fn is_fatal(self) -> bool {
        !matches!(self, Self::RenameCollision { .. })
    }
}

/// The strategy of a use/hide filter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Strategy {
    /// Retain only the listed names.
    Using,
    /// Drop the listed names.
    Hiding,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rename {
    pub from: Atom,
    pub to: Atom,
}

/// A parsed use/hide clause of an `open` statement.
#[derive(Clone)]
pub struct UseHide {
    pub strategy: Strategy,
    pub list: Vec<Atom>,
    pub renames: Vec<Rename>,
}

impl UseHide {
    pub fn using(list: impl IntoIterator<Item = Atom>) -> Self {
        Self {
            strategy: Strategy::Using,
            list: list.into_iter().collect(),
            renames: Vec::new(),
        }
    }

    pub fn hiding(list: impl IntoIterator<Item = Atom>) -> Self {
        Self {
            strategy: Strategy::Hiding,
            list: list.into_iter().collect(),
            renames: Vec::new(),
        }
    }

    /// Keep everything.
    pub fn open() -> Self {
        Self::hiding([])
    }

    #[must_use]
    pub fn rename(mut self, from: Atom, to: Atom) -> Self {
        self.renames.push(Rename { from, to });
        self
    }
}

/// A symbol in the process of being admitted.
pub enum GlobalSymbol {
    Defined {
        name: Atom,
        target: DefId,
        accessibility: Accessibility,
    },
    Imported {
        path: ModulePath,
        name: Atom,
        target: DefId,
        accessibility: Accessibility,
    },
}

impl GlobalSymbol {
    fn name(&self) -> Atom {
        match self {
            Self::Defined { name, .. } | Self::Imported { name, .. } => *name,
        }
    }

    fn component_path(&self) -> ModulePath {
        match self {
            Self::Defined { .. } => ModulePath::this(),
            Self::Imported { path, .. } => path.clone(),
        }
    }

    fn target(&self) -> DefId {
        match self {
            Self::Defined { target, .. } | Self::Imported { target, .. } => *target,
        }
    }

    fn origin(&self) -> Origin {
        match self {
            Self::Defined { .. } => Origin::Defined,
            Self::Imported { .. } => Origin::Imported,
        }
    }

    fn accessibility(&self) -> Accessibility {
        match self {
            Self::Defined { accessibility, .. } | Self::Imported { accessibility, .. } => {
                *accessibility
            }
        }
    }

    /// The target to export, if visible to the outside.
    fn export_maybe(&self) -> Option<DefId> {
        (self.accessibility() == Accessibility::Public).then(|| self.target())
    }
}

/// The flavor of a module context.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContextKind {
    /// A scope that never exports (example blocks, command-line snippets).
    NoExport,
    /// A physical module with an export view.
    Physical,
}

/// The scope of one module: visible symbols and imported modules.
pub struct ModuleContext {
    kind: ContextKind,
    symbols: ModuleSymbol<SymbolEntry>,
    /// `qualified module path → module export`. The empty path — this
    /// module — is always present.
    modules: HashMap<ModulePath, ModuleExport>,
    /// Modules imported publicly, re-exported on demand.
    reexports: HashSet<ModulePath>,
    reporter: Reporter,
}

impl ModuleContext {
    pub fn new(kind: ContextKind, reporter: Reporter) -> Self {
        let mut modules = HashMap::default();
        modules.insert(ModulePath::this(), ModuleExport::new());

        Self {
            kind,
            symbols: ModuleSymbol::default(),
            modules,
            reexports: HashSet::default(),
            reporter,
        }
    }

    pub fn symbols(&self) -> &ModuleSymbol<SymbolEntry> {
        &self.symbols
    }

    pub fn modules(&self) -> &HashMap<ModulePath, ModuleExport> {
        &self.modules
    }

    /// This module's export view.
    pub fn exports(&self) -> &ModuleExport {
        &self.modules[&ModulePath::this()]
    }

    /// The publicly imported modules, re-exported to consumers.
    pub fn exported_modules(&self) -> impl Iterator<Item = (&ModulePath, &ModuleExport)> {
        self.modules
            .iter()
            .filter(|(path, _)| self.reexports.contains(*path))
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Import a whole module tree: itself and its re-exports.
    pub fn import_modules(
        &mut self,
        mod_name: &ModulePath,
        modules: impl IntoIterator<Item = (ModulePath, ModuleExport)>,
        accessibility: Accessibility,
        pos: Span,
    ) -> Result {
        for (sub_path, export) in modules {
            self.import_module(mod_name.concat(&sub_path), export, accessibility, pos)?;
        }
        Ok(())
    }

    /// Import one module export.
    ///
    /// Importing the exact same qualified path twice is a hard error;
    /// reaching an already visible module via a different chain only
    /// shadows and warns.
    pub fn import_module(
        &mut self,
        path: ModulePath,
        export: ModuleExport,
        accessibility: Accessibility,
        pos: Span,
    ) -> Result {
        if self.modules.contains_key(&path) {
            return Err(error::duplicate_module(&path, pos).report(&self.reporter));
        }

        if self.modules.values().any(|module| module.id() == export.id()) {
            error::module_shadowing(&path, pos).report(&self.reporter);
        }

        if accessibility == Accessibility::Public {
            self.reexports.insert(path.clone());
        }
        self.modules.insert(path, export);
        Ok(())
    }

    /// Open an imported module, admitting its filtered symbols unqualified.
    ///
    /// Non-fatal filter problems are deferred and reported only after the
    /// whole operation succeeded.
    pub fn open_module(
        &mut self,
        path: &ModulePath,
        accessibility: Accessibility,
        use_hide: &UseHide,
        pos: Span,
    ) -> Result {
        let export = match self.modules.get(path) {
            Some(export) => export.clone(),
            None => return Err(error::module_not_found(path, pos).report(&self.reporter)),
        };

        let filtered = export.use_hide(use_hide);

        let mut fatal = None;
        for problem in &filtered.problems {
            if problem.is_fatal() {
                fatal = Some(error::filter_problem(*problem, pos).report(&self.reporter));
            }
        }
        if let Some(error) = fatal {
            return Err(error);
        }

        for (name, component_path, &target) in filtered.export.symbols().iter() {
            let full_path = path.concat(component_path);
            self.add_global(
                GlobalSymbol::Imported {
                    path: full_path,
                    name,
                    target,
                    accessibility,
                },
                pos,
            )?;
        }

        for problem in &filtered.problems {
            if !problem.is_fatal() {
                error::filter_problem(*problem, pos).report(&self.reporter);
            }
        }

        Ok(())
    }

    /// Add a top-level local definition under the `this` component path.
    pub fn define(
        &mut self,
        name: Atom,
        target: DefId,
        accessibility: Accessibility,
        pos: Span,
    ) -> Result {
        self.add_global(
            GlobalSymbol::Defined {
                name,
                target,
                accessibility,
            },
            pos,
        )
    }

    /// The central admission rule.
    pub fn add_global(&mut self, symbol: GlobalSymbol, pos: Span) -> Result {
        let name = symbol.name();
        let path = symbol.component_path();

        if !self.symbols.contains_name(name) {
            if self.visible_through_modules(name, &path)
                && !name.to_str().starts_with(ANONYMOUS_PREFIX)
            {
                error::shadowing(name, pos).report(&self.reporter);
            }
        } else if self.symbols.contains_definitely(&path, name) {
            return Err(error::duplicate_name(name, pos).report(&self.reporter));
        } else {
            error::ambiguous_name(name, pos).report(&self.reporter);
        }

        let admitted = self.symbols.add(
            path.clone(),
            name,
            SymbolEntry {
                target: symbol.target(),
                origin: symbol.origin(),
                accessibility: symbol.accessibility(),
            },
        );
        debug_assert!(admitted, "admission raced the duplicate check");

        if let Some(target) = symbol.export_maybe() {
            self.do_export(&path, name, target, pos)?;
        }

        Ok(())
    }

    /// Record an exported symbol in this module's export view.
    ///
    /// A no-export context silently ignores the call.
    fn do_export(&mut self, path: &ModulePath, name: Atom, target: DefId, pos: Span) -> Result {
        match self.kind {
            ContextKind::NoExport => Ok(()),
            ContextKind::Physical => {
                let this = self
                    .modules
                    .get_mut(&ModulePath::this())
                    .expect("the this-module is always present");

                if this.export(path.clone(), name, target) {
                    Ok(())
                } else {
                    Err(error::duplicate_name(name, pos).report(&self.reporter))
                }
            }
        }
    }

    /// Is the name reachable through some other channel, i.e. an imported
    /// module's export view? The channel the symbol itself arrives through
    /// does not count.
    fn visible_through_modules(&self, name: Atom, through: &ModulePath) -> bool {
        self.modules.iter().any(|(path, module)| {
            !path.is_this()
                && !through.starts_with(path)
                && module.contains_unqualified(name)
        })
    }
}
