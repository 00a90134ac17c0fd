//! The primitive-factory cache.
//!
//! One factory per library identity, created on first demand and reused
//! across compilations. This keeps primitive references shared across
//! edits within a library, which is a correctness requirement, not an
//! optimization.

use resolver::DefId;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, LazyLock, Mutex},
};
use utility::{Atom, HashMap};

/// Mints canonical references to built-in definitions.
pub struct PrimFactory {
    defs: Mutex<HashMap<Atom, DefId>>,
}

impl PrimFactory {
    fn new() -> Self {
        Self {
            defs: Mutex::default(),
        }
    }

    /// The canonical reference for the named primitive. Idempotent.
    pub fn reference(&self, name: Atom) -> DefId {
        *self
            .defs
            .lock()
            .unwrap()
            .entry(name)
            .or_insert_with(DefId::fresh)
    }
}

static FACTORIES: LazyLock<Mutex<HashMap<PathBuf, Arc<PrimFactory>>>> =
    LazyLock::new(|| Mutex::new(HashMap::default()));

/// The factory for the given library identity. Insertion is idempotent.
pub fn factory(library: &Path) -> Arc<PrimFactory> {
    FACTORIES
        .lock()
        .unwrap()
        .entry(library.to_owned())
        .or_insert_with(|| Arc::new(PrimFactory::new()))
        .clone()
}

/// Drop all factories. Only meant for workspace teardown.
pub fn clear() {
    FACTORIES.lock().unwrap().clear();
}
