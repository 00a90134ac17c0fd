//! Local variables with globally unique identity.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::atomic::{AtomicU64, Ordering},
};
use utility::Atom;

/// A local variable.
///
/// The identity is the minted id; the name is display-only. Two variables
/// with the same name never alias unless they are clones of one another.
#[derive(Clone, Eq)]
pub struct LocalVar {
    name: Atom,
    id: u64,
}

impl LocalVar {
    pub fn new(name: impl Into<Atom>) -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);

        Self {
            name: name.into(),
            id: NEXT.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// A fresh variable with the same display name.
    pub fn fresh(&self) -> Self {
        Self::new(self.name)
    }

    pub fn name(&self) -> Atom {
        self.name
    }
}

impl PartialEq for LocalVar {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for LocalVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for LocalVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

impl fmt::Display for LocalVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}
