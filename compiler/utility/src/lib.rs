//! Utility functionality and definitions.

use colored::Colorize;
use difference::{Changeset, Difference};
use std::{ffi::OsStr, fmt, path::Path};

pub use atom::Atom;
pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
pub use smallvec::smallvec;

pub mod atom;
pub mod cycle;

pub const FILE_EXTENSION: &str = "aya";
pub const MANIFEST_FILE_NAME: &str = "aya.json";

/// The prefix of names the compiler invents for desugared binders.
///
/// Such names never trigger shadowing warnings.
pub const ANONYMOUS_PREFIX: &str = "_";

pub type Str = std::borrow::Cow<'static, str>;

pub type SmallVec<T, const N: usize> = smallvec::SmallVec<[T; N]>;

pub fn default<T: Default>() -> T {
    T::default()
}

pub fn has_file_extension(path: &Path, required_extension: &str) -> bool {
    path.extension().and_then(OsStr::to_str) == Some(required_extension)
}

#[macro_export]
macro_rules! obtain {
    ($expr:expr, $pat:pat $( if $guard:expr )? => $mapping:expr $(,)?) => {
        match $expr {
            $pat $( if $guard )? => Some($mapping),
            _ => None,
        }
    };
}

#[macro_export]
macro_rules! pluralize {
    ($amount:expr, $singular:expr $(,)?) => {
        $crate::pluralize!($amount, $singular, concat!($singular, "s"))
    };
    ($amount:expr, $singular:expr, $plural:expr $(,)?) => {
        if $amount == 1 {
            $crate::Str::from($singular)
        } else {
            $crate::Str::from($plural)
        }
    };
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::And => "and",
            Self::Or => "or",
        })
    }
}

pub trait ListingExt {
    fn list(self, conjunction: Conjunction) -> String;
}

impl<I> ListingExt for I
where
    I: Iterator,
    I::Item: fmt::Display,
{
    fn list(self, conjunction: Conjunction) -> String {
        let items: Vec<_> = self.map(|item| item.to_string()).collect();

        match &*items {
            [] => String::new(),
            [single] => single.clone(),
            [first, second] => format!("{first} {conjunction} {second}"),
            [init @ .., last] => format!("{} {conjunction} {last}", init.join(", ")),
        }
    }
}

pub trait QuoteExt {
    fn quote(self) -> String;
}

impl<D: fmt::Display> QuoteExt for D {
    fn quote(self) -> String {
        format!("\u{2018}{self}\u{2019}")
    }
}

/// Render a line-based diff of two texts for test failure output.
///
/// The Display implementation provided by the diffing library is unreadable
/// when only whitespace differs, hence the explicit per-line markers.
pub fn difference(original: &str, edit: &str, split: &str) -> String {
    use std::fmt::Write;

    let mut rendered = String::new();

    for change in Changeset::new(original, edit, split).diffs {
        let (marker, block) = match &change {
            Difference::Same(block) => (' ', block),
            Difference::Add(block) => ('+', block),
            Difference::Rem(block) => ('-', block),
        };

        for line in block.lines() {
            let line = format!("{marker} {line}");
            let line = match &change {
                Difference::Same(_) => line.normal(),
                Difference::Add(_) => line.green(),
                Difference::Rem(_) => line.red(),
            };
            let _ = writeln!(rendered, "{line}");
        }
    }

    rendered
}
