//! Diagnostic codes.

use std::fmt;

/// The code of a diagnostic: an error code or a lint code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Code {
    Error(ErrorCode),
    Lint(LintCode),
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(code) => code.fmt(f),
            Self::Lint(code) => code.fmt(f),
        }
    }
}

impl From<ErrorCode> for Code {
    fn from(code: ErrorCode) -> Self {
        Self::Error(code)
    }
}

impl From<LintCode> for Code {
    fn from(code: LintCode) -> Self {
        Self::Lint(code)
    }
}

/// The code of an error diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum ErrorCode {
    /// Module not found.
    E010,
    /// Duplicate module import.
    E011,
    /// Duplicate name definition.
    E012,
    /// Unknown name in a use/hide filter or a rename.
    E013,
    /// Cyclic module imports.
    E014,
    /// Library manifest failure.
    E020,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The code of a warning diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum LintCode {
    /// A name shadows an already visible one.
    Shadowing,
    /// A module shadows an already visible one.
    ModuleShadowing,
    /// A name became ambiguous and needs qualification.
    AmbiguousName,
}

impl fmt::Display for LintCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shadowing => "shadowing",
            Self::ModuleShadowing => "module-shadowing",
            Self::AmbiguousName => "ambiguous-name",
        })
    }
}
