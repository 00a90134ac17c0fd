//! Diagnostic constructors for name problems.

use crate::{FilterProblem, ModulePath};
use diagnostics::{Diagnostic, ErrorCode, LintCode};
use span::Span;
use utility::{Atom, QuoteExt};

pub(crate) fn module_not_found(path: &ModulePath, pos: Span) -> Diagnostic {
    Diagnostic::error()
        .code(ErrorCode::E010)
        .message(format!("the module {} is not in scope", path.quote()))
        .primary_span(pos)
}

pub(crate) fn duplicate_module(path: &ModulePath, pos: Span) -> Diagnostic {
    Diagnostic::error()
        .code(ErrorCode::E011)
        .message(format!(
            "the module {} is already imported under this exact path",
            path.quote()
        ))
        .primary_span(pos)
        .note("importing the same qualified path twice is never a silent overwrite")
}

pub(crate) fn duplicate_name(name: Atom, pos: Span) -> Diagnostic {
    Diagnostic::error()
        .code(ErrorCode::E012)
        .message(format!(
            "the name {} is already defined under the same qualification",
            name.quote()
        ))
        .primary_span(pos)
}

pub(crate) fn filter_problem(problem: FilterProblem, pos: Span) -> Diagnostic {
    match problem {
        FilterProblem::UnknownFilterName(name) => Diagnostic::error()
            .code(ErrorCode::E013)
            .message(format!(
                "the name {} does not exist in the opened module",
                name.quote()
            ))
            .primary_span(pos),
        FilterProblem::UnknownRenameSource(name) => Diagnostic::error()
            .code(ErrorCode::E013)
            .message(format!(
                "the rename source {} does not exist in the opened module",
                name.quote()
            ))
            .primary_span(pos),
        FilterProblem::RenameCollision { from, to } => Diagnostic::warning()
            .code(LintCode::AmbiguousName)
            .message(format!(
                "renaming {} to {} collides with an existing name",
                from.quote(),
                to.quote()
            ))
            .primary_span(pos),
    }
}

pub(crate) fn shadowing(name: Atom, pos: Span) -> Diagnostic {
    Diagnostic::warning()
        .code(LintCode::Shadowing)
        .message(format!("the name {} shadows another visible one", name.quote()))
        .primary_span(pos)
}

pub(crate) fn module_shadowing(path: &ModulePath, pos: Span) -> Diagnostic {
    Diagnostic::warning()
        .code(LintCode::ModuleShadowing)
        .message(format!(
            "the module {} is already visible via a different chain",
            path.quote()
        ))
        .primary_span(pos)
}

pub(crate) fn ambiguous_name(name: Atom, pos: Span) -> Diagnostic {
    Diagnostic::warning()
        .code(LintCode::AmbiguousName)
        .message(format!(
            "the name {} now has multiple provenances and must be qualified to be used",
            name.quote()
        ))
        .primary_span(pos)
}
