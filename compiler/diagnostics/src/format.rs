//! Plain-text rendering of diagnostics.
//!
//! A deliberately lean textual format: one header line, one line per
//! highlight, one line per subdiagnostic. Rich windowed source snippets are
//! the business of an external renderer.

use crate::{Diagnostic, Role, Severity};
use colored::{Color, Colorize};
use span::SourceMap;
use std::fmt::Write;

pub(crate) fn format(diagnostic: &Diagnostic, map: Option<&SourceMap>) -> String {
    let mut output = String::new();

    let header = match diagnostic.code {
        Some(code) => format!("{}[{code}]", diagnostic.severity.name()),
        None => diagnostic.severity.name().to_string(),
    };
    let _ = write!(output, "{}", header.color(color(diagnostic.severity)).bold());

    if let Some(message) = &diagnostic.message {
        let _ = write!(output, ": {}", message.bold());
    }

    for highlight in &diagnostic.highlights {
        let _ = write!(output, "\n {} ", marker(highlight.role));

        match map.and_then(|map| {
            let location = map.locate(highlight.span.start)?;
            Some((map[location.file].path().map(ToOwned::to_owned), location))
        }) {
            Some((path, location)) => {
                let path = path
                    .as_deref()
                    .map_or_else(|| "<anonymous>".into(), |path| path.display().to_string());
                let _ = write!(output, "{path}:{}:{}", location.line + 1, location.column + 1);
            }
            None => {
                let _ = write!(
                    output,
                    "<unknown>:{}..{}",
                    highlight.span.start.0, highlight.span.end.0
                );
            }
        }

        if let Some(label) = &highlight.label {
            let _ = write!(output, ": {label}");
        }
    }

    for subdiagnostic in &diagnostic.subdiagnostics {
        let _ = write!(
            output,
            "\n{}: {}",
            subdiagnostic.severity.name().bold(),
            subdiagnostic.message
        );
    }

    output
}

const fn color(severity: Severity) -> Color {
    match severity {
        Severity::Bug | Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Debug => Color::Blue,
    }
}

const fn marker(role: Role) -> &'static str {
    match role {
        Role::Primary => "-->",
        Role::Secondary => "~~>",
    }
}
