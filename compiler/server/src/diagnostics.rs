//! Conversion of workspace diagnostics into their LSP shape.

use ::diagnostics::{Diagnostic, Highlight, Role, Severity};
use ::span::SourceMap;
use tower_lsp::lsp_types::{
    self, DiagnosticRelatedInformation, DiagnosticSeverity, Location, MessageType, NumberOrString,
    OneOf, Position, Range, Url,
};

const SOURCE: &str = "aya";

pub(crate) type LspMessage = (MessageType, String);

pub(crate) trait DiagnosticExt {
    /// A span-less diagnostic degrades into a plain editor message.
    fn into_lsp_type(self, map: &SourceMap) -> OneOf<lsp_types::Diagnostic, LspMessage>;
}

impl DiagnosticExt for Diagnostic {
    fn into_lsp_type(self, map: &SourceMap) -> OneOf<lsp_types::Diagnostic, LspMessage> {
        let message = self
            .message
            .clone()
            .map_or_else(|| " ".into(), Into::into);

        match convert_highlights(&self, map) {
            Some((range, related_information)) => OneOf::Left(lsp_types::Diagnostic {
                range,
                severity: Some(severity(self.severity)),
                code: self.code.map(|code| NumberOrString::String(code.to_string())),
                source: Some(SOURCE.into()),
                message,
                related_information: Some(related_information),
                ..Default::default()
            }),
            None => OneOf::Right((message_type(self.severity), message)),
        }
    }
}

fn convert_highlights(
    diagnostic: &Diagnostic,
    map: &SourceMap,
) -> Option<(Range, Vec<DiagnosticRelatedInformation>)> {
    let mut range = None;
    let mut related_information = Vec::new();

    for highlight in &diagnostic.highlights {
        let Some(highlight_range) = range_of(highlight, map) else {
            continue;
        };

        if highlight.role == Role::Primary && range.is_none() {
            range = Some(highlight_range);
        } else if let Some(uri) = diagnostic
            .path
            .as_ref()
            .and_then(|path| Url::from_file_path(path).ok())
        {
            related_information.push(DiagnosticRelatedInformation {
                location: Location::new(uri, highlight_range),
                message: highlight
                    .label
                    .clone()
                    .map_or_else(|| " ".into(), Into::into),
            });
        }
    }

    // diagnostics with a file but no resolvable span anchor at the top
    let range = range.or_else(|| {
        diagnostic
            .path
            .is_some()
            .then(|| Range::new(Position::new(0, 0), Position::new(0, 0)))
    })?;

    Some((range, related_information))
}

fn range_of(highlight: &Highlight, map: &SourceMap) -> Option<Range> {
    crate::span::to_range(map, highlight.span)
}

fn severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Bug | Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Debug => DiagnosticSeverity::INFORMATION,
    }
}

fn message_type(severity: Severity) -> MessageType {
    match severity {
        Severity::Bug | Severity::Error => MessageType::ERROR,
        Severity::Warning => MessageType::WARNING,
        Severity::Debug => MessageType::INFO,
    }
}
