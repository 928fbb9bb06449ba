//! Diagnostic and error reporting for Ember.
//!
//! Front-end problems are collected as [`Diagnostic`] values instead of
//! aborting, and rendered with ariadne once a whole file has been read.

mod codes;
mod diagnostic;

pub use codes::ErrorCode;
pub use diagnostic::{Diagnostic, DiagnosticKind, Label, Severity};

use ariadne::{ColorGenerator, Label as AriadneLabel, Report, ReportKind, Source};

/// Render a diagnostic to stderr.
pub fn emit(source: &str, filename: &str, diagnostic: &Diagnostic) {
    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Note => ReportKind::Advice,
    };

    let mut colors = ColorGenerator::new();
    let mut report = Report::build(kind, filename, diagnostic.span.start.0 as usize)
        .with_message(&diagnostic.message);

    if let Some(code) = &diagnostic.code {
        report = report.with_code(code.as_str());
    }

    for label in &diagnostic.labels {
        let color = colors.next();
        let ariadne_label = AriadneLabel::new((filename, label.span.range()))
            .with_message(&label.message)
            .with_color(color);
        report = report.with_label(ariadne_label);
    }

    for note in &diagnostic.notes {
        report = report.with_note(note);
    }

    let help = diagnostic
        .help
        .as_deref()
        .or(diagnostic.code.and_then(|c| c.suggestion()));
    if let Some(help) = help {
        report = report.with_help(help);
    }

    // Nothing sensible to do if stderr itself is gone.
    let _ = report
        .finish()
        .eprint((filename, Source::from(source)));
}

/// Render a diagnostic as a single plain line, `file:line:col: message`.
///
/// Used where colored multi-line reports are unwanted (tests, the REPL
/// history, and error values that carry diagnostics around).
pub fn render_plain(source: &str, filename: &str, diagnostic: &Diagnostic) -> String {
    let (line, col) = diagnostic.span.line_col(source);
    match diagnostic.code {
        Some(code) => format!(
            "{filename}:{line}:{col}: {} [{}]",
            diagnostic.message,
            code.as_str()
        ),
        None => format!("{filename}:{line}:{col}: {}", diagnostic.message),
    }
}
