//! Diagnostic and error reporting for Quill.
//! Quill 的诊断和错误报告。
//!
//! Compile failures are collected as [`Diagnostic`]s and rendered with
//! ariadne against the template source.

mod codes;
mod diagnostic;

pub use codes::ErrorCode;
pub use diagnostic::{Diagnostic, DiagnosticKind, Label, Severity};

use ariadne::{ColorGenerator, Config, Label as AriadneLabel, Report, ReportKind, Source};

fn build_report<'a>(
    filename: &'a str,
    diagnostic: &Diagnostic,
    color: bool,
) -> Report<'a, (&'a str, std::ops::Range<usize>)> {
    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
    };

    let mut colors = ColorGenerator::new();
    let mut report = Report::build(kind, filename, diagnostic.span.offset())
        .with_config(Config::default().with_color(color))
        .with_message(&diagnostic.message);

    if let Some(code) = &diagnostic.code {
        report = report.with_code(code.as_str());
    }

    for label in &diagnostic.labels {
        let ariadne_label = AriadneLabel::new((filename, label.span.range()))
            .with_message(&label.message)
            .with_color(colors.next());
        report = report.with_label(ariadne_label);
    }

    for note in &diagnostic.notes {
        report = report.with_note(note);
    }

    if let Some(help) = &diagnostic.help {
        report = report.with_help(help);
    }

    report.finish()
}

/// Render a diagnostic to stderr.
/// 将诊断信息渲染到标准错误输出。
pub fn emit(source: &str, filename: &str, diagnostic: &Diagnostic) -> std::io::Result<()> {
    build_report(filename, diagnostic, true).eprint((filename, Source::from(source)))
}

/// Render a diagnostic to a plain (uncolored) string.
/// 将诊断信息渲染为无颜色的纯文本。
pub fn render(source: &str, filename: &str, diagnostic: &Diagnostic) -> String {
    let mut out = Vec::new();
    if build_report(filename, diagnostic, false)
        .write((filename, Source::from(source)), &mut out)
        .is_err()
    {
        return diagnostic.message.clone();
    }
    String::from_utf8_lossy(&out).into_owned()
}
