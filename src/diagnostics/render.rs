use ariadne::{ColorGenerator, Config, IndexType, Label, Report, ReportKind};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::diagnostics::{Diagnostic, Severity, Summary};

/// File name to source text, used to print labeled snippets.
pub type SourceMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Annotated source snippets.
    #[default]
    Human,
    /// One line per diagnostic: `path:line:col: severity[rule]: message`.
    Concise,
    /// Machine-readable diagnostics with 1-based positions.
    Json,
}

/// Byte offset to 1-based line/column conversion for one source file.
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex {
            source,
            line_starts,
        }
    }

    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = self
            .source
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start);
        (line + 1, column + 1)
    }
}

pub fn render(
    format: OutputFormat,
    diagnostics: &[Diagnostic],
    sources: &SourceMap,
    summary: &Summary,
    color: bool,
    out: &mut dyn Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Human => render_human(diagnostics, sources, color, out),
        OutputFormat::Concise => render_concise(diagnostics, sources, out),
        OutputFormat::Json => render_json(diagnostics, sources, summary, out),
    }
}

pub fn render_human(
    diagnostics: &[Diagnostic],
    sources: &SourceMap,
    color: bool,
    out: &mut dyn Write,
) -> io::Result<()> {
    let mut cache = ariadne::sources(
        sources
            .iter()
            .map(|(file, source)| (file.clone(), source.clone())),
    );

    for diagnostic in diagnostics {
        let kind = match diagnostic.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let mut colors = ColorGenerator::new();

        let mut report = Report::build(kind, (diagnostic.file.clone(), diagnostic.span.clone()))
            .with_config(
                Config::default()
                    .with_color(color)
                    .with_index_type(IndexType::Byte),
            )
            .with_code(diagnostic.rule.code())
            .with_message(&diagnostic.message)
            .with_label(
                Label::new((diagnostic.file.clone(), diagnostic.span.clone()))
                    .with_message(&diagnostic.message)
                    .with_color(colors.next()),
            );

        for label in &diagnostic.labels {
            report = report.with_label(
                Label::new((label.file.clone(), label.span.clone()))
                    .with_message(&label.message)
                    .with_color(colors.next()),
            );
        }

        if let Some(note) = &diagnostic.note {
            report = report.with_note(note);
        }

        report.finish().write(&mut cache, &mut *out)?;
    }
    Ok(())
}

pub fn render_concise(
    diagnostics: &[Diagnostic],
    sources: &SourceMap,
    out: &mut dyn Write,
) -> io::Result<()> {
    for diagnostic in diagnostics {
        let (line, column) = position(sources, &diagnostic.file, diagnostic.span.start);
        writeln!(
            out,
            "{}:{}:{}: {}[{}]: {}",
            diagnostic.file,
            line,
            column,
            diagnostic.severity,
            diagnostic.rule,
            diagnostic.message
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    diagnostics: Vec<JsonDiagnostic<'a>>,
    summary: &'a Summary,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    rule: &'static str,
    severity: Severity,
    file: &'a str,
    line: usize,
    column: usize,
    end_line: usize,
    end_column: usize,
    message: &'a str,
    labels: Vec<JsonLabel<'a>>,
    note: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonLabel<'a> {
    file: &'a str,
    line: usize,
    column: usize,
    message: &'a str,
}

pub fn render_json(
    diagnostics: &[Diagnostic],
    sources: &SourceMap,
    summary: &Summary,
    out: &mut dyn Write,
) -> io::Result<()> {
    let diagnostics = diagnostics
        .iter()
        .map(|d| {
            let (line, column) = position(sources, &d.file, d.span.start);
            let (end_line, end_column) = position(sources, &d.file, d.span.end);
            JsonDiagnostic {
                rule: d.rule.code(),
                severity: d.severity,
                file: &d.file,
                line,
                column,
                end_line,
                end_column,
                message: &d.message,
                labels: d
                    .labels
                    .iter()
                    .map(|l| {
                        let (line, column) = position(sources, &l.file, l.span.start);
                        JsonLabel {
                            file: &l.file,
                            line,
                            column,
                            message: &l.message,
                        }
                    })
                    .collect(),
                note: d.note.as_deref(),
            }
        })
        .collect();

    let report = JsonReport {
        diagnostics,
        summary,
    };
    serde_json::to_writer_pretty(&mut *out, &report).map_err(io::Error::other)?;
    writeln!(out)
}

fn position(sources: &SourceMap, file: &str, offset: usize) -> (usize, usize) {
    match sources.get(file) {
        Some(source) => LineIndex::new(source).line_col(offset),
        None => (1, offset + 1),
    }
}
