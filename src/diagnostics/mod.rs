pub mod render;


use serde::{Deserialize, Serialize};

use std::fmt;
use std::ops::Range;

pub use render::{LineIndex, OutputFormat, SourceMap, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Some(Severity::Error),
            "warning" | "warn" => Some(Severity::Warning),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Every check the tool can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    SyntaxError,
    DuplicateSymbol,
    OrphanAccessor,
    DuplicateModule,
    UnresolvedModule,
    RelativeImportBeyondTop,
    UnresolvedImport,
    PrivateImport,
    UnresolvedBase,
    InvalidBase,
    CyclicInheritance,
    InvalidSignature,
    MissingSelf,
    UndefinedExport,
}

impl Rule {
    pub fn all() -> &'static [Rule] {
        &[
            Rule::SyntaxError,
            Rule::DuplicateSymbol,
            Rule::OrphanAccessor,
            Rule::DuplicateModule,
            Rule::UnresolvedModule,
            Rule::RelativeImportBeyondTop,
            Rule::UnresolvedImport,
            Rule::PrivateImport,
            Rule::UnresolvedBase,
            Rule::InvalidBase,
            Rule::CyclicInheritance,
            Rule::InvalidSignature,
            Rule::MissingSelf,
            Rule::UndefinedExport,
        ]
    }

    pub fn code(&self) -> &'static str {
        match self {
            Rule::SyntaxError => "syntax-error",
            Rule::DuplicateSymbol => "duplicate-symbol",
            Rule::OrphanAccessor => "orphan-accessor",
            Rule::DuplicateModule => "duplicate-module",
            Rule::UnresolvedModule => "unresolved-module",
            Rule::RelativeImportBeyondTop => "relative-import-beyond-top",
            Rule::UnresolvedImport => "unresolved-import",
            Rule::PrivateImport => "private-import",
            Rule::UnresolvedBase => "unresolved-base",
            Rule::InvalidBase => "invalid-base",
            Rule::CyclicInheritance => "cyclic-inheritance",
            Rule::InvalidSignature => "invalid-signature",
            Rule::MissingSelf => "missing-self",
            Rule::UndefinedExport => "undefined-export",
        }
    }

    pub fn parse_code(code: &str) -> Option<Self> {
        Rule::all()
            .iter()
            .copied()
            .find(|rule| rule.code() == code.trim().to_ascii_lowercase())
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Rule::PrivateImport | Rule::MissingSelf => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Rule::SyntaxError => "the file cannot be tokenized or parsed as a declaration stub",
            Rule::DuplicateSymbol => "a name is bound twice in the same scope",
            Rule::OrphanAccessor => "a property setter or deleter has no matching getter",
            Rule::DuplicateModule => "two files map to the same dotted module name",
            Rule::UnresolvedModule => "an imported module of this tree does not exist",
            Rule::RelativeImportBeyondTop => "a relative import climbs above the top-level package",
            Rule::UnresolvedImport => "an imported name is not declared in the target module",
            Rule::PrivateImport => "an imported name exists in the target but is not re-exported",
            Rule::UnresolvedBase => "a base class is neither declared nor imported into scope",
            Rule::InvalidBase => "a base class refers to something that is not a class",
            Rule::CyclicInheritance => "a class inherits from itself through its bases",
            Rule::InvalidSignature => "a parameter list violates the signature grammar",
            Rule::MissingSelf => "a method takes no parameters and is not a staticmethod",
            Rule::UndefinedExport => "an `__all__` entry is not bound in the module",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub file: String,
    pub span: Range<usize>,
    pub message: String,
}

/// One finding about a stub file. Findings are data; they never abort a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub rule: Rule,
    pub severity: Severity,
    pub file: String,
    pub span: Range<usize>,
    pub message: String,
    pub labels: Vec<Label>,
    pub note: Option<String>,
}

impl Diagnostic {
    pub fn new(
        rule: Rule,
        file: impl Into<String>,
        span: Range<usize>,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            rule,
            severity: rule.default_severity(),
            file: file.into(),
            span,
            message: message.into(),
            labels: vec![],
            note: None,
        }
    }

    pub fn with_label(
        mut self,
        file: impl Into<String>,
        span: Range<usize>,
        message: impl Into<String>,
    ) -> Self {
        self.labels.push(Label {
            file: file.into(),
            span,
            message: message.into(),
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Orders diagnostics by file, then position, then rule.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        (a.file.as_str(), a.span.start, a.rule).cmp(&(b.file.as_str(), b.span.start, b.rule))
    });
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl Summary {
    pub fn collect(files: usize, diagnostics: &[Diagnostic]) -> Self {
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        Summary {
            files,
            errors,
            warnings: diagnostics.len() - errors,
        }
    }

    pub fn failed(&self) -> bool {
        self.errors > 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checked {} file{}: {} error{}, {} warning{}",
            self.files,
            plural(self.files),
            self.errors,
            plural(self.errors),
            self.warnings,
            plural(self.warnings)
        )
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
