use serde::Serialize;

use std::fmt;
use std::ops::Range;

pub type Span = Range<usize>;

#[derive(Debug, Default, Serialize)]
pub struct StubFile {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    Import(Import),
    FromImport(FromImport),
    Function(FunctionSig),
    Class(ClassDecl),
    Attribute(AttributeDecl),
    Conditional(Conditional),
    Pass { span: Span },
    Ellipsis { span: Span },
    Docstring { text: String, span: Span },
    Error { span: Span }, // dummy node for error recovery
}

/// A dotted name such as `docker.api.build` or `typing.Any`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QualName(pub Vec<String>);

impl QualName {
    pub fn simple(name: &str) -> Self {
        QualName(vec![name.to_string()])
    }

    pub fn parse(dotted: &str) -> Self {
        QualName(dotted.split('.').map(str::to_string).collect())
    }

    pub fn head(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    pub fn last(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    pub fn is_simple(&self) -> bool {
        self.0.len() == 1
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// `import a.b` or `import a.b as c`.
#[derive(Debug, Clone, Serialize)]
pub struct Import {
    pub names: Vec<ImportedModule>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportedModule {
    pub module: QualName,
    pub alias: Option<String>,
    pub span: Span,
}

/// `from .build import BuildApiMixin as BuildApiMixin`.
#[derive(Debug, Clone, Serialize)]
pub struct FromImport {
    /// number of leading dots
    pub level: usize,
    pub module: Option<QualName>,
    pub names: Vec<ImportedName>,
    pub star: bool,
    pub span: Span,
}

impl FromImport {
    /// Source text form of the module part, e.g. `..utils`.
    pub fn module_text(&self) -> String {
        let dots = ".".repeat(self.level);
        match &self.module {
            Some(module) => format!("{}{}", dots, module),
            None => dots,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
    pub span: Span,
}

impl ImportedName {
    pub fn bound_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// `from m import x as x` re-exports `x` from a stub.
    pub fn is_reexport(&self) -> bool {
        self.alias.as_deref() == Some(self.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Decorator {
    pub name: QualName,
    pub span: Span,
}

const DECORATOR_MODULES: &[&str] = &["typing", "typing_extensions", "abc", "builtins"];

#[derive(Debug, Clone, Serialize)]
pub struct FunctionSig {
    pub name: (String, Span),
    pub params: Vec<Param>,
    pub returns: Option<(TypeAnnot, Span)>,
    pub decorators: Vec<Decorator>,
    pub is_async: bool,
    pub span: Span,
}

impl FunctionSig {
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators.iter().any(|d| {
            d.name.last() == name
                && (d.name.is_simple() || DECORATOR_MODULES.contains(&d.name.head()))
        })
    }

    pub fn is_overload(&self) -> bool {
        self.has_decorator("overload")
    }

    /// `@name.setter` style accessor decorator, returning the accessor kind.
    pub fn accessor_of(&self, name: &str) -> Option<Accessor> {
        self.decorators.iter().find_map(|d| match d.name.0.as_slice() {
            [owner, kind] if owner == name => match kind.as_str() {
                "setter" => Some(Accessor::Setter),
                "deleter" => Some(Accessor::Deleter),
                "getter" => Some(Accessor::Getter),
                _ => None,
            },
            _ => None,
        })
    }

    pub fn is_property(&self) -> bool {
        self.decorators.iter().any(|d| {
            matches!(d.name.last(), "property" | "cached_property" | "abstractproperty")
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessor {
    Getter,
    Setter,
    Deleter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Regular,
    VarPositional,
    VarKeyword,
    PositionalOnlyMarker,
    KeywordOnlyMarker,
}

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<(TypeAnnot, Span)>,
    pub default: Option<(Value, Span)>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDecl {
    pub name: (String, Span),
    pub bases: Vec<(TypeAnnot, Span)>,
    pub keywords: Vec<(String, TypeAnnot, Span)>,
    pub decorators: Vec<Decorator>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `x: T`, `x: T = v`, `x = v` or `x += v`.
#[derive(Debug, Clone, Serialize)]
pub struct AttributeDecl {
    pub name: (String, Span),
    pub annotation: Option<(TypeAnnot, Span)>,
    pub value: Option<(Value, Span)>,
    pub augmented: bool,
    pub span: Span,
}

/// `if ...: / elif ...: / else:` with the conditions kept as source text.
#[derive(Debug, Clone, Serialize)]
pub struct Conditional {
    pub branches: Vec<Branch>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct Branch {
    pub condition: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TypeAnnot {
    Name(QualName),
    Generic(QualName, Vec<TypeAnnot>),
    Union(Vec<TypeAnnot>),
    None,
    Ellipsis,
    Literal(String),
    List(Vec<TypeAnnot>),
    Unknown,
}

impl TypeAnnot {
    /// The head name of a reference, e.g. `Generic` in `Generic[T]`.
    pub fn head(&self) -> Option<&QualName> {
        match self {
            TypeAnnot::Name(name) | TypeAnnot::Generic(name, _) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeAnnot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeAnnot::Name(name) => write!(f, "{}", name),
            TypeAnnot::Generic(name, args) => write!(f, "{}[{}]", name, join(args, ", ")),
            TypeAnnot::Union(members) => write!(f, "{}", join(members, " | ")),
            TypeAnnot::None => write!(f, "None"),
            TypeAnnot::Ellipsis => write!(f, "..."),
            TypeAnnot::Literal(text) => write!(f, "{:?}", text),
            TypeAnnot::List(items) => write!(f, "[{}]", join(items, ", ")),
            TypeAnnot::Unknown => write!(f, "<unknown>"),
        }
    }
}

fn join(items: &[TypeAnnot], sep: &str) -> String {
    items
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Default values and assigned values. Never evaluated; only `__all__`
/// reads its string items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Ellipsis,
    None,
    Bool(bool),
    Number(String),
    Str(String),
    Name(QualName),
    Call(QualName),
    Collection(Vec<Value>),
    Other,
}

impl Value {
    pub fn string_items(&self) -> Option<Vec<&str>> {
        match self {
            Value::Collection(items) => items
                .iter()
                .map(|item| match item {
                    Value::Str(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}
