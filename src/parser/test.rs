use super::*;
use crate::ast::{ParamKind, QualName, TypeAnnot, Value};

// Helper function to parse input without file I/O
fn parse_str(input: &str) -> (StubFile, Vec<Diagnostic>) {
    parse_stub("test.pyi", input)
}

fn parse_ok(input: &str) -> StubFile {
    let (stub, errors) = parse_str(input);
    assert!(errors.is_empty(), "unexpected errors: {:#?}", errors);
    stub
}

fn name(n: &str) -> TypeAnnot {
    TypeAnnot::Name(QualName::parse(n))
}

#[test]
fn test_parse_from_import_with_reexport() {
    let stub = parse_ok("from .build import BuildApiMixin as BuildApiMixin\n");
    assert_eq!(stub.stmts.len(), 1);

    let Stmt::FromImport(import) = &stub.stmts[0] else {
        panic!("Expected from-import");
    };
    assert_eq!(import.level, 1);
    assert_eq!(import.module, Some(QualName::simple("build")));
    assert_eq!(import.names.len(), 1);
    assert_eq!(import.names[0].name, "BuildApiMixin");
    assert!(import.names[0].is_reexport());
    assert_eq!(import.module_text(), ".build");
}

#[test]
fn test_parse_parenthesized_and_star_imports() {
    let stub = parse_ok(
        "from ..utils import (\n    json_stream,\n    parse_bytes as pb,\n)\nfrom typing import *\nfrom . import errors\n",
    );
    let Stmt::FromImport(first) = &stub.stmts[0] else {
        panic!("Expected from-import");
    };
    assert_eq!(first.level, 2);
    assert_eq!(first.names.len(), 2);
    assert_eq!(first.names[1].bound_name(), "pb");
    assert!(!first.names[1].is_reexport());

    let Stmt::FromImport(second) = &stub.stmts[1] else {
        panic!("Expected from-import");
    };
    assert!(second.star);
    assert!(second.names.is_empty());

    let Stmt::FromImport(third) = &stub.stmts[2] else {
        panic!("Expected from-import");
    };
    assert_eq!(third.level, 1);
    assert!(third.module.is_none());
}

#[test]
fn test_parse_plain_import() {
    let stub = parse_ok("import ssl\nimport urllib3.connectionpool as pool, os\n");
    let Stmt::Import(second) = &stub.stmts[1] else {
        panic!("Expected import");
    };
    assert_eq!(second.names.len(), 2);
    assert_eq!(second.names[0].module.to_string(), "urllib3.connectionpool");
    assert_eq!(second.names[0].alias.as_deref(), Some("pool"));
    assert_eq!(second.names[1].alias, None);
}

#[test]
fn test_parse_function_signature() {
    let stub = parse_ok(
        "def pull(self, repository: str, tag: str | None = ..., *args, stream: bool = False, **kwargs) -> Any: ...\n",
    );
    let Stmt::Function(function) = &stub.stmts[0] else {
        panic!("Expected function");
    };
    assert_eq!(function.name.0, "pull");
    assert_eq!(function.params.len(), 6);

    let kinds: Vec<_> = function.params.iter().map(|p| p.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            ParamKind::Regular,
            ParamKind::Regular,
            ParamKind::Regular,
            ParamKind::VarPositional,
            ParamKind::Regular,
            ParamKind::VarKeyword,
        ]
    );
    assert_eq!(
        function.params[2].annotation.as_ref().map(|a| &a.0),
        Some(&TypeAnnot::Union(vec![name("str"), TypeAnnot::None]))
    );
    assert_eq!(
        function.params[2].default.as_ref().map(|d| &d.0),
        Some(&Value::Ellipsis)
    );
    assert_eq!(
        function.params[4].default.as_ref().map(|d| &d.0),
        Some(&Value::Bool(false))
    );
    assert_eq!(function.returns.as_ref().map(|r| &r.0), Some(&name("Any")));
}

#[test]
fn test_parse_markers_and_multiline_signature() {
    let stub = parse_ok("def f(\n    a: int,\n    /,\n    b: int = 1,\n    *,\n    c,\n) -> None:\n    ...\n");
    let Stmt::Function(function) = &stub.stmts[0] else {
        panic!("Expected function");
    };
    assert_eq!(function.params[1].kind, ParamKind::PositionalOnlyMarker);
    assert_eq!(function.params[3].kind, ParamKind::KeywordOnlyMarker);
    assert_eq!(function.params[4].name, "c");
    assert_eq!(function.returns.as_ref().map(|r| &r.0), Some(&TypeAnnot::None));
}

#[test]
fn test_parse_generic_annotations() {
    let stub = parse_ok(
        "x: Dict[str, List[int]]\ncb: Callable[[int, str], None]\nmode: Literal['r', 'w']\n",
    );
    let Stmt::Attribute(x) = &stub.stmts[0] else {
        panic!("Expected attribute");
    };
    assert_eq!(
        x.annotation.as_ref().map(|a| &a.0),
        Some(&TypeAnnot::Generic(
            QualName::simple("Dict"),
            vec![
                name("str"),
                TypeAnnot::Generic(QualName::simple("List"), vec![name("int")])
            ]
        ))
    );

    let Stmt::Attribute(cb) = &stub.stmts[1] else {
        panic!("Expected attribute");
    };
    assert_eq!(
        cb.annotation.as_ref().map(|a| a.0.to_string()),
        Some("Callable[[int, str], None]".to_string())
    );

    let Stmt::Attribute(mode) = &stub.stmts[2] else {
        panic!("Expected attribute");
    };
    assert_eq!(
        mode.annotation.as_ref().map(|a| &a.0),
        Some(&TypeAnnot::Generic(
            QualName::simple("Literal"),
            vec![
                TypeAnnot::Literal("r".to_string()),
                TypeAnnot::Literal("w".to_string())
            ]
        ))
    );
}

#[test]
fn test_parse_class_with_bases_keywords_and_body() {
    let stub = parse_ok(
        "class APIClient(requests.Session, BuildApiMixin, metaclass=ABCMeta):\n    \"\"\"Docs.\"\"\"\n    base_url: str\n    def __init__(self, base_url: str | None = ...) -> None: ...\n    @property\n    def api_version(self) -> str: ...\n",
    );
    let Stmt::Class(class) = &stub.stmts[0] else {
        panic!("Expected class");
    };
    assert_eq!(class.name.0, "APIClient");
    assert_eq!(class.bases.len(), 2);
    assert_eq!(class.bases[0].0, name("requests.Session"));
    assert_eq!(class.keywords.len(), 1);
    assert_eq!(class.keywords[0].0, "metaclass");
    assert_eq!(class.body.len(), 4);
    assert!(matches!(class.body[0], Stmt::Docstring { .. }));

    let Stmt::Function(prop) = &class.body[3] else {
        panic!("Expected property");
    };
    assert!(prop.is_property());
}

#[test]
fn test_parse_one_line_class_and_generic_base() {
    let stub = parse_ok("class Stream(Iterator[bytes]): ...\nclass Empty: pass\n");
    let Stmt::Class(stream) = &stub.stmts[0] else {
        panic!("Expected class");
    };
    assert_eq!(
        stream.bases[0].0.head(),
        Some(&QualName::simple("Iterator"))
    );
    assert!(matches!(stub.stmts[1], Stmt::Class(_)));
}

#[test]
fn test_parse_call_in_base_list() {
    let stub = parse_ok(
        "class Model(six.with_metaclass(ModelMeta, Base), Mixin): ...\n",
    );
    let Stmt::Class(model) = &stub.stmts[0] else {
        panic!("Expected class");
    };
    assert_eq!(model.bases.len(), 2);
    assert_eq!(model.bases[0].0, TypeAnnot::Unknown);
    assert_eq!(model.bases[0].1, 12..47);
    assert_eq!(model.bases[1].0, name("Mixin"));
}

#[test]
fn test_parse_conditional_blocks() {
    let stub = parse_ok(
        "if sys.version_info >= (3, 8):\n    from typing import Literal\nelif sys.platform == 'win32':\n    Literal: Any\nelse:\n    from typing_extensions import Literal\n",
    );
    let Stmt::Conditional(conditional) = &stub.stmts[0] else {
        panic!("Expected conditional");
    };
    assert_eq!(conditional.branches.len(), 3);
    assert_eq!(
        conditional.branches[0].condition.as_deref(),
        Some("sys.version_info >= (3, 8)")
    );
    assert_eq!(conditional.branches[2].condition, None);
    assert_eq!(conditional.branches[1].body.len(), 1);
}

#[test]
fn test_parse_module_constants_and_all() {
    let stub = parse_ok(
        "DEFAULT_TIMEOUT_SECONDS: int\nDEFAULT_USER_AGENT = \"docker-sdk-python/\" \"5.0\"\n__all__ = ['APIClient', 'from_env']\n__all__ += ['errors']\nT = TypeVar('T', bound=Callable[..., Any])\n",
    );
    assert_eq!(stub.stmts.len(), 5);

    let Stmt::Attribute(agent) = &stub.stmts[1] else {
        panic!("Expected attribute");
    };
    assert_eq!(
        agent.value.as_ref().map(|v| &v.0),
        Some(&Value::Str("docker-sdk-python/5.0".to_string()))
    );

    let Stmt::Attribute(all) = &stub.stmts[2] else {
        panic!("Expected attribute");
    };
    assert_eq!(
        all.value.as_ref().and_then(|v| v.0.string_items()),
        Some(vec!["APIClient", "from_env"])
    );

    let Stmt::Attribute(extend) = &stub.stmts[3] else {
        panic!("Expected attribute");
    };
    assert!(extend.augmented);

    let Stmt::Attribute(tvar) = &stub.stmts[4] else {
        panic!("Expected attribute");
    };
    assert_eq!(
        tvar.value.as_ref().map(|v| &v.0),
        Some(&Value::Call(QualName::simple("TypeVar")))
    );
}

#[test]
fn test_parse_decorators_with_arguments() {
    let stub = parse_ok("@overload\n@deprecated(\"use pull\")\ndef fetch(self) -> None: ...\n");
    let Stmt::Function(function) = &stub.stmts[0] else {
        panic!("Expected function");
    };
    assert_eq!(function.decorators.len(), 2);
    assert!(function.is_overload());
    assert_eq!(function.span.start, 0);
}

#[test]
fn test_syntax_error_recovers_at_next_statement() {
    let (stub, errors) = parse_str("def broken(self x): ...\ndef fine(self) -> None: ...\n");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].rule, Rule::SyntaxError);
    assert!(errors[0].message.contains("expected `,` or `)`"));
    assert!(errors[0].note.is_some());

    assert!(matches!(stub.stmts[0], Stmt::Error { .. }));
    let Stmt::Function(fine) = &stub.stmts[1] else {
        panic!("Expected function after recovery");
    };
    assert_eq!(fine.name.0, "fine");
}

#[test]
fn test_syntax_error_skips_broken_block() {
    let (stub, errors) = parse_str(
        "class Broken(:\n    x: int\nclass Fine:\n    y: int\n",
    );
    assert_eq!(errors.len(), 1);
    // the unclosed `(` swallows line breaks, so only the tail can be trusted
    assert!(matches!(stub.stmts[0], Stmt::Error { .. }));
}

#[test]
fn test_error_inside_class_body_keeps_class() {
    let (stub, errors) = parse_str("class A:\n    x: int\n    return x\n    y: str\nz: int\n");
    assert_eq!(errors.len(), 1);
    let Stmt::Class(class) = &stub.stmts[0] else {
        panic!("Expected class");
    };
    assert_eq!(class.body.len(), 3);
    assert!(matches!(class.body[1], Stmt::Error { .. }));
    assert!(matches!(stub.stmts[1], Stmt::Attribute(_)));
}

#[test]
fn test_lex_errors_become_syntax_diagnostics() {
    let (_, errors) = parse_str("x: int\ny: $str\n");
    assert!(!errors.is_empty());
    assert!(errors.iter().all(|e| e.rule == Rule::SyntaxError));
    assert_eq!(errors[0].span, 10..11);
}

#[test]
fn test_parse_empty_file() {
    let stub = parse_ok("# only a comment\n\n");
    assert!(stub.stmts.is_empty());
}
