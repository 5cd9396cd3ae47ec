use super::*;
use crate::diagnostics::{Rule, Severity};
use crate::validation::signatures::signature_errors;

fn tree(files: &[(&str, &str, &str)]) -> StubTree {
    StubTree::from_sources(
        files
            .iter()
            .map(|(module, path, source)| (module.to_string(), path.to_string(), source.to_string()))
            .collect(),
    )
}

fn check(files: &[(&str, &str, &str)]) -> Vec<Diagnostic> {
    validate_tree(&tree(files), &Config::default()).unwrap()
}

fn rules(diagnostics: &[Diagnostic]) -> Vec<Rule> {
    diagnostics.iter().map(|d| d.rule).collect()
}

const BUILD_PRESENT: &str = "class BuildApiMixin:\n    def build(self, path: str | None = ...) -> Any: ...\n";

#[test]
fn test_reexported_mixin_resolves() {
    let diagnostics = check(&[
        (
            "docker.api",
            "docker/api/__init__.pyi",
            "from .build import BuildApiMixin as BuildApiMixin\n",
        ),
        ("docker.api.build", "docker/api/build.pyi", BUILD_PRESENT),
    ]);
    assert!(diagnostics.is_empty(), "{:#?}", diagnostics);
}

#[test]
fn test_missing_mixin_is_unresolved_import() {
    let diagnostics = check(&[
        (
            "docker.api",
            "docker/api/__init__.pyi",
            "from .build import BuildApiMixin as BuildApiMixin\n",
        ),
        ("docker.api.build", "docker/api/build.pyi", "class ContainerApiMixin: ...\n"),
    ]);
    assert_eq!(rules(&diagnostics), vec![Rule::UnresolvedImport]);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.file, "docker/api/__init__.pyi");
    assert_eq!(diagnostic.span, 19..49);
    assert!(diagnostic.message.contains("`BuildApiMixin`"));
    assert!(diagnostic.message.contains("`docker.api.build`"));
    assert!(diagnostic.is_error());
}

#[test]
fn test_missing_internal_module() {
    let diagnostics = check(&[(
        "docker.api",
        "docker/api/__init__.pyi",
        "from .exec_api import ExecApiMixin as ExecApiMixin\nimport docker.models\nimport requests\nfrom urllib3 import PoolManager\n",
    )]);
    assert_eq!(
        rules(&diagnostics),
        vec![Rule::UnresolvedModule, Rule::UnresolvedModule]
    );
    assert!(diagnostics[0].message.contains("docker.api.exec_api"));
}

#[test]
fn test_private_import_warning() {
    let diagnostics = check(&[
        (
            "docker.api",
            "docker/api/__init__.pyi",
            "from .client import APIClient\n",
        ),
        (
            "docker.client",
            "docker/client.pyi",
            "from .api import APIClient\n",
        ),
        ("docker", "docker/__init__.pyi", ""),
    ]);
    // `docker.api` itself imports from a module that is not in the tree
    assert!(rules(&diagnostics).contains(&Rule::UnresolvedModule));
    let private: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.rule == Rule::PrivateImport)
        .collect();
    assert_eq!(private.len(), 1);
    assert_eq!(private[0].file, "docker/client.pyi");
    assert_eq!(private[0].severity, Severity::Warning);
    assert_eq!(private[0].labels[0].file, "docker/api/__init__.pyi");
}

#[test]
fn test_package_imports_its_own_submodules() {
    let diagnostics = check(&[
        (
            "docker",
            "docker/__init__.pyi",
            "from . import errors as errors\nfrom . import types\nfrom . import utils\n",
        ),
        ("docker.errors", "docker/errors.pyi", "class DockerException(Exception): ...\n"),
        ("docker.types", "docker/types.pyi", "class Ulimit: ...\n"),
        (
            "docker.api",
            "docker/api/__init__.pyi",
            "from docker import errors\n\nclass APIError(errors.DockerException): ...\n",
        ),
    ]);
    assert_eq!(rules(&diagnostics), vec![Rule::UnresolvedImport]);
    assert_eq!(diagnostics[0].file, "docker/__init__.pyi");
    assert!(diagnostics[0].message.contains("`utils`"));
}

#[test]
fn test_namespace_package_submodules() {
    let diagnostics = check(&[
        (
            "docker",
            "docker/__init__.pyi",
            "from docker.api import build as build\nfrom docker.api import container\nimport docker.api\n",
        ),
        ("docker.api.build", "docker/api/build.pyi", BUILD_PRESENT),
    ]);
    assert_eq!(rules(&diagnostics), vec![Rule::UnresolvedImport]);
    assert!(diagnostics[0].message.contains("`container`"));
    assert!(diagnostics[0].message.contains("`docker.api`"));
}

#[test]
fn test_called_alias_base_is_permissive() {
    let diagnostics = check(&[(
        "sqlalchemy.orm",
        "sqlalchemy/orm.pyi",
        "def declarative_base() -> type: ...\nBase = declarative_base()\nclass Model(Base): ...\nclass _Point: ...\nPoint = _Point()\nclass Named(Point): ...\n",
    )]);
    assert!(diagnostics.is_empty(), "{:#?}", diagnostics);
}

#[test]
fn test_relative_import_beyond_top_is_reported_once() {
    let diagnostics = check(&[("docker", "docker/__init__.pyi", "from .. import x\n")]);
    assert_eq!(rules(&diagnostics), vec![Rule::RelativeImportBeyondTop]);
}

#[test]
fn test_unresolved_and_invalid_bases() {
    let diagnostics = check(&[(
        "docker.models.containers",
        "docker/models/containers.pyi",
        "import os\nfrom typing import Generic, TypeVar\n_T = TypeVar('_T')\ndef factory() -> None: ...\nclass Model(Generic[_T]): ...\nclass Container(Model, Collection): ...\nclass Weird(factory, os): ...\nclass Fine(Exception, Model): ...\n",
    )]);
    assert_eq!(
        rules(&diagnostics),
        vec![Rule::UnresolvedBase, Rule::InvalidBase, Rule::InvalidBase]
    );
    assert!(diagnostics[0].message.contains("`Collection`"));
    assert!(diagnostics[0].message.contains("`Container`"));
    assert!(diagnostics[1].message.contains("function"));
    assert!(diagnostics[2].message.contains("module"));
}

#[test]
fn test_nested_class_base_uses_enclosing_body() {
    let diagnostics = check(&[(
        "m",
        "m.pyi",
        "class Outer:\n    class Base: ...\n    class Child(Base): ...\nclass Other(Base): ...\n",
    )]);
    assert_eq!(rules(&diagnostics), vec![Rule::UnresolvedBase]);
    assert!(diagnostics[0].message.contains("`Other`"));
}

#[test]
fn test_cyclic_inheritance_across_modules() {
    let diagnostics = check(&[
        ("pkg.a", "pkg/a.pyi", "from .b import B\nclass A(B): ...\n"),
        ("pkg.b", "pkg/b.pyi", "from .a import A\nclass B(A): ...\nclass C(B): ...\n"),
    ]);
    let cyclic: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.rule == Rule::CyclicInheritance)
        .map(|d| d.file.as_str())
        .collect();
    assert_eq!(cyclic, vec!["pkg/a.pyi", "pkg/b.pyi"]);
}

#[test]
fn test_signature_rules() {
    let diagnostics = check(&[(
        "m",
        "m.pyi",
        "def ok(a, /, b=1, *args, c, d=2, **kwargs) -> None: ...\ndef bad(a=1, b) -> None: ...\nclass C:\n    def method() -> None: ...\n    @staticmethod\n    def helper() -> None: ...\n    @classmethod\n    def make(cls) -> C: ...\n",
    )]);
    assert_eq!(
        rules(&diagnostics),
        vec![Rule::InvalidSignature, Rule::MissingSelf]
    );
    assert_eq!(diagnostics[1].severity, Severity::Warning);
}

#[test]
fn test_signature_errors() {
    let cases = [
        ("def f(a, a): ...\n", "duplicate parameter `a`"),
        ("def f(*, **kw): ...\n", "named parameters must follow a bare `*`"),
        ("def f(*a, *b): ...\n", "`*` may appear only once"),
        ("def f(/, a): ...\n", "at least one parameter must precede `/`"),
        ("def f(a, *, b, /): ...\n", "`/` must come before `*`"),
        ("def f(**kw, a): ...\n", "parameter `a` follows `**kw`"),
        ("def f(*args=1): ...\n", "variadic parameter `args` cannot have a default"),
    ];
    for (source, expected) in cases {
        let (stub, errors) = crate::parser::parse_stub("t.pyi", source);
        assert!(errors.is_empty(), "{}: {:#?}", source, errors);
        let crate::ast::Stmt::Function(sig) = &stub.stmts[0] else {
            panic!("Expected function in {}", source);
        };
        let found = signature_errors(sig);
        assert_eq!(found.len(), 1, "{}: {:?}", source, found);
        assert_eq!(found[0].1, expected);
    }

    let (stub, _) = crate::parser::parse_stub("t.pyi", "def f(a, b=1, *, c, d=2, e) -> None: ...\n");
    let crate::ast::Stmt::Function(sig) = &stub.stmts[0] else {
        panic!("Expected function");
    };
    assert!(signature_errors(sig).is_empty());
}

#[test]
fn test_undefined_exports() {
    let diagnostics = check(&[
        (
            "docker",
            "docker/__init__.pyi",
            "from .client import DockerClient\nfrom .errors import *\n__all__ = ['DockerClient', 'APIError', 'errors', 'from_env']\n",
        ),
        ("docker.client", "docker/client.pyi", "class DockerClient: ...\n"),
        ("docker.errors", "docker/errors.pyi", "class APIError(Exception): ...\n"),
    ]);
    assert_eq!(rules(&diagnostics), vec![Rule::UndefinedExport]);
    assert!(diagnostics[0].message.contains("`from_env`"));
}

#[test]
fn test_permissive_external_names() {
    let diagnostics = check(&[(
        "docker.transport",
        "docker/transport.pyi",
        "from _typeshed import Incomplete\nimport urllib3.connectionpool\nfrom requests.adapters import HTTPAdapter\nclass UnixHTTPAdapter(HTTPAdapter): ...\nclass Pool(urllib3.connectionpool.HTTPConnectionPool): ...\nclass Anything(Incomplete): ...\n",
    )]);
    assert!(diagnostics.is_empty(), "{:#?}", diagnostics);
}

#[test]
fn test_selection_and_sorting() {
    let files = [
        ("b", "b.pyi", "class B(Missing): ...\n"),
        ("a", "a.pyi", "x: int\nx: str\nclass A(Nope): ...\n"),
    ];
    let diagnostics = check(&files);
    let order: Vec<_> = diagnostics
        .iter()
        .map(|d| (d.file.as_str(), d.rule))
        .collect();
    assert_eq!(
        order,
        vec![
            ("a.pyi", Rule::DuplicateSymbol),
            ("a.pyi", Rule::UnresolvedBase),
            ("b.pyi", Rule::UnresolvedBase),
        ]
    );

    let config = Config::parse("[rules]\nignore = [\"unresolved-base\"]\n").unwrap();
    let diagnostics = validate_tree(&tree(&files), &config).unwrap();
    assert_eq!(rules(&diagnostics), vec![Rule::DuplicateSymbol]);
}
