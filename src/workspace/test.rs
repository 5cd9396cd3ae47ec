use super::*;
use crate::diagnostics::Rule;

use std::fs;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn module_names(tree: &StubTree) -> Vec<&str> {
    tree.modules.keys().map(String::as_str).collect()
}

#[test]
fn test_resolve_relative() {
    assert_eq!(
        resolve_relative("docker.api.client", false, 1, Some("build")),
        Some("docker.api.build".to_string())
    );
    assert_eq!(
        resolve_relative("docker.api", true, 1, Some("build")),
        Some("docker.api.build".to_string())
    );
    assert_eq!(
        resolve_relative("docker.api", true, 2, None),
        Some("docker".to_string())
    );
    assert_eq!(
        resolve_relative("docker.api.client", false, 2, Some("errors")),
        Some("docker.errors".to_string())
    );
    assert_eq!(resolve_relative("docker.api", false, 2, Some("x")), None);
    assert_eq!(resolve_relative("docker", true, 2, None), None);
    assert_eq!(
        resolve_relative("anything", false, 0, Some("typing")),
        Some("typing".to_string())
    );
}

#[test]
fn test_from_sources() {
    let tree = StubTree::from_sources(vec![
        (
            "docker".to_string(),
            "docker/__init__.pyi".to_string(),
            "from .client import DockerClient as DockerClient\n".to_string(),
        ),
        (
            "docker.client".to_string(),
            "docker/client.pyi".to_string(),
            "class DockerClient: ...\n".to_string(),
        ),
    ]);
    assert_eq!(module_names(&tree), vec!["docker", "docker.client"]);
    assert!(tree.get("docker").unwrap().is_package);
    assert!(!tree.get("docker.client").unwrap().is_package);
    assert_eq!(tree.file_count(), 2);
    assert!(tree.packages().contains("docker"));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_load_names_modules_from_layout() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "docker/__init__.pyi", "");
    write(dir.path(), "docker/api/__init__.pyi", "");
    write(dir.path(), "docker/api/build.pyi", "class BuildApiMixin: ...\n");
    write(dir.path(), "docker/notes.txt", "not a stub");
    write(dir.path(), "six.pyi", "");

    let tree = StubTree::load(&[dir.path().to_path_buf()], &Config::default()).unwrap();
    assert_eq!(
        module_names(&tree),
        vec!["docker", "docker.api", "docker.api.build", "six"]
    );
    assert!(tree.get("docker.api").unwrap().is_package);
    assert_eq!(tree.file_count(), 4);
}

#[test]
fn test_load_package_root_and_stubs_suffix() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "docker-stubs/__init__.pyi", "");
    write(dir.path(), "docker-stubs/errors.pyi", "class APIError(Exception): ...\n");

    let tree = StubTree::load(&[dir.path().to_path_buf()], &Config::default()).unwrap();
    assert_eq!(module_names(&tree), vec!["docker", "docker.errors"]);

    // pointing at the package directory itself keeps its name
    let tree = StubTree::load(&[dir.path().join("docker-stubs")], &Config::default()).unwrap();
    assert_eq!(module_names(&tree), vec!["docker", "docker.errors"]);
}

#[test]
fn test_load_single_file_root() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "stubs/docker/errors.pyi", "class APIError(Exception): ...\n");
    write(dir.path(), "stubs/docker/__init__.pyi", "");

    let file = dir.path().join("stubs/docker/errors.pyi");
    let tree = StubTree::load(&[file], &Config::default()).unwrap();
    assert_eq!(module_names(&tree), vec!["errors"]);

    let init = dir.path().join("stubs/docker/__init__.pyi");
    let tree = StubTree::load(&[init], &Config::default()).unwrap();
    assert_eq!(module_names(&tree), vec!["docker"]);
}

#[test]
fn test_load_respects_config_globs() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "docker/__init__.pyi", "");
    write(dir.path(), "docker/transport/unixconn.pyi", "");
    write(dir.path(), "requests/__init__.pyi", "");

    let config = Config::parse(
        "[files]\ninclude = [\"docker/**\"]\nexclude = [\"docker/transport/**\"]\n",
    )
    .unwrap();
    let tree = StubTree::load(&[dir.path().to_path_buf()], &config).unwrap();
    assert_eq!(module_names(&tree), vec!["docker"]);
}

#[test]
fn test_duplicate_module_keeps_first() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pkg/__init__.pyi", "x: int\n");
    write(dir.path(), "pkg.pyi", "y: int\n");

    let tree = StubTree::load(&[dir.path().to_path_buf()], &Config::default()).unwrap();
    assert_eq!(module_names(&tree), vec!["pkg"]);
    assert!(tree.get("pkg").unwrap().get("x").is_some());

    assert_eq!(tree.diagnostics.len(), 1);
    let duplicate = &tree.diagnostics[0];
    assert_eq!(duplicate.rule, Rule::DuplicateModule);
    assert!(duplicate.file.ends_with("pkg.pyi"));
    assert_eq!(tree.file_count(), 2);
}

#[test]
fn test_load_collects_syntax_errors() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "broken.pyi", "def f(:\n");

    let tree = StubTree::load(&[dir.path().to_path_buf()], &Config::default()).unwrap();
    assert!(tree.get("broken").is_some());
    assert!(tree.diagnostics.iter().any(|d| d.rule == Rule::SyntaxError));
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = StubTree::load(&[missing.clone()], &Config::default()).unwrap_err();
    assert!(matches!(err, StubError::MissingRoot(path) if path == missing));
}
