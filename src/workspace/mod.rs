#[cfg(test)]
pub mod test;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::config::{Config, FileMatcher};
use crate::diagnostics::{Diagnostic, Rule, SourceMap};
use crate::error::StubError;
use crate::parser::parse_stub;
use crate::symbols::ModuleDecl;

const STUB_EXTENSION: &str = "pyi";

/// Every declaration file of a run, keyed by dotted module name.
#[derive(Debug, Default)]
pub struct StubTree {
    pub modules: BTreeMap<String, ModuleDecl>,
    /// Findings produced while loading: syntax errors, duplicate bindings,
    /// duplicate modules.
    pub diagnostics: Vec<Diagnostic>,
    pub sources: SourceMap,
    packages: BTreeSet<String>,
}

impl StubTree {
    pub fn load(roots: &[PathBuf], config: &Config) -> Result<StubTree, StubError> {
        let matcher = config.file_matcher()?;
        let mut tree = StubTree::default();

        for root in roots {
            if !root.exists() {
                return Err(StubError::MissingRoot(root.clone()));
            }
            for (module, path, is_package) in discover(root, &matcher)? {
                let source = std::fs::read_to_string(&path).map_err(|source| StubError::Read {
                    path: path.clone(),
                    source,
                })?;
                tree.insert(&module, &path.display().to_string(), is_package, source);
            }
        }

        info!(
            modules = tree.modules.len(),
            files = tree.file_count(),
            "loaded stub tree"
        );
        Ok(tree)
    }

    /// Builds a tree from in-memory `(module, path, source)` triples. A path
    /// ending in `__init__.pyi` marks a package.
    pub fn from_sources(files: Vec<(String, String, String)>) -> StubTree {
        let mut tree = StubTree::default();
        for (module, path, source) in files {
            let is_package = Path::new(&path)
                .file_stem()
                .is_some_and(|stem| stem == "__init__");
            tree.insert(&module, &path, is_package, source);
        }
        tree
    }

    fn insert(&mut self, module: &str, path: &str, is_package: bool, source: String) {
        if let Some(first) = self.modules.get(module) {
            warn!(module, path, first = %first.file, "module declared twice");
            self.diagnostics.push(
                Diagnostic::new(
                    Rule::DuplicateModule,
                    path,
                    0..0,
                    format!("module `{}` is already declared by {}", module, first.file),
                )
                .with_label(first.file.clone(), 0..0, "first declared here")
                .with_note("only the first file is checked against its importers"),
            );
            self.sources.insert(path.to_string(), source);
            return;
        }

        debug!(module, path, is_package, "parsing stub");
        let (stub, syntax_errors) = parse_stub(path, &source);
        let (decl, symbol_errors) = ModuleDecl::build(module, path, is_package, &stub);

        self.diagnostics.extend(syntax_errors);
        self.diagnostics.extend(symbol_errors);
        if let Some(top) = module.split('.').next() {
            self.packages.insert(top.to_string());
        }
        self.modules.insert(module.to_string(), decl);
        self.sources.insert(path.to_string(), source);
    }

    pub fn get(&self, module: &str) -> Option<&ModuleDecl> {
        self.modules.get(module)
    }

    pub fn file_count(&self) -> usize {
        self.sources.len()
    }

    /// Top-level package (or module) names present in the tree.
    pub fn packages(&self) -> &BTreeSet<String> {
        &self.packages
    }
}

/// Finds stub files below `root` in sorted path order and names them.
fn discover(root: &Path, matcher: &FileMatcher) -> Result<Vec<(String, PathBuf, bool)>, StubError> {
    if root.is_file() {
        let dirs = match root.file_stem() {
            Some(stem) if stem == "__init__" => parent_package(root),
            _ => vec![],
        };
        return Ok(module_name(&dirs, root)
            .map(|(module, is_package)| (module, root.to_path_buf(), is_package))
            .into_iter()
            .collect());
    }

    // a root that is itself a package contributes its own name
    let prefix = match root.join("__init__.pyi").is_file() {
        true => parent_package(&root.join("__init__.pyi")),
        false => vec![],
    };

    let mut found = vec![];
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| StubError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().is_none_or(|ext| ext != STUB_EXTENSION)
        {
            continue;
        }

        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if !matcher.is_included(relative) {
            debug!(path = %path.display(), "excluded by config");
            continue;
        }

        let dirs: Vec<String> = prefix
            .iter()
            .cloned()
            .chain(
                relative
                    .parent()
                    .into_iter()
                    .flat_map(|p| p.components())
                    .map(|c| package_dir_name(&c.as_os_str().to_string_lossy())),
            )
            .collect();

        match module_name(&dirs, relative) {
            Some((module, is_package)) => found.push((module, path.to_path_buf(), is_package)),
            None => warn!(path = %path.display(), "skipping file with no importable module name"),
        }
    }
    Ok(found)
}

fn parent_package(init: &Path) -> Vec<String> {
    init.parent()
        .and_then(Path::file_name)
        .map(|n| vec![package_dir_name(&n.to_string_lossy())])
        .unwrap_or_default()
}

/// `docker-stubs` distributions install as `docker`.
fn package_dir_name(dir: &str) -> String {
    dir.strip_suffix("-stubs").unwrap_or(dir).to_string()
}

/// Dotted name for a stub file inside `dirs`. `__init__.pyi` names the
/// package itself.
fn module_name(dirs: &[String], file: &Path) -> Option<(String, bool)> {
    let stem = file.file_stem()?.to_string_lossy().to_string();
    let mut parts = dirs.to_vec();
    let is_package = stem == "__init__";
    if !is_package {
        parts.push(stem);
    }
    if parts.is_empty() || !parts.iter().all(|p| is_identifier(p)) {
        return None;
    }
    Some((parts.join("."), is_package))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Makes a relative import absolute. `importer` is the dotted name of the
/// importing module; a package counts as its own first anchor. Returns
/// `None` when the dots climb above the top-level package.
pub fn resolve_relative(
    importer: &str,
    is_package: bool,
    level: usize,
    module: Option<&str>,
) -> Option<String> {
    if level == 0 {
        return module.map(str::to_string);
    }

    let parts: Vec<&str> = importer.split('.').collect();
    let climb = if is_package { level - 1 } else { level };
    if climb >= parts.len() {
        return None;
    }

    let mut base = parts[..parts.len() - climb].join(".");
    if let Some(module) = module {
        base.push('.');
        base.push_str(module);
    }
    Some(base)
}
