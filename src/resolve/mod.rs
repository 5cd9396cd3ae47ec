
use tracing::trace;

use std::collections::BTreeSet;

use crate::ast::{QualName, Value};
use crate::config::Config;
use crate::parser::annotation::value_name;
use crate::symbols::{ModuleDecl, Symbol, SymbolKind};
use crate::workspace::StubTree;

/// Names every module can use without importing them.
const BUILTINS: &[&str] = &[
    "object", "type", "int", "float", "complex", "bool", "str", "bytes", "bytearray",
    "memoryview", "list", "tuple", "dict", "set", "frozenset", "range", "slice", "property",
    "staticmethod", "classmethod", "super", "Ellipsis", "NotImplemented", "BaseException",
    "Exception", "ArithmeticError", "AssertionError", "AttributeError", "BufferError",
    "EOFError", "ImportError", "ModuleNotFoundError", "LookupError", "IndexError", "KeyError",
    "MemoryError", "NameError", "OSError", "IOError", "EnvironmentError", "ConnectionError",
    "BrokenPipeError", "ConnectionAbortedError", "ConnectionRefusedError",
    "ConnectionResetError", "FileExistsError", "FileNotFoundError", "InterruptedError",
    "IsADirectoryError", "NotADirectoryError", "PermissionError", "ProcessLookupError",
    "TimeoutError", "ReferenceError", "RuntimeError", "NotImplementedError", "RecursionError",
    "StopIteration", "StopAsyncIteration", "SyntaxError", "SystemError", "SystemExit",
    "TypeError", "ValueError", "UnicodeError", "UnicodeDecodeError", "UnicodeEncodeError",
    "KeyboardInterrupt", "GeneratorExit", "Warning", "UserWarning", "DeprecationWarning",
    "PendingDeprecationWarning", "RuntimeWarning", "SyntaxWarning", "FutureWarning",
    "ImportWarning", "UnicodeWarning", "BytesWarning", "ResourceWarning",
];

/// Maximum alias hops followed for `Alias = Base` style constants.
const MAX_ALIAS_DEPTH: usize = 16;

#[derive(Debug, Clone)]
pub enum Resolved<'t> {
    /// Declared in the tree. `path` is the dotted location inside `module`,
    /// e.g. `["Outer", "Inner"]`.
    Declared {
        module: &'t ModuleDecl,
        path: Vec<String>,
        symbol: &'t Symbol,
    },
    /// A module, whether in the tree or not.
    Module(String),
    /// Outside the tree or otherwise unknowable; never reported.
    External,
    Missing,
}

impl Resolved<'_> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Resolved::Missing)
    }
}

pub struct Resolver<'t> {
    tree: &'t StubTree,
    builtins: BTreeSet<String>,
}

impl<'t> Resolver<'t> {
    pub fn new(tree: &'t StubTree, config: &Config) -> Self {
        let builtins = BUILTINS
            .iter()
            .map(|b| b.to_string())
            .chain(config.resolve.extra_builtins.iter().cloned())
            .collect();
        Resolver { tree, builtins }
    }

    pub fn lookup_module(&self, name: &str) -> Option<&'t ModuleDecl> {
        self.tree.get(name)
    }

    /// True for modules in the tree and for any module under one of the
    /// tree's top-level packages, present or not.
    pub fn is_internal(&self, name: &str) -> bool {
        if self.tree.get(name).is_some() {
            return true;
        }
        let top = name.split('.').next().unwrap_or(name);
        self.tree.packages().contains(top)
    }

    /// True for a module file in the tree or a directory holding one, such
    /// as a namespace package without `__init__.pyi`.
    pub fn has_module(&self, name: &str) -> bool {
        if self.tree.get(name).is_some() {
            return true;
        }
        let prefix = format!("{}.", name);
        self.tree
            .modules
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(module, _)| module.starts_with(&prefix))
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains(name)
    }

    /// Resolves `name` as an attribute of `module`, following imports.
    pub fn resolve_symbol(&self, module: &str, name: &str) -> Resolved<'t> {
        self.resolve_in(module, name, &mut BTreeSet::new())
    }

    fn resolve_in(
        &self,
        module: &str,
        name: &str,
        visited: &mut BTreeSet<(String, String)>,
    ) -> Resolved<'t> {
        if !visited.insert((module.to_string(), name.to_string())) {
            trace!(module, name, "import cycle");
            return Resolved::Missing;
        }

        let submodule = format!("{}.{}", module, name);

        let Some(decl) = self.lookup_module(module) else {
            return if self.has_module(&submodule) {
                Resolved::Module(submodule)
            } else if self.is_internal(module) {
                Resolved::Missing
            } else {
                Resolved::External
            };
        };

        if let Some(symbol) = decl.get(name) {
            // `from . import errors` in a package binds its own submodule
            return match self.follow(decl, symbol, visited) {
                Resolved::Missing if self.has_module(&submodule) => Resolved::Module(submodule),
                resolved => resolved,
            };
        }

        if self.has_module(&submodule) {
            return Resolved::Module(submodule);
        }

        for star in &decl.star_imports {
            let Some(target) = &star.module else {
                return Resolved::External;
            };
            match self.resolve_in(target, name, visited) {
                Resolved::Missing => continue,
                found => return found,
            }
        }

        if decl.has_dynamic_getattr() {
            return Resolved::External;
        }
        Resolved::Missing
    }

    fn follow(
        &self,
        decl: &'t ModuleDecl,
        symbol: &'t Symbol,
        visited: &mut BTreeSet<(String, String)>,
    ) -> Resolved<'t> {
        match &symbol.kind {
            SymbolKind::Import {
                module: Some(module),
                name,
            } => self.resolve_in(module, name, visited),
            SymbolKind::Import { module: None, .. } => Resolved::External,
            SymbolKind::Module { module } => Resolved::Module(module.clone()),
            _ => Resolved::Declared {
                module: decl,
                path: vec![symbol.name.clone()],
                symbol,
            },
        }
    }

    /// Resolves a dotted reference written inside `module`, in the body of
    /// the class at `scope` (empty for module level).
    pub fn resolve_reference(
        &self,
        module: &'t ModuleDecl,
        scope: &[String],
        name: &QualName,
    ) -> Resolved<'t> {
        let head = name.head();

        let enclosing = module
            .class(scope)
            .and_then(|class| class.members.get(head));
        let mut current = match enclosing {
            Some(symbol) => match &symbol.kind {
                SymbolKind::Import { .. } | SymbolKind::Module { .. } => {
                    self.follow(module, symbol, &mut BTreeSet::new())
                }
                _ => {
                    let mut path = scope.to_vec();
                    path.push(head.to_string());
                    Resolved::Declared {
                        module,
                        path,
                        symbol,
                    }
                }
            },
            None => match self.resolve_symbol(&module.name, head) {
                Resolved::Missing if self.is_builtin(head) => Resolved::External,
                resolved => resolved,
            },
        };

        for part in name.0.iter().skip(1) {
            current = self.attribute(current, part);
        }
        current
    }

    fn attribute(&self, owner: Resolved<'t>, part: &str) -> Resolved<'t> {
        match owner {
            Resolved::Module(module) => self.resolve_symbol(&module, part),
            Resolved::Declared {
                module,
                mut path,
                symbol,
            } => match &symbol.kind {
                SymbolKind::Class(class) => match class.members.get(part) {
                    Some(member) => {
                        path.push(part.to_string());
                        Resolved::Declared {
                            module,
                            path,
                            symbol: member,
                        }
                    }
                    // may be inherited
                    None if !class.bases.is_empty() => Resolved::External,
                    None => Resolved::Missing,
                },
                _ => Resolved::External,
            },
            other => other,
        }
    }

    /// Follows `Alias = Target` constants to what they name. A call such as
    /// `Base = declarative_base()` names its result: calling an in-tree
    /// function gives something unknowable, while class-like callees
    /// (`NamedTuple(...)`, `TypedDict(...)`) are followed.
    pub fn resolve_alias(&self, resolved: Resolved<'t>) -> Resolved<'t> {
        let mut current = resolved;
        for _ in 0..MAX_ALIAS_DEPTH {
            let next = match &current {
                Resolved::Declared { module, symbol, .. } => {
                    alias_target(*symbol).map(|(target, call)| (*module, target, call))
                }
                _ => None,
            };
            let Some((module, target, call)) = next else {
                return current;
            };
            current = self.resolve_reference(module, &[], target);
            if call && returns_value(&current) {
                return Resolved::External;
            }
        }
        Resolved::External
    }
}

/// The name an alias constant refers to, and whether it is called.
fn alias_target(symbol: &Symbol) -> Option<(&QualName, bool)> {
    match &symbol.kind {
        SymbolKind::Constant {
            value: Some(value), ..
        } => value_name(value).map(|name| (name, matches!(value, Value::Call(_)))),
        _ => None,
    }
}

fn returns_value(callee: &Resolved<'_>) -> bool {
    matches!(
        callee,
        Resolved::Declared { symbol, .. }
            if matches!(symbol.kind, SymbolKind::Function { .. } | SymbolKind::Property(_))
    )
}
