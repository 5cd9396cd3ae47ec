pub mod scope;


use serde::Serialize;
use tracing::debug;

use std::collections::BTreeMap;

use crate::ast::{
    ClassDecl, FunctionSig, ImportedName, Span, Stmt, StubFile, TypeAnnot, Value,
};
use crate::diagnostics::{Diagnostic, Rule};
use crate::symbols::scope::Scope;
use crate::workspace::resolve_relative;

/// The public surface of one declaration file.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleDecl {
    pub name: String,
    pub file: String,
    pub is_package: bool,
    pub symbols: BTreeMap<String, Symbol>,
    /// `__all__` entries, when the module declares one.
    pub exports: Option<Vec<(String, Span)>>,
    pub star_imports: Vec<StarImport>,
    #[serde(skip)]
    pub imports: Vec<ImportRecord>,
    #[serde(skip)]
    pub classes: Vec<ClassRecord>,
    #[serde(skip)]
    pub functions: Vec<FunctionRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub span: Span,
    /// Whether importing this name from another module is legitimate.
    pub reexported: bool,
    /// Bound inside an `if`/`else` branch.
    pub conditional: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolKind {
    Function {
        overloads: usize,
        implementations: usize,
    },
    Property(PropertyDecl),
    Class(ClassInfo),
    Constant {
        annotation: Option<TypeAnnot>,
        value: Option<Value>,
    },
    /// `from module import name` binding. `module` is `None` when the
    /// import could not be made absolute.
    Import {
        module: Option<String>,
        name: String,
    },
    /// `import a.b` binds `a`; `import a.b as c` binds `c` to `a.b`.
    Module { module: String },
}

impl SymbolKind {
    pub fn describe(&self) -> &'static str {
        match self {
            SymbolKind::Function { .. } => "function",
            SymbolKind::Property(_) => "property",
            SymbolKind::Class(_) => "class",
            SymbolKind::Constant { .. } => "constant",
            SymbolKind::Import { .. } => "import",
            SymbolKind::Module { .. } => "module",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyDecl {
    pub getter: Option<Span>,
    pub setter: Option<Span>,
    pub deleter: Option<Span>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassInfo {
    pub bases: Vec<(TypeAnnot, Span)>,
    pub members: BTreeMap<String, Symbol>,
}

#[derive(Debug, Clone)]
pub enum ImportKind {
    Module,
    From {
        names: Vec<ImportedName>,
        star: bool,
    },
}

/// One import statement, kept for validating its target.
#[derive(Debug, Clone)]
pub struct ImportRecord {
    /// Absolute target module; `None` when a relative import climbs too far.
    pub target: Option<String>,
    pub written: String,
    pub relative: bool,
    pub kind: ImportKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct StarImport {
    pub module: Option<String>,
    pub span: Span,
}

/// A class declaration anywhere in the module, with the path of the class
/// whose body encloses it (empty at module level).
#[derive(Debug, Clone)]
pub struct ClassRecord {
    pub path: Vec<String>,
    pub name: (String, Span),
    pub bases: Vec<(TypeAnnot, Span)>,
}

impl ClassRecord {
    pub fn qualname(&self) -> String {
        let mut parts = self.path.clone();
        parts.push(self.name.0.clone());
        parts.join(".")
    }
}

#[derive(Debug, Clone)]
pub struct FunctionRecord {
    pub sig: FunctionSig,
    pub in_class: bool,
}

/// Locally declared names are public unless spelled `_private`; dunders
/// such as `__version__` are public.
pub fn is_public(name: &str) -> bool {
    !name.starts_with('_') || (name.starts_with("__") && name.ends_with("__"))
}

impl ModuleDecl {
    /// Binds every declaration of `stub` and reports names bound twice.
    pub fn build(
        name: &str,
        file: &str,
        is_package: bool,
        stub: &StubFile,
    ) -> (ModuleDecl, Vec<Diagnostic>) {
        let mut module = ModuleDecl {
            name: name.to_string(),
            file: file.to_string(),
            is_package,
            symbols: BTreeMap::new(),
            exports: None,
            star_imports: vec![],
            imports: vec![],
            classes: vec![],
            functions: vec![],
        };
        let mut errors = vec![];

        let mut scope = Scope::new(file);
        module.collect(&stub.stmts, &mut scope, &[], &mut errors);
        module.symbols = scope.finish();

        if let Some(exports) = &module.exports {
            for (export, _) in exports {
                if let Some(symbol) = module.symbols.get_mut(export) {
                    symbol.reexported = true;
                }
            }
        }

        debug!(
            module = %module.name,
            symbols = module.symbols.len(),
            classes = module.classes.len(),
            "built module declaration"
        );
        (module, errors)
    }

    fn collect(
        &mut self,
        stmts: &[Stmt],
        scope: &mut Scope,
        path: &[String],
        errors: &mut Vec<Diagnostic>,
    ) {
        let in_class = !path.is_empty();
        for stmt in stmts {
            match stmt {
                Stmt::Import(import) => {
                    for imported in &import.names {
                        let module = imported.module.to_string();
                        let (bound, target, reexported) = match &imported.alias {
                            Some(alias) => (alias.clone(), module.clone(), *alias == module),
                            None => (
                                imported.module.head().to_string(),
                                imported.module.head().to_string(),
                                false,
                            ),
                        };
                        scope.bind(
                            Symbol {
                                name: bound,
                                kind: SymbolKind::Module { module: target },
                                span: imported.span.clone(),
                                reexported,
                                conditional: false,
                            },
                            errors,
                        );
                        if !in_class {
                            self.imports.push(ImportRecord {
                                target: Some(module.clone()),
                                written: module,
                                relative: false,
                                kind: ImportKind::Module,
                                span: imported.span.clone(),
                            });
                        }
                    }
                }
                Stmt::FromImport(import) => {
                    let target = if import.level == 0 {
                        import.module.as_ref().map(|m| m.to_string())
                    } else {
                        let base = import.module.as_ref().map(|m| m.to_string());
                        let resolved =
                            resolve_relative(&self.name, self.is_package, import.level, base.as_deref());
                        if resolved.is_none() {
                            errors.push(Diagnostic::new(
                                Rule::RelativeImportBeyondTop,
                                self.file.clone(),
                                import.span.clone(),
                                format!(
                                    "relative import `{}` goes beyond the top-level package of `{}`",
                                    import.module_text(),
                                    self.name
                                ),
                            ));
                        }
                        resolved
                    };

                    if import.star {
                        self.star_imports.push(StarImport {
                            module: target.clone(),
                            span: import.span.clone(),
                        });
                    }

                    for imported in &import.names {
                        scope.bind(
                            Symbol {
                                name: imported.bound_name().to_string(),
                                kind: SymbolKind::Import {
                                    module: target.clone(),
                                    name: imported.name.clone(),
                                },
                                span: imported.span.clone(),
                                reexported: imported.is_reexport(),
                                conditional: false,
                            },
                            errors,
                        );
                    }

                    self.imports.push(ImportRecord {
                        target,
                        written: import.module_text(),
                        relative: import.level > 0,
                        kind: ImportKind::From {
                            names: import.names.clone(),
                            star: import.star,
                        },
                        span: import.span.clone(),
                    });
                }
                Stmt::Function(function) => {
                    self.functions.push(FunctionRecord {
                        sig: function.clone(),
                        in_class,
                    });
                    scope.bind_function(function, in_class, errors);
                }
                Stmt::Class(class) => {
                    let info = self.collect_class(class, path, errors);
                    scope.bind(
                        Symbol {
                            name: class.name.0.clone(),
                            kind: SymbolKind::Class(info),
                            span: class.name.1.clone(),
                            reexported: is_public(&class.name.0),
                            conditional: false,
                        },
                        errors,
                    );
                }
                Stmt::Attribute(attribute) => {
                    let name = &attribute.name.0;
                    if !in_class && name == "__all__" {
                        self.collect_exports(attribute.value.as_ref(), attribute.augmented);
                    }
                    if attribute.augmented {
                        continue;
                    }
                    scope.bind(
                        Symbol {
                            name: name.clone(),
                            kind: SymbolKind::Constant {
                                annotation: attribute.annotation.as_ref().map(|a| a.0.clone()),
                                value: attribute.value.as_ref().map(|v| v.0.clone()),
                            },
                            span: attribute.name.1.clone(),
                            reexported: is_public(name),
                            conditional: false,
                        },
                        errors,
                    );
                }
                Stmt::Conditional(conditional_stmt) => {
                    for branch in &conditional_stmt.branches {
                        let mut branch_scope = scope.branch();
                        self.collect(&branch.body, &mut branch_scope, path, errors);
                        scope.merge_conditional(branch_scope.finish());
                    }
                }
                Stmt::Pass { .. }
                | Stmt::Ellipsis { .. }
                | Stmt::Docstring { .. }
                | Stmt::Error { .. } => {}
            }
        }
    }

    fn collect_class(
        &mut self,
        class: &ClassDecl,
        path: &[String],
        errors: &mut Vec<Diagnostic>,
    ) -> ClassInfo {
        self.classes.push(ClassRecord {
            path: path.to_vec(),
            name: class.name.clone(),
            bases: class.bases.clone(),
        });

        let mut inner_path = path.to_vec();
        inner_path.push(class.name.0.clone());

        let mut scope = Scope::new(&self.file);
        self.collect(&class.body, &mut scope, &inner_path, errors);

        ClassInfo {
            bases: class.bases.clone(),
            members: scope.finish(),
        }
    }

    fn collect_exports(&mut self, value: Option<&(Value, Span)>, augmented: bool) {
        let Some((value, span)) = value else {
            return;
        };
        let names: Vec<(String, Span)> = value
            .string_items()
            .unwrap_or_default()
            .into_iter()
            .map(|name| (name.to_string(), span.clone()))
            .collect();

        match (&mut self.exports, augmented) {
            (Some(exports), true) => exports.extend(names),
            _ => self.exports = Some(names),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Looks up a class by its dotted path inside the module, e.g. `Outer.Inner`.
    pub fn class(&self, path: &[String]) -> Option<&ClassInfo> {
        let (first, rest) = path.split_first()?;
        let mut current = match &self.symbols.get(first)?.kind {
            SymbolKind::Class(info) => info,
            _ => return None,
        };
        for part in rest {
            current = match &current.members.get(part)?.kind {
                SymbolKind::Class(info) => info,
                _ => return None,
            };
        }
        Some(current)
    }

    /// A module-level `__getattr__` makes every attribute lookup succeed.
    pub fn has_dynamic_getattr(&self) -> bool {
        matches!(
            self.symbols.get("__getattr__").map(|s| &s.kind),
            Some(SymbolKind::Function { .. })
        )
    }
}
