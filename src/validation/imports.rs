use tracing::trace;

use crate::diagnostics::{Diagnostic, Rule};
use crate::resolve::{Resolved, Resolver};
use crate::symbols::{ImportKind, ImportRecord, ModuleDecl, Symbol, SymbolKind};

/// Checks that every import of `module` names something that exists.
/// Imports of modules outside the tree are never reported.
pub fn check_imports(module: &ModuleDecl, resolver: &Resolver) -> Vec<Diagnostic> {
    let mut errors = vec![];

    for import in &module.imports {
        // already reported as relative-import-beyond-top
        let Some(target) = &import.target else {
            continue;
        };

        let Some(target_decl) = resolver.lookup_module(target) else {
            if resolver.has_module(target) {
                errors.extend(check_namespace_names(module, import, target, resolver));
            } else if import.relative || resolver.is_internal(target) {
                errors.push(missing_module(module, import, target));
            } else {
                trace!(module = %module.name, target, "external import");
            }
            continue;
        };

        let ImportKind::From { names, .. } = &import.kind else {
            continue;
        };

        for imported in names {
            if resolver.has_module(&format!("{}.{}", target, imported.name)) {
                continue;
            }
            let binding = target_decl
                .get(&imported.name)
                .filter(|symbol| !is_own_binding(module, target, &imported.name, symbol));
            match binding {
                Some(symbol) => {
                    let is_alias = matches!(
                        symbol.kind,
                        SymbolKind::Import { .. } | SymbolKind::Module { .. }
                    );
                    if is_alias && !symbol.reexported {
                        errors.push(
                            Diagnostic::new(
                                Rule::PrivateImport,
                                module.file.clone(),
                                imported.span.clone(),
                                format!(
                                    "`{}` is imported into `{}` but not re-exported by it",
                                    imported.name, target
                                ),
                            )
                            .with_label(
                                target_decl.file.clone(),
                                symbol.span.clone(),
                                "imported here without `as` re-export",
                            )
                            .with_note(format!(
                                "write `import {0} as {0}` in `{1}` or list it in `__all__`",
                                imported.name, target
                            )),
                        );
                    }
                }
                None => {
                    if let Resolved::Missing = resolver.resolve_symbol(target, &imported.name) {
                        errors.push(
                            Diagnostic::new(
                                Rule::UnresolvedImport,
                                module.file.clone(),
                                imported.span.clone(),
                                format!(
                                    "`{}` is not declared in `{}`",
                                    imported.name, target
                                ),
                            )
                            .with_note(format!("`{}` is declared by {}", target, target_decl.file)),
                        );
                    }
                }
            }
        }
    }

    errors
}

/// `from . import x` inside a package binds `x` in the package itself.
fn is_own_binding(module: &ModuleDecl, target: &str, name: &str, symbol: &Symbol) -> bool {
    module.name == target
        && matches!(
            &symbol.kind,
            SymbolKind::Import { module: Some(bound), name: bound_name }
                if bound == target && bound_name == name
        )
}

/// A directory without `__init__.pyi` only holds submodules.
fn check_namespace_names(
    module: &ModuleDecl,
    import: &ImportRecord,
    target: &str,
    resolver: &Resolver,
) -> Vec<Diagnostic> {
    let ImportKind::From { names, .. } = &import.kind else {
        return vec![];
    };
    names
        .iter()
        .filter(|imported| !resolver.has_module(&format!("{}.{}", target, imported.name)))
        .map(|imported| {
            Diagnostic::new(
                Rule::UnresolvedImport,
                module.file.clone(),
                imported.span.clone(),
                format!(
                    "`{}` is not a submodule of namespace package `{}`",
                    imported.name, target
                ),
            )
        })
        .collect()
}

fn missing_module(module: &ModuleDecl, import: &ImportRecord, target: &str) -> Diagnostic {
    let message = if import.relative {
        format!("relative import `{}` refers to missing module `{}`", import.written, target)
    } else {
        format!("module `{}` is not part of the stub tree", target)
    };
    Diagnostic::new(Rule::UnresolvedModule, module.file.clone(), import.span.clone(), message)
}
