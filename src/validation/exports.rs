use crate::diagnostics::{Diagnostic, Rule};
use crate::resolve::{Resolved, Resolver};
use crate::symbols::ModuleDecl;

/// Every `__all__` entry must name something the module binds.
pub fn check_exports(module: &ModuleDecl, resolver: &Resolver) -> Vec<Diagnostic> {
    let Some(exports) = &module.exports else {
        return vec![];
    };

    exports
        .iter()
        .filter(|(name, _)| module.get(name).is_none())
        .filter(|(name, _)| matches!(resolver.resolve_symbol(&module.name, name), Resolved::Missing))
        .map(|(name, span)| {
            Diagnostic::new(
                Rule::UndefinedExport,
                module.file.clone(),
                span.clone(),
                format!("`__all__` lists `{}`, which `{}` never binds", name, module.name),
            )
        })
        .collect()
}
