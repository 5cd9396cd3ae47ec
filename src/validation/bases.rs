use std::collections::{BTreeMap, BTreeSet};

use crate::ast::Span;
use crate::diagnostics::{Diagnostic, Rule};
use crate::resolve::{Resolved, Resolver};
use crate::symbols::{ClassRecord, ModuleDecl, SymbolKind};
use crate::workspace::StubTree;

/// `(module, dotted class path)`
type ClassKey = (String, String);

pub fn check_bases(module: &ModuleDecl, resolver: &Resolver) -> Vec<Diagnostic> {
    let mut errors = vec![];

    for class in &module.classes {
        for (base, span) in &class.bases {
            // `Literal[...]`, `[...]` and friends are not class references
            let Some(name) = base.head() else {
                continue;
            };

            let resolved = resolver.resolve_alias(resolver.resolve_reference(module, &class.path, name));
            match resolved {
                Resolved::Missing => errors.push(
                    Diagnostic::new(
                        Rule::UnresolvedBase,
                        module.file.clone(),
                        span.clone(),
                        format!(
                            "base class `{}` of `{}` is neither declared nor imported",
                            name,
                            class.qualname()
                        ),
                    )
                    .with_label(module.file.clone(), class.name.1.clone(), "in this class"),
                ),
                Resolved::Module(target) => errors.push(invalid_base(
                    module,
                    class,
                    span,
                    format!("`{}` is the module `{}`, not a class", name, target),
                )),
                Resolved::Declared { symbol, .. } => match &symbol.kind {
                    SymbolKind::Function { .. } | SymbolKind::Property(_) => {
                        errors.push(invalid_base(
                            module,
                            class,
                            span,
                            format!("`{}` is a {}, not a class", name, symbol.kind.describe()),
                        ))
                    }
                    _ => {}
                },
                Resolved::External => {}
            }
        }
    }

    errors
}

fn invalid_base(module: &ModuleDecl, class: &ClassRecord, span: &Span, message: String) -> Diagnostic {
    Diagnostic::new(Rule::InvalidBase, module.file.clone(), span.clone(), message).with_label(
        module.file.clone(),
        class.name.1.clone(),
        format!("base of `{}`", class.qualname()),
    )
}

/// Reports every class whose chain of in-tree bases leads back to itself.
pub fn check_cycles(tree: &StubTree, resolver: &Resolver) -> Vec<Diagnostic> {
    let mut graph: BTreeMap<ClassKey, Vec<ClassKey>> = BTreeMap::new();
    let mut locations: BTreeMap<ClassKey, (String, Span)> = BTreeMap::new();

    for module in tree.modules.values() {
        for class in &module.classes {
            let key = (module.name.clone(), class.qualname());
            let mut edges = vec![];
            for (base, _) in &class.bases {
                let Some(name) = base.head() else {
                    continue;
                };
                let resolved = resolver.resolve_alias(resolver.resolve_reference(module, &class.path, name));
                if let Resolved::Declared {
                    module: owner,
                    path,
                    symbol,
                } = resolved
                {
                    if matches!(symbol.kind, SymbolKind::Class(_)) {
                        edges.push((owner.name.clone(), path.join(".")));
                    }
                }
            }
            locations
                .entry(key.clone())
                .or_insert_with(|| (module.file.clone(), class.name.1.clone()));
            graph.entry(key).or_default().extend(edges);
        }
    }

    let mut errors = vec![];
    for (key, (file, span)) in &locations {
        if reaches(&graph, key, key) {
            errors.push(Diagnostic::new(
                Rule::CyclicInheritance,
                file.clone(),
                span.clone(),
                format!("class `{}.{}` inherits from itself", key.0, key.1),
            ));
        }
    }
    errors
}

fn reaches(graph: &BTreeMap<ClassKey, Vec<ClassKey>>, from: &ClassKey, target: &ClassKey) -> bool {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<&ClassKey> = graph.get(from).into_iter().flatten().collect();
    while let Some(next) = stack.pop() {
        if next == target {
            return true;
        }
        if seen.insert(next) {
            stack.extend(graph.get(next).into_iter().flatten());
        }
    }
    false
}
