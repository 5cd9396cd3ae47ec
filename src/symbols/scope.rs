use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::ast::{Accessor, FunctionSig};
use crate::diagnostics::{Diagnostic, Rule};
use crate::symbols::{PropertyDecl, Symbol, SymbolKind, is_public};

/// Names bound in one module or class body.
pub struct Scope {
    file: String,
    bindings: BTreeMap<String, Symbol>,
}

impl Scope {
    pub fn new(file: &str) -> Self {
        Scope {
            file: file.to_string(),
            bindings: BTreeMap::new(),
        }
    }

    /// A scope for one `if`/`else` branch; merged back with
    /// [`Scope::merge_conditional`]. It starts with the enclosing
    /// properties so a guarded `@x.setter` finds its getter.
    pub fn branch(&self) -> Scope {
        let mut branch = Scope::new(&self.file);
        for (name, symbol) in &self.bindings {
            if let SymbolKind::Property(_) = symbol.kind {
                let mut symbol = symbol.clone();
                symbol.conditional = true;
                branch.bindings.insert(name.clone(), symbol);
            }
        }
        branch
    }

    pub fn finish(self) -> BTreeMap<String, Symbol> {
        self.bindings
    }

    pub fn bind(&mut self, symbol: Symbol, errors: &mut Vec<Diagnostic>) {
        match self.bindings.entry(symbol.name.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(symbol);
            }
            Entry::Occupied(entry) => {
                let first = entry.get();
                if first.conditional || symbol.conditional || same_target(first, &symbol) {
                    return;
                }
                errors.push(duplicate(&self.file, first, &symbol));
            }
        }
    }

    /// Bindings from a branch never clash with other branches, nor with
    /// later unconditional bindings.
    pub fn merge_conditional(&mut self, bindings: BTreeMap<String, Symbol>) {
        for (name, mut symbol) in bindings {
            if let (Some(SymbolKind::Property(existing)), SymbolKind::Property(branch)) = (
                self.bindings.get_mut(&name).map(|s| &mut s.kind),
                &symbol.kind,
            ) {
                existing.getter = existing.getter.take().or_else(|| branch.getter.clone());
                existing.setter = existing.setter.take().or_else(|| branch.setter.clone());
                existing.deleter = existing.deleter.take().or_else(|| branch.deleter.clone());
                continue;
            }
            symbol.conditional = true;
            self.bindings.entry(name).or_insert(symbol);
        }
    }

    pub fn bind_function(
        &mut self,
        function: &FunctionSig,
        in_class: bool,
        errors: &mut Vec<Diagnostic>,
    ) {
        let (name, span) = &function.name;

        if in_class {
            if let Some(accessor) = function.accessor_of(name) {
                self.bind_accessor(function, accessor, errors);
                return;
            }
            if function.is_property() {
                self.bind(
                    Symbol {
                        name: name.clone(),
                        kind: SymbolKind::Property(PropertyDecl {
                            getter: Some(span.clone()),
                            ..PropertyDecl::default()
                        }),
                        span: span.clone(),
                        reexported: is_public(name),
                        conditional: false,
                    },
                    errors,
                );
                return;
            }
        }

        let overload = function.is_overload();
        if let Some(existing) = self.bindings.get_mut(name) {
            if let SymbolKind::Function {
                overloads,
                implementations,
            } = &mut existing.kind
            {
                if overload {
                    *overloads += 1;
                    return;
                }
                if *implementations == 0 && *overloads > 0 {
                    *implementations = 1;
                    return;
                }
            }
        }

        self.bind(
            Symbol {
                name: name.clone(),
                kind: SymbolKind::Function {
                    overloads: overload as usize,
                    implementations: !overload as usize,
                },
                span: span.clone(),
                reexported: is_public(name),
                conditional: false,
            },
            errors,
        );
    }

    fn bind_accessor(
        &mut self,
        function: &FunctionSig,
        accessor: Accessor,
        errors: &mut Vec<Diagnostic>,
    ) {
        let (name, span) = &function.name;

        let property = match self.bindings.get_mut(name).map(|s| &mut s.kind) {
            Some(SymbolKind::Property(property)) => property,
            _ => {
                errors.push(Diagnostic::new(
                    Rule::OrphanAccessor,
                    self.file.as_str(),
                    span.clone(),
                    format!(
                        "`@{}.{}` has no `@property` getter named `{}` before it",
                        name,
                        accessor_name(accessor),
                        name
                    ),
                ));
                return;
            }
        };

        let slot = match accessor {
            Accessor::Getter => &mut property.getter,
            Accessor::Setter => &mut property.setter,
            Accessor::Deleter => &mut property.deleter,
        };
        if let Some(first) = slot.clone() {
            errors.push(
                Diagnostic::new(
                    Rule::DuplicateSymbol,
                    self.file.as_str(),
                    span.clone(),
                    format!("property `{}` already has a {}", name, accessor_name(accessor)),
                )
                .with_label(self.file.as_str(), first, "first declared here"),
            );
        } else {
            *slot = Some(span.clone());
        }
    }
}

fn accessor_name(accessor: Accessor) -> &'static str {
    match accessor {
        Accessor::Getter => "getter",
        Accessor::Setter => "setter",
        Accessor::Deleter => "deleter",
    }
}

fn same_target(first: &Symbol, second: &Symbol) -> bool {
    match (&first.kind, &second.kind) {
        (
            SymbolKind::Import { module: m1, name: n1 },
            SymbolKind::Import { module: m2, name: n2 },
        ) => m1 == m2 && n1 == n2,
        (SymbolKind::Module { module: m1 }, SymbolKind::Module { module: m2 }) => m1 == m2,
        _ => false,
    }
}

fn duplicate(file: &str, first: &Symbol, second: &Symbol) -> Diagnostic {
    Diagnostic::new(
        Rule::DuplicateSymbol,
        file,
        second.span.clone(),
        format!(
            "`{}` is already bound as a {} in this scope",
            second.name,
            first.kind.describe()
        ),
    )
    .with_label(file, first.span.clone(), "first bound here")
}
