use std::collections::BTreeSet;

use crate::ast::{FunctionSig, ParamKind, Span};
use crate::diagnostics::{Diagnostic, Rule};
use crate::symbols::ModuleDecl;

pub fn check_signatures(module: &ModuleDecl) -> Vec<Diagnostic> {
    let mut errors = vec![];
    for function in &module.functions {
        for (span, message) in signature_errors(&function.sig) {
            errors.push(
                Diagnostic::new(Rule::InvalidSignature, module.file.clone(), span, message)
                    .with_label(
                        module.file.clone(),
                        function.sig.name.1.clone(),
                        format!("in `{}`", function.sig.name.0),
                    ),
            );
        }
        if function.in_class {
            if let Some(error) = missing_self(&module.file, &function.sig) {
                errors.push(error);
            }
        }
    }
    errors
}

/// Parameter ordering and uniqueness problems, in source order.
pub fn signature_errors(sig: &FunctionSig) -> Vec<(Span, String)> {
    let mut errors = vec![];
    let mut names: BTreeSet<&str> = BTreeSet::new();

    let mut seen_default = false;
    let mut seen_slash = false;
    // after `*` or `*args`: keyword-only, defaults no longer ordered
    let mut keyword_only = false;
    let mut bare_star: Option<&Span> = None;
    let mut var_keyword: Option<&str> = None;
    let mut positional = 0;

    for param in &sig.params {
        if let Some(kwargs) = var_keyword {
            errors.push((
                param.span.clone(),
                format!("parameter `{}` follows `**{}`", param.name, kwargs),
            ));
            continue;
        }

        match param.kind {
            ParamKind::PositionalOnlyMarker => {
                if seen_slash {
                    errors.push((param.span.clone(), "`/` may appear only once".to_string()));
                } else if keyword_only {
                    errors.push((param.span.clone(), "`/` must come before `*`".to_string()));
                } else if positional == 0 {
                    errors.push((
                        param.span.clone(),
                        "at least one parameter must precede `/`".to_string(),
                    ));
                }
                seen_slash = true;
                continue;
            }
            ParamKind::KeywordOnlyMarker | ParamKind::VarPositional => {
                if keyword_only {
                    errors.push((param.span.clone(), "`*` may appear only once".to_string()));
                }
                keyword_only = true;
                if param.kind == ParamKind::KeywordOnlyMarker {
                    bare_star = Some(&param.span);
                    continue;
                }
            }
            ParamKind::VarKeyword => var_keyword = Some(param.name.as_str()),
            ParamKind::Regular => {
                bare_star = None;
                if !keyword_only {
                    positional += 1;
                    match &param.default {
                        Some(_) => seen_default = true,
                        None if seen_default => errors.push((
                            param.span.clone(),
                            format!(
                                "parameter `{}` without a default follows a parameter with one",
                                param.name
                            ),
                        )),
                        None => {}
                    }
                }
            }
        }

        if param.kind != ParamKind::Regular {
            if let Some((_, span)) = &param.default {
                errors.push((
                    span.clone(),
                    format!("variadic parameter `{}` cannot have a default", param.name),
                ));
            }
        }

        if !names.insert(param.name.as_str()) {
            errors.push((
                param.span.clone(),
                format!("duplicate parameter `{}`", param.name),
            ));
        }
    }

    if let Some(star) = bare_star {
        errors.push((
            star.clone(),
            "named parameters must follow a bare `*`".to_string(),
        ));
    }

    errors
}

fn missing_self(file: &str, sig: &FunctionSig) -> Option<Diagnostic> {
    if sig.has_decorator("staticmethod") {
        return None;
    }
    let receiver = sig
        .params
        .first()
        .is_some_and(|p| matches!(p.kind, ParamKind::Regular | ParamKind::VarPositional));
    if receiver {
        return None;
    }

    let expected = if sig.has_decorator("classmethod") { "cls" } else { "self" };
    Some(
        Diagnostic::new(
            Rule::MissingSelf,
            file,
            sig.name.1.clone(),
            format!("method `{}` takes no `{}` parameter", sig.name.0, expected),
        )
        .with_note("mark it `@staticmethod` if it is called without an instance"),
    )
}
