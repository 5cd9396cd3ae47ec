pub mod bases;
pub mod exports;
pub mod imports;
pub mod signatures;

#[cfg(test)]
pub mod test;

use tracing::{debug, info};

use crate::config::{Config, RuleSelection};
use crate::diagnostics::{Diagnostic, sort_diagnostics};
use crate::error::ConfigError;
use crate::resolve::Resolver;
use crate::workspace::StubTree;

/// Runs every enabled rule over every module of `tree`. Load-time findings
/// (syntax errors, duplicates) are included.
pub fn validate_tree(tree: &StubTree, config: &Config) -> Result<Vec<Diagnostic>, ConfigError> {
    let selection = config.rule_selection()?;
    Ok(validate_with(tree, config, &selection))
}

pub fn validate_with(tree: &StubTree, config: &Config, selection: &RuleSelection) -> Vec<Diagnostic> {
    let resolver = Resolver::new(tree, config);
    let mut diagnostics = tree.diagnostics.clone();

    for module in tree.modules.values() {
        let before = diagnostics.len();
        diagnostics.extend(imports::check_imports(module, &resolver));
        diagnostics.extend(bases::check_bases(module, &resolver));
        diagnostics.extend(signatures::check_signatures(module));
        diagnostics.extend(exports::check_exports(module, &resolver));
        debug!(
            module = %module.name,
            found = diagnostics.len() - before,
            "validated module"
        );
    }
    diagnostics.extend(bases::check_cycles(tree, &resolver));

    let mut diagnostics = selection.apply(diagnostics);
    sort_diagnostics(&mut diagnostics);
    info!(
        modules = tree.modules.len(),
        diagnostics = diagnostics.len(),
        "validation finished"
    );
    diagnostics
}
