//! `stubcheck.toml` support.
//!
//! ```toml
//! [files]
//! include = ["docker/**"]
//! exclude = ["**/_vendored/**"]
//!
//! [rules]
//! select = ["unresolved-import", "unresolved-base"]
//! ignore = ["private-import"]
//!
//! [rules.severity]
//! missing-self = "error"
//!
//! [resolve]
//! extra-builtins = ["reveal_type"]
//! ```


use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::diagnostics::{Diagnostic, Rule, Severity};
use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "stubcheck.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub files: FilesConfig,

    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub resolve: ResolveConfig,
}

/// Globs matched against paths relative to each root. An empty include
/// list keeps every `.pyi` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Rules to run. Empty means all of them.
    #[serde(default)]
    pub select: Vec<String>,

    /// Rules to skip; wins over `select`.
    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default)]
    pub severity: BTreeMap<String, Severity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ResolveConfig {
    /// Names treated like builtins: they resolve everywhere.
    #[serde(default)]
    pub extra_builtins: Vec<String>,
}

impl Config {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Walks up from `start` looking for `stubcheck.toml`, stopping at a
    /// directory that contains `.git`.
    pub fn discover(start: &Path) -> Result<Option<(Self, PathBuf)>, ConfigError> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                let config = Self::load(&candidate)?;
                return Ok(Some((config, candidate)));
            }
            if current.join(".git").exists() {
                return Ok(None);
            }
            match current.parent() {
                Some(parent) if parent != current => current = parent.to_path_buf(),
                _ => return Ok(None),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let codes = self
            .rules
            .select
            .iter()
            .chain(&self.rules.ignore)
            .chain(self.rules.severity.keys());
        for code in codes {
            if Rule::parse_code(code).is_none() {
                return Err(ConfigError::UnknownRule(code.clone()));
            }
        }
        self.file_matcher()?;
        Ok(())
    }

    /// Applies `--select`/`--ignore` from the command line. A non-empty
    /// `--select` replaces the file's selection; `--ignore` adds to it.
    pub fn merge_cli(&mut self, select: &[String], ignore: &[String]) -> Result<(), ConfigError> {
        if !select.is_empty() {
            self.rules.select = select.to_vec();
        }
        self.rules.ignore.extend(ignore.iter().cloned());
        self.validate()
    }

    pub fn file_matcher(&self) -> Result<FileMatcher, ConfigError> {
        Ok(FileMatcher {
            include: build_globset(&self.files.include)?,
            exclude: build_globset(&self.files.exclude)?,
        })
    }

    pub fn rule_selection(&self) -> Result<RuleSelection, ConfigError> {
        let parse = |code: &String| Rule::parse_code(code).ok_or_else(|| ConfigError::UnknownRule(code.clone()));

        let mut enabled: BTreeSet<Rule> = if self.rules.select.is_empty() {
            Rule::all().iter().copied().collect()
        } else {
            self.rules.select.iter().map(parse).collect::<Result<_, _>>()?
        };
        for code in &self.rules.ignore {
            enabled.remove(&parse(code)?);
        }

        let mut severity = BTreeMap::new();
        for (code, level) in &self.rules.severity {
            severity.insert(parse(code)?, *level);
        }

        Ok(RuleSelection { enabled, severity })
    }
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, ConfigError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            Glob::new(pattern).map_err(|e| ConfigError::InvalidGlob(pattern.clone(), e.to_string()))?,
        );
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| ConfigError::InvalidGlob(patterns.join(", "), e.to_string()))
}

pub struct FileMatcher {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl FileMatcher {
    /// Excludes win over includes.
    pub fn is_included(&self, relative: &Path) -> bool {
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(relative) {
                return false;
            }
        }
        match &self.include {
            Some(include) => include.is_match(relative),
            None => true,
        }
    }
}

/// Which rules run and at what severity.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSelection {
    enabled: BTreeSet<Rule>,
    severity: BTreeMap<Rule, Severity>,
}

impl Default for RuleSelection {
    fn default() -> Self {
        RuleSelection {
            enabled: Rule::all().iter().copied().collect(),
            severity: BTreeMap::new(),
        }
    }
}

impl RuleSelection {
    pub fn is_enabled(&self, rule: Rule) -> bool {
        self.enabled.contains(&rule)
    }

    pub fn severity_of(&self, rule: Rule) -> Severity {
        self.severity
            .get(&rule)
            .copied()
            .unwrap_or_else(|| rule.default_severity())
    }

    /// Drops disabled rules and applies severity overrides.
    pub fn apply(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter(|d| self.is_enabled(d.rule))
            .map(|mut d| {
                d.severity = self.severity_of(d.rule);
                d
            })
            .collect()
    }
}
