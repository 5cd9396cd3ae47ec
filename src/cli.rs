//! Command line interface: argument parsing and the command handlers the
//! binary dispatches to.


use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::ast::StubFile;
use crate::config::Config;
use crate::diagnostics::{Diagnostic, OutputFormat, Rule, SourceMap, Summary, render};
use crate::error::exit_code;
use crate::parser::parse_stub;
use crate::symbols::ModuleDecl;
use crate::validation::validate_tree;
use crate::workspace::StubTree;

#[derive(Parser, Debug)]
#[command(name = "stubcheck")]
#[command(about = "Check Python declaration stubs for structural consistency")]
#[command(version)]
pub struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print diagnostics, no summary line
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check stub trees and report diagnostics
    Check(CheckArgs),

    /// Print the parsed declarations of one stub file as JSON
    Dump {
        /// Stub file to parse
        file: PathBuf,
    },

    /// List every rule with its default severity
    Rules,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Stub roots: directories holding packages, package directories, or single files
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Config file (default: nearest stubcheck.toml above the current directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Only run these rules (comma separated); replaces the config's selection
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Skip these rules (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

/// Runs the parsed command, writing results to `out`, and returns the
/// process exit code.
pub fn run(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Check(args) => run_check(args, cli.quiet, out),
        Commands::Dump { file } => run_dump(file, out),
        Commands::Rules => run_rules(out),
    }
}

pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path).with_context(|| format!("loading {}", path.display()));
    }
    let cwd = std::env::current_dir().context("reading the current directory")?;
    match Config::discover(&cwd)? {
        Some((config, path)) => {
            info!(path = %path.display(), "using config");
            Ok(config)
        }
        None => {
            debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn run_check(args: &CheckArgs, quiet: bool, out: &mut dyn Write) -> anyhow::Result<i32> {
    let mut config = load_config(args.config.as_deref())?;
    config
        .merge_cli(&args.select, &args.ignore)
        .context("invalid --select/--ignore")?;

    let tree = StubTree::load(&args.paths, &config)?;
    let diagnostics = validate_tree(&tree, &config)?;
    let summary = Summary::collect(tree.file_count(), &diagnostics);

    let color = !args.no_color && args.format == OutputFormat::Human;
    render(args.format, &diagnostics, &tree.sources, &summary, color, out)?;

    if !quiet && args.format != OutputFormat::Json {
        eprintln!("{}", summary);
    }

    Ok(if summary.failed() {
        exit_code::DIAGNOSTICS
    } else {
        exit_code::CLEAN
    })
}

#[derive(Serialize)]
struct Dump<'a> {
    file: &'a str,
    module: &'a ModuleDecl,
    statements: &'a StubFile,
    diagnostics: &'a [Diagnostic],
}

fn run_dump(file: &Path, out: &mut dyn Write) -> anyhow::Result<i32> {
    let source =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let name = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let path = file.display().to_string();
    let is_package = name == "__init__";

    let (stub, mut diagnostics) = parse_stub(&path, &source);
    let (module, symbol_errors) = ModuleDecl::build(&name, &path, is_package, &stub);
    diagnostics.extend(symbol_errors);

    serde_json::to_writer_pretty(
        &mut *out,
        &Dump {
            file: &path,
            module: &module,
            statements: &stub,
            diagnostics: &diagnostics,
        },
    )?;
    writeln!(out)?;

    if !diagnostics.is_empty() {
        let sources = SourceMap::from([(path.clone(), source)]);
        let summary = Summary::collect(1, &diagnostics);
        render(OutputFormat::Concise, &diagnostics, &sources, &summary, false, &mut std::io::stderr())?;
    }

    Ok(exit_code::CLEAN)
}

fn run_rules(out: &mut dyn Write) -> anyhow::Result<i32> {
    let width = Rule::all().iter().map(|r| r.code().len()).max().unwrap_or(0);
    for rule in Rule::all() {
        writeln!(
            out,
            "{:width$}  {:7}  {}",
            rule.code(),
            rule.default_severity().to_string(),
            rule.description(),
            width = width
        )?;
    }
    Ok(exit_code::CLEAN)
}
