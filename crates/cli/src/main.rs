use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use mta_rust_godeps_core::config::project_root_for;
use mta_rust_godeps_core::{
    format_report, mode_line, AnalyzeConfig, CategoryFilter, DependencyAnalyzer, FileConfig,
    OutputFormat, ParseErrorPolicy, ReportOptions,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage:
  godeps -f <entry file> [-d] [-v] [-t <type>]

Options:
  -f, --file     Entry file path (required)
  -d, --deep     Deep analysis, recurse into internal packages
  -v, --verbose  Verbose output
  -t, --type     Only show one kind of dependency
                 types: stdlib | third-party | internal | all (default)

Examples:
  godeps -f service/manager/rpc/manager.go
  godeps -f service/manager/rpc/manager.go -d
  godeps -f service/admin/api/admin.go -d -v
  godeps -f service/manager/rpc/manager.go -t stdlib
  godeps -f service/manager/rpc/manager.go -t third-party";

#[derive(Parser)]
#[command(name = "godeps")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Classify the dependencies of a Go entry file")]
#[command(long_about = "Parses the imports of a Go entry file and sorts every imported package \
    into standard library, third-party or internal (under the module path from go.mod). \
    With --deep, internal packages are expanded into their non-test source files and \
    analyzed in turn, so the report covers every package the entry file transitively \
    reaches inside the project.")]
pub struct Args {
    /// Entry file path
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Deep analysis: recurse into internal packages
    #[arg(short, long)]
    pub deep: bool,

    /// Turn deep analysis off even when the config file enables it
    #[arg(long, conflicts_with = "deep")]
    pub no_deep: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only show one kind of dependency: stdlib | third-party | internal | all
    #[arg(short = 't', long = "type", default_value = "all")]
    pub filter: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormatArg::Text)]
    pub format: OutputFormatArg,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Project root that internal packages are resolved against
    /// (defaults to the current directory, or its parent inside `scripts`)
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    /// Config file (defaults to godeps.toml in the project root)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Internal namespace used when go.mod declares no module
    #[arg(long)]
    pub legacy_prefix: Option<String>,

    /// Skip files matching these patterns during deep analysis
    #[arg(long, action = clap::ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Skip internal files that fail to parse instead of aborting
    #[arg(long)]
    pub skip_unparsable: bool,

    /// Parallel threads for deep analysis (1 = sequential, 0 = auto)
    #[arg(long)]
    pub threads: Option<usize>,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormatArg {
    Text,
    Json,
    Yaml,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Yaml => OutputFormat::Yaml,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env("GODEPS_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_file_config(args: &Args, project_root: &Path) -> anyhow::Result<Option<FileConfig>> {
    match args.config {
        Some(ref path) => FileConfig::load(path)
            .map(Some)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(FileConfig::discover(project_root)?),
    }
}

fn build_config(args: &Args, project_root: PathBuf) -> anyhow::Result<AnalyzeConfig> {
    let mut config = AnalyzeConfig::new(project_root.clone());
    if let Some(file) = load_file_config(args, &project_root)? {
        config = config.merge_file(&file);
    }

    // Command-line flags win over the config file
    if args.deep {
        config = config.with_deep(true);
    } else if args.no_deep {
        config = config.with_deep(false);
    }
    if let Some(ref prefix) = args.legacy_prefix {
        config = config.with_legacy_prefix(prefix.clone());
    }
    if !args.ignore.is_empty() {
        let mut patterns = config.ignore_patterns.clone();
        patterns.extend(args.ignore.iter().cloned());
        config = config.with_ignore_patterns(patterns);
    }
    if args.skip_unparsable {
        config = config.with_parse_error_policy(ParseErrorPolicy::Skip);
    }
    if let Some(threads) = args.threads {
        config = config.with_threads(threads);
    }

    Ok(config)
}

/// Absolute, symlink- and `..`-free path of an existing entry file
fn resolve_entry(file: &Path) -> anyhow::Result<PathBuf> {
    let entry = std::path::absolute(file)
        .with_context(|| format!("cannot resolve absolute path of {}", file.display()))?;
    if !entry.exists() {
        bail!("file does not exist: {}", entry.display());
    }
    fs::canonicalize(&entry).with_context(|| format!("cannot resolve {}", entry.display()))
}

/// Validate the `-t` value and the entry file before any work is done
fn resolve_inputs(args: &Args, file: &Path) -> anyhow::Result<(PathBuf, CategoryFilter)> {
    let filter: CategoryFilter = args.filter.parse()?;
    let entry = resolve_entry(file)?;
    Ok((entry, filter))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let Some(ref file) = args.file else {
        println!("Error: please specify the entry file path\n");
        println!("{USAGE}");
        process::exit(1);
    };

    let (entry, filter) = match resolve_inputs(&args, file) {
        Ok(inputs) => inputs,
        Err(e) => {
            println!("Error: {e:#}");
            process::exit(1);
        }
    };

    let project_root = match args.project_root {
        Some(ref root) => std::path::absolute(root)
            .with_context(|| format!("cannot resolve project root {}", root.display()))?,
        None => {
            let cwd = env::current_dir().context("cannot determine the current directory")?;
            project_root_for(&cwd)
        }
    };

    let config = build_config(&args, project_root)?;
    let format: OutputFormat = args.format.clone().into();

    // Keep machine-readable stdout clean
    let header = format!("Analyzing file: {}\n{}", entry.display(), mode_line(config.deep));
    if format == OutputFormat::Text && args.output.is_none() {
        println!("{header}");
    } else {
        eprintln!("{header}");
    }

    let spinner = if args.verbose {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Analyzing dependencies...");
        Some(pb)
    } else {
        None
    };

    let analyzer = DependencyAnalyzer::new(config)?;
    let result = analyzer.analyze(&entry);

    if let Some(ref pb) = spinner {
        match result {
            Ok(ref r) => pb.finish_with_message(format!(
                "Parsed {} files in {}ms",
                r.stats.files_parsed, r.metadata.duration_ms
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }
    let result = result?;

    let options = ReportOptions {
        format,
        filter,
        verbose: args.verbose,
    };
    let output = format_report(&result, &options)?;

    if let Some(ref path) = args.output {
        fs::write(path, &output).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "output written");
    } else {
        print!("{}", output);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Component;
    use tempfile::TempDir;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["godeps", "-f", "main.go"]);
        assert_eq!(args.file, Some(PathBuf::from("main.go")));
        assert!(!args.deep);
        assert!(!args.verbose);
        assert_eq!(args.filter, "all");
        assert!(matches!(args.format, OutputFormatArg::Text));
    }

    #[test]
    fn test_args_short_flags() {
        let args = Args::parse_from(["godeps", "-f", "a.go", "-d", "-v", "-t", "third-party"]);
        assert!(args.deep);
        assert!(args.verbose);
        assert_eq!(args.filter.parse::<CategoryFilter>(), Ok(CategoryFilter::ThirdParty));
    }

    #[test]
    fn test_missing_file_is_accepted_by_parser() {
        // Reported with the usage text by main, not by clap
        let args = Args::parse_from(["godeps"]);
        assert!(args.file.is_none());
    }

    #[test]
    fn test_build_config_flags_override() {
        let args = Args::parse_from([
            "godeps",
            "-f",
            "a.go",
            "-d",
            "--legacy-prefix",
            "corp.example/legacy",
            "--ignore",
            "*_gen.go",
            "--skip-unparsable",
            "--threads",
            "0",
            "--config",
            "/definitely/not/here/godeps.toml",
        ]);
        // An explicit config path that does not exist is an error
        assert!(build_config(&args, PathBuf::from("/tmp")).is_err());

        let args = Args {
            config: None,
            ..args
        };
        let config = build_config(&args, PathBuf::from("/definitely/not/here")).unwrap();
        assert!(config.deep);
        assert_eq!(config.legacy_prefix, "corp.example/legacy");
        assert_eq!(config.ignore_patterns, vec!["*_gen.go"]);
        assert_eq!(config.parse_error_policy, ParseErrorPolicy::Skip);
        assert_eq!(config.threads, 0);
    }

    #[test]
    fn test_no_deep_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("godeps.toml"), "deep = true\n").unwrap();

        let args = Args::parse_from(["godeps", "-f", "a.go"]);
        assert!(build_config(&args, dir.path().to_path_buf()).unwrap().deep);

        let args = Args::parse_from(["godeps", "-f", "a.go", "--no-deep"]);
        assert!(!build_config(&args, dir.path().to_path_buf()).unwrap().deep);
    }

    #[test]
    fn test_deep_and_no_deep_conflict() {
        assert!(Args::try_parse_from(["godeps", "-f", "a.go", "-d", "--no-deep"]).is_err());
    }

    #[test]
    fn test_invalid_type_is_rejected() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("main.go");
        fs::write(&entry, "package main\n").unwrap();

        let args = Args::parse_from(["godeps", "-f", "main.go", "-t", "vendor"]);
        let err = resolve_inputs(&args, &entry).unwrap_err();
        assert!(err.to_string().contains("invalid type 'vendor'"));
    }

    #[test]
    fn test_missing_entry_is_rejected() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.go");

        let err = resolve_entry(&missing).unwrap_err();
        assert!(err.to_string().contains("file does not exist"));

        let args = Args::parse_from(["godeps", "-f", "nope.go"]);
        assert!(resolve_inputs(&args, &missing).is_err());
    }

    #[test]
    fn test_resolve_entry_removes_parent_components() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let real = dir.path().join("main.go");
        fs::write(&real, "package main\n").unwrap();

        let entry = resolve_entry(&dir.path().join("sub").join("..").join("main.go")).unwrap();
        assert_eq!(entry, fs::canonicalize(&real).unwrap());
        assert!(!entry.components().any(|c| c == Component::ParentDir));

        let args = Args::parse_from(["godeps", "-f", "main.go", "-t", "internal"]);
        let (resolved, filter) = resolve_inputs(&args, &real).unwrap();
        assert_eq!(resolved, entry);
        assert_eq!(filter, CategoryFilter::Internal);
    }
}
