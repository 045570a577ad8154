use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use covlens::baseline::DEFAULT_BASELINE_FILE;
use covlens::cli;
use covlens::config::Config;
use covlens::parsers::clover::DEFAULT_INCLUDE_PREFIXES;

/// covlens: per-class coverage analysis with baselines and complexity risk.
#[derive(Parser)]
#[command(name = "covlens", version, about)]
struct Cli {
    /// Directory prefix a Clover file path must contain (repeatable).
    #[arg(long = "include", global = true)]
    include: Vec<String>,

    /// Only report classes whose FQCN starts with this prefix.
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Skip classes whose FQCN starts with this prefix.
    #[arg(long, global = true)]
    exclude: Option<String>,

    /// Path to the baseline file.
    #[arg(long, global = true, default_value = DEFAULT_BASELINE_FILE)]
    baseline: PathBuf,

    /// Override format detection (clover, instrumentation).
    #[arg(long, global = true)]
    format: Option<String>,

    /// Enable debug logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Categorize classes as covered, partially covered or uncovered.
    Summary {
        /// Path to the coverage artifact.
        artifact: PathBuf,

        /// List every method with its line range.
        #[arg(long)]
        methods: bool,

        /// Also list fully covered classes.
        #[arg(long)]
        covered: bool,
    },

    /// Fail when any class is below a minimum coverage percentage.
    Check {
        artifact: PathBuf,

        /// Minimum per-class coverage percentage.
        #[arg(long)]
        min: f64,
    },

    /// Save the current coverage as the baseline.
    SaveBaseline { artifact: PathBuf },

    /// Compare the current coverage against the baseline.
    Diff { artifact: PathBuf },

    /// Score methods by complexity weighted by missing coverage.
    Complexity {
        artifact: PathBuf,

        /// JSON file of precomputed complexity facts keyed by source path.
        #[arg(long)]
        facts: PathBuf,
    },

    /// Report missing type declarations from external facts.
    Types {
        artifact: PathBuf,

        /// JSON file of type-declaration facts keyed by source path.
        #[arg(long)]
        facts: PathBuf,
    },
}

impl Cli {
    /// Build the run configuration once; it is not modified afterwards.
    fn config(&self) -> Config {
        let include_prefixes = if self.include.is_empty() {
            DEFAULT_INCLUDE_PREFIXES.iter().map(|p| p.to_string()).collect()
        } else {
            self.include.clone()
        };
        let (show_methods, show_covered) = match &self.command {
            Commands::Summary {
                methods, covered, ..
            } => (*methods, *covered),
            _ => (false, false),
        };
        Config {
            include_prefixes,
            namespace_filter: self.namespace.clone(),
            namespace_exclude: self.exclude.clone(),
            min_coverage: match &self.command {
                Commands::Check { min, .. } => Some(*min),
                _ => None,
            },
            show_methods,
            show_covered,
            baseline_path: self.baseline.clone(),
            complexity_facts: match &self.command {
                Commands::Complexity { facts, .. } => Some(facts.clone()),
                _ => None,
            },
            type_facts: match &self.command {
                Commands::Types { facts, .. } => Some(facts.clone()),
                _ => None,
            },
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = cli.config();
    let format = cli.format.as_deref();

    match &cli.command {
        Commands::Summary { artifact, .. } => {
            let report = cli::load_report(artifact, format, &config)?;
            print!("{}", cli::cmd_summary(&report, &config));
        }
        Commands::Check { artifact, .. } => {
            let report = cli::load_report(artifact, format, &config)?;
            let min = config.min_coverage.unwrap_or(0.0);
            let (out, failed) = cli::cmd_check(&report, min);
            print!("{out}");
            if failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::SaveBaseline { artifact } => {
            let report = cli::load_report(artifact, format, &config)?;
            print!("{}", cli::cmd_save_baseline(&report, &config.baseline_store())?);
        }
        Commands::Diff { artifact } => {
            let report = cli::load_report(artifact, format, &config)?;
            print!("{}", cli::cmd_diff(&report, &config.baseline_store()));
        }
        Commands::Complexity { artifact, .. } => {
            let report = cli::load_report(artifact, format, &config)?;
            if let Some(facts) = &config.complexity_facts {
                print!("{}", cli::cmd_complexity(&report, facts)?);
            }
        }
        Commands::Types { artifact, .. } => {
            let report = cli::load_report(artifact, format, &config)?;
            if let Some(facts) = &config.type_facts {
                print!("{}", cli::cmd_types(&report, facts)?);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
