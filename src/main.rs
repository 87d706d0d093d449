// Command-line entry point for stubdoc.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stubdoc::application::{
    CheckStubsUsecase, DuplicateDocsError, GeneratePagesUsecase, TransformTreeUsecase,
};
use stubdoc::config::StubdocConfig;
use stubdoc::domain::doc_rules::doc_rule_table;
use stubdoc::infrastructure::concurrency::init_thread_pool;
use stubdoc::infrastructure::{JsonSnapshotFile, StubSurfaceScanner};
use stubdoc::ports::SurfaceSource;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./stubdoc.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Number of worker threads for tree transforms
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expand docstring tokens of the stub tree into an output tree
    Transform {
        /// Stub source directory
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit site cross-references instead of absolute URLs
        #[arg(long)]
        site: bool,

        /// Replace the output directory if it exists
        #[arg(short, long)]
        force: bool,
    },

    /// Compare the stubs against a captured host surface
    CheckStubs {
        /// Stub source directory
        #[arg(short, long)]
        stubs: Option<PathBuf>,

        /// Captured host surface (JSON)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Only check these modules (can specify multiple)
        #[arg(short, long)]
        module: Vec<String>,
    },

    /// Write the surface declared by the stubs to a JSON snapshot
    Snapshot {
        /// Stub source directory
        #[arg(short, long)]
        stubs: Option<PathBuf>,

        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate documentation pages and merge human-written docs
    Pages {
        /// Transformed stub tree
        #[arg(long)]
        prebuild: Option<PathBuf>,

        /// Human-written documentation
        #[arg(long)]
        docs: Option<PathBuf>,

        /// Documentation build directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Transform with site links, then generate pages
    BuildDocs,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the configuration and fill in the module sections from the stub tree.
fn load_config(path: Option<&Path>) -> Result<StubdocConfig> {
    let mut config = StubdocConfig::load(path)?;
    config.apply_env();

    let scanner = StubSurfaceScanner::new(&config.paths.src);
    match scanner.discover_modules() {
        Ok(modules) => {
            for module in modules {
                config.rules.module_sections.insert(module.name, module.section);
            }
        }
        Err(e) => tracing::warn!("could not map modules to sections: {:#}", e),
    }
    Ok(config)
}

fn run_transform(config: &StubdocConfig, input: &Path, output: &Path, force: bool) -> Result<bool> {
    let rules = doc_rule_table(config.rules.clone());
    tracing::debug!(
        "{} rule(s): {}",
        rules.len(),
        rules.names().collect::<Vec<_>>().join(", ")
    );
    let usecase = TransformTreeUsecase {
        rules: &rules,
        config: &config.transform,
    };
    let report = usecase.run(input, output, force)?;

    if !report.is_success() {
        eprint!("{}", report.failures);
        return Ok(false);
    }
    println!(
        "Transformed {} file(s), copied {} into {}",
        report.transformed,
        report.copied,
        output.display()
    );
    Ok(true)
}

fn run_pages(config: &StubdocConfig, prebuild: &Path, docs: &Path, output: &Path) -> Result<bool> {
    let usecase = GeneratePagesUsecase {
        config: &config.pages,
    };
    match usecase.run(prebuild, docs, output) {
        Ok(report) => {
            println!(
                "Generated {} page file(s), merged {} human-written file(s) into {}",
                report.generated,
                report.merged,
                output.display()
            );
            Ok(true)
        }
        Err(e) => match e.downcast::<DuplicateDocsError>() {
            Ok(DuplicateDocsError(duplicates)) => {
                eprintln!("Unable to generate docs, files would be overwritten");
                for dup in duplicates {
                    eprintln!("- {}", dup.display());
                }
                Ok(false)
            }
            Err(e) => Err(e),
        },
    }
}

fn run(cli: Cli) -> Result<bool> {
    let mut config = load_config(cli.config.as_deref())?;
    init_thread_pool(cli.jobs)?;

    match cli.command {
        Command::Transform {
            input,
            output,
            site,
            force,
        } => {
            if site {
                config.rules.site_links = true;
            }
            let input = input.unwrap_or_else(|| config.paths.src.clone());
            let output = output.unwrap_or_else(|| config.paths.build_lib.clone());
            run_transform(&config, &input, &output, force)
        }
        Command::CheckStubs {
            stubs,
            snapshot,
            module,
        } => {
            let stubs = stubs.unwrap_or_else(|| config.paths.src.clone());
            let snapshot = snapshot.unwrap_or_else(|| config.paths.snapshot.clone());
            let expected = StubSurfaceScanner::new(&stubs);
            let actual = JsonSnapshotFile::new(&snapshot);

            let usecase = CheckStubsUsecase {
                expected: &expected,
                actual: &actual,
                options: config.check.diff_options(),
                modules: module,
            };
            let diff = usecase.run()?;
            tracing::info!(
                "{} name(s) only in stubs, {} only in host",
                diff.added().count(),
                diff.removed().count()
            );
            print!("{}", diff);
            if diff.has_differences() {
                println!("Stub code not same as FL Studio libraries");
                Ok(false)
            } else {
                println!("Stub code matches FL Studio libraries");
                Ok(true)
            }
        }
        Command::Snapshot { stubs, output } => {
            let stubs = stubs.unwrap_or_else(|| config.paths.src.clone());
            let snapshot = StubSurfaceScanner::new(&stubs).load()?;
            JsonSnapshotFile::new(&output).save(&snapshot)?;
            println!(
                "Wrote {} module(s) to {}",
                snapshot.len(),
                output.display()
            );
            Ok(true)
        }
        Command::Pages {
            prebuild,
            docs,
            output,
        } => {
            let prebuild = prebuild.unwrap_or_else(|| config.paths.prebuild_docs.clone());
            let docs = docs.unwrap_or_else(|| config.paths.docs.clone());
            let output = output.unwrap_or_else(|| config.paths.build_docs.clone());
            run_pages(&config, &prebuild, &docs, &output)
        }
        Command::BuildDocs => {
            config.rules.site_links = true;
            let paths = config.paths.clone();
            if !run_transform(&config, &paths.src, &paths.prebuild_docs, true)? {
                return Ok(false);
            }
            run_pages(&config, &paths.prebuild_docs, &paths.docs, &paths.build_docs)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
