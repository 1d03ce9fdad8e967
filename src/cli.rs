//! CLI argument parsing and command dispatch

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::builder::{NonEmptyStringValueParser, RangedU64ValueParser};
use clap::Parser;
use log::{debug, LevelFilter};

use svn_migrate::gateway::{DefaultVersionControl, GatewayConfig};
use svn_migrate::model::RepositoryReference;
use svn_migrate::orchestrator::{CloneOrchestrator, MigrationOptions, DEFAULT_BRANCH};
use svn_migrate::output::{OutputConfig, Reporter};

/// svn-migrate - Convert a Subversion checkout and its svn:externals to git
#[derive(Parser, Debug)]
#[command(name = "svn-migrate")]
#[command(version, about, long_about = None)]
#[command(override_usage = "svn-migrate [OPTIONS] <svn-repository> <target-dir>")]
pub struct Cli {
    /// URL of the Subversion repository (or path to a local one)
    #[arg(value_name = "svn-repository")]
    source: String,

    /// Directory to create the git working copy in; must not exist
    #[arg(value_name = "target-dir")]
    target: PathBuf,

    /// Branch to create and check out after conversion
    #[arg(long, value_name = "NAME", env = "SVN_MIGRATE_BRANCH", default_value = DEFAULT_BRANCH,
          value_parser = NonEmptyStringValueParser::new())]
    branch: String,

    /// Number of sibling externals to clone in parallel
    #[arg(short, long, value_name = "N", env = "SVN_MIGRATE_JOBS", default_value_t = 1,
          value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    jobs: usize,

    /// git executable to run
    #[arg(long, value_name = "PATH", env = "SVN_MIGRATE_GIT", default_value = "git")]
    git: PathBuf,

    /// svn executable to run
    #[arg(long, value_name = "PATH", env = "SVN_MIGRATE_SVN", default_value = "svn")]
    svn: PathBuf,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Colorize output (always, never, auto)
    #[arg(long, value_name = "WHEN", default_value = "auto",
          value_parser = ["always", "never", "auto"])]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "warn",
          value_parser = ["error", "warn", "info", "debug", "trace"])]
    log_level: String,
}

impl Cli {
    /// Execute the migration
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let reporter = if self.quiet {
            Reporter::quiet()
        } else {
            Reporter::stdout(OutputConfig::from_env_and_flag(&self.color))
        };

        let gateway = DefaultVersionControl::new(GatewayConfig {
            git_program: self.git.into_os_string(),
            svn_program: self.svn.into_os_string(),
        });
        debug!("Using {:?}", gateway.config());

        let orchestrator = CloneOrchestrator::new(
            Box::new(gateway),
            MigrationOptions {
                branch: self.branch,
                jobs: self.jobs,
            },
        )?;

        let source = RepositoryReference::from_source_argument(&self.source);
        let start_time = Instant::now();

        let summary = orchestrator.run(&source, &self.target, &reporter)?;

        reporter.success(format!(
            "migrated {} repositories ({} externals linked) from {} into {} in {:.2}s",
            summary.repositories,
            summary.links,
            summary.source,
            summary.target.display(),
            start_time.elapsed().as_secs_f64()
        ));

        Ok(())
    }
}

/// `RUST_LOG`, when set, takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.parse().unwrap_or(LevelFilter::Warn));

    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }

    // A second initialisation (e.g. from tests) is harmless
    let _ = builder.try_init();
}
