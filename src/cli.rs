//! Command-line driver: resolve fixtures, fan them out, print the report.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;

use crate::config::Config;
use crate::expectation::MarkerPolicy;
use crate::rules::RuleRegistry;
use crate::runner::{self, report, FixtureOutcome, FixtureRunner, MatchMode, OutputFormat};

/// Entry point for the `attr-verify` binary
pub async fn run() -> Result<ExitCode> {
    let config = Config::from_args_and_env()?;
    init_logging(&config.log_level);

    if let Some(path) = &config.project_config_path {
        log::info!("Using project config {}", path.display());
    }

    if config.watch {
        crate::watch::watch(config).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let code = run_once(&config).await?;
    Ok(ExitCode::from(code))
}

/// `RUST_LOG` wins over `--log-level`
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Load rule sets, run every fixture once and print the report
pub async fn run_once(config: &Config) -> Result<u8> {
    let registry = Arc::new(RuleRegistry::from_config(config)?);
    let fixtures = collect_fixtures(&config.fixtures, &config.extensions)?;
    if fixtures.is_empty() {
        eprintln!(
            "No fixtures found (searched for: {})",
            config.extensions.join(", ")
        );
        return Ok(runner::EXIT_FAIL);
    }
    log::info!("Running {} fixture(s)", fixtures.len());

    let outcomes = run_all(registry, config.marker_policy, config.match_mode, fixtures).await?;
    print_report(&outcomes, config.format)?;
    Ok(runner::exit_code(&outcomes))
}

fn print_report(outcomes: &[FixtureOutcome], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            print!("{}", report::render_text(outcomes));
            println!("{}", report::summary(outcomes));
        }
        OutputFormat::Json => {
            let json = report::render_json(outcomes).context("Failed to serialize report")?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Expand directories into their fixture files (sorted); files pass through
/// as given
pub fn collect_fixtures(inputs: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut fixtures = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            collect_dir(input, extensions, &mut found)?;
            if found.is_empty() {
                log::warn!("No fixtures in {}", input.display());
            }
            found.sort();
            fixtures.extend(found);
        } else {
            fixtures.push(input.clone());
        }
    }
    Ok(fixtures)
}

fn collect_dir(dir: &Path, extensions: &[String], found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read fixture directory: {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_dir(&path, extensions, found)?;
        } else if has_extension(&path, extensions) {
            found.push(path);
        }
    }
    Ok(())
}

pub(crate) fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}

/// One blocking task per fixture; outcomes come back in input order
pub async fn run_all(
    registry: Arc<RuleRegistry>,
    policy: MarkerPolicy,
    match_mode: MatchMode,
    fixtures: Vec<PathBuf>,
) -> Result<Vec<FixtureOutcome>> {
    let mut tasks = JoinSet::new();
    for (index, path) in fixtures.into_iter().enumerate() {
        let registry = Arc::clone(&registry);
        tasks.spawn_blocking(move || {
            let runner = FixtureRunner::new(&registry, policy).with_match_mode(match_mode);
            (index, runner.run_path(&path))
        });
    }

    let mut indexed = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        indexed.push(joined.context("Fixture task panicked")?);
    }
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, outcome)| outcome).collect())
}
