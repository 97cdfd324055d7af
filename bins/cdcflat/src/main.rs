mod error;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::Parser;

use cdcflat_api::transform::RecordTransform;
use cdcflat_debezium::{DebeziumFlatten, FlattenConfig};
use cdcflat_host::config::RunnerConfig;
use cdcflat_host::plugin_host::{build_config_values, load_transform};
use cdcflat_host::{RunStats, Runner};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "cdcflat", about = "Flatten Debezium change events into table rows")]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(long, env = "CDCFLAT_CONFIG")]
    config: Option<PathBuf>,

    /// Newline-delimited change events. Reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Transform .so plugin, overrides `[transform] plugin`.
    #[arg(long)]
    plugin: Option<PathBuf>,

    /// Do not write `{}` lines for dropped records.
    #[arg(long)]
    skip_rejected: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "cdcflat failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<RunStats, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!(config = %path.display(), "loading configuration");
            RunnerConfig::load(path)?
        }
        None => RunnerConfig::default(),
    };
    if cli.plugin.is_some() {
        config.transform.plugin = cli.plugin.clone();
    }
    let skip_rejected = cli.skip_rejected || config.output.skip_rejected;

    let transform = build_transform(&config)?;
    let runner = Runner::new(transform.as_ref()).skip_rejected(skip_rejected);

    let stdout = io::stdout().lock();
    let stats = match &cli.input {
        Some(path) => {
            let file = File::open(path).map_err(|source| CliError::Input {
                path: path.clone(),
                source,
            })?;
            runner.run(BufReader::new(file), stdout)?
        }
        None => runner.run(io::stdin().lock(), stdout)?,
    };
    Ok(stats)
}

fn build_transform(config: &RunnerConfig) -> Result<Box<dyn RecordTransform>, CliError> {
    let params = config.transform_params()?;
    match &config.transform.plugin {
        Some(path) => Ok(Box::new(load_transform(path, params.as_ref())?)),
        None => {
            let values = build_config_values(params.as_ref(), &FlattenConfig::config_params())
                .map_err(|e| e.with_context("built-in transform"))?;
            let transform = DebeziumFlatten::from_config(&values)?;
            tracing::info!(transform = transform.name(), "using built-in transform");
            Ok(Box::new(transform))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "cdcflat",
            "--input",
            "events.ndjson",
            "--plugin",
            "libcdcflat_debezium.so",
            "--skip-rejected",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("events.ndjson")));
        assert_eq!(cli.plugin, Some(PathBuf::from("libcdcflat_debezium.so")));
        assert!(cli.skip_rejected);
    }

    #[test]
    fn built_in_transform_honours_config() {
        let config = RunnerConfig::parse("[transform.config]\nlog_input_limit = 8\n").unwrap();
        let transform = build_transform(&config).unwrap();
        assert_eq!(transform.name(), "debezium-flatten");
        assert_eq!(transform.transform("{}"), "{}");
    }

    #[test]
    fn plugin_transform_is_loaded_from_config() {
        let name = format!(
            "{}cdcflat_debezium{}",
            std::env::consts::DLL_PREFIX,
            std::env::consts::DLL_SUFFIX
        );
        let exe = std::env::current_exe().unwrap();
        let deps = exe.parent().unwrap();
        let so = [deps.join(&name), deps.parent().unwrap().join(&name)]
            .into_iter()
            .find(|p| p.exists())
            .unwrap();

        let config = RunnerConfig::parse(&format!(
            "[transform]\nplugin = '{}'\n\n[transform.config]\nlog_rejected = false\n",
            so.display()
        ))
        .unwrap();
        let transform = build_transform(&config).unwrap();
        assert_eq!(transform.name(), "debezium-flatten");
        assert_eq!(
            transform.transform(
                r#"{"payload":{"op":"r","ts_ms":5,"after":{"id":7},"source":{"ts_ms":4}}}"#
            ),
            r#"{"id":7,"_op":"r","_ts_ms":5,"_source_ts_ms":4}"#
        );
    }

    #[test]
    fn missing_input_file_is_reported() {
        let cli = Cli::try_parse_from(["cdcflat", "--input", "/nonexistent/events.ndjson"]).unwrap();
        let err = run(cli).unwrap_err();
        assert!(matches!(err, CliError::Input { .. }));
    }
}
