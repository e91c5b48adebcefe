//! snapload CLI: run, check and inspect incremental extraction pipelines.

use clap::{Parser, Subcommand};
use snapload_core::config::RunConfig;
use snapload_core::manifest::RunManifest;
use snapload_core::table::TableSpec;
use snapload_core::watermark::Watermark;
use snapload_exec::{connector_for_uri, Orchestrator, RunReport};
use snapload_io::{FileSink, FileWatermarkStore, FsStorage, WatermarkStore};
use snapload_planner::{parse_pipeline_file, plan_all, validate_tables, PipelineConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snapload")]
#[command(about = "Checkpointed incremental table extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every configured table and advance the watermark
    Run {
        /// Path to the pipeline file (YAML, or JSON by extension)
        #[arg(short, long, alias = "pipeline")]
        config: PathBuf,

        /// Source location (overrides config)
        #[arg(long)]
        source_uri: Option<String>,

        /// Watermark record path (overrides config)
        #[arg(long)]
        watermark_path: Option<String>,

        /// Base directory for relative sinks (overrides config)
        #[arg(long)]
        output_dir: Option<String>,

        /// Write the run manifest as JSON to this path
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Check a pipeline file without touching the source
    Validate {
        #[arg(short, long, alias = "pipeline")]
        config: PathBuf,
    },

    /// Show the query each table would run against the current watermark
    Explain {
        #[arg(short, long, alias = "pipeline")]
        config: PathBuf,

        /// Watermark record path (overrides config)
        #[arg(long)]
        watermark_path: Option<String>,
    },

    /// Inspect or edit the watermark record
    Watermark {
        #[command(subcommand)]
        action: WatermarkAction,
    },
}

#[derive(Subcommand)]
enum WatermarkAction {
    /// Print the current watermark
    Show {
        #[arg(long)]
        path: Option<String>,
    },
    /// Overwrite the watermark, e.g. to re-extract from a known point
    Set {
        /// Timestamp, `YYYY-MM-DD HH:MM:SS`
        timestamp: String,
        #[arg(long)]
        path: Option<String>,
    },
    /// Delete the record; the next run extracts everything
    Reset {
        #[arg(long)]
        path: Option<String>,
    },
}

/// CLI flags that take precedence over the pipeline file and environment.
#[derive(Debug, Default)]
struct Overrides {
    source_uri: Option<String>,
    watermark_path: Option<String>,
    output_dir: Option<String>,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            source_uri,
            watermark_path,
            output_dir,
            manifest,
        } => run_pipeline(
            &config,
            Overrides {
                source_uri,
                watermark_path,
                output_dir,
            },
            manifest.as_deref(),
        ),
        Commands::Validate { config } => validate_pipeline(&config),
        Commands::Explain {
            config,
            watermark_path,
        } => explain_pipeline(
            &config,
            Overrides {
                watermark_path,
                ..Default::default()
            },
        ),
        Commands::Watermark { action } => watermark_command(action),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SNAPLOAD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Defaults, then environment, then pipeline file, then CLI flags.
fn resolve_config(file: &PipelineConfig, overrides: &Overrides) -> RunConfig {
    let mut config = RunConfig::from_env();
    apply_pipeline_config(&mut config, file);
    apply_overrides(&mut config, overrides);
    config
}

fn run_pipeline(
    config_path: &Path,
    overrides: Overrides,
    manifest_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = parse_pipeline_file(config_path)?;
    let config = resolve_config(&parsed.config, &overrides);
    tracing::debug!(?config, "resolved run config");

    let connector = connector_for_uri(&config.source_uri)?;
    let store = FileWatermarkStore::new(&config.watermark_path);
    let sink = FileSink::new(config.output_dir.clone());

    let orchestrator = Orchestrator::new(parsed.tables);
    let outcome = orchestrator.run(&store, connector.as_ref(), &sink);
    let report = match &outcome {
        Ok(report) => report,
        Err(failure) => &failure.report,
    };

    print_report(report, orchestrator.tables(), &config);
    if let Some(path) = manifest_path {
        write_manifest(path, &report.manifest)?;
    }
    outcome?;
    Ok(())
}

fn print_report(report: &RunReport, tables: &[TableSpec], config: &RunConfig) {
    for (result, spec) in report.results.iter().zip(tables) {
        let mark = if result.is_success() { "✓" } else { "✗" };
        let load = if spec.is_incremental() {
            format!("incremental, after {}", report.previous_watermark)
        } else {
            "full".to_string()
        };
        match &result.error {
            None => println!(
                "{mark} {} ({load}): {} rows -> {}",
                result.table_name,
                result.row_count,
                config.resolve_sink(&spec.sink)
            ),
            Some(e) => println!("{mark} {} ({load}): {e}", result.table_name),
        }
    }
    match &report.committed_watermark {
        Some(w) => println!(
            "✓ Run {} committed watermark {} (was {})",
            report.run_id, w, report.previous_watermark
        ),
        None => println!(
            "✗ Run {} did not commit; watermark stays at {}",
            report.run_id, report.previous_watermark
        ),
    }
}

fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = serde_json::to_vec_pretty(manifest)?;
    FsStorage::new().write_atomic(path, &bytes)?;
    Ok(())
}

fn validate_pipeline(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = parse_pipeline_file(config_path)?;
    validate_tables(&parsed.tables)?;
    let config = resolve_config(&parsed.config, &Overrides::default());
    connector_for_uri(&config.source_uri)?;
    println!("✓ Pipeline is valid ({} tables)", parsed.tables.len());
    Ok(())
}

fn explain_pipeline(
    config_path: &Path,
    overrides: Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = parse_pipeline_file(config_path)?;
    let config = resolve_config(&parsed.config, &overrides);
    let store = FileWatermarkStore::new(&config.watermark_path);
    let current = store.load();
    let planned = plan_all(&parsed.tables, &current)?;

    println!("Extraction Plan");
    println!("===============");
    println!();
    println!("Source:    {}", config.source_uri);
    println!("Watermark: {} ({})", current, store.describe());
    println!();
    for (i, table) in planned.iter().enumerate() {
        println!(
            "{}. {} [{}] -> {}",
            i + 1,
            table.spec.name,
            table.spec.load_type,
            config.resolve_sink(&table.spec.sink)
        );
        println!("   {}", table.query.text);
        for (name, value) in &table.query.params {
            println!("   :{} = {}", name, value);
        }
    }
    Ok(())
}

fn watermark_command(action: WatermarkAction) -> Result<(), Box<dyn std::error::Error>> {
    let defaults = RunConfig::from_env();
    let store_at = |path: Option<String>| {
        FileWatermarkStore::new(path.unwrap_or_else(|| defaults.watermark_path.clone()))
    };
    match action {
        WatermarkAction::Show { path } => {
            let store = store_at(path);
            println!("{} ({})", store.load(), store.describe());
        }
        WatermarkAction::Set { timestamp, path } => {
            let ts = Watermark::parse(timestamp)?;
            let store = store_at(path);
            store.save(&ts)?;
            println!("✓ Watermark set to {} ({})", ts, store.describe());
        }
        WatermarkAction::Reset { path } => {
            let store = store_at(path);
            store.reset()?;
            println!("✓ Watermark reset ({})", store.describe());
        }
    }
    Ok(())
}

fn apply_pipeline_config(cfg: &mut RunConfig, doc: &PipelineConfig) {
    if let Some(uri) = &doc.source_uri {
        cfg.source_uri = uri.clone();
    }
    if let Some(path) = &doc.watermark_path {
        cfg.watermark_path = path.clone();
    }
    if let Some(dir) = &doc.output_dir {
        cfg.output_dir = Some(dir.clone());
    }
}

fn apply_overrides(cfg: &mut RunConfig, flags: &Overrides) {
    if let Some(uri) = &flags.source_uri {
        cfg.source_uri = uri.clone();
    }
    if let Some(path) = &flags.watermark_path {
        cfg.watermark_path = path.clone();
    }
    if let Some(dir) = &flags.output_dir {
        cfg.output_dir = Some(dir.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::{
        apply_overrides, apply_pipeline_config, watermark_command, Cli, Overrides, RunConfig,
        WatermarkAction,
    };
    use clap::CommandFactory;
    use snapload_planner::PipelineConfig;

    #[test]
    fn pipeline_config_overrides_env_defaults() {
        let mut config = RunConfig::default();
        let pipeline = PipelineConfig {
            source_uri: Some("sqlite:///data/shop.db".into()),
            output_dir: Some("out".into()),
            ..Default::default()
        };
        apply_pipeline_config(&mut config, &pipeline);
        assert_eq!(config.source_uri, "sqlite:///data/shop.db");
        assert_eq!(config.output_dir.as_deref(), Some("out"));
        assert_eq!(config.watermark_path, "last_run.json");
    }

    #[test]
    fn cli_overrides_higher_priority_than_config() {
        let mut config = RunConfig::default();
        let pipeline = PipelineConfig {
            watermark_path: Some("state/pipeline.json".into()),
            ..Default::default()
        };
        apply_pipeline_config(&mut config, &pipeline);
        assert_eq!(config.watermark_path, "state/pipeline.json");

        apply_overrides(
            &mut config,
            &Overrides {
                watermark_path: Some("state/cli.json".into()),
                ..Default::default()
            },
        );
        assert_eq!(config.watermark_path, "state/cli.json");
    }

    #[test]
    fn watermark_set_rejects_unpadded_timestamps() {
        let dir = std::env::temp_dir().join(format!("snapload-cli-set-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("last_run.json");
        let path_arg = || Some(path.to_string_lossy().into_owned());

        for bad in ["2024-01-01  9:00:00", "+2024-01-01 9:00:00"] {
            let action = WatermarkAction::Set {
                timestamp: bad.into(),
                path: path_arg(),
            };
            assert!(watermark_command(action).is_err(), "accepted {bad:?}");
            assert!(!path.exists());
        }

        let action = WatermarkAction::Set {
            timestamp: "2024-01-01 09:00:00".into(),
            path: path_arg(),
        };
        watermark_command(action).unwrap();
        assert!(path.is_file());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
