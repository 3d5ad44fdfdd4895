//! Engine binary for the rail signals network.
//!
//! Wires configuration, the demo network and the tick loop together.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `signals-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build and compile the demo network
//! 4. Run the tick loop until the tick limit or Ctrl-C
//! 5. Log the result and the final lamps

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use signals_core::config::SignalsConfig;
use signals_core::runner::{self, RunSummary};
use signals_core::snapshot::{LampBoard, NetworkHandle};
use signals_core::tick::{SignalTicker, StaticTrainSource};
use signals_network::{create_demo_network, demo_trains};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Environment variable naming the configuration file.
const CONFIG_PATH_ENV: &str = "SIGNALS_CONFIG";

/// Configuration file used when `SIGNALS_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "signals-config.yaml";

/// Application entry point for the signals engine.
///
/// # Errors
///
/// Returns an error if configuration, network construction or a tick fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so remember where it
    //    came from and report it below.
    let path = config_path(std::env::var(CONFIG_PATH_ENV).ok());
    let (config, loaded) = load_config(&path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("signals-engine starting");
    if loaded {
        info!(path = %path.display(), "Configuration loaded");
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
    }
    info!(
        zero_directional = ?config.network.zero_directional,
        tick_interval_ms = config.engine.tick_interval_ms,
        max_ticks = config.engine.max_ticks,
        "Configuration"
    );

    // 3. Build the demo network.
    let (index, signals) = create_demo_network().map_err(EngineError::from)?;
    let network = Arc::new(
        NetworkHandle::compile(index, config.network.zero_directional)
            .map_err(EngineError::from)?,
    );
    let board = Arc::new(LampBoard::new());
    let graph = network.snapshot().graph;
    let source = StaticTrainSource::new(demo_trains(&graph));
    info!(
        edges = graph.edge_count(),
        signals = graph.signals().count(),
        "Demo network ready"
    );

    // 4. Run the tick loop.
    let mut ticker = SignalTicker::new(Arc::clone(&network), Arc::clone(&board));
    let outcome = tokio::select! {
        result = runner::run_signals(&mut ticker, &source, &config.engine) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let summary = if let Some(result) = outcome {
        result.map_err(EngineError::from)?
    } else {
        info!(tick = ticker.tick(), "Interrupted");
        RunSummary {
            total_ticks: ticker.tick(),
            ..RunSummary::default()
        }
    };

    // 5. Report.
    runner::log_run_end(&summary);
    let published = board.current();
    for (name, position) in signals.named() {
        info!(
            signal = name,
            position = %position,
            lamp = %published.lamp_status(position),
            "Final lamp"
        );
    }

    Ok(())
}

/// Configuration path from the environment, or the default.
fn config_path(from_env: Option<String>) -> PathBuf {
    from_env
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. The flag reports whether the file was read.
fn load_config(path: &std::path::Path) -> Result<(SignalsConfig, bool), EngineError> {
    if path.exists() {
        Ok((SignalsConfig::from_file(path)?, true))
    } else {
        let mut config = SignalsConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn config_path_defaults_without_env() {
        assert_eq!(config_path(None), PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(
            config_path(Some("  ".to_owned())),
            PathBuf::from(DEFAULT_CONFIG_PATH)
        );
        assert_eq!(
            config_path(Some("/etc/signals.yaml".to_owned())),
            PathBuf::from("/etc/signals.yaml")
        );
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let result = load_config(Path::new("/nonexistent/signals-config.yaml"));
        assert!(result.is_ok());
        if let Ok((config, loaded)) = result {
            assert!(!loaded);
            assert_eq!(config.engine.max_ticks, 0);
        }
    }
}
