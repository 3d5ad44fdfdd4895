//! Tick loop runner.
//!
//! [`run_signals`] paces [`SignalTicker::run_tick`] with a tokio interval
//! until the configured tick limit is reached. Evaluation itself never
//! awaits; the runner only decides when the next tick starts.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::tick::{SignalTicker, TickError, TickSummary, TrainSource};

/// Result of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Total lamp changes reported across all ticks.
    pub lamp_changes: u64,
    /// Total forced chain resolutions across all ticks.
    pub forced_resolutions: u64,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
}

/// Run ticks until `config.max_ticks` have executed (0 = forever).
///
/// # Errors
///
/// Returns [`TickError`] if a tick fails.
pub async fn run_signals(
    ticker: &mut SignalTicker,
    source: &dyn TrainSource,
    config: &EngineConfig,
) -> Result<RunSummary, TickError> {
    let mut summary = RunSummary::default();

    info!(
        max_ticks = config.max_ticks,
        tick_interval_ms = config.tick_interval_ms,
        generation = ticker.network().generation(),
        "Signal evaluation starting"
    );

    let period = Duration::from_millis(config.tick_interval_ms.max(1));
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while config.max_ticks == 0 || summary.total_ticks < config.max_ticks {
        interval.tick().await;

        let tick = ticker.run_tick(source)?;
        summary.total_ticks = summary.total_ticks.saturating_add(1);
        summary.lamp_changes = summary
            .lamp_changes
            .saturating_add(u64::try_from(tick.changes.len()).unwrap_or(u64::MAX));
        summary.forced_resolutions = summary
            .forced_resolutions
            .saturating_add(u64::try_from(tick.forced.len()).unwrap_or(u64::MAX));
        summary.final_summary = Some(tick);
    }

    Ok(summary)
}

/// Log the outcome of a run.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        total_ticks = summary.total_ticks,
        lamp_changes = summary.lamp_changes,
        forced_resolutions = summary.forced_resolutions,
        final_tick = summary.final_summary.as_ref().map(|s| s.tick),
        "Signal evaluation ended"
    );
    if summary.final_summary.is_none() {
        warn!("Signal evaluation ended with no ticks executed");
    }
}
