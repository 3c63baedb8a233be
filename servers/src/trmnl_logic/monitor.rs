//! Periodic tasks: the full re-render on the configured interval and the
//! rotation check once a minute. Both stop on the shutdown broadcast.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use crate::trmnl_logic::state::AppState;

pub const ROTATION_CHECK_PERIOD: Duration = Duration::from_secs(60);

pub async fn run_refresh(app_state: AppState, mut shutdown: broadcast::Receiver<()>) {
    let period = app_state.pipeline.config().render.refresh_interval();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately; the initial render already ran
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Refresh task received shutdown signal.");
                break;
            }
            _ = ticker.tick() => {
                log::info!("Scheduled render triggered");
                if let Err(e) = app_state.pipeline.render_all().await {
                    log::error!("Scheduled render failed: {}", e);
                }
            }
        }
    }
}

pub async fn run_rotation(app_state: AppState, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = interval(ROTATION_CHECK_PERIOD);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Rotation task received shutdown signal.");
                break;
            }
            _ = ticker.tick() => {
                if let Some(view) = app_state.pipeline.rotate_if_due().await {
                    log::debug!("Device now shows view '{}'", view);
                }
            }
        }
    }
}
