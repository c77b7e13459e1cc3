//! Run command - periodic tracking until interrupted.

use std::sync::Arc;

use console::style;
use tokio::sync::Notify;
use tracing::info;

use geotrack::app::TrackerApp;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Start the tracker and block until Ctrl+C.
pub fn run(debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug, true)?;
    runner.log_startup("run");

    let app_config = runner.app_config()?;
    let interval = app_config.tracker.interval();
    let window = app_config.tracker.throttle_window();

    let shutdown = Arc::new(Notify::new());
    let shutdown_handler = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        // notify_one stores a permit, so an early Ctrl+C is not lost
        shutdown_handler.notify_one();
    })
    .map_err(|e| CliError::Runtime(format!("Failed to set Ctrl+C handler: {}", e)))?;

    runner.block_on(async move {
        let app = TrackerApp::start(app_config).await?;
        let status = app.status()?;

        println!("{}", style("geotrack is tracking").green().bold());
        println!("  Collector: {}", app.config().collector.base_url);
        println!("  Source:    {}", app.position().name());
        println!("  Interval:  {}s", interval.as_secs());
        println!("  Throttle:  {}s inside safe zones", window.as_secs());
        match &status.device_id {
            Some(id) => println!("  Device:    {}", id),
            None => println!(
                "  Device:    {} (samples are queued until registered)",
                style("not registered").yellow()
            ),
        }
        if status.queued > 0 {
            println!("  Backlog:   {} queued sample(s)", status.queued);
        }
        println!();
        println!("Press Ctrl+C to stop.");

        shutdown.notified().await;
        info!("Interrupt received");
        println!();
        println!("Stopping...");
        app.shutdown().await;
        Ok::<(), CliError>(())
    })?;

    println!("{}", style("Stopped.").dim());
    Ok(())
}
