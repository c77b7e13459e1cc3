//! Drain command - flush the offline queue.

use console::style;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Upload queued samples in order until the queue is empty or a send fails.
pub fn run(debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug, false)?;
    runner.log_startup("drain");
    let app = runner.open_app()?;

    let delivered = runner.block_on(app.sync().drain())?;
    let remaining = app.status()?.queued;

    println!(
        "{} {} sample(s), {} remaining",
        style("Delivered").green().bold(),
        delivered,
        remaining
    );
    if remaining > 0 && app.status()?.device_id.is_none() {
        println!(
            "{}",
            style("Device is not registered; samples stay queued.").yellow()
        );
    }
    Ok(())
}
