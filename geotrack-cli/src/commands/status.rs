//! Status command.

use console::style;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Print the locally persisted state.
pub fn run(debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug, false)?;
    let app = runner.open_app()?;
    let status = app.status()?;

    println!("{}", style("geotrack status").bold());
    println!("  Database:  {}", app.config().storage.database.display());
    println!("  Collector: {}", app.config().collector.base_url);
    println!("  Log file:  {}", runner.config().logging.file.display());
    match status.device_id {
        Some(id) => println!("  Device:    {}", id),
        None => println!("  Device:    {}", style("not registered").yellow()),
    }
    println!("  Queued:    {} / {}", status.queued, status.max_queued);
    println!("  Zones:     {}", status.zones);
    match status.last_sent_at {
        Some(at) => println!("  Throttle:  window opened {}", at.to_rfc3339()),
        None => println!("  Throttle:  inactive"),
    }
    Ok(())
}
