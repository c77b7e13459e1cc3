//! Update command - one manual capture and send.

use console::style;

use geotrack::tracker::Delivery;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Capture one sample and try to deliver it right away.
///
/// Exits non-zero when the sample could only be queued.
pub fn run(debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug, false)?;
    runner.log_startup("update");
    let app = runner.open_app()?;

    let delivery = runner.block_on(app.controller().update_now())?;

    match delivery {
        Delivery::Sent { sample, drained } => {
            println!(
                "{} {:.6}, {:.6} at {}",
                style("Sent").green().bold(),
                sample.latitude,
                sample.longitude,
                sample.captured_at.to_rfc3339()
            );
            if drained > 0 {
                println!("Delivered {} queued sample(s)", drained);
            }
            Ok(())
        }
        Delivery::Queued { sample, reason } => {
            println!(
                "{} {:.6}, {:.6} (queue id {})",
                style("Queued").yellow().bold(),
                sample.sample.latitude,
                sample.sample.longitude,
                sample.id
            );
            Err(CliError::NotDelivered(reason))
        }
    }
}
