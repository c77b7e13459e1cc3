//! gpsd position source.
//!
//! Speaks the gpsd JSON protocol over TCP: enables watch mode and waits for
//! the first `TPV` report carrying a 2D or 3D fix.
//!
//! # Protocol
//!
//! ```text
//! client → ?WATCH={"enable":true,"json":true};
//! gpsd   → {"class":"VERSION",...}
//! gpsd   → {"class":"DEVICES",...}
//! gpsd   → {"class":"TPV","mode":3,"time":"...","lat":19.43,"lon":-99.13,...}
//! ```

use std::io;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use super::types::{PositionError, PositionSource, Sample};
use crate::BoxFuture;

/// Default gpsd listen address.
pub const DEFAULT_GPSD_ADDRESS: &str = "127.0.0.1:2947";

const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";

/// Minimum TPV mode that carries a usable position (2 = 2D fix).
const MIN_FIX_MODE: u8 = 2;

/// Subset of a gpsd report; only TPV fields are read.
#[derive(Debug, Deserialize)]
struct Report {
    class: String,
    #[serde(default)]
    mode: u8,
    time: Option<DateTime<Utc>>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Position source backed by a gpsd daemon.
#[derive(Debug, Clone)]
pub struct GpsdPositionSource {
    address: String,
    timeout: Duration,
}

impl GpsdPositionSource {
    /// Create a source for the gpsd instance at `address`.
    ///
    /// `timeout` bounds a whole acquisition: connect, handshake and waiting
    /// for a fix.
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    /// The configured gpsd address.
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn read_fix(&self) -> Result<Sample, PositionError> {
        let mut stream = TcpStream::connect(&self.address)
            .await
            .map_err(|e| self.map_io(e))?;
        stream
            .write_all(WATCH_COMMAND)
            .await
            .map_err(|e| self.map_io(e))?;

        let mut lines = BufReader::new(stream).lines();
        while let Some(line) = lines.next_line().await.map_err(|e| self.map_io(e))? {
            trace!(line = %line, "gpsd report");
            if let Some(sample) = parse_report(&line) {
                return Ok(sample);
            }
        }

        Err(PositionError::Unavailable(format!(
            "gpsd at {} closed the connection before a fix",
            self.address
        )))
    }

    fn map_io(&self, e: io::Error) -> PositionError {
        match e.kind() {
            io::ErrorKind::PermissionDenied => PositionError::PermissionDenied,
            _ => PositionError::Unavailable(format!("gpsd at {}: {}", self.address, e)),
        }
    }
}

impl PositionSource for GpsdPositionSource {
    fn name(&self) -> &str {
        "gpsd"
    }

    fn request_permission(&self) -> BoxFuture<'_, Result<(), PositionError>> {
        Box::pin(async move {
            // Only an explicit refusal blocks startup; a daemon that is down
            // now may come up before the next tick.
            match TcpStream::connect(&self.address).await {
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    Err(PositionError::PermissionDenied)
                }
                Err(e) => {
                    debug!(address = %self.address, error = %e, "gpsd not reachable yet");
                    Ok(())
                }
                Ok(_) => Ok(()),
            }
        })
    }

    fn current_position(&self) -> BoxFuture<'_, Result<Sample, PositionError>> {
        Box::pin(async move {
            tokio::time::timeout(self.timeout, self.read_fix())
                .await
                .map_err(|_| PositionError::Timeout(self.timeout))?
        })
    }
}

/// Extract a sample from one gpsd JSON line, if it is a TPV report with a fix.
fn parse_report(line: &str) -> Option<Sample> {
    let report: Report = serde_json::from_str(line).ok()?;
    if report.class != "TPV" || report.mode < MIN_FIX_MODE {
        return None;
    }
    let latitude = report.lat?;
    let longitude = report.lon?;
    Some(Sample::new(
        latitude,
        longitude,
        report.time.unwrap_or_else(Utc::now),
    ))
}
