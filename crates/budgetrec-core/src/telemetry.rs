//! Minimale Logging-Schicht.
//!
//! Mit dem Feature `telemetry` laufen Ereignisse über `tracing`. Ohne das
//! Feature landen Warnungen auf stderr, Debug-Ereignisse entfallen.

use std::fmt;

pub fn warn(args: fmt::Arguments<'_>) {
    #[cfg(feature = "telemetry")]
    tracing::warn!("{}", args);
    #[cfg(not(feature = "telemetry"))]
    eprintln!("warning: {args}");
}

pub fn debug(args: fmt::Arguments<'_>) {
    #[cfg(feature = "telemetry")]
    tracing::debug!("{}", args);
    #[cfg(not(feature = "telemetry"))]
    let _ = args;
}
