//! Logger Module
//!
//! Optional diagnostics sink for a stash. Without a logger every diagnostic
//! call is a no-op; a logger never changes control flow.

use std::fmt;
use std::sync::Arc;

// == Logger ==
/// Receives formatted diagnostic lines.
pub trait Logger: Send + Sync {
    fn printf(&self, args: fmt::Arguments<'_>);
}

// == Tracing Logger ==
/// Forwards diagnostics to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn printf(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "stash", "{}", args);
    }
}

// == Diagnostics ==
/// Applies the debug flag and prefix in front of an optional logger.
#[derive(Clone, Default)]
pub struct Diagnostics {
    logger: Option<Arc<dyn Logger>>,
    prefix: String,
    enabled: bool,
}

impl Diagnostics {
    pub fn new(logger: Option<Arc<dyn Logger>>, enabled: bool, prefix: impl Into<String>) -> Self {
        Self {
            logger,
            prefix: prefix.into(),
            enabled,
        }
    }

    /// Diagnostics that never print.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn printf(&self, args: fmt::Arguments<'_>) {
        if !self.enabled {
            return;
        }
        if let Some(logger) = &self.logger {
            logger.printf(format_args!("{}{}", self.prefix, args));
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("logger", &self.logger.is_some())
            .field("prefix", &self.prefix)
            .field("enabled", &self.enabled)
            .finish()
    }
}
