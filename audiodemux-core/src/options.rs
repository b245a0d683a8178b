//! Open-time configuration threaded through parser entry points.

use std::fmt;

/// Diagnostic message sink.
pub type LogSink = Box<dyn Fn(&str) + Send + Sync>;

/// Options passed to every container parse entry point.
///
/// Carries optional info/error sinks for callers that want to capture
/// diagnostics; unset sinks fall back to the `log` crate macros.
#[derive(Default)]
pub struct OpenOptions {
    info: Option<LogSink>,
    error: Option<LogSink>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route informational messages to `sink`.
    pub fn with_info_sink(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.info = Some(Box::new(sink));
        self
    }

    /// Route error messages to `sink`.
    pub fn with_error_sink(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(sink));
        self
    }

    /// Emit an informational diagnostic.
    pub fn info(&self, msg: &str) {
        match &self.info {
            Some(sink) => sink(msg),
            None => log::info!("{msg}"),
        }
    }

    /// Emit an error diagnostic.
    pub fn error(&self, msg: &str) {
        match &self.error {
            Some(sink) => sink(msg),
            None => log::error!("{msg}"),
        }
    }
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("info", &self.info.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_error_sink_receives_messages() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink_store = Arc::clone(&captured);
        let options = OpenOptions::new()
            .with_error_sink(move |msg| sink_store.lock().unwrap().push(msg.to_string()));
        options.error("bad header");
        assert_eq!(captured.lock().unwrap().as_slice(), ["bad header"]);
    }

    #[test]
    fn test_unset_sinks_do_not_panic() {
        let options = OpenOptions::new();
        options.info("probe ok");
        options.error("probe failed");
    }
}
