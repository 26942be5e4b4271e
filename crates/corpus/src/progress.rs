//! Structured progress reporting for corpus builds.

use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during a build.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the build: "import", "filter", "embed", "write"
    pub phase: String,

    pub current: u64,

    /// Total expected work, if known
    pub total: Option<u64>,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: Option<f64>,

    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        let percentage = total.map(|t| {
            if t > 0 {
                (current as f64 / t as f64) * 100.0
            } else {
                100.0
            }
        });

        Self {
            phase: phase.into(),
            current,
            total,
            percentage,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a single user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };

        let pct = self
            .percentage
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// Reporter that only logs.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    /// Log the event at debug level and pass it to the callback, if any.
    pub fn emit(&self, event: ProgressEvent) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let event = event.with_elapsed(elapsed);

        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            percentage = ?event.percentage,
            message = %event.message,
            elapsed_secs = elapsed,
            "Progress event"
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    pub fn import(&self, articles: u64, path: &str) {
        self.emit(ProgressEvent::new(
            "import",
            articles,
            None,
            format!("read {}", path),
        ));
    }

    pub fn filter(&self, kept: u64, total: Option<u64>, dropped: usize) {
        self.emit(ProgressEvent::new(
            "filter",
            kept,
            total,
            format!("{} without content dropped", dropped),
        ));
    }

    pub fn embed(&self, current: u64, total: Option<u64>, model: &str) {
        self.emit(ProgressEvent::new(
            "embed",
            current,
            total,
            format!("model={}", model),
        ));
    }

    pub fn write(&self, current: u64, total: Option<u64>, file: &str) {
        self.emit(ProgressEvent::new("write", current, total, file.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_event_format() {
        let event = ProgressEvent::new("embed", 5, Some(10), "model=trigram-v1");
        let formatted = event.format_simple();
        assert_eq!(formatted, "[embed] 5/10 (50%) - model=trigram-v1");
    }

    #[test]
    fn test_progress_event_zero_total() {
        let event = ProgressEvent::new("embed", 0, Some(0), "nothing to do");
        assert_eq!(event.percentage, Some(100.0));
    }

    #[test]
    fn test_progress_reporter_emit() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();

        let reporter = ProgressReporter::new(Arc::new(move |event: ProgressEvent| {
            events_clone.lock().unwrap().push(event);
        }));

        reporter.filter(3, Some(4), 1);
        reporter.write(1, Some(3), "articles.json");

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].phase, "filter");
        assert_eq!(captured[0].current, 3);
        assert!(captured[1].elapsed_secs.is_some());
    }

    #[test]
    fn test_noop_reporter() {
        let reporter = ProgressReporter::noop();
        reporter.embed(1, None, "mock-v1");
    }
}
