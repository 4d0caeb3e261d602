//! Run progress bookkeeping
//!
//! [`LoadRunState`] is created at the start of a run, owned by the
//! orchestrator task and dropped when the run completes. It turns per-system
//! progress reports into the run-wide fraction observers see.

use tracing::debug;

/// Overall fraction for `loaded` completed systems out of `total`, with the
/// currently loading system at `inner`
///
/// `total == 0` is a finished run.
pub fn overall_fraction(loaded: usize, total: usize, inner: f32) -> f32 {
    if total == 0 {
        return 1.0;
    }
    ((loaded as f32 + inner) / total as f32).clamp(0.0, 1.0)
}

/// Per-run progress state
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRunState {
    total: usize,
    loaded: usize,
    current: Option<String>,
    inner: f32,
    last_published: Option<f32>,
}

impl LoadRunState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            loaded: 0,
            current: None,
            inner: 0.0,
            last_published: None,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Systems that completed their load step so far
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Declared name of the system currently loading
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn last_published(&self) -> Option<f32> {
        self.last_published
    }

    /// Current overall fraction
    pub fn overall(&self) -> f32 {
        overall_fraction(self.loaded, self.total, self.inner)
    }

    /// Mark `name` as the loading system
    pub fn begin(&mut self, name: &str) {
        self.current = Some(name.to_string());
        self.inner = 0.0;
    }

    /// Record an inner progress report
    ///
    /// Returns the overall fraction to publish. `None` for a non-finite
    /// report, or one that would not move observers forward (e.g. the first
    /// reports after an abandoned system).
    pub fn record(&mut self, inner: f32) -> Option<f32> {
        if !inner.is_finite() {
            debug!(
                "Ignoring non-finite progress {} from {}",
                inner,
                self.current.as_deref().unwrap_or("-")
            );
            return None;
        }
        self.inner = inner.clamp(0.0, 1.0);

        let fraction = self.overall();
        if self.is_behind(fraction) {
            Some(self.publish(fraction))
        } else {
            None
        }
    }

    /// The loading system finished its load step
    ///
    /// Returns the fraction to publish if observers have not seen it yet.
    pub fn complete(&mut self) -> Option<f32> {
        self.loaded += 1;
        self.current = None;
        self.inner = 0.0;

        let fraction = self.overall();
        if self.is_behind(fraction) {
            Some(self.publish(fraction))
        } else {
            None
        }
    }

    /// The loading system failed; the loaded count is left as is
    pub fn abandon(&mut self) {
        self.current = None;
        self.inner = 0.0;
    }

    /// Final report for the end of the run, if observers are not yet at 1.0
    pub fn finish(&mut self) -> Option<f32> {
        self.current = None;
        if self.is_behind(1.0) {
            Some(self.publish(1.0))
        } else {
            None
        }
    }

    fn is_behind(&self, fraction: f32) -> bool {
        self.last_published.map_or(true, |last| last < fraction)
    }

    fn publish(&mut self, fraction: f32) -> f32 {
        self.last_published = Some(fraction);
        fraction
    }
}
