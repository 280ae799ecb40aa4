use std::fmt::{Display, Formatter};

/// Receives coarse build progress, as a percentage in `0..=100` and a short status.
///
/// Reports are advisory: they arrive at the start, after every zoom level and at the end
/// of a build, and may be skipped by callers that do not care.
pub trait ProgressSink {
    fn report(&mut self, percent: u8, status: &str);
}

impl<F: FnMut(u8, &str)> ProgressSink for F {
    fn report(&mut self, percent: u8, status: &str) {
        self(percent, status);
    }
}

/// Discards all reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8, _status: &str) {}
}

/// A single progress report.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Progress {
    pub percent: u8,
    pub status: String,
}

impl Display for Progress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}% {}", self.percent, self.status)
    }
}

/// Forwards reports to another sink and remembers the most recent one,
/// so that a failed build can tell how far it got.
pub struct ProgressTracker<'a> {
    inner: &'a mut dyn ProgressSink,
    last: Option<Progress>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(inner: &'a mut dyn ProgressSink) -> Self {
        Self { inner, last: None }
    }

    #[must_use]
    pub fn last(&self) -> Option<&Progress> {
        self.last.as_ref()
    }
}

impl ProgressSink for ProgressTracker<'_> {
    fn report(&mut self, percent: u8, status: &str) {
        let percent = percent.min(100);
        self.inner.report(percent, status);
        self.last = Some(Progress {
            percent,
            status: status.to_string(),
        });
    }
}
