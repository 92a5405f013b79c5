//! Progress reporting
//!
//! The indexing layers report `(message, fraction)` pairs through a
//! [`ProgressSink`]; the pipeline rescales sub-progress into its own range
//! with [`ScaledSink`] before forwarding.

use indicatif::{ProgressBar, ProgressStyle};

/// Receiver for progress updates; `fraction` is in 0.0..=1.0
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str, fraction: f32);
}

/// Sink that discards all updates
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _message: &str, _fraction: f32) {}
}

/// Sink that maps child progress into a sub-range of a parent sink.
///
/// A child fraction `p` is forwarded as `offset + span * p`.
pub struct ScaledSink<'a> {
    inner: &'a dyn ProgressSink,
    offset: f32,
    span: f32,
}

impl<'a> ScaledSink<'a> {
    pub fn new(inner: &'a dyn ProgressSink, offset: f32, span: f32) -> Self {
        Self {
            inner,
            offset,
            span,
        }
    }
}

impl ProgressSink for ScaledSink<'_> {
    fn report(&self, message: &str, fraction: f32) {
        let scaled = (self.offset + self.span * fraction).clamp(0.0, 1.0);
        self.inner.report(message, scaled);
    }
}

/// Terminal progress bar sink for the CLI
pub struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos:>3}% {msg}")
                .expect("static template is valid"),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for BarSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarSink {
    fn report(&self, message: &str, fraction: f32) {
        self.bar
            .set_position((fraction.clamp(0.0, 1.0) * 100.0) as u64);
        self.bar.set_message(message.to_string());
    }
}
