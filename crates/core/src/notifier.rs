//! Progress notification.
//!
//! The output monitor reports `(current, total)` pairs through a
//! [`Notifier`]. Front ends choose the implementation: a console progress
//! bar, a closure, or nothing at all.

/// Receives progress updates from an output monitor.
///
/// Called synchronously on the task draining the program output, so
/// implementations must not block.
pub trait Notifier: Send + Sync {
    fn on_progress(&self, current: u32, total: u32);
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn on_progress(&self, _current: u32, _total: u32) {}
}

/// Adapts a closure into a [`Notifier`].
pub struct FnNotifier<F> {
    callback: F,
}

impl<F> FnNotifier<F>
where
    F: Fn(u32, u32) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> Notifier for FnNotifier<F>
where
    F: Fn(u32, u32) + Send + Sync,
{
    fn on_progress(&self, current: u32, total: u32) {
        (self.callback)(current, total);
    }
}
