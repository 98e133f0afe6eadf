//! Console progress bars.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use wr_core::notifier::Notifier;
use wr_protocol::ipc::Event;

const BAR_TEMPLATE: &str = "{prefix:>8} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Forwards monitor progress to one bar.
#[derive(Clone)]
pub struct BarNotifier {
    bar: ProgressBar,
}

impl Notifier for BarNotifier {
    fn on_progress(&self, current: u32, total: u32) {
        self.bar.set_length(u64::from(total));
        self.bar.set_position(u64::from(current));
    }
}

/// One bar per pipeline step, in step order.
pub struct StepBars {
    bars: Vec<ProgressBar>,
}

impl StepBars {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let multi = MultiProgress::new();
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");

        let bars = names
            .into_iter()
            .map(|name| {
                let bar = multi.add(ProgressBar::new(0));
                bar.set_style(style.clone());
                bar.set_prefix(name.to_string());
                bar.set_message("waiting");
                bar
            })
            .collect();

        Self { bars }
    }

    pub fn notifier(&self, index: usize) -> Option<Arc<dyn Notifier>> {
        self.bars
            .get(index)
            .map(|bar| Arc::new(BarNotifier { bar: bar.clone() }) as Arc<dyn Notifier>)
    }

    /// Update bar messages from a pipeline event.
    pub fn apply(&self, event: &Event) {
        match event {
            Event::StepStarted { step_index, .. } => {
                if let Some(bar) = self.bars.get(*step_index) {
                    bar.set_message("running");
                }
            }
            Event::StepFinished {
                step_index,
                success,
                ..
            } => {
                if let Some(bar) = self.bars.get(*step_index) {
                    bar.finish_with_message(if *success { "done" } else { "failed" });
                }
            }
            _ => {}
        }
    }

    /// Stop every bar that never finished.
    pub fn abandon_unfinished(&self) {
        for bar in self.bars.iter().filter(|bar| !bar.is_finished()) {
            bar.abandon_with_message("skipped");
        }
    }
}
