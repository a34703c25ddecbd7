//! Live display provider implementation
//!
//! Human mode prints styled status lines and indicatif spinners. JSON mode
//! stays silent until the final report so stdout carries exactly one object.

use super::Display;
use super::providers::*;
use super::report::CommandReport;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Live implementation of DisplayProvider, owned by a command session
pub struct LiveDisplayProvider {
    multi_progress: MultiProgress,
    json_mode: bool,
}

impl LiveDisplayProvider {
    pub fn new(json_mode: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            json_mode,
        }
    }

    pub fn new_with_multi_progress(multi_progress: &MultiProgress, json_mode: bool) -> Self {
        Self {
            multi_progress: multi_progress.clone(),
            json_mode,
        }
    }
}

impl DisplayProvider for LiveDisplayProvider {
    fn status(&self) -> Box<dyn StatusProvider> {
        if self.json_mode {
            Box::new(QuietStatusProvider)
        } else {
            Box::new(LiveStatusProvider)
        }
    }

    fn progress(&self) -> Box<dyn ProgressProvider> {
        Box::new(LiveProgressProvider {
            parent: self.multi_progress.clone(),
            hidden: self.json_mode || !Display::capabilities().is_tty,
        })
    }

    fn report(&self, report: &CommandReport) {
        if self.json_mode {
            println!("{}", report.to_json());
        }
    }
}

struct LiveStatusProvider;

impl StatusProvider for LiveStatusProvider {
    fn working(&self, task: &str) {
        Display::status().working(task);
    }

    fn success(&self, item: &str, details: &str) {
        Display::status().success(item, details);
    }

    fn error(&self, item: &str, details: &str) {
        Display::status().error(item, details);
    }

    fn warning(&self, message: &str) {
        Display::status().warning(message);
    }

    fn info(&self, message: &str) {
        Display::status().info(message);
    }

    fn message(&self, text: &str) {
        Display::status().message(text);
    }

    fn subtle(&self, text: &str) {
        Display::status().subtle(text);
    }

    fn list(&self, items: &[&str]) {
        Display::status().list(items);
    }

    fn section(&self, title: &str) {
        Display::status().section(title);
    }
}

/// Swallows status lines in `--json` mode
struct QuietStatusProvider;

impl StatusProvider for QuietStatusProvider {
    fn working(&self, _task: &str) {}
    fn success(&self, _item: &str, _details: &str) {}
    fn error(&self, _item: &str, _details: &str) {}
    fn warning(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn message(&self, _text: &str) {}
    fn subtle(&self, _text: &str) {}
    fn list(&self, _items: &[&str]) {}
    fn section(&self, _title: &str) {}
}

struct LiveProgressProvider {
    parent: MultiProgress,
    hidden: bool,
}

impl ProgressProvider for LiveProgressProvider {
    fn spinner(&self, message: &str) -> Box<dyn ProgressTracker> {
        let bar = if self.hidden {
            ProgressBar::hidden()
        } else {
            let bar = self.parent.add(ProgressBar::new_spinner());
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        bar.set_message(message.to_string());
        Box::new(SpinnerTracker { bar })
    }
}

struct SpinnerTracker {
    bar: ProgressBar,
}

impl ProgressTracker for SpinnerTracker {
    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }

    fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }
}
