//! Mock display provider implementation for testing
//!
//! Records every display call so command tests can assert on what the user
//! would have seen.

use super::providers::*;
use super::report::CommandReport;
use std::sync::{Arc, Mutex};

/// Mock implementation of DisplayProvider that records all calls
#[derive(Clone, Default)]
pub struct MockDisplayProvider {
    calls: Arc<Mutex<Vec<DisplayCall>>>,
}

/// Recorded display call for testing
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    Working { task: String },
    Success { item: String, details: String },
    Error { item: String, details: String },
    Warning { message: String },
    Info { message: String },
    Message { text: String },
    Subtle { text: String },
    List { items: Vec<String> },
    Section { title: String },
    Spinner { message: String },
    SpinnerFinish { message: String },
    SpinnerAbandon { message: String },
    Report(CommandReport),
}

impl MockDisplayProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn has_call(&self, expected: &DisplayCall) -> bool {
        self.get_calls().contains(expected)
    }

    /// The last report emitted, if any
    pub fn last_report(&self) -> Option<CommandReport> {
        self.get_calls().into_iter().rev().find_map(|call| match call {
            DisplayCall::Report(report) => Some(report),
            _ => None,
        })
    }

    /// All success items, in order
    pub fn successes(&self) -> Vec<String> {
        self.get_calls()
            .into_iter()
            .filter_map(|call| match call {
                DisplayCall::Success { item, .. } => Some(item),
                _ => None,
            })
            .collect()
    }

    /// Every message/info/warning text, for loose substring assertions
    pub fn texts(&self) -> Vec<String> {
        self.get_calls()
            .into_iter()
            .filter_map(|call| match call {
                DisplayCall::Message { text } | DisplayCall::Subtle { text } => Some(text),
                DisplayCall::Info { message } | DisplayCall::Warning { message } => Some(message),
                DisplayCall::Success { item, details } | DisplayCall::Error { item, details } => {
                    Some(format!("{item}: {details}"))
                }
                _ => None,
            })
            .collect()
    }
}

fn record(calls: &Arc<Mutex<Vec<DisplayCall>>>, call: DisplayCall) {
    if let Ok(mut calls) = calls.lock() {
        calls.push(call);
    }
}

impl DisplayProvider for MockDisplayProvider {
    fn status(&self) -> Box<dyn StatusProvider> {
        Box::new(MockStatusProvider {
            calls: self.calls.clone(),
        })
    }

    fn progress(&self) -> Box<dyn ProgressProvider> {
        Box::new(MockProgressProvider {
            calls: self.calls.clone(),
        })
    }

    fn report(&self, report: &CommandReport) {
        record(&self.calls, DisplayCall::Report(report.clone()));
    }
}

struct MockStatusProvider {
    calls: Arc<Mutex<Vec<DisplayCall>>>,
}

impl StatusProvider for MockStatusProvider {
    fn working(&self, task: &str) {
        record(&self.calls, DisplayCall::Working { task: task.into() });
    }

    fn success(&self, item: &str, details: &str) {
        record(
            &self.calls,
            DisplayCall::Success {
                item: item.into(),
                details: details.into(),
            },
        );
    }

    fn error(&self, item: &str, details: &str) {
        record(
            &self.calls,
            DisplayCall::Error {
                item: item.into(),
                details: details.into(),
            },
        );
    }

    fn warning(&self, message: &str) {
        record(&self.calls, DisplayCall::Warning { message: message.into() });
    }

    fn info(&self, message: &str) {
        record(&self.calls, DisplayCall::Info { message: message.into() });
    }

    fn message(&self, text: &str) {
        record(&self.calls, DisplayCall::Message { text: text.into() });
    }

    fn subtle(&self, text: &str) {
        record(&self.calls, DisplayCall::Subtle { text: text.into() });
    }

    fn list(&self, items: &[&str]) {
        record(
            &self.calls,
            DisplayCall::List {
                items: items.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    fn section(&self, title: &str) {
        record(&self.calls, DisplayCall::Section { title: title.into() });
    }
}

struct MockProgressProvider {
    calls: Arc<Mutex<Vec<DisplayCall>>>,
}

impl ProgressProvider for MockProgressProvider {
    fn spinner(&self, message: &str) -> Box<dyn ProgressTracker> {
        record(&self.calls, DisplayCall::Spinner { message: message.into() });
        Box::new(MockTracker {
            calls: self.calls.clone(),
        })
    }
}

struct MockTracker {
    calls: Arc<Mutex<Vec<DisplayCall>>>,
}

impl ProgressTracker for MockTracker {
    fn set_message(&self, _message: &str) {}

    fn finish(&self, message: &str) {
        record(&self.calls, DisplayCall::SpinnerFinish { message: message.into() });
    }

    fn abandon(&self, message: &str) {
        record(&self.calls, DisplayCall::SpinnerAbandon { message: message.into() });
    }

    fn finish_clear(&self) {}
}
