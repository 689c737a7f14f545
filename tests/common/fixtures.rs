//! Source list fixtures and event recording helpers

use sni_ranges::{Event, Observer};
use std::sync::{Arc, Mutex};

/// A short SNI range list in the published format
pub const SNI_LIST: &str = "\
3.5.140.2 -- [s3.ap-northeast-2.amazonaws.com *.s3.ap-northeast-2.amazonaws.com]
13.32.0.10 -- [d1.cloudfront.net]
18.64.1.7 -- [www.example.com *.example.com api.example.com]
52.1.2.3 -- [no-match.test]
";

/// Observer that records every event it sees
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingObserver {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Number of attempts started for `source`
    pub fn attempts_started(&self, source: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::AttemptStarted { source: s, .. } if s == source))
            .count()
    }
}

impl Observer for RecordingObserver {
    fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}
