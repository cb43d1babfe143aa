// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use super::{context, default_engine};
use crate::validation::{
    Rule, RuleOutcome, ValidationContext, ValidationEngine, ValidationSession, ValidationStatus,
};

/// Signals entry, then blocks until released
struct BlockingRule {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl Rule for BlockingRule {
    fn id(&self) -> &'static str {
        "blocking"
    }

    fn validate(&self, _context: &ValidationContext) -> Option<RuleOutcome> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Some(RuleOutcome::new())
    }
}

#[test]
fn test_idle_session_runs() {
    let session = ValidationSession::new(default_engine());

    let result = session.try_validate(&context("F1", &["FireAll"], 10));
    assert_eq!(result.map(|r| r.severity), Some(ValidationStatus::Success));
    assert!(!session.is_busy());
}

#[test]
fn test_concurrent_request_is_dropped() {
    let (entered_tx, entered_rx) = channel();
    let (release_tx, release_rx) = channel();

    let mut engine = ValidationEngine::new();
    engine.push_rule(Box::new(BlockingRule {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    }));
    let session = Arc::new(ValidationSession::new(engine));

    let worker = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.try_validate(&context("F1", &["FireAll"], 10)))
    };

    // Wait until the first run is inside the rule
    entered_rx.recv().unwrap();
    assert!(session.is_busy());
    assert!(session.try_validate(&context("F1", &["FireAll"], 10)).is_none());

    release_tx.send(()).unwrap();
    let first = worker.join().unwrap();
    assert_eq!(first.map(|r| r.warnings.len()), Some(1));
    assert!(!session.is_busy());
}
