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

//! Single-flight validation
//!
//! An editor triggers validation on every keystroke. `ValidationSession`
//! lets at most one run be in flight per editing context: a request that
//! arrives while a run is active is dropped (not queued) and returns
//! `None`; the active run still reports its own result.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::validation::{ValidationContext, ValidationEngine, ValidationResult};

/// Validation entry point guarded against re-entry
pub struct ValidationSession {
    engine: ValidationEngine,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when dropped, including on unwind
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl ValidationSession {
    pub fn new(engine: ValidationEngine) -> Self {
        Self {
            engine,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Runs validation unless a run is already in progress
    ///
    /// # Returns
    ///
    /// * `Some(result)` - This call ran the rules
    /// * `None` - Another run was active; this request was dropped
    pub fn try_validate(&self, context: &ValidationContext) -> Option<ValidationResult> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            debug!(key = %context.key, "validation already in flight, request dropped");
            return None;
        }

        let _guard = InFlightGuard {
            flag: &self.in_flight,
        };
        Some(self.engine.validate(context))
    }

    /// True while a run is in progress
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }
}
