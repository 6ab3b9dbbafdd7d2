// Serial suites
//
// Tests that share mutable domain state (one user's pending connections, for
// example) must not interleave. They take the same named lock for their whole
// body; independent tests take nothing and run in parallel.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

use crate::error::Result;

type Registry = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

fn registry() -> &'static Registry {
    static LOCKS: OnceLock<Registry> = OnceLock::new();
    LOCKS.get_or_init(Default::default)
}

/// Held for the duration of a test belonging to a serial suite.
pub struct SerialGuard {
    name: String,
    _guard: OwnedMutexGuard<()>,
}

impl SerialGuard {
    pub fn suite(&self) -> &str {
        &self.name
    }
}

/// Waits for exclusive access to the serial suite `name`.
pub async fn serial_lock(name: &str) -> SerialGuard {
    let lock = registry()
        .lock()
        .entry(name.to_string())
        .or_default()
        .clone();
    let guard = lock.lock_owned().await;
    tracing::debug!(suite = name, "entered serial suite");
    SerialGuard {
        name: name.to_string(),
        _guard: guard,
    }
}

type StepFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Ordered steps where each may depend on the previous one's mutation.
///
/// `run` stops at the first failing step and names it in the error.
pub struct SerialSuite<'a> {
    name: String,
    steps: Vec<(String, StepFuture<'a>)>,
}

impl<'a> SerialSuite<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step<F>(mut self, label: impl Into<String>, step: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'a,
    {
        self.steps.push((label.into(), Box::pin(step)));
        self
    }

    /// Runs the steps in order while holding the suite's lock.
    pub async fn run(self) -> Result<()> {
        let _guard = serial_lock(&self.name).await;
        let total = self.steps.len();
        for (index, (label, step)) in self.steps.into_iter().enumerate() {
            tracing::info!(suite = %self.name, step = %label, "{}/{}", index + 1, total);
            step.await
                .map_err(|e| e.context(format!("{} step {} '{}'", self.name, index + 1, label)))?;
        }
        Ok(())
    }
}
