//! Mock producers for testing.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cancellation::CancellationToken;
use crate::core::StreamEvent;
use crate::errors::ProducerError;
use crate::producer::{EventStream, Producer, ProducerRequest};

/// One step of a scripted attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Yield an event.
    Emit(StreamEvent),
    /// Fail the pull with this message and end the sequence.
    Fail(String),
    /// Wait before the next step. The sequence ends quietly if the token
    /// fires first.
    Delay(Duration),
    /// Cancel the token handed to this invocation.
    Cancel(String),
}

/// A producer that replays one script per invocation.
///
/// Invocation `n` replays script `n`; once the scripts run out the last one
/// repeats. Every invocation is counted so tests can observe how often the
/// coordinator went back to the factory.
#[derive(Debug)]
pub struct ScriptedProducer {
    name: String,
    scripts: Mutex<Vec<Vec<ScriptStep>>>,
    invocations: AtomicUsize,
    resume_tokens: Mutex<Vec<Option<String>>>,
    cancel_tokens: Mutex<Vec<Arc<CancellationToken>>>,
}

impl ScriptedProducer {
    /// Creates a producer with no scripts; it yields an empty sequence.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scripts: Mutex::new(Vec::new()),
            invocations: AtomicUsize::new(0),
            resume_tokens: Mutex::new(Vec::new()),
            cancel_tokens: Mutex::new(Vec::new()),
        }
    }

    /// Appends a script for the next invocation.
    #[must_use]
    pub fn then(self, steps: Vec<ScriptStep>) -> Self {
        self.scripts.lock().push(steps);
        self
    }

    /// Appends an invocation that fails on its first pull.
    #[must_use]
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.then(vec![ScriptStep::Fail(message.into())])
    }

    /// Appends an invocation that yields `events` and completes.
    #[must_use]
    pub fn then_emit(self, events: Vec<StreamEvent>) -> Self {
        self.then(events.into_iter().map(ScriptStep::Emit).collect())
    }

    /// Returns the number of times `produce` was called.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Returns the resume token passed to each invocation.
    #[must_use]
    pub fn resume_tokens(&self) -> Vec<Option<String>> {
        self.resume_tokens.lock().clone()
    }

    /// Returns the cancellation token passed to each invocation.
    #[must_use]
    pub fn cancel_tokens(&self) -> Vec<Arc<CancellationToken>> {
        self.cancel_tokens.lock().clone()
    }

    fn script_for(&self, invocation: usize) -> Vec<ScriptStep> {
        let scripts = self.scripts.lock();
        scripts
            .get(invocation)
            .or_else(|| scripts.last())
            .cloned()
            .unwrap_or_default()
    }
}

impl Producer for ScriptedProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn produce(
        &self,
        _request: &ProducerRequest,
        resume_token: Option<&str>,
        cancel: Arc<CancellationToken>,
    ) -> EventStream {
        let invocation = self.invocations.fetch_add(1, Ordering::SeqCst);
        self.resume_tokens.lock().push(resume_token.map(String::from));
        self.cancel_tokens.lock().push(cancel.clone());
        let steps = self.script_for(invocation);

        Box::pin(async_stream::stream! {
            for step in steps {
                match step {
                    ScriptStep::Emit(event) => yield Ok(event),
                    ScriptStep::Fail(message) => {
                        yield Err(ProducerError::new(message));
                        return;
                    }
                    ScriptStep::Delay(duration) => {
                        tokio::select! {
                            () = tokio::time::sleep(duration) => {}
                            () = cancel.cancelled() => return,
                        }
                    }
                    ScriptStep::Cancel(reason) => cancel.cancel(reason),
                }
            }
        })
    }
}
