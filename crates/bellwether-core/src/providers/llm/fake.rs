use super::{GenerationRequest, LlmClient};
use crate::errors::{BackendError, BackendErrorKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What the fake does for a given prompt.
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Respond with this text after the optional delay.
    Reply { text: String, delay: Duration },
    /// Fail with this error kind after the optional delay.
    Fail { kind: BackendErrorKind, delay: Duration },
    /// Never resolve; used to exercise the per-call timeout.
    Hang,
}

impl FakeBehavior {
    pub fn reply(text: impl Into<String>) -> Self {
        FakeBehavior::Reply {
            text: text.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn reply_after(text: impl Into<String>, delay: Duration) -> Self {
        FakeBehavior::Reply {
            text: text.into(),
            delay,
        }
    }

    pub fn fail(kind: BackendErrorKind) -> Self {
        FakeBehavior::Fail {
            kind,
            delay: Duration::ZERO,
        }
    }
}

/// Scripted in-process client. Behaviors are keyed by prompt; unscripted
/// prompts get the default behavior.
pub struct FakeClient {
    scripted: HashMap<String, FakeBehavior>,
    default: FakeBehavior,
    calls: AtomicUsize,
}

impl FakeClient {
    pub fn new(default: FakeBehavior) -> Self {
        Self {
            scripted: HashMap::new(),
            default,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(text: impl Into<String>) -> Self {
        Self::new(FakeBehavior::reply(text))
    }

    pub fn script(mut self, prompt: impl Into<String>, behavior: FakeBehavior) -> Self {
        self.scripted.insert(prompt.into(), behavior);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn generate(&self, req: &GenerationRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.scripted.get(&req.prompt).unwrap_or(&self.default);
        match behavior.clone() {
            FakeBehavior::Reply { text, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(text)
            }
            FakeBehavior::Fail { kind, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Err(BackendError::new(kind, "scripted failure"))
            }
            FakeBehavior::Hang => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
