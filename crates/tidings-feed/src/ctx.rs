use std::fmt;
use std::future::{Future, pending};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{CancelledSnafu, DeadlineExceededSnafu};
use crate::FeedResult;

/// Which store read a request was in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FollowGraph,
    Content,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::FollowGraph => "follow graph",
            Stage::Content => "content",
        })
    }
}

/// Per-request deadline and cancellation
///
/// Cloned into every store call of a request. The default never expires and
/// can't be cancelled.
#[derive(Debug, Clone, Default)]
pub struct RequestCtx {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl RequestCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Cancel once the sender side flips to `true`
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    pub fn check(&self, stage: Stage) -> FeedResult<()> {
        if self.is_cancelled() {
            return CancelledSnafu { stage }.fail();
        }
        if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            return DeadlineExceededSnafu { stage }.fail();
        }
        Ok(())
    }

    /// Run a store read, giving up if the deadline passes or the request is
    /// cancelled first
    pub async fn run<T>(
        &self,
        stage: Stage,
        f: impl Future<Output = FeedResult<T>>,
    ) -> FeedResult<T> {
        self.check(stage)?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        let cancelled = async {
            match self.cancel.clone() {
                Some(mut rx) => {
                    // Sender gone without cancelling means nobody ever will
                    let cancelled = rx.wait_for(|cancelled| *cancelled).await.is_ok();
                    if !cancelled {
                        pending::<()>().await;
                    }
                }
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            res = f => res,
            () = cancelled => CancelledSnafu { stage }.fail(),
            () = deadline => DeadlineExceededSnafu { stage }.fail(),
        }
    }
}
