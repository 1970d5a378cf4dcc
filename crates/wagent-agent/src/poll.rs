// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded polling of assistant runs.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wagent_core::{AssistantBackend, ContentPart, RunStatus, WagentError};

/// Polls a run until it reaches a terminal status.
///
/// Each attempt sleeps `interval` first and then checks the status, so a
/// run that completes on attempt `n` resolves after `n * interval`.
/// `requires_action` is not supported and is treated as still pending.
#[derive(Debug, Clone)]
pub struct RunPoller {
    interval: Duration,
    max_attempts: u32,
    cancel: CancellationToken,
}

impl RunPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            cancel: CancellationToken::new(),
        }
    }

    /// Aborts in-flight waits when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Waits for `run_id` and returns the thread's latest content part.
    pub async fn wait_for_completion(
        &self,
        backend: &dyn AssistantBackend,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Option<ContentPart>, WagentError> {
        for attempt in 1..=self.max_attempts {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(WagentError::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }

            let status = backend.run_status(thread_id, run_id).await?;
            match status {
                RunStatus::Completed => {
                    debug!(run_id, attempt, "run completed");
                    return backend.latest_message(thread_id).await;
                }
                s if s.is_failure() => {
                    return Err(WagentError::RunFailed {
                        run_id: run_id.to_string(),
                        status: s,
                    });
                }
                RunStatus::RequiresAction => {
                    warn!(run_id, attempt, "run requires action, which is unsupported; still waiting");
                }
                other => debug!(run_id, attempt, status = %other, "run pending"),
            }
        }

        Err(WagentError::RunTimeout {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;
    use wagent_test_utils::MockAssistant;

    const INTERVAL: Duration = Duration::from_millis(1000);

    #[tokio::test(start_paused = true)]
    async fn completes_on_third_attempt() {
        let assistant = MockAssistant::new();
        assistant.script_statuses([RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed]);
        assistant.set_reply(ContentPart::Text("{\"reply\":\"hi\"}".into()));

        let started = Instant::now();
        let part = RunPoller::new(INTERVAL, 60)
            .wait_for_completion(&assistant, "thread_1", "run_1")
            .await
            .unwrap();

        assert_eq!(part, Some(ContentPart::Text("{\"reply\":\"hi\"}".into())));
        assert_eq!(started.elapsed(), INTERVAL * 3);
        assert_eq!(assistant.status_checks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn never_terminal_times_out_after_budget() {
        let assistant = MockAssistant::new();
        assistant.script_statuses(std::iter::repeat_n(RunStatus::InProgress, 10));

        let started = Instant::now();
        let err = RunPoller::new(INTERVAL, 5)
            .wait_for_completion(&assistant, "thread_1", "run_1")
            .await
            .unwrap_err();

        assert!(matches!(err, WagentError::RunTimeout { attempts: 5 }));
        assert_eq!(started.elapsed(), INTERVAL * 5);
        assert_eq!(assistant.status_checks(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_status_stops_polling() {
        let assistant = MockAssistant::new();
        assistant.script_statuses([RunStatus::Queued, RunStatus::Expired]);

        let err = RunPoller::new(INTERVAL, 60)
            .wait_for_completion(&assistant, "thread_1", "run_9")
            .await
            .unwrap_err();

        match err {
            WagentError::RunFailed { run_id, status } => {
                assert_eq!(run_id, "run_9");
                assert_eq!(status, RunStatus::Expired);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(assistant.status_checks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn requires_action_keeps_polling() {
        let assistant = MockAssistant::new();
        assistant.script_statuses([RunStatus::RequiresAction, RunStatus::Completed]);

        let result = RunPoller::new(INTERVAL, 60)
            .wait_for_completion(&assistant, "thread_1", "run_1")
            .await;

        assert!(result.is_ok());
        assert_eq!(assistant.status_checks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_wait() {
        let assistant = MockAssistant::new();
        assistant.script_statuses(std::iter::repeat_n(RunStatus::InProgress, 100));
        let token = CancellationToken::new();
        let poller = RunPoller::new(INTERVAL, 60).with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(INTERVAL * 2 + Duration::from_millis(500)).await;
            token.cancel();
        });

        let err = poller
            .wait_for_completion(&assistant, "thread_1", "run_1")
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, WagentError::Cancelled));
        assert_eq!(assistant.status_checks(), 2);
    }
}
