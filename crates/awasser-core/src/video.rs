//! Long-running video synthesis as an explicit state machine.
//!
//! `Submitted -> Polling { attempt } -> Ready | Failed`, with an exponential
//! backoff between polls and a hard cap on the number of polls.

use crate::constants::{VIDEO_POLL_INITIAL_SEC, VIDEO_POLL_MAX_ATTEMPTS, VIDEO_POLL_MAX_SEC};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PollPolicy {
    pub initial: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs_f64(VIDEO_POLL_INITIAL_SEC),
            max_delay: Duration::from_secs_f64(VIDEO_POLL_MAX_SEC),
            max_attempts: VIDEO_POLL_MAX_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Delay before poll number `attempt` (0-based): `initial * 2^attempt`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2f64.powi(attempt.min(30) as i32);
        let secs = (self.initial.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// What one poll of the remote operation reported.
#[derive(Clone, Debug, PartialEq)]
pub enum OperationStatus {
    Pending,
    Done { uri: Option<String> },
    Error(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum VideoJobState {
    Submitted { operation: String },
    Polling { operation: String, attempt: u32 },
    Ready { uri: String },
    Failed { reason: VideoFailure },
}

#[derive(Clone, Debug, PartialEq)]
pub enum VideoFailure {
    Remote(String),
    NoVideo,
    TimedOut { attempts: u32 },
}

#[derive(Clone, Debug)]
pub struct VideoJob {
    state: VideoJobState,
    policy: PollPolicy,
    polls: u32,
}

impl VideoJob {
    pub fn submitted(operation: impl Into<String>, policy: PollPolicy) -> Self {
        Self {
            state: VideoJobState::Submitted {
                operation: operation.into(),
            },
            policy,
            polls: 0,
        }
    }

    pub fn state(&self) -> &VideoJobState {
        &self.state
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            VideoJobState::Ready { .. } | VideoJobState::Failed { .. }
        )
    }

    pub fn operation(&self) -> Option<&str> {
        match &self.state {
            VideoJobState::Submitted { operation } | VideoJobState::Polling { operation, .. } => {
                Some(operation)
            }
            _ => None,
        }
    }

    /// How long to wait before the next poll; `None` once terminal.
    pub fn next_delay(&self) -> Option<Duration> {
        if self.is_terminal() {
            return None;
        }
        Some(self.policy.delay_for(self.polls))
    }

    pub fn record(&mut self, status: OperationStatus) -> &VideoJobState {
        let Some(operation) = self.operation().map(str::to_string) else {
            return &self.state;
        };
        self.polls += 1;
        self.state = match status {
            OperationStatus::Done { uri: Some(uri) } => VideoJobState::Ready { uri },
            OperationStatus::Done { uri: None } => VideoJobState::Failed {
                reason: VideoFailure::NoVideo,
            },
            OperationStatus::Error(msg) => VideoJobState::Failed {
                reason: VideoFailure::Remote(msg),
            },
            OperationStatus::Pending if self.polls >= self.policy.max_attempts => {
                log::warn!("[video] giving up after {} polls", self.polls);
                VideoJobState::Failed {
                    reason: VideoFailure::TimedOut {
                        attempts: self.polls,
                    },
                }
            }
            OperationStatus::Pending => VideoJobState::Polling {
                operation,
                attempt: self.polls,
            },
        };
        &self.state
    }
}

impl VideoJob {
    /// A poll that never reached the operation. It uses up an attempt like a
    /// pending reply; the job fails only once the attempt cap is reached.
    pub fn record_poll_error(&mut self, message: impl Into<String>) -> &VideoJobState {
        let Some(operation) = self.operation().map(str::to_string) else {
            return &self.state;
        };
        self.polls += 1;
        let message = message.into();
        log::warn!("[video] poll {} failed: {}", self.polls, message);
        self.state = if self.polls >= self.policy.max_attempts {
            VideoJobState::Failed {
                reason: VideoFailure::Remote(message),
            }
        } else {
            VideoJobState::Polling {
                operation,
                attempt: self.polls,
            }
        };
        &self.state
    }
}

/// Attach the API key to a generated video uri so the browser can fetch it.
pub fn downloadable_uri(uri: &str, api_key: &str) -> String {
    let sep = if uri.contains('?') { '&' } else { '?' };
    format!("{}{}key={}", uri, sep, api_key)
}
