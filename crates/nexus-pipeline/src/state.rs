// SPDX-FileCopyrightText: 2026 Nexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request lifecycle FSM.
//!
//! Happy path: Received -> Redacting -> ScreeningSafety (per message) ->
//! CheckingRateLimit -> CallingUpstream -> RecordingMetrics -> Completed.
//! Policy decisions end in Rejected; dependency failures end in Failed.

use nexus_core::{Disposition, NexusError};
use tracing::trace;

/// States a single chat request passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Authenticated and parsed, nothing done yet.
    Received,
    /// Running the redactor over one message.
    Redacting,
    /// Screening one redacted message.
    ScreeningSafety,
    /// Charging the redacted token count against the user's window.
    CheckingRateLimit,
    /// Waiting on the upstream provider.
    CallingUpstream,
    /// Updating counters and writing the request log.
    RecordingMetrics,
    /// Response handed back to the caller.
    Completed,
    /// Ended by a policy decision (content, quota, bad input).
    Rejected(&'static str),
    /// Ended because a dependency failed.
    Failed(&'static str),
}

impl RequestState {
    /// The terminal state for an error.
    pub fn from_error(err: &NexusError) -> Self {
        match err.disposition() {
            Disposition::Rejected => Self::Rejected(err.kind()),
            Disposition::Failed => Self::Failed(err.kind()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected(_) | Self::Failed(_))
    }

    /// Outcome label for request metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Rejected(_) => "rejected",
            Self::Failed(_) => "failed",
            _ => "in_progress",
        }
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestState::Received => write!(f, "received"),
            RequestState::Redacting => write!(f, "redacting"),
            RequestState::ScreeningSafety => write!(f, "screening_safety"),
            RequestState::CheckingRateLimit => write!(f, "checking_rate_limit"),
            RequestState::CallingUpstream => write!(f, "calling_upstream"),
            RequestState::RecordingMetrics => write!(f, "recording_metrics"),
            RequestState::Completed => write!(f, "completed"),
            RequestState::Rejected(reason) => write!(f, "rejected({reason})"),
            RequestState::Failed(reason) => write!(f, "failed({reason})"),
        }
    }
}

/// Tracks the current state of one request and traces every transition.
#[derive(Debug)]
pub struct RequestTracker {
    request_id: String,
    state: RequestState,
}

impl RequestTracker {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            state: RequestState::Received,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Moves to `next`. Terminal states are sticky.
    pub fn advance(&mut self, next: RequestState) {
        if self.state.is_terminal() {
            return;
        }
        trace!(
            request_id = self.request_id.as_str(),
            from = %self.state,
            to = %next,
            "request state transition"
        );
        self.state = next;
    }

    /// Moves to the terminal state matching `err`.
    pub fn fail(&mut self, err: &NexusError) {
        self.advance(RequestState::from_error(err));
    }
}

#[cfg(test)]
mod tests {
    use nexus_core::types::HazardCategory;

    use super::*;

    #[test]
    fn display_names() {
        assert_eq!(RequestState::ScreeningSafety.to_string(), "screening_safety");
        assert_eq!(
            RequestState::Rejected("rate_limit_exceeded").to_string(),
            "rejected(rate_limit_exceeded)"
        );
    }

    #[test]
    fn errors_map_to_terminal_states() {
        let blocked = NexusError::ContentPolicyViolation {
            categories: vec![HazardCategory::Violence],
        };
        assert_eq!(
            RequestState::from_error(&blocked),
            RequestState::Rejected("content_policy_violation")
        );

        let upstream = NexusError::Upstream {
            message: "bad gateway".into(),
            status: Some(502),
            source: None,
        };
        assert_eq!(
            RequestState::from_error(&upstream),
            RequestState::Failed("upstream_error")
        );

        let screener = NexusError::ScreenerUnavailable {
            message: "connection failed".into(),
            status: None,
            source: None,
        };
        assert_eq!(
            RequestState::from_error(&screener),
            RequestState::Failed("screener_unavailable")
        );
    }

    #[test]
    fn terminal_state_is_sticky() {
        let mut tracker = RequestTracker::new("req-1");
        tracker.advance(RequestState::Redacting);
        tracker.fail(&NexusError::Validation("x".into()));
        tracker.advance(RequestState::Completed);
        assert_eq!(tracker.state(), RequestState::Rejected("validation_error"));
        assert_eq!(tracker.state().outcome(), "rejected");
    }
}
