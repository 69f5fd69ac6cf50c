//! Helpers for exercising mobile handling in an application's own tests.

use crate::types::{RequestSignals, SessionOverride};

/// User agent installed by [`force_mobile_request_agent`] when none is given.
pub const DEFAULT_MOBILE_AGENT: &str = "Android";
/// User agent restored by [`reset_test_request_agent`].
pub const DEFAULT_TEST_AGENT: &str = "Testing";

/// Make the request look like it comes from a mobile device.
pub fn force_mobile_request_agent(signals: &mut RequestSignals, agent: Option<&str>) {
    signals.user_agent = agent.unwrap_or(DEFAULT_MOBILE_AGENT).to_string();
}

pub fn reset_test_request_agent(signals: &mut RequestSignals) {
    signals.user_agent = DEFAULT_TEST_AGENT.to_string();
}

pub fn set_session_override(signals: &mut RequestSignals, value: Option<SessionOverride>) {
    signals.session_override = value;
}
