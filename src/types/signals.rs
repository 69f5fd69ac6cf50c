use std::collections::HashMap;
use std::str::FromStr;

/// Request parameter carrying the explicitly requested format.
pub const FORMAT_PARAM: &str = "format";
/// Request parameter that, when `"true"`, bypasses mobile handling.
pub const SKIP_MOBILE_PARAM: &str = "skip_mobile";
/// Session key holding the [`SessionOverride`].
pub const SESSION_OVERRIDE_KEY: &str = "mobile_override";

/// Per-session switch stored by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOverride {
    ForceMobile,
    IgnoreMobile,
}

impl SessionOverride {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForceMobile => "force_mobile",
            Self::IgnoreMobile => "ignore_mobile",
        }
    }

    /// Read the override from a session store. Unrecognised values count as
    /// absent.
    pub fn from_session(session: &HashMap<String, String>) -> Option<Self> {
        session
            .get(SESSION_OVERRIDE_KEY)
            .and_then(|v| v.parse().ok())
    }
}

impl FromStr for SessionOverride {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "force_mobile" => Ok(Self::ForceMobile),
            "ignore_mobile" => Ok(Self::IgnoreMobile),
            _ => Err(()),
        }
    }
}

/// The response format negotiated for a request plus the candidate list the
/// rendering layer tries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedFormat {
    pub format: String,
    pub formats: Vec<String>,
}

impl NegotiatedFormat {
    pub fn new(format: impl Into<String>) -> Self {
        let format = format.into();
        Self {
            formats: vec![format.clone()],
            format,
        }
    }
}

impl Default for NegotiatedFormat {
    fn default() -> Self {
        Self::new("html")
    }
}

/// Everything the classifier reads from the HTTP layer for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestSignals {
    pub user_agent: String,
    pub params: HashMap<String, String>,
    pub negotiated: NegotiatedFormat,
    pub xhr: bool,
    pub session_override: Option<SessionOverride>,
}

impl RequestSignals {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.negotiated = NegotiatedFormat::new(format);
        self
    }

    pub fn with_xhr(mut self, xhr: bool) -> Self {
        self.xhr = xhr;
        self
    }

    pub fn with_session_override(mut self, session_override: Option<SessionOverride>) -> Self {
        self.session_override = session_override;
        self
    }

    /// Value of the `format` request parameter.
    pub fn format_param(&self) -> Option<&str> {
        self.params.get(FORMAT_PARAM).map(String::as_str)
    }

    /// Whether the request asked to skip mobile handling.
    pub fn skip_requested(&self) -> bool {
        self.params
            .get(SKIP_MOBILE_PARAM)
            .is_some_and(|v| v == "true")
    }
}
