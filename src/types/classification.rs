/// Outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Render normally.
    Standard,
    /// Respond with the given mobile format tag.
    Mobile { format: String },
}

impl Classification {
    pub fn is_mobile(&self) -> bool {
        matches!(self, Self::Mobile { .. })
    }

    /// The chosen format tag, if mobile.
    pub fn format(&self) -> Option<&str> {
        match self {
            Self::Mobile { format } => Some(format.as_str()),
            Self::Standard => None,
        }
    }
}
