use aho_corasick::AhoCorasick;
use fancy_regex::Regex;

use crate::error::{Error, Result};

/// A matcher over raw user-agent text, registered under a device name.
///
/// Patterns are compiled when constructed but never rejected: a source that
/// fails to compile is kept as-is and reported by [`DevicePattern::is_match`],
/// so a bad registration surfaces the first time traffic is matched against it
/// instead of being silently treated as "no match".
#[derive(Debug, Clone)]
pub struct DevicePattern {
    source: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Regex with PCRE features (lookahead is needed for e.g. android tablets).
    Regex(Regex),
    /// Case-insensitive substring set; any keyword occurring in the text matches.
    Keywords(AhoCorasick),
    /// Source that did not compile, with the compiler's message.
    Invalid(String),
}

impl DevicePattern {
    /// Compile `source` as a regex. Flags such as `(?i)` go in the source.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let matcher = match Regex::new(&source) {
            Ok(re) => Matcher::Regex(re),
            Err(e) => Matcher::Invalid(e.to_string()),
        };
        Self { source, matcher }
    }

    /// Build an ASCII case-insensitive keyword matcher: the pattern matches
    /// when any keyword occurs anywhere in the text.
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().to_string())
            .collect();
        let source = keywords.join("|");
        let matcher = match AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&keywords)
        {
            Ok(ac) => Matcher::Keywords(ac),
            Err(e) => Matcher::Invalid(e.to_string()),
        };
        Self { source, matcher }
    }

    /// The text this pattern was built from (keywords are `|`-joined).
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.matcher, Matcher::Invalid(_))
    }

    /// Test `text` against the pattern.
    ///
    /// Fails for a pattern that did not compile and for regex runtime errors
    /// (backtrack limit exceeded).
    pub fn is_match(&self, text: &str) -> Result<bool> {
        match &self.matcher {
            Matcher::Regex(re) => Ok(re.is_match(text)?),
            Matcher::Keywords(ac) => Ok(ac.is_match(text)),
            Matcher::Invalid(message) => Err(Error::InvalidPattern {
                pattern: self.source.clone(),
                message: message.clone(),
            }),
        }
    }
}

impl From<&str> for DevicePattern {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for DevicePattern {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<Regex> for DevicePattern {
    fn from(re: Regex) -> Self {
        Self {
            source: re.as_str().to_string(),
            matcher: Matcher::Regex(re),
        }
    }
}

impl PartialEq for DevicePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}
