use crate::config::Configuration;
use crate::query::build_search_expression;
use crate::types::{LookupDetails, TemplatePath};

/// Template storage as seen by the resolver: given a search expression,
/// return the first template it matches.
///
/// Expanding the braces and touching the filesystem (or wherever templates
/// live) is entirely up to the implementation.
pub trait TemplateLookup {
    type Template;

    fn find(&self, expression: &str) -> Option<Self::Template>;
}

/// Expands format tags into their fallback chains and turns lookups into
/// search expressions over a fixed set of search paths.
#[derive(Debug, Clone)]
pub struct FormatResolver<'a> {
    config: &'a Configuration,
    search_paths: Vec<String>,
}

impl<'a> FormatResolver<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self {
            config,
            search_paths: Vec::new(),
        }
    }

    pub fn with_search_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn search_paths(&self) -> &[String] {
        &self.search_paths
    }

    /// Whether `format` falls back to anything, either through an explicit
    /// chain or through the configured default fallback.
    pub fn has_chain(&self, format: &str) -> bool {
        self.explicit_chain(format).is_some() || self.config.default_fallback().is_some()
    }

    /// Formats to try for `format`, most specific first.
    ///
    /// An explicit chain wins; otherwise `[format, default_fallback]` when a
    /// default is configured; otherwise just `[format]`.
    pub fn chain_for(&self, format: &str) -> Vec<String> {
        if let Some(chain) = self.explicit_chain(format) {
            return chain.to_vec();
        }
        match self.config.default_fallback() {
            Some(fallback) => vec![format.to_string(), fallback.to_string()],
            None => vec![format.to_string()],
        }
    }

    /// Replace every format with its chain, keeping order. Formats repeated
    /// across chains are kept; the lookup only needs a trial order.
    pub fn expand_formats<S: AsRef<str>>(&self, formats: &[S]) -> Vec<String> {
        formats
            .iter()
            .flat_map(|f| self.chain_for(f.as_ref()))
            .collect()
    }

    /// `details` with its formats expanded.
    pub fn expand_details(&self, details: &LookupDetails) -> LookupDetails {
        LookupDetails {
            formats: self.expand_formats(&details.formats),
            ..details.clone()
        }
    }

    /// Search expression over this resolver's search paths. Formats are used
    /// as given; see [`FormatResolver::find_templates`] for the expanding
    /// variant.
    pub fn build_query(&self, path: &TemplatePath, details: &LookupDetails) -> String {
        build_search_expression(&self.search_paths, path, details)
    }

    /// Expand the formats in `details`, compile the search expression and ask
    /// `lookup` for a match.
    pub fn find_templates<L: TemplateLookup>(
        &self,
        path: &TemplatePath,
        details: &LookupDetails,
        lookup: &L,
    ) -> Option<L::Template> {
        let details = self.expand_details(details);
        let query = self.build_query(path, &details);
        tracing::debug!(query = %query, formats = ?details.formats, "looking up template");
        lookup.find(&query)
    }

    fn explicit_chain(&self, format: &str) -> Option<&'a [String]> {
        self.config
            .fallback_chains()
            .get(format)
            .map(Vec::as_slice)
            .filter(|chain| !chain.is_empty())
    }
}
