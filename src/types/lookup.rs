/// A template reference as the rendering layer asks for it:
/// `index` under `tests`, optionally as a partial (`_index`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePath {
    pub name: String,
    pub prefix: String,
    pub partial: bool,
}

impl TemplatePath {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, partial: bool) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            partial,
        }
    }

    /// File stem to look for; partials are prefixed with `_`.
    pub fn file_name(&self) -> String {
        if self.partial {
            format!("_{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Lookup axes that are expanded into a search expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupDetails {
    pub locales: Vec<String>,
    pub formats: Vec<String>,
    pub handlers: Vec<String>,
}

impl LookupDetails {
    pub fn new<L, F, H>(locales: L, formats: F, handlers: H) -> Self
    where
        L: IntoIterator,
        L::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
        H: IntoIterator,
        H::Item: Into<String>,
    {
        Self {
            locales: locales.into_iter().map(Into::into).collect(),
            formats: formats.into_iter().map(Into::into).collect(),
            handlers: handlers.into_iter().map(Into::into).collect(),
        }
    }
}
