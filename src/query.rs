use indexmap::IndexSet;

use crate::types::{LookupDetails, TemplatePath};

/// Compile the lookup axes into one brace-expansion pattern.
///
/// The result stands for every combination of
/// search path × locale-or-none × format-or-none × handler, e.g.
///
/// ```text
/// {/app1/home,/app2/home}/tests/index{.{en},}{.{html},}{.{erb,builder,coffee},}
/// ```
///
/// Locale and format groups end with an empty alternative so templates
/// without that suffix are found too. A single handler is emitted as a plain
/// `.ext` suffix. Values are de-duplicated per axis and glob metacharacters
/// are escaped; expanding the pattern is left to the template lookup.
pub fn build_search_expression<P: AsRef<str>>(
    search_paths: &[P],
    path: &TemplatePath,
    details: &LookupDetails,
) -> String {
    let mut query = group(search_paths.iter().map(|p| p.as_ref()));
    query.push('/');
    if !path.prefix.is_empty() {
        query.push_str(&escape(&path.prefix));
        query.push('/');
    }
    query.push_str(&escape(&path.file_name()));
    query.push_str(&optional_extension(&details.locales));
    query.push_str(&optional_extension(&details.formats));
    query.push_str(&handler_extension(&details.handlers));
    tracing::trace!(query = %query, "built search expression");
    query
}

/// Escaped, de-duplicated values in first-seen order.
fn unique<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    values
        .into_iter()
        .map(escape)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Nothing, a bare value, or `{a,b,...}`.
fn group<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let values = unique(values);
    match values.len() {
        0 => String::new(),
        1 => values[0].clone(),
        _ => format!("{{{}}}", values.join(",")),
    }
}

/// `{.{a,b},}`: one of the values after a dot, or no suffix at all.
fn optional_extension(values: &[String]) -> String {
    let values = unique(values.iter().map(String::as_str));
    if values.is_empty() {
        return String::new();
    }
    format!("{{.{{{}}},}}", values.join(","))
}

fn handler_extension(values: &[String]) -> String {
    let unique_values = unique(values.iter().map(String::as_str));
    match unique_values.len() {
        0 => String::new(),
        1 => format!(".{}", unique_values[0]),
        _ => optional_extension(values),
    }
}

fn escape(entry: &str) -> String {
    let mut escaped = String::with_capacity(entry.len());
    for c in entry.chars() {
        if matches!(c, '\\' | '*' | '?' | '{' | '}' | '[' | ']' | ',') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
