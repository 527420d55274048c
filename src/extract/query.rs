use crate::schema::SiteSchema;
use url::Url;

/// Parameter names tried when none of the schema's declared ones are present
pub const COMMON_QUERY_PARAMS: &[&str] = &["q", "query", "search", "keyword", "term"];

/// Recovers the search term from a result page URL.
///
/// The schema's declared parameter names are tried in declaration order, then
/// the common fallbacks; the first non-empty value wins. Unparseable URLs and
/// URLs without a matching parameter yield an empty string.
pub fn extract_query_from_url(source_url: &str, schema: &SiteSchema) -> String {
    let Ok(url) = Url::parse(source_url) else {
        ::log::debug!("Cannot recover query from unparseable URL {}", source_url);
        return String::new();
    };

    let declared = schema.search_param_names.keys().map(String::as_str);
    for name in declared.chain(COMMON_QUERY_PARAMS.iter().copied()) {
        if let Some(value) = first_param(&url, name) {
            if !value.is_empty() {
                return value;
            }
        }
    }
    String::new()
}

/// Value of the first occurrence of `name` in the query string
fn first_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
