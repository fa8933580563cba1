use crate::UrlError;
use url::Url;

/// Fixed path prefix of app share links: `/discovery/item/{note_id}`
const ALTERNATE_PREFIX: [&str; 2] = ["discovery", "item"];

/// Query parameters that survive conversion, in output order
const KEPT_PARAMS: &[&str] = &["xsec_source", "type", "xsec_token"];

/// Returns true if the URL is an app share link (`/discovery/item/{id}`)
///
/// Unparseable input is never an alternate link.
pub fn is_alternate_form(raw_url: &str) -> bool {
    Url::parse(raw_url)
        .map(|url| has_alternate_prefix(&url))
        .unwrap_or(false)
}

pub(crate) fn has_alternate_prefix(url: &Url) -> bool {
    let segments = non_empty_segments(url);
    segments.len() >= ALTERNATE_PREFIX.len()
        && segments[..ALTERNATE_PREFIX.len()] == ALTERNATE_PREFIX
}

/// Converts an app share link into the canonical `/explore/{id}` link
///
/// Only `xsec_source`, `type` and `xsec_token` are carried over, in that
/// order; every tracking parameter is dropped. Scheme and host are kept.
///
/// # Examples
///
/// ```
/// use xhs_harvest::url::to_canonical_form;
///
/// let url = to_canonical_form(
///     "https://site/discovery/item/6851829e000000002102cb05?app_platform=android&xsec_source=app_share&type=normal&xsec_token=CBdXOVVtUIw-vYe_hwvxF7T9SFM2KAdwiE2MWDtPM_1kM%3D&author_share=1",
/// )
/// .unwrap();
/// assert_eq!(
///     url,
///     "https://site/explore/6851829e000000002102cb05?xsec_source=app_share&type=normal&xsec_token=CBdXOVVtUIw-vYe_hwvxF7T9SFM2KAdwiE2MWDtPM_1kM%3D"
/// );
/// ```
pub fn to_canonical_form(raw_url: &str) -> Result<String, UrlError> {
    let url = Url::parse(raw_url).map_err(|e| UrlError::Parse(format!("{}: {}", raw_url, e)))?;
    convert(&url).map(String::from)
}

pub(crate) fn convert(url: &Url) -> Result<Url, UrlError> {
    if !has_alternate_prefix(url) {
        return Err(UrlError::InvalidShape(url.to_string()));
    }

    let note_id = non_empty_segments(url)
        .get(ALTERNATE_PREFIX.len())
        .map(|id| id.to_string())
        .ok_or_else(|| UrlError::MissingIdentifier(url.to_string()))?;

    let kept: Vec<(String, String)> = KEPT_PARAMS
        .iter()
        .filter_map(|name| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| (name.to_string(), value.into_owned()))
        })
        .collect();

    let mut canonical = url.clone();
    canonical.set_path(&format!("/explore/{}", note_id));
    canonical.set_query(None);
    canonical.set_fragment(None);

    // query_pairs_mut on an empty list would still leave a trailing '?'
    if !kept.is_empty() {
        canonical.query_pairs_mut().extend_pairs(kept);
    }

    Ok(canonical)
}

pub(crate) fn non_empty_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}
