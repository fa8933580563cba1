use crate::url::alternate::{convert, has_alternate_prefix, non_empty_segments};
use crate::url::CanonicalUrl;
use crate::UrlError;
use url::Url;

/// Length of a platform note id (24 lowercase hex digits)
const NOTE_ID_LEN: usize = 24;

/// Extracts the note id and security tokens from any accepted share link
///
/// Both `/explore/{id}?...` links and app share links
/// (`/discovery/item/{id}?...`) are accepted; the latter are converted
/// first. A missing `xsec_token` or `xsec_source` yields an empty string
/// since some calls are legally tokenless.
///
/// # Errors
///
/// * `UrlError::Parse` - The input is not an absolute URL
/// * `UrlError::MissingIdentifier` - No well-formed note id in the path
///
/// # Examples
///
/// ```
/// use xhs_harvest::url::canonicalize;
///
/// let note = canonicalize(
///     "https://www.xiaohongshu.com/explore/64f8a1b2000000001e00c123?xsec_token=ABtest123&xsec_source=pc_search",
/// )
/// .unwrap();
/// assert_eq!(note.note_id, "64f8a1b2000000001e00c123");
/// assert_eq!(note.xsec_token, "ABtest123");
/// assert_eq!(note.xsec_source, "pc_search");
/// ```
pub fn canonicalize(raw_url: &str) -> Result<CanonicalUrl, UrlError> {
    let parsed =
        Url::parse(raw_url).map_err(|e| UrlError::Parse(format!("{}: {}", raw_url, e)))?;

    let url = if has_alternate_prefix(&parsed) {
        convert(&parsed)?
    } else {
        parsed
    };

    let note_id = match non_empty_segments(&url).as_slice() {
        ["explore", id, ..] if is_note_id(id) => id.to_string(),
        _ => return Err(UrlError::MissingIdentifier(raw_url.to_string())),
    };

    Ok(CanonicalUrl {
        note_id,
        xsec_token: query_value(&url, "xsec_token"),
        xsec_source: query_value(&url, "xsec_source"),
    })
}

/// Returns true if the string has the shape of a platform note id
pub fn is_note_id(candidate: &str) -> bool {
    candidate.len() == NOTE_ID_LEN && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

fn query_value(url: &Url, name: &str) -> String {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}
