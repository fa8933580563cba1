//! URL handling module for xhs-harvest
//!
//! Share links come in two shapes: the canonical `/explore/{id}` link and the
//! app share link `/discovery/item/{id}` that carries extra tracking
//! parameters. This module converts between them and extracts the stable
//! identifiers every API call needs.

mod alternate;
mod canonical;

use serde::Serialize;
use url::Url;

// Re-export main functions
pub use alternate::{is_alternate_form, to_canonical_form};
pub use canonical::{canonicalize, is_note_id};

/// Stable identifiers of one note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalUrl {
    /// 24-digit hex note id, never empty
    pub note_id: String,

    /// Security token, empty when the link carried none
    pub xsec_token: String,

    /// Where the token was issued (`pc_feed`, `app_share`, ...), may be empty
    pub xsec_source: String,
}

impl CanonicalUrl {
    /// Builds the `/explore/{id}` link for this note under `web_base_url`
    ///
    /// Empty token or source parameters are omitted.
    pub fn explore_url(&self, web_base_url: &str) -> String {
        let base = web_base_url.trim_end_matches('/');
        let mut url = match Url::parse(&format!("{}/explore/{}", base, self.note_id)) {
            Ok(url) => url,
            Err(_) => return format!("{}/explore/{}", base, self.note_id),
        };

        let params: Vec<(&str, &str)> = [
            ("xsec_token", self.xsec_token.as_str()),
            ("xsec_source", self.xsec_source.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect();

        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        url.into()
    }
}

/// Outcome of converting one share link, as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlConversion {
    pub original_url: String,
    pub converted_url: String,
    pub note_id: String,
    pub xsec_token: String,
    pub xsec_source: String,
}

/// Converts a share link (either shape) and reports its identifiers
pub fn describe_url(raw_url: &str) -> crate::UrlResult<UrlConversion> {
    let converted_url = if is_alternate_form(raw_url) {
        to_canonical_form(raw_url)?
    } else {
        raw_url.to_string()
    };
    let note = canonicalize(&converted_url)?;

    Ok(UrlConversion {
        original_url: raw_url.to_string(),
        converted_url,
        note_id: note.note_id,
        xsec_token: note.xsec_token,
        xsec_source: note.xsec_source,
    })
}
