//! Platform endpoints
//!
//! One method per remote endpoint. Each issues exactly one gateway call and
//! decodes the `data` payload into crawler-facing values; paging and pacing
//! are left to the caller.

use crate::config::CrawlerConfig;
use crate::crawler::gateway::{Gateway, Method, Session};
use crate::crawler::pager::Page;
use crate::model::{format_epoch_millis, CommentRecord, NoteDetail, NoteSummary};
use crate::signer::generate_trace_id;
use crate::url::CanonicalUrl;
use crate::GatewayError;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{json, Value};

pub const COMMENT_PAGE_URI: &str = "/api/sns/web/v2/comment/page";
pub const SUB_COMMENT_PAGE_URI: &str = "/api/sns/web/v2/comment/sub/page";
pub const SEARCH_NOTES_URI: &str = "/api/sns/web/v1/search/notes";
pub const NOTE_FEED_URI: &str = "/api/sns/web/v1/feed";
pub const COMMENT_POST_URI: &str = "/api/sns/web/v1/comment/post";

const IMAGE_FORMATS: &str = "jpg,webp,avif";

/// Length of the per-request search correlation id
const SEARCH_ID_LEN: usize = 21;

/// Source tag attached to links built from search results
const SEARCH_RESULT_SOURCE: &str = "pc_feed";

// ============================================================================
// Raw payloads
// ============================================================================

/// Treats an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts counts sent either as numbers or as numeric strings
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUser {
    #[serde(deserialize_with = "null_as_default")]
    pub nickname: String,
}

/// A comment as returned by the comment endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawComment {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub note_id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub content: String,

    #[serde(deserialize_with = "lenient_count")]
    pub like_count: u64,

    #[serde(deserialize_with = "null_as_default")]
    pub user_info: RawUser,

    #[serde(deserialize_with = "null_as_default")]
    pub ip_location: String,

    /// Millisecond epoch, number or string
    pub create_time: Value,

    /// First replies, inlined into the root comment
    #[serde(deserialize_with = "null_as_default")]
    pub sub_comments: Vec<RawComment>,

    #[serde(deserialize_with = "null_as_default")]
    pub sub_comment_has_more: bool,

    /// Where the reply thread continues after the inlined replies
    #[serde(deserialize_with = "null_as_default")]
    pub sub_comment_cursor: String,
}

impl RawComment {
    /// Flattens this comment into a record of `fallback_note_id` when the
    /// payload carries no note id of its own
    pub fn to_record(&self, fallback_note_id: &str) -> CommentRecord {
        let note_id = if self.note_id.is_empty() {
            fallback_note_id
        } else {
            &self.note_id
        };

        CommentRecord {
            note_id: note_id.to_string(),
            comment_id: self.id.clone(),
            content: self.content.clone(),
            like_count: self.like_count,
            author_nickname: self.user_info.nickname.clone(),
            ip_location: self.ip_location.clone(),
            created_at: format_epoch_millis(&self.create_time),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCommentPage {
    #[serde(deserialize_with = "null_as_default")]
    comments: Vec<RawComment>,

    #[serde(deserialize_with = "null_as_default")]
    cursor: String,

    #[serde(deserialize_with = "null_as_default")]
    has_more: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSearchPage {
    #[serde(deserialize_with = "null_as_default")]
    items: Vec<Value>,

    has_more: Option<bool>,
}

fn decode<T: DeserializeOwned>(uri: &str, data: Value) -> Result<T, GatewayError> {
    serde_json::from_value(data).map_err(|e| GatewayError::MalformedResponse {
        uri: uri.to_string(),
        reason: e.to_string(),
    })
}

/// Renders a JSON scalar the way the platform displays it
fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// Endpoints
// ============================================================================

/// Endpoint calls made on behalf of one session
#[derive(Clone, Copy)]
pub struct PlatformApi<'a> {
    gateway: &'a Gateway,
    session: &'a Session,
    config: &'a CrawlerConfig,
}

impl<'a> PlatformApi<'a> {
    pub fn new(gateway: &'a Gateway, session: &'a Session, config: &'a CrawlerConfig) -> Self {
        Self {
            gateway,
            session,
            config,
        }
    }

    /// One page of top-level comments
    pub async fn comment_page(
        &self,
        target: &CanonicalUrl,
        cursor: String,
    ) -> Result<Page<RawComment, String>, GatewayError> {
        let params = json!({
            "note_id": target.note_id,
            "cursor": cursor,
            "top_comment_id": "",
            "image_formats": IMAGE_FORMATS,
            "xsec_token": target.xsec_token,
        });

        let data = self
            .gateway
            .call(self.session, Method::Get, COMMENT_PAGE_URI, &params)
            .await?;
        let page: RawCommentPage = decode(COMMENT_PAGE_URI, data)?;

        Ok(Page {
            items: page.comments,
            next_cursor: page.cursor,
            has_more: page.has_more,
        })
    }

    /// One page of replies under `root_comment_id`
    pub async fn sub_comment_page(
        &self,
        note_id: &str,
        root_comment_id: &str,
        xsec_token: &str,
        cursor: String,
    ) -> Result<Page<RawComment, String>, GatewayError> {
        let params = json!({
            "note_id": note_id,
            "root_comment_id": root_comment_id,
            "num": self.config.sub_comment_page_size,
            "cursor": cursor,
            "image_formats": IMAGE_FORMATS,
            "xsec_token": xsec_token,
        });

        let data = self
            .gateway
            .call(self.session, Method::Get, SUB_COMMENT_PAGE_URI, &params)
            .await?;
        let page: RawCommentPage = decode(SUB_COMMENT_PAGE_URI, data)?;

        Ok(Page {
            items: page.comments,
            next_cursor: page.cursor,
            has_more: page.has_more,
        })
    }

    /// One page of keyword search results
    ///
    /// Items without a note card (ads, topic cards) are skipped. The next
    /// cursor is always `page + 1`; an empty raw page ends the sequence.
    pub async fn search_page(
        &self,
        keyword: &str,
        page: u32,
    ) -> Result<Page<NoteSummary, u32>, GatewayError> {
        let params = json!({
            "keyword": keyword,
            "page": page,
            "page_size": self.config.search_page_size,
            "search_id": generate_trace_id(SEARCH_ID_LEN),
            "sort": "general",
            "note_type": 0,
            "ext_flags": [],
            "filters": [
                {"tags": ["general"], "type": "sort_type"},
                {"tags": ["不限"], "type": "filter_note_type"},
                {"tags": ["不限"], "type": "filter_note_time"},
                {"tags": ["不限"], "type": "filter_note_range"},
                {"tags": ["不限"], "type": "filter_pos_distance"},
            ],
            "geo": "",
            "image_formats": ["jpg", "webp", "avif"],
        });

        let data = self
            .gateway
            .call(self.session, Method::Post, SEARCH_NOTES_URI, &params)
            .await?;
        let raw: RawSearchPage = decode(SEARCH_NOTES_URI, data)?;

        let has_more = !raw.items.is_empty() && raw.has_more.unwrap_or(true);
        let items = raw
            .items
            .iter()
            .filter_map(|item| self.note_summary(item))
            .collect();

        Ok(Page {
            items,
            next_cursor: page.saturating_add(1),
            has_more,
        })
    }

    fn note_summary(&self, item: &Value) -> Option<NoteSummary> {
        let card = item.get("note_card").filter(|card| card.is_object())?;
        let note_id = item.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())?;
        let xsec_token = str_field(item, "xsec_token");

        let url = CanonicalUrl {
            note_id: note_id.to_string(),
            xsec_token: xsec_token.clone(),
            xsec_source: SEARCH_RESULT_SOURCE.to_string(),
        }
        .explore_url(self.gateway.web_base_url());

        Some(NoteSummary {
            note_id: note_id.to_string(),
            title: str_field(card, "display_title"),
            xsec_token,
            url,
        })
    }

    /// Note metadata from the feed endpoint
    pub async fn note_detail(
        &self,
        target: &CanonicalUrl,
        note_url: &str,
    ) -> Result<NoteDetail, GatewayError> {
        let params = json!({
            "source_note_id": target.note_id,
            "xsec_token": target.xsec_token,
            "xsec_source": target.xsec_source,
            "image_formats": ["jpg", "webp", "avif"],
            "extra": {"need_body_topic": "1"},
        });

        let data = self
            .gateway
            .call(self.session, Method::Post, NOTE_FEED_URI, &params)
            .await?;

        let item = data
            .get("items")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .ok_or_else(|| GatewayError::MalformedResponse {
                uri: NOTE_FEED_URI.to_string(),
                reason: "feed returned no items".to_string(),
            })?;
        let card = item
            .get("note_card")
            .filter(|card| card.is_object())
            .ok_or_else(|| GatewayError::MalformedResponse {
                uri: NOTE_FEED_URI.to_string(),
                reason: "feed item has no note card".to_string(),
            })?;

        let interact = card.get("interact_info").cloned().unwrap_or(Value::Null);
        let note_id = match str_field(card, "note_id") {
            id if id.is_empty() => target.note_id.clone(),
            id => id,
        };
        let published_at = match card.get("time") {
            Some(time) if !time.is_null() => format_epoch_millis(time),
            _ => String::new(),
        };

        Ok(NoteDetail {
            note_id,
            title: str_field(card, "title"),
            author: card
                .get("user")
                .map(|user| str_field(user, "nickname"))
                .unwrap_or_default(),
            like_count: display_value(interact.get("liked_count")),
            collected_count: display_value(interact.get("collected_count")),
            comment_count: display_value(interact.get("comment_count")),
            location: str_field(card, "ip_location"),
            note_type: display_value(item.get("model_type")),
            url: note_url.to_string(),
            xsec_token: target.xsec_token.clone(),
            published_at,
        })
    }

    /// Posts `content` as a reply to `comment_id`
    pub async fn post_reply(
        &self,
        note_id: &str,
        comment_id: &str,
        content: &str,
    ) -> Result<Value, GatewayError> {
        let params = json!({
            "note_id": note_id,
            "target_comment_id": comment_id,
            "content": content,
            "at_users": [],
        });

        self.gateway
            .call(self.session, Method::Post, COMMENT_POST_URI, &params)
            .await
    }
}
