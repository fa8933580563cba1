//! Shared fixtures: a recording signer, a test configuration pointed at a
//! mock server, and builders for platform payloads.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xhs_harvest::config::Config;
use xhs_harvest::crawler::Coordinator;
use xhs_harvest::signer::{SignedHeaders, Signer};
use xhs_harvest::GatewayError;

pub const NOTE_ID: &str = "64f8a1b2000000001e00c123";
pub const OTHER_NOTE_ID: &str = "65a0c3d4000000001f03e456";
pub const COOKIES: &str = "a1=18c0fe1a2b3c; web_session=040069b5; webId=7d1f";
pub const SESSION_KEY: &str = "18c0fe1a2b3c";
pub const FAKE_XS: &str = "XYW_ZmFrZQ==";

pub const COMMENT_PAGE: &str = "/api/sns/web/v2/comment/page";
pub const SUB_COMMENT_PAGE: &str = "/api/sns/web/v2/comment/sub/page";
pub const SEARCH_NOTES: &str = "/api/sns/web/v1/search/notes";
pub const NOTE_FEED: &str = "/api/sns/web/v1/feed";
pub const COMMENT_POST: &str = "/api/sns/web/v1/comment/post";

/// One call seen by the signer
#[derive(Debug, Clone)]
pub struct SignedCall {
    pub uri: String,
    pub body: String,
    pub session_key: String,
    pub at: Instant,
}

/// Signs everything with fixed headers and records what it was asked
#[derive(Default)]
pub struct RecordingSigner {
    calls: Mutex<Vec<SignedCall>>,
}

impl RecordingSigner {
    pub fn calls(&self) -> Vec<SignedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Signer for RecordingSigner {
    async fn sign(
        &self,
        uri: &str,
        body: &str,
        session_key: &str,
    ) -> Result<SignedHeaders, GatewayError> {
        self.calls.lock().unwrap().push(SignedCall {
            uri: uri.to_string(),
            body: body.to_string(),
            session_key: session_key.to_string(),
            at: Instant::now(),
        });
        Ok(SignedHeaders {
            xs: FAKE_XS.to_string(),
            xt: "1718000000000".to_string(),
            xs_common: "2UQAPsHC+aIjqArjwjHjNsQhPsHCH0rjNsQhPaHCH0P1+".to_string(),
        })
    }

    fn trace_id(&self) -> String {
        "0123456789abcdef".to_string()
    }
}

/// A signer whose backing process is gone
pub struct BrokenSigner;

#[async_trait]
impl Signer for BrokenSigner {
    async fn sign(
        &self,
        _uri: &str,
        _body: &str,
        _session_key: &str,
    ) -> Result<SignedHeaders, GatewayError> {
        Err(GatewayError::SignerUnavailable(
            "signer exited with status 1".to_string(),
        ))
    }
}

/// Configuration pointed at `server` with short pauses
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.platform.api_base_url = server.uri();
    config.platform.web_base_url = server.uri();
    config.platform.timeout_secs = 5;
    config.throttle.page_interval_ms = 10;
    config.throttle.reply_interval_ms = 10;
    config.throttle.batch_interval_ms = 10;
    config.crawler.max_pages = 50;
    config
}

pub struct Harness {
    pub server: MockServer,
    pub signer: Arc<RecordingSigner>,
    pub coordinator: Coordinator,
}

impl Harness {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self::with_config(server, |_| {})
    }

    pub fn with_config(server: MockServer, adjust: impl FnOnce(&mut Config)) -> Self {
        let mut config = test_config(&server);
        adjust(&mut config);

        let signer = Arc::new(RecordingSigner::default());
        let coordinator =
            Coordinator::new(config, signer.clone()).expect("Failed to create coordinator");

        Self {
            server,
            signer,
            coordinator,
        }
    }

    /// Canonical link to `note_id` on the mock server
    pub fn note_url(&self, note_id: &str) -> String {
        format!(
            "{}/explore/{}?xsec_token=ABtok%3D&xsec_source=pc_search",
            self.server.uri(),
            note_id
        )
    }
}

/// Successful response envelope around `data`
pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 0,
        "success": true,
        "msg": "成功",
        "data": data,
    }))
}

/// A comment without replies
pub fn comment(id: &str) -> Value {
    json!({
        "id": id,
        "note_id": NOTE_ID,
        "content": format!("content of {}", id),
        "like_count": "3",
        "user_info": {"user_id": "u1", "nickname": format!("nick-{}", id)},
        "ip_location": "上海",
        "create_time": 1_718_000_000_000i64,
        "sub_comments": [],
        "sub_comment_has_more": false,
        "sub_comment_cursor": "",
    })
}

/// A root comment with inlined replies and, optionally, a continuing thread
pub fn comment_with_replies(id: &str, inline: &[&str], more_from: Option<&str>) -> Value {
    let mut value = comment(id);
    value["sub_comments"] = Value::Array(inline.iter().map(|reply| comment(reply)).collect());
    if let Some(cursor) = more_from {
        value["sub_comment_has_more"] = json!(true);
        value["sub_comment_cursor"] = json!(cursor);
    }
    value
}

/// Data of one comment page
pub fn comment_page(comments: Vec<Value>, cursor: &str, has_more: bool) -> Value {
    json!({
        "comments": comments,
        "cursor": cursor,
        "has_more": has_more,
        "time": 1_718_000_000_000i64,
    })
}

/// A search result item carrying a note card
pub fn search_item(note_id: &str, title: &str) -> Value {
    json!({
        "id": note_id,
        "model_type": "note",
        "xsec_token": format!("tok-{}", note_id),
        "note_card": {
            "display_title": title,
            "type": "normal",
            "user": {"nickname": "author"},
        },
    })
}

/// Data of one search page
pub fn search_page(items: Vec<Value>, has_more: bool) -> Value {
    json!({"items": items, "has_more": has_more})
}

/// Mounts a top-level comment page of `note_id` served at `cursor`
pub async fn mount_comment_page(
    server: &MockServer,
    note_id: &str,
    cursor: &str,
    data: Value,
    expected_calls: u64,
) {
    Mock::given(method("GET"))
        .and(path(COMMENT_PAGE))
        .and(query_param("note_id", note_id))
        .and(query_param("cursor", cursor))
        .respond_with(ok(data))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Mounts a reply page of `root_comment_id` served at `cursor`
pub async fn mount_reply_page(
    server: &MockServer,
    root_comment_id: &str,
    cursor: &str,
    data: Value,
    expected_calls: u64,
) {
    Mock::given(method("GET"))
        .and(path(SUB_COMMENT_PAGE))
        .and(query_param("root_comment_id", root_comment_id))
        .and(query_param("cursor", cursor))
        .respond_with(ok(data))
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub fn ids(records: &[xhs_harvest::CommentRecord]) -> Vec<&str> {
    records.iter().map(|r| r.comment_id.as_str()).collect()
}
