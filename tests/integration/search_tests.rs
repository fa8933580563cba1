//! Keyword search and the search-then-comments job against a mock platform

use crate::common::*;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

async fn mount_search_page(server: &MockServer, page: u32, data: Value, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(SEARCH_NOTES))
        .and(body_partial_json(json!({"page": page})))
        .respond_with(ok(data))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn ad_item() -> Value {
    json!({"id": "ad-1", "model_type": "ads", "xsec_token": "t"})
}

#[tokio::test]
async fn test_search_pages_advance_and_truncate() {
    let h = Harness::start().await;
    mount_search_page(
        &h.server,
        1,
        search_page(vec![search_item(NOTE_ID, "露营装备"), ad_item()], true),
        1,
    )
    .await;
    mount_search_page(
        &h.server,
        2,
        search_page(
            vec![
                search_item(OTHER_NOTE_ID, "露营地推荐"),
                search_item("66b1d2e3000000001c01f789", "第三篇"),
            ],
            true,
        ),
        1,
    )
    .await;
    mount_search_page(&h.server, 3, search_page(vec![], false), 0).await;

    let notes = h
        .coordinator
        .search_notes(COOKIES, "露营", 2)
        .await
        .expect("search failed");

    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].note_id, NOTE_ID);
    assert_eq!(notes[0].title, "露营装备");
    assert_eq!(notes[0].xsec_token, format!("tok-{}", NOTE_ID));
    assert_eq!(
        notes[0].url,
        format!(
            "{}/explore/{}?xsec_token=tok-{}&xsec_source=pc_feed",
            h.server.uri(),
            NOTE_ID,
            NOTE_ID
        )
    );
    assert_eq!(notes[1].note_id, OTHER_NOTE_ID);
}

#[tokio::test]
async fn test_search_stops_when_results_run_out() {
    let h = Harness::start().await;
    mount_search_page(
        &h.server,
        1,
        search_page(vec![search_item(NOTE_ID, "only")], true),
        1,
    )
    .await;
    mount_search_page(&h.server, 2, search_page(vec![], true), 1).await;
    mount_search_page(&h.server, 3, search_page(vec![], false), 0).await;

    let notes = h
        .coordinator
        .search_notes(COOKIES, "露营", 20)
        .await
        .expect("search failed");

    assert_eq!(notes.len(), 1);
}

#[tokio::test]
async fn test_search_body_is_signed_with_fresh_search_id() {
    let h = Harness::start().await;
    mount_search_page(
        &h.server,
        1,
        search_page(vec![search_item(NOTE_ID, "a")], true),
        1,
    )
    .await;
    mount_search_page(
        &h.server,
        2,
        search_page(vec![search_item(OTHER_NOTE_ID, "b")], false),
        1,
    )
    .await;

    h.coordinator
        .search_notes(COOKIES, "露营", 5)
        .await
        .expect("search failed");

    let calls = h.signer.calls();
    assert_eq!(calls.len(), 2);

    let mut search_ids = Vec::new();
    for call in &calls {
        assert_eq!(call.uri, SEARCH_NOTES);
        let body: Value = serde_json::from_str(&call.body).expect("body is JSON");
        assert_eq!(body["keyword"], "露营");
        assert_eq!(body["page_size"], 20);

        let search_id = body["search_id"].as_str().expect("search id").to_string();
        assert_eq!(search_id.len(), 21);
        assert!(search_id.chars().all(|c| c.is_ascii_hexdigit()));
        search_ids.push(search_id);
    }
    assert_ne!(search_ids[0], search_ids[1]);

    let received = h.server.received_requests().await.expect("recording enabled");
    assert_eq!(received[0].body, calls[0].body.as_bytes());
}

#[tokio::test]
async fn test_search_comments_shares_one_budget() {
    let h = Harness::start().await;
    mount_search_page(
        &h.server,
        1,
        search_page(
            vec![
                search_item(NOTE_ID, "first"),
                search_item(OTHER_NOTE_ID, "second"),
            ],
            true,
        ),
        1,
    )
    .await;
    mount_search_page(&h.server, 2, search_page(vec![], false), 0).await;

    mount_comment_page(
        &h.server,
        NOTE_ID,
        "",
        comment_page(vec![comment("a1"), comment("a2"), comment("a3")], "", false),
        1,
    )
    .await;
    // The second note has more comments than the budget leaves room for
    mount_comment_page(
        &h.server,
        OTHER_NOTE_ID,
        "",
        comment_page(
            vec![comment("b1"), comment("b2"), comment("b3"), comment("b4")],
            "next",
            true,
        ),
        1,
    )
    .await;
    mount_comment_page(
        &h.server,
        OTHER_NOTE_ID,
        "next",
        comment_page(vec![comment("b5")], "", false),
        0,
    )
    .await;

    let records = h
        .coordinator
        .search_comments(COOKIES, "露营", 5)
        .await
        .expect("search-comments failed");

    assert_eq!(ids(&records), vec!["a1", "a2", "a3", "b1", "b2"]);
}

#[tokio::test]
async fn test_search_comments_advances_page_index() {
    let h = Harness::start().await;
    mount_search_page(
        &h.server,
        1,
        search_page(vec![search_item(NOTE_ID, "first")], true),
        1,
    )
    .await;
    mount_search_page(
        &h.server,
        2,
        search_page(vec![search_item(OTHER_NOTE_ID, "second")], true),
        1,
    )
    .await;
    mount_search_page(&h.server, 3, search_page(vec![], true), 1).await;

    mount_comment_page(
        &h.server,
        NOTE_ID,
        "",
        comment_page(vec![comment("a1")], "", false),
        1,
    )
    .await;
    mount_comment_page(
        &h.server,
        OTHER_NOTE_ID,
        "",
        comment_page(vec![comment("b1")], "", false),
        1,
    )
    .await;

    let records = h
        .coordinator
        .search_comments(COOKIES, "露营", 10)
        .await
        .expect("search-comments failed");

    assert_eq!(ids(&records), vec!["a1", "b1"]);
}

#[tokio::test]
async fn test_search_comments_skips_note_whose_comments_fail() {
    let h = Harness::start().await;
    mount_search_page(
        &h.server,
        1,
        search_page(
            vec![
                search_item(NOTE_ID, "broken"),
                search_item(OTHER_NOTE_ID, "fine"),
            ],
            false,
        ),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path(COMMENT_PAGE))
        .and(wiremock::matchers::query_param("note_id", NOTE_ID))
        .respond_with(wiremock::ResponseTemplate::new(500))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_comment_page(
        &h.server,
        OTHER_NOTE_ID,
        "",
        comment_page(vec![comment("b1")], "", false),
        1,
    )
    .await;

    let records = h
        .coordinator
        .search_comments(COOKIES, "露营", 10)
        .await
        .expect("search-comments failed");

    assert_eq!(ids(&records), vec!["b1"]);
}

/// Serves endless search results: one note per page, always with more to come
struct EndlessResults;

impl Respond for EndlessResults {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let page = serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|body| body["page"].as_u64())
            .unwrap_or(0);
        ok(search_page(
            vec![search_item(&format!("note-{}", page), "endless")],
            true,
        ))
    }
}

#[tokio::test]
async fn test_job_deadline_stops_between_search_pages() {
    let server = MockServer::start().await;
    let h = Harness::with_config(server, |config| {
        config.throttle.page_interval_ms = 300;
        config.crawler.job_timeout_secs = 1;
    });
    Mock::given(method("POST"))
        .and(path(SEARCH_NOTES))
        .respond_with(EndlessResults)
        .mount(&h.server)
        .await;

    let started = Instant::now();
    let notes = h
        .coordinator
        .search_notes(COOKIES, "露营", 100)
        .await
        .expect("deadline must not fail the search");

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(notes.len() >= 2, "pages read before the deadline are kept");
    assert!(notes.len() <= 8, "search ran past its deadline: {}", notes.len());
    assert_eq!(notes[0].note_id, "note-1");
    assert_eq!(notes[1].note_id, "note-2");
}
