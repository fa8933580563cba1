//! Batch execution end to end

use crate::common::*;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};
use xhs_harvest::crawler::{BatchJob, BatchPayload, CommentRequest, SearchRequest};
use xhs_harvest::state::JobStatus;

fn comment_request(h: &Harness, cookies: &str) -> CommentRequest {
    CommentRequest {
        cookies: cookies.to_string(),
        note_url: h.note_url(NOTE_ID),
        cursor: None,
        max_comments: Some(1),
    }
}

#[tokio::test]
async fn test_failed_job_does_not_abort_batch() {
    let h = Harness::start().await;
    mount_comment_page(
        &h.server,
        NOTE_ID,
        "",
        comment_page(vec![comment("r1"), comment("r2")], "", false),
        2,
    )
    .await;

    let results = h
        .coordinator
        .process_batch_comments(vec![
            comment_request(&h, COOKIES),
            comment_request(&h, "web_session=no-a1-here"),
            comment_request(&h, COOKIES),
        ])
        .await;

    assert_eq!(results.len(), 3);
    let statuses: Vec<JobStatus> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![JobStatus::Success, JobStatus::Failed, JobStatus::Success]
    );
    for (index, result) in results.iter().enumerate() {
        assert_eq!(result.job_index, index);
    }

    assert!(results[1].error.as_deref().unwrap_or_default().contains("a1"));
    assert_eq!(results[1].target, h.note_url(NOTE_ID));
    match &results[2].payload {
        Some(BatchPayload::Comments(comments)) => assert_eq!(comments.len(), 1),
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[tokio::test]
async fn test_batch_search_validates_each_request() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path(SEARCH_NOTES))
        .respond_with(ok(search_page(
            vec![search_item(NOTE_ID, "a"), search_item(OTHER_NOTE_ID, "b")],
            false,
        )))
        .expect(2)
        .mount(&h.server)
        .await;

    let request = |num| SearchRequest {
        cookies: COOKIES.to_string(),
        keyword: "露营".to_string(),
        num,
    };
    let results = h
        .coordinator
        .process_batch_search(vec![request(1), request(0), request(5)])
        .await;

    assert_eq!(results[0].payload.as_ref().map(BatchPayload::len), Some(1));
    assert_eq!(results[1].status, JobStatus::Failed);
    assert_eq!(results[2].payload.as_ref().map(BatchPayload::len), Some(2));
}

#[tokio::test]
async fn test_mixed_batch_serializes_results() {
    let h = Harness::start().await;
    mount_comment_page(
        &h.server,
        NOTE_ID,
        "",
        comment_page(vec![comment("r1")], "", false),
        1,
    )
    .await;
    Mock::given(method("POST"))
        .and(path(SEARCH_NOTES))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&h.server)
        .await;

    let jobs: Vec<BatchJob> = serde_json::from_value(json!([
        {"kind": "comments", "cookies": COOKIES, "noteUrl": h.note_url(NOTE_ID)},
        {"kind": "search", "cookies": COOKIES, "keyword": "露营", "num": 3},
    ]))
    .unwrap();

    let results = h.coordinator.run_batch(jobs).await;
    let value: Value = serde_json::to_value(&results).unwrap();

    assert_eq!(value[0]["jobIndex"], 0);
    assert_eq!(value[0]["status"], "success");
    assert_eq!(value[0]["payload"][0]["commentId"], "r1");
    assert_eq!(value[0]["target"], h.note_url(NOTE_ID));
    assert_eq!(value[0]["itemCount"], 1);
    // Search page errors shorten the result instead of failing the job
    assert_eq!(value[1]["status"], "success");
    assert_eq!(value[1]["payload"], json!([]));
    assert_eq!(value[1]["target"], "露营");
    assert!(value[1]["processedAt"].is_string());
}
