//! Integration tests for the row-store client and the eventual-mirror
//! policy.

use postflow::config::Config;
use postflow::content::{Account, ContentItem, ContentPipeline};
use postflow::store::RowStore;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> RowStore {
    let config = Config {
        store_url: Some(server.uri()),
        ..Config::for_testing()
    };
    RowStore::from_config(&config).expect("store configured")
}

fn draft(pipeline: &mut ContentPipeline, text: &str) -> u64 {
    let id = pipeline.allocate_id();
    pipeline.add(ContentItem::draft(id, Account::Primary, text.to_string()));
    id
}

#[tokio::test]
async fn test_mirror_save_stamps_store_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 42}])))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let mut pipeline = ContentPipeline::new();
    let id = draft(&mut pipeline, "post to mirror");

    store.mirror_save_posts(&mut pipeline, &[id]).await;
    assert_eq!(pipeline.get(id).unwrap().store_id, Some(42));
}

#[tokio::test]
async fn test_mirror_failure_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/posts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let mut pipeline = ContentPipeline::new();
    let id = draft(&mut pipeline, "post that fails to mirror");

    // no error surfaces; local state stays authoritative
    store.mirror_save_posts(&mut pipeline, &[id]).await;
    let item = pipeline.get(id).unwrap();
    assert_eq!(item.post, "post that fails to mirror");
    assert_eq!(item.store_id, None);

    store.mirror_patch_post(7, json!({"tab": "POST"})).await;
    store.mirror_delete_post(7).await;
}

#[tokio::test]
async fn test_upsert_setting_patches_then_inserts() {
    let server = MockServer::start().await;
    // no existing row: patch matches nothing
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/settings"))
        .and(query_param("key", "eq.brand_voice_django_crypto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/settings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"key": "brand_voice_django_crypto"}])))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store
        .upsert_setting("brand_voice_django_crypto", "the voice profile")
        .await
        .expect("upsert falls back to insert");
}

#[tokio::test]
async fn test_upsert_setting_patch_hit_skips_insert() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/settings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"key": "weekly_notes_django_crypto", "value": "v"}])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/settings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store
        .upsert_setting("weekly_notes_django_crypto", "v")
        .await
        .expect("patch hit is enough");
}

#[tokio::test]
async fn test_fetch_candidates_tolerates_numeric_and_null_columns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"post": "tracked post one", "category": "growth", "structure": null, "score": 7, "tab": "USED"},
            {"post": "tracked post two", "category": null, "structure": "Listicle", "score": "8.5", "tab": "POST"}
        ])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let candidates = store.fetch_match_candidates().await.expect("fetch works");
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].score, "7");
    assert_eq!(candidates[1].pillar, "");
    assert_eq!(candidates[1].score, "8.5");
}

#[tokio::test]
async fn test_get_setting_reads_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/settings"))
        .and(query_param("key", "eq.last_analysis"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"key": "last_analysis", "value": "the report"}])),
        )
        .mount(&server)
        .await;

    let store = store_for(&server);
    let value = store.get_setting("last_analysis").await.expect("setting read");
    assert_eq!(value.as_deref(), Some("the report"));
}
