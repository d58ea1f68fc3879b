//! Integration tests for the spreadsheet import.

use postflow::config::Config;
use postflow::content::{Account, ContentPipeline, Tab};
use postflow::sheets::SheetsClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> Config {
    Config {
        sheets_base_url: base_url.to_string(),
        ..Config::for_testing()
    }
}

async fn mount_tab(server: &MockServer, tab: &str, csv: &str) {
    Mock::given(method("GET"))
        .and(path("/spreadsheets/d/test-sheet/gviz/tq"))
        .and(query_param("sheet", tab))
        .respond_with(ResponseTemplate::new(200).set_body_string(csv.to_string()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_import_all_tabs() {
    let server = MockServer::start().await;
    mount_tab(
        &server,
        "DRAFT",
        "Post,Category,Structure,Score\n\"draft post one\",growth,Listicle,7\n\"draft post two\",market,,\n",
    )
    .await;
    mount_tab(&server, "POST", "Post,Category\nscheduled post,market\n").await;
    mount_tab(
        &server,
        "USED",
        "Post,Category,Impressions,Likes\n\"used post, with comma\",growth,1200,40\n",
    )
    .await;
    mount_tab(&server, "DATABASE", "Post,Category\n").await;
    mount_tab(&server, "BAD", "Post,Category,Why Bad\nweak post,growth,too generic\n").await;

    let client = SheetsClient::new(&test_config(&server.uri()));
    let mut pipeline = ContentPipeline::new();
    let imported = client
        .import_all(&mut pipeline, Account::Primary)
        .await
        .expect("import should succeed");

    assert_eq!(imported, 5);
    let counts = pipeline.counts(Account::Primary);
    assert_eq!(counts.get(&Tab::Draft), Some(&2));
    assert_eq!(counts.get(&Tab::Post), Some(&1));
    assert_eq!(counts.get(&Tab::Used), Some(&1));
    assert_eq!(counts.get(&Tab::Database), None);
    assert_eq!(counts.get(&Tab::Bad), Some(&1));

    // ids are sequential across tabs, in tab order
    let used = pipeline.tab_items(Account::Primary, Tab::Used);
    assert_eq!(used[0].post, "used post, with comma");
    assert_eq!(used[0].metrics.impressions, "1200");

    // Why Bad lands in notes
    let bad = pipeline.tab_items(Account::Primary, Tab::Bad);
    assert_eq!(bad[0].notes, "too generic");
}

#[tokio::test]
async fn test_failed_tab_is_named() {
    let server = MockServer::start().await;
    mount_tab(&server, "DRAFT", "Post,Category\nfine post,growth\n").await;
    Mock::given(method("GET"))
        .and(path("/spreadsheets/d/test-sheet/gviz/tq"))
        .and(query_param("sheet", "POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = SheetsClient::new(&test_config(&server.uri()));
    let mut pipeline = ContentPipeline::new();
    let err = client
        .import_all(&mut pipeline, Account::Primary)
        .await
        .expect_err("second tab should fail");

    assert!(err.to_string().contains("POST"), "error names the tab: {err}");
    // rows from the tab that loaded before the failure are kept
    assert_eq!(pipeline.tab_items(Account::Primary, Tab::Draft).len(), 1);
}

#[tokio::test]
async fn test_empty_tab_yields_no_rows() {
    let server = MockServer::start().await;
    for tab in ["DRAFT", "POST", "USED", "DATABASE", "BAD"] {
        mount_tab(&server, tab, "").await;
    }
    let client = SheetsClient::new(&test_config(&server.uri()));
    let mut pipeline = ContentPipeline::new();
    let imported = client
        .import_all(&mut pipeline, Account::Primary)
        .await
        .expect("empty tabs are not an error");
    assert_eq!(imported, 0);
}
