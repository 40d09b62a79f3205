use chrono::NaiveDate;
use monosync_core::{LedgerStore, LedgerTransaction, SortOrder, StoreError, TransactionQuery};
use monosync_ledger::ActualClient;
use secrecy::SecretString;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SYNC_ID: &str = "budget-sync-id";

fn client(server: &MockServer) -> ActualClient {
    ActualClient::new(server.uri(), SecretString::new("api-key".to_string()), SYNC_ID)
}

fn actual_row(id: &str, date: &str, imported_id: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "account": "checking",
        "date": date,
        "amount": -1000,
        "payee": "payee-uuid",
        "imported_payee": "Shop",
        "notes": null,
        "imported_id": imported_id,
        "category": null,
        "is_parent": false,
        "is_child": false
    })
}

#[tokio::test]
async fn test_cursor_query_filters_and_limits_locally() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/budgets/budget-sync-id/accounts/checking/transactions"))
        .and(query_param("since_date", "1970-01-01"))
        .and(header("x-api-key", "api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                actual_row("1", "2026-03-01", Some("bank|manual")),
                actual_row("2", "2026-02-27", Some("mono|older")),
                actual_row("3", "2026-02-28", Some("mono|newest")),
                actual_row("4", "2026-03-02", None)
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = TransactionQuery::account("checking")
        .imported_with_prefix("mono|")
        .order(SortOrder::DateDesc)
        .limit(1);
    let rows = client(&server).query_transactions(&query).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].imported_id.as_deref(), Some("mono|newest"));
    assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    assert_eq!(rows[0].payee_name, "Shop");
}

#[tokio::test]
async fn test_categories_and_encryption_password() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/budgets/budget-sync-id/categories"))
        .and(header("budget-encryption-password", "hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"id": "c1", "name": "Food", "group_id": "g1", "is_income": false, "hidden": false},
                {"id": "c2", "name": "Starting Balances", "group_id": "g2", "is_income": true, "hidden": false}
            ]
        })))
        .mount(&server)
        .await;

    let cats = client(&server)
        .with_budget_password(Some(SecretString::new("hunter2".to_string())))
        .categories()
        .await
        .unwrap();

    assert_eq!(cats.len(), 2);
    assert_eq!(cats[1].name, "Starting Balances");
    assert_eq!(cats[1].id, "c2");
}

#[tokio::test]
async fn test_import_posts_batch_and_counts() {
    let server = MockServer::start().await;
    let batch = vec![
        LedgerTransaction {
            account: "checking".to_string(),
            amount: -2505,
            date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
            payee_name: "Silpo".to_string(),
            notes: Some("MCC: 5411".to_string()),
            imported_id: Some("mono|abc".to_string()),
            category: None,
        },
        LedgerTransaction {
            account: "checking".to_string(),
            amount: 120000,
            date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            payee_name: "Starting Balance".to_string(),
            notes: None,
            imported_id: None,
            category: Some("c2".to_string()),
        },
    ];

    Mock::given(method("POST"))
        .and(path("/v1/budgets/budget-sync-id/accounts/checking/transactions/import"))
        .and(body_json(serde_json::json!({
            "transactions": [
                {
                    "account": "checking",
                    "amount": -2505,
                    "date": "2026-02-20",
                    "payee_name": "Silpo",
                    "notes": "MCC: 5411",
                    "imported_id": "mono|abc"
                },
                {
                    "account": "checking",
                    "amount": 120000,
                    "date": "2026-02-01",
                    "payee_name": "Starting Balance",
                    "category": "c2"
                }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"added": ["t1", "t2"], "updated": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = client(&server)
        .import_transactions("checking", &batch)
        .await
        .unwrap();
    assert_eq!(report.added, 2);
    assert_eq!(report.updated, 0);
}

#[tokio::test]
async fn test_import_validation_errors_are_rejections() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/budgets/budget-sync-id/accounts/checking/transactions/import"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"added": [], "updated": [], "errors": [{"message": "Invalid date"}]}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .import_transactions("checking", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Rejected(ref msgs) if msgs == &["Invalid date"]));
}

#[tokio::test]
async fn test_http_failure_is_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/budgets/budget-sync-id/categories"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let err = client(&server).categories().await.unwrap_err();
    match err {
        StoreError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "unauthorized");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
