//! Wire mapping tests for the Grafana HTTP client.
//!
//! A wiremock server stands in for Grafana; each test checks the path,
//! headers and body a client call produces and how responses are mapped.

use grafana_client::{
    CreateFolderCommand, GrafanaApi, GrafanaConfig, GrafanaError, GrafanaHttpClient,
    SaveDashboardCommand, SsoSettings, UpdateFolderCommand, FOLDER_PAGE_SIZE,
};
use grafana_domain::Datasource;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Basic auth header for admin:secret.
const BASIC_AUTH: &str = "Basic YWRtaW46c2VjcmV0";

/// Test fixture providing a mock Grafana server.
struct TestFixture {
    server: MockServer,
}

impl TestFixture {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn config(&self) -> GrafanaConfig {
        GrafanaConfig {
            timeout_secs: 5,
            verify_tls: false,
            ..GrafanaConfig::with_basic_auth(self.server.uri(), "admin", "secret")
        }
    }

    fn client(&self) -> GrafanaHttpClient {
        GrafanaHttpClient::new(self.config()).unwrap()
    }
}

// =============================================================================
// Organization scoping and authentication
// =============================================================================

#[tokio::test]
async fn test_requests_carry_org_header_and_basic_auth() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/datasources"))
        .and(header("X-Grafana-Org-Id", "1"))
        .and(header("Authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/datasources"))
        .and(header("X-Grafana-Org-Id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "uid": "gs-loki", "name": "Loki", "type": "loki"}
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let client = fixture.client();
    let scoped = client.with_org_id(7);

    let scoped_list = scoped.list_datasources().await.unwrap();
    let default_list = client.list_datasources().await.unwrap();

    assert_eq!(scoped_list.len(), 1);
    assert_eq!(scoped_list[0].uid, "gs-loki");
    assert!(default_list.is_empty());
}

#[tokio::test]
async fn test_token_takes_precedence_over_basic_auth() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/orgs/1"))
        .and(header("Authorization", "Bearer glsa_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Main Org."})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let config = GrafanaConfig {
        api_token: Some("glsa_test".to_string()),
        ..fixture.config()
    };
    let client = GrafanaHttpClient::new(config).unwrap();

    let org = client.get_org_by_id(1).await.unwrap();
    assert_eq!(org.name, "Main Org.");
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_failed() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/orgs/1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&fixture.server)
        .await;

    let err = fixture.client().get_org_by_id(1).await.unwrap_err();
    assert!(matches!(err, GrafanaError::AuthenticationFailed));
    assert!(!err.is_not_found());
}

// =============================================================================
// Organizations
// =============================================================================

#[tokio::test]
async fn test_org_lookup_by_name_encodes_name() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/orgs/name/Test%20Org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "name": "Test Org"})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let org = fixture.client().get_org_by_name("Test Org").await.unwrap();
    assert_eq!(org.id, 5);
}

#[tokio::test]
async fn test_create_org_returns_id() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/orgs"))
        .and(body_partial_json(json!({"name": "Test Org"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"orgId": 12, "message": "Organization created"})),
        )
        .expect(1)
        .mount(&fixture.server)
        .await;

    let id = fixture.client().create_org("Test Org").await.unwrap();
    assert_eq!(id, 12);
}

#[tokio::test]
async fn test_create_org_without_id_is_invalid_response() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/orgs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .mount(&fixture.server)
        .await;

    let err = fixture.client().create_org("Test Org").await.unwrap_err();
    assert!(matches!(err, GrafanaError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_not_found_is_classified() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/orgs/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Organization not found"})))
        .mount(&fixture.server)
        .await;

    let err = fixture.client().get_org_by_id(99).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("DELETE"))
        .and(path("/api/orgs/3"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database is locked"))
        .mount(&fixture.server)
        .await;

    let err = fixture.client().delete_org(3).await.unwrap_err();
    match err {
        GrafanaError::ApiError { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database is locked");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

// =============================================================================
// Folders
// =============================================================================

#[tokio::test]
async fn test_folder_calls() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/folders"))
        .and(body_partial_json(json!({
            "uid": "gs-child",
            "title": "networking",
            "parentUid": "gs-root"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": "gs-child", "title": "networking", "parentUid": "gs-root"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/folders/gs-child"))
        .and(body_partial_json(json!({"title": "Networking", "overwrite": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": "gs-child", "title": "Networking", "parentUid": "gs-root"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/folders"))
        .and(query_param("parentUid", "gs-root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"uid": "gs-child", "title": "Networking"}
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/folders/gs-child/counts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "folder": 0, "dashboard": 2, "librarypanel": 0, "alertrule": 0
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let client = fixture.client();

    let created = client
        .create_folder(&CreateFolderCommand {
            uid: "gs-child".to_string(),
            title: "networking".to_string(),
            parent_uid: Some("gs-root".to_string()),
            description: "managed".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(created.parent_uid.as_deref(), Some("gs-root"));

    let renamed = client
        .update_folder(
            "gs-child",
            &UpdateFolderCommand {
                title: "Networking".to_string(),
                overwrite: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.title, "Networking");

    let children = client.list_folders(Some("gs-root")).await.unwrap();
    assert_eq!(children.len(), 1);

    let counts = client.folder_descendant_counts("gs-child").await.unwrap();
    assert_eq!(counts["dashboard"], 2);
}

#[tokio::test]
async fn test_list_folders_follows_pages() {
    let fixture = TestFixture::new().await;

    let full_page: Vec<_> = (0..FOLDER_PAGE_SIZE)
        .map(|i| json!({"uid": format!("gs-{i}"), "title": format!("folder {i}")}))
        .collect();

    Mock::given(method("GET"))
        .and(path("/api/folders"))
        .and(query_param("limit", "1000"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/folders"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"uid": "gs-last", "title": "last"}
        ])))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let folders = fixture.client().list_folders(None).await.unwrap();

    assert_eq!(folders.len(), FOLDER_PAGE_SIZE + 1);
    assert_eq!(folders[0].uid, "gs-0");
    assert_eq!(folders[FOLDER_PAGE_SIZE].uid, "gs-last");
}

// =============================================================================
// Dashboards and datasources
// =============================================================================

#[tokio::test]
async fn test_post_dashboard() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/dashboards/db"))
        .and(body_partial_json(json!({
            "dashboard": {"uid": "abc"},
            "folderUid": "gs-folder",
            "overwrite": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 10, "uid": "abc", "version": 1, "status": "success"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let mut dashboard = serde_json::Map::new();
    dashboard.insert("uid".to_string(), json!("abc"));

    let response = fixture
        .client()
        .post_dashboard(&SaveDashboardCommand {
            dashboard,
            folder_uid: Some("gs-folder".to_string()),
            overwrite: true,
        })
        .await
        .unwrap();
    assert_eq!(response.uid, "abc");
    assert_eq!(response.version, 1);
}

#[tokio::test]
async fn test_datasource_writes_return_id() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/datasources"))
        .and(body_partial_json(json!({"uid": "gs-loki", "type": "loki"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 21, "message": "Datasource added", "datasource": {"id": 21, "uid": "gs-loki"}
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/datasources/uid/gs-loki"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 21, "message": "Datasource updated"
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/datasources/uid/gs-loki"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Data source deleted"})))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let client = fixture.client();
    let datasource = Datasource {
        kind: "loki".to_string(),
        ..Datasource::new("gs-loki", "Loki")
    };

    assert_eq!(client.add_datasource(&datasource).await.unwrap(), 21);
    assert_eq!(client.update_datasource("gs-loki", &datasource).await.unwrap(), 21);
    client.delete_datasource("gs-loki").await.unwrap();
}

// =============================================================================
// SSO settings
// =============================================================================

#[tokio::test]
async fn test_sso_settings_round_trip() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sso-settings/generic_oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "",
            "provider": "generic_oauth",
            "settings": {"enabled": true, "orgMapping": ""}
        })))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/sso-settings/generic_oauth"))
        .and(body_partial_json(json!({
            "provider": "generic_oauth",
            "settings": {"enabled": true, "org_mapping": "\"*:Shared Org:Admin\""}
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let client = fixture.client();
    let mut settings: SsoSettings = client.get_sso_settings("generic_oauth").await.unwrap();
    settings
        .settings
        .insert("org_mapping".to_string(), json!("\"*:Shared Org:Admin\""));

    client
        .update_sso_settings("generic_oauth", &settings)
        .await
        .unwrap();
}
