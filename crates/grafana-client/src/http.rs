//! Grafana HTTP client.
//!
//! reqwest implementation of [`GrafanaApi`]. Every request carries the
//! `X-Grafana-Org-Id` header of the handle issuing it, so organization
//! scoping is a property of the handle rather than of shared client state.

use async_trait::async_trait;
use grafana_domain::Datasource;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::api::{
    CreateFolderCommand, DashboardRecord, DescendantCounts, FolderRecord, GrafanaApi, OrgRecord,
    SaveDashboardCommand, SaveDashboardResponse, SsoSettings, UpdateFolderCommand,
};
use crate::config::GrafanaConfig;
use crate::error::{GrafanaError, GrafanaResult};

/// Header selecting the organization a request operates on.
pub const ORG_ID_HEADER: &str = "X-Grafana-Org-Id";

/// Folders requested per page when listing.
pub const FOLDER_PAGE_SIZE: usize = 1000;

/// Grafana HTTP API client.
///
/// Cloning is cheap: clones share the connection pool and configuration.
#[derive(Clone)]
pub struct GrafanaHttpClient {
    /// HTTP client instance.
    client: Client,

    /// Endpoint and credentials.
    config: Arc<GrafanaConfig>,

    /// Organization targeted by this handle.
    org_id: i64,
}

impl std::fmt::Debug for GrafanaHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrafanaHttpClient")
            .field("base_url", &self.config.base_url)
            .field("org_id", &self.org_id)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrgResponse {
    org_id: Option<i64>,
}

#[derive(Deserialize)]
struct DatasourceWriteResponse {
    id: Option<i64>,
    datasource: Option<Datasource>,
}

impl DatasourceWriteResponse {
    fn into_id(self, uid: &str) -> GrafanaResult<i64> {
        self.id
            .or_else(|| self.datasource.map(|ds| ds.id))
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                GrafanaError::InvalidResponse(format!("datasource {uid:?}: response carries no id"))
            })
    }
}

impl GrafanaHttpClient {
    /// Create a new Grafana client targeting the configured default organization.
    pub fn new(config: GrafanaConfig) -> GrafanaResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            client,
            org_id: config.org_id,
            config: Arc::new(config),
        })
    }

    /// Client configuration.
    pub fn config(&self) -> &GrafanaConfig {
        &self.config
    }

    fn request(&self, method: Method, url: impl reqwest::IntoUrl) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header(ORG_ID_HEADER, self.org_id.to_string());

        if let Some(ref token) = self.config.api_token {
            request = request.bearer_auth(token);
        } else if let Some(ref username) = self.config.username {
            request = request.basic_auth(username, self.config.password.as_ref());
        }

        request
    }

    fn endpoint(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, self.config.url(path))
    }

    /// URL with `segment` appended as a single percent-encoded path segment.
    fn url_with_segment(&self, path: &str, segment: &str) -> GrafanaResult<Url> {
        let mut url = Url::parse(&self.config.url(path))
            .map_err(|e| GrafanaError::Config(format!("invalid Grafana URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| GrafanaError::Config("Grafana URL cannot have path segments".to_string()))?
            .push(segment);
        Ok(url)
    }

    async fn send_json<T>(&self, request: RequestBuilder, resource: &str) -> GrafanaResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.check(request.send().await?, resource).await?;
        response
            .json()
            .await
            .map_err(|e| GrafanaError::InvalidResponse(format!("{resource}: {e}")))
    }

    async fn send_empty(&self, request: RequestBuilder, resource: &str) -> GrafanaResult<()> {
        self.check(request.send().await?, resource).await?;
        Ok(())
    }

    /// Map non-success statuses to errors.
    async fn check(
        &self,
        response: reqwest::Response,
        resource: &str,
    ) -> GrafanaResult<reqwest::Response> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            error!("Grafana authentication failed");
            return Err(GrafanaError::AuthenticationFailed);
        }

        if status == StatusCode::NOT_FOUND {
            debug!(resource, "Grafana resource not found");
            return Err(GrafanaError::NotFound {
                resource: resource.to_string(),
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Grafana API error ({}) on {}: {}", status.as_u16(), resource, message);
            return Err(GrafanaError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl GrafanaApi for GrafanaHttpClient {
    fn org_id(&self) -> i64 {
        self.org_id
    }

    fn with_org_id(&self, org_id: i64) -> Self {
        Self {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            org_id,
        }
    }

    #[instrument(skip(self))]
    async fn get_org_by_id(&self, org_id: i64) -> GrafanaResult<OrgRecord> {
        let request = self.endpoint(Method::GET, &format!("/api/orgs/{org_id}"));
        self.send_json(request, &format!("organization {org_id}")).await
    }

    #[instrument(skip(self))]
    async fn get_org_by_name(&self, name: &str) -> GrafanaResult<OrgRecord> {
        let url = self.url_with_segment("/api/orgs/name", name)?;
        let request = self.request(Method::GET, url);
        self.send_json(request, &format!("organization {name:?}")).await
    }

    #[instrument(skip(self))]
    async fn create_org(&self, name: &str) -> GrafanaResult<i64> {
        let request = self
            .endpoint(Method::POST, "/api/orgs")
            .json(&serde_json::json!({ "name": name }));
        let response: CreateOrgResponse = self
            .send_json(request, &format!("organization {name:?}"))
            .await?;

        response.org_id.filter(|id| *id > 0).ok_or_else(|| {
            GrafanaError::InvalidResponse(format!("organization {name:?}: response carries no orgId"))
        })
    }

    #[instrument(skip(self))]
    async fn update_org(&self, org_id: i64, name: &str) -> GrafanaResult<()> {
        let request = self
            .endpoint(Method::PUT, &format!("/api/orgs/{org_id}"))
            .json(&serde_json::json!({ "name": name }));
        self.send_empty(request, &format!("organization {org_id}")).await
    }

    #[instrument(skip(self))]
    async fn delete_org(&self, org_id: i64) -> GrafanaResult<()> {
        let request = self.endpoint(Method::DELETE, &format!("/api/orgs/{org_id}"));
        self.send_empty(request, &format!("organization {org_id}")).await
    }

    #[instrument(skip(self), fields(org_id = self.org_id))]
    async fn get_folder(&self, uid: &str) -> GrafanaResult<FolderRecord> {
        let url = self.url_with_segment("/api/folders", uid)?;
        self.send_json(self.request(Method::GET, url), &format!("folder {uid}"))
            .await
    }

    #[instrument(skip(self, command), fields(org_id = self.org_id, uid = %command.uid))]
    async fn create_folder(&self, command: &CreateFolderCommand) -> GrafanaResult<FolderRecord> {
        let request = self.endpoint(Method::POST, "/api/folders").json(command);
        self.send_json(request, &format!("folder {}", command.uid)).await
    }

    #[instrument(skip(self, command), fields(org_id = self.org_id))]
    async fn update_folder(
        &self,
        uid: &str,
        command: &UpdateFolderCommand,
    ) -> GrafanaResult<FolderRecord> {
        let url = self.url_with_segment("/api/folders", uid)?;
        let request = self.request(Method::PUT, url).json(command);
        self.send_json(request, &format!("folder {uid}")).await
    }

    #[instrument(skip(self), fields(org_id = self.org_id))]
    async fn delete_folder(&self, uid: &str) -> GrafanaResult<()> {
        let url = self.url_with_segment("/api/folders", uid)?;
        self.send_empty(self.request(Method::DELETE, url), &format!("folder {uid}"))
            .await
    }

    #[instrument(skip(self), fields(org_id = self.org_id))]
    async fn list_folders(&self, parent_uid: Option<&str>) -> GrafanaResult<Vec<FolderRecord>> {
        let mut folders = Vec::new();

        // A short page is the last one.
        for page in 1.. {
            let mut request = self
                .endpoint(Method::GET, "/api/folders")
                .query(&[("limit", FOLDER_PAGE_SIZE), ("page", page)]);
            if let Some(parent_uid) = parent_uid {
                request = request.query(&[("parentUid", parent_uid)]);
            }

            let batch: Vec<FolderRecord> = self.send_json(request, "folders").await?;
            let last = batch.len() < FOLDER_PAGE_SIZE;
            folders.extend(batch);
            if last {
                break;
            }
            debug!(page, fetched = folders.len(), "fetching next folder page");
        }

        Ok(folders)
    }

    #[instrument(skip(self), fields(org_id = self.org_id))]
    async fn folder_descendant_counts(&self, uid: &str) -> GrafanaResult<DescendantCounts> {
        let mut url = self.url_with_segment("/api/folders", uid)?;
        url.path_segments_mut()
            .map_err(|_| GrafanaError::Config("Grafana URL cannot have path segments".to_string()))?
            .push("counts");
        self.send_json(self.request(Method::GET, url), &format!("folder {uid}"))
            .await
    }

    #[instrument(skip(self), fields(org_id = self.org_id))]
    async fn get_dashboard(&self, uid: &str) -> GrafanaResult<DashboardRecord> {
        let url = self.url_with_segment("/api/dashboards/uid", uid)?;
        self.send_json(self.request(Method::GET, url), &format!("dashboard {uid}"))
            .await
    }

    #[instrument(skip(self, command), fields(org_id = self.org_id))]
    async fn post_dashboard(
        &self,
        command: &SaveDashboardCommand,
    ) -> GrafanaResult<SaveDashboardResponse> {
        let uid = command
            .dashboard
            .get("uid")
            .and_then(|uid| uid.as_str())
            .unwrap_or_default()
            .to_string();
        let request = self.endpoint(Method::POST, "/api/dashboards/db").json(command);
        self.send_json(request, &format!("dashboard {uid}")).await
    }

    #[instrument(skip(self), fields(org_id = self.org_id))]
    async fn delete_dashboard(&self, uid: &str) -> GrafanaResult<()> {
        let url = self.url_with_segment("/api/dashboards/uid", uid)?;
        self.send_empty(self.request(Method::DELETE, url), &format!("dashboard {uid}"))
            .await
    }

    #[instrument(skip(self), fields(org_id = self.org_id))]
    async fn list_datasources(&self) -> GrafanaResult<Vec<Datasource>> {
        let request = self.endpoint(Method::GET, "/api/datasources");
        self.send_json(request, "datasources").await
    }

    #[instrument(skip(self, datasource), fields(org_id = self.org_id, uid = %datasource.uid))]
    async fn add_datasource(&self, datasource: &Datasource) -> GrafanaResult<i64> {
        let request = self.endpoint(Method::POST, "/api/datasources").json(datasource);
        let response: DatasourceWriteResponse = self
            .send_json(request, &format!("datasource {}", datasource.uid))
            .await?;
        response.into_id(&datasource.uid)
    }

    #[instrument(skip(self, datasource), fields(org_id = self.org_id))]
    async fn update_datasource(&self, uid: &str, datasource: &Datasource) -> GrafanaResult<i64> {
        let url = self.url_with_segment("/api/datasources/uid", uid)?;
        let request = self.request(Method::PUT, url).json(datasource);
        let response: DatasourceWriteResponse = self
            .send_json(request, &format!("datasource {uid}"))
            .await?;
        response.into_id(uid)
    }

    #[instrument(skip(self), fields(org_id = self.org_id))]
    async fn delete_datasource(&self, uid: &str) -> GrafanaResult<()> {
        let url = self.url_with_segment("/api/datasources/uid", uid)?;
        self.send_empty(self.request(Method::DELETE, url), &format!("datasource {uid}"))
            .await
    }

    #[instrument(skip(self))]
    async fn get_sso_settings(&self, provider: &str) -> GrafanaResult<SsoSettings> {
        let url = self.url_with_segment("/api/v1/sso-settings", provider)?;
        self.send_json(self.request(Method::GET, url), &format!("sso provider {provider}"))
            .await
    }

    #[instrument(skip(self, settings))]
    async fn update_sso_settings(&self, provider: &str, settings: &SsoSettings) -> GrafanaResult<()> {
        let url = self.url_with_segment("/api/v1/sso-settings", provider)?;
        let request = self.request(Method::PUT, url).json(settings);
        self.send_empty(request, &format!("sso provider {provider}")).await
    }
}
