//! Datasource generation and reconciliation.
//!
//! The desired datasource set of an organization is recomputed from scratch
//! on every run and diffed against what Grafana holds, matching on `uid`
//! only. Nothing is cached between runs.
//!
//! Every generated datasource forwards the organization's tenants to the
//! backend through the tenant header. Multi-tenant datasources carry all
//! tenant names joined by `|`; the rules backend cannot manage rules across
//! several tenants at once, so alerting tenants additionally get
//! single-tenant Mimir and Alertmanager datasources.

use grafana_client::GrafanaApi;
use grafana_domain::{Datasource, Organization, Tenant};
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use crate::config::{DatasourceEndpoints, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::org_context::within_organization;

/// Header carrying the tenant list to the backends.
pub const TENANT_HEADER_NAME: &str = "X-Scope-OrgID";

/// Separator of tenant names in a multi-tenant header value.
pub const TENANT_SEPARATOR: &str = "|";

const PROXY_ACCESS: &str = "proxy";

const LOKI_UID: &str = "gs-loki";
const MIMIR_UID: &str = "gs-mimir";
const MIMIR_ALERTMANAGER_UID: &str = "gs-mimir-alertmanager";
const TEMPO_UID: &str = "gs-tempo";
const MIMIR_CARDINALITY_UID: &str = "gs-mimir-cardinality";

// Predefined datasources

/// Loki logs datasource. Links trace ids to Tempo when tracing is enabled.
pub fn loki(endpoints: &DatasourceEndpoints, tracing_enabled: bool) -> Datasource {
    let datasource = Datasource {
        kind: "loki".to_string(),
        url: endpoints.loki.clone(),
        access: PROXY_ACCESS.to_string(),
        ..Datasource::new(LOKI_UID, "Loki")
    };

    if !tracing_enabled {
        return datasource;
    }

    datasource.with_json_data(
        "derivedFields",
        json!([{
            "datasourceUid": TEMPO_UID,
            "matcherRegex": r#"[tT]race_?[Ii][dD]"?[:=](\w+)"#,
            "name": "traceID",
            "url": "${__value.raw}",
            "urlDisplayLabel": "Trace ID"
        }]),
    )
}

/// Mimir metrics datasource template, without identity.
pub fn mimir(endpoints: &DatasourceEndpoints) -> Datasource {
    Datasource {
        kind: "prometheus".to_string(),
        url: endpoints.mimir.clone(),
        access: PROXY_ACCESS.to_string(),
        ..Default::default()
    }
    .with_json_data("cacheLevel", json!("Medium"))
    .with_json_data("httpMethod", json!("POST"))
    .with_json_data("incrementalQuerying", json!(true))
    .with_json_data("prometheusType", json!("Mimir"))
    .with_json_data("prometheusVersion", json!("2.9.1"))
    .with_json_data("timeInterval", json!("60s"))
}

/// Mimir Alertmanager datasource template, without identity.
pub fn mimir_alertmanager(endpoints: &DatasourceEndpoints) -> Datasource {
    Datasource {
        kind: "alertmanager".to_string(),
        url: endpoints.mimir_alertmanager.clone(),
        access: PROXY_ACCESS.to_string(),
        ..Default::default()
    }
    .with_json_data("handleGrafanaManagedAlerts", json!(false))
    .with_json_data("implementation", json!("mimir"))
}

/// Tempo traces datasource, correlated with Mimir and Loki.
pub fn tempo(endpoints: &DatasourceEndpoints) -> Datasource {
    Datasource {
        kind: "tempo".to_string(),
        url: endpoints.tempo.clone(),
        access: PROXY_ACCESS.to_string(),
        ..Datasource::new(TEMPO_UID, "Tempo")
    }
    .with_json_data("serviceMap", json!({ "datasourceUid": MIMIR_UID }))
    .with_json_data("tracesToMetrics", json!({ "datasourceUid": MIMIR_UID }))
    .with_json_data("nodeGraph", json!({ "enabled": true }))
    .with_json_data("streamingEnabled", json!({ "metrics": true, "search": true }))
    .with_json_data(
        "tracesToLogsV2",
        json!({
            "datasourceUid": LOKI_UID,
            "spanStartTimeShift": "-10m",
            "spanEndTimeShift": "10m",
            "filterByTraceID": true
        }),
    )
}

/// Mimir cardinality explorer, only offered in the shared organization.
pub fn mimir_cardinality(endpoints: &DatasourceEndpoints) -> Datasource {
    Datasource {
        kind: "marcusolsson-json-datasource".to_string(),
        url: endpoints.mimir_cardinality.clone(),
        access: PROXY_ACCESS.to_string(),
        ..Datasource::new(MIMIR_CARDINALITY_UID, "Mimir Cardinality")
    }
}

fn with_tenant_header(datasource: Datasource, value: &str) -> Datasource {
    datasource
        .with_json_data("httpHeaderName1", json!(TENANT_HEADER_NAME))
        .with_secure_json_data("httpHeaderValue1", value)
}

fn single_tenant_mimir(endpoints: &DatasourceEndpoints, tenant: &Tenant) -> Datasource {
    let identity = Datasource::new(
        format!("{MIMIR_UID}-{}", tenant.name),
        format!("Mimir ({})", tenant.name),
    )
    .with_json_data("manageAlerts", json!(true))
    .with_json_data("allowAsRecordingRulesTarget", json!(true));

    with_tenant_header(mimir(endpoints).merge(identity), &tenant.name)
}

fn single_tenant_alertmanager(endpoints: &DatasourceEndpoints, tenant: &Tenant) -> Datasource {
    let identity = Datasource::new(
        format!("{MIMIR_ALERTMANAGER_UID}-{}", tenant.name),
        format!("Mimir Alertmanager ({})", tenant.name),
    );

    with_tenant_header(mimir_alertmanager(endpoints).merge(identity), &tenant.name)
}

/// Computes the desired datasources of an organization.
///
/// The result is ordered: Loki, Mimir, Tempo (tracing only), the
/// single-tenant pairs of each alerting tenant, then Cardinality (shared
/// organization only).
///
/// Tenant names are spliced into uids, so a tenant such as
/// `alertmanager-foo` can claim a uid another datasource needs. Such an
/// organization is rejected with [`SyncError::DatasourceUidConflict`]
/// rather than converged without one of its datasources.
pub fn generate_datasources(config: &SyncConfig, org: &Organization) -> SyncResult<Vec<Datasource>> {
    let endpoints = &config.endpoints;
    let all_tenants = org.tenant_names().join(TENANT_SEPARATOR);

    let mut generated = vec![
        with_tenant_header(loki(endpoints, config.tracing_enabled), &all_tenants),
        with_tenant_header(
            mimir(endpoints).merge(Datasource {
                is_default: true,
                ..Datasource::new(MIMIR_UID, "Mimir")
            }),
            &all_tenants,
        )
        .with_json_data("manageAlerts", json!(false))
        .with_json_data("allowAsRecordingRulesTarget", json!(false)),
    ];

    if config.tracing_enabled {
        generated.push(with_tenant_header(tempo(endpoints), &all_tenants));
    }

    for tenant in org.alerting_tenants() {
        generated.push(single_tenant_mimir(endpoints, tenant));
        generated.push(single_tenant_alertmanager(endpoints, tenant));
    }

    if org.name == config.shared_org_name {
        generated.push(with_tenant_header(mimir_cardinality(endpoints), &all_tenants));
    }

    let mut claimed: HashMap<&str, &str> = HashMap::new();
    for datasource in &generated {
        if let Some(first) = claimed.insert(&datasource.uid, &datasource.name) {
            warn!(uid = %datasource.uid, org_name = %org.name, "conflicting datasource uid");
            return Err(SyncError::DatasourceUidConflict {
                uid: datasource.uid.clone(),
                first: first.to_string(),
                second: datasource.name.clone(),
            });
        }
    }

    Ok(generated)
}

/// Converges the datasources of organizations.
pub struct DatasourceGenerator<'a, C> {
    client: &'a C,
    config: &'a SyncConfig,
}

impl<'a, C: GrafanaApi> DatasourceGenerator<'a, C> {
    /// Create a datasource generator bound to a client handle.
    pub fn new(client: &'a C, config: &'a SyncConfig) -> Self {
        Self { client, config }
    }

    /// Generates the organization's datasources and converges Grafana to them.
    ///
    /// Returns the desired datasources with their Grafana ids set.
    #[instrument(skip(self, org), fields(org_id = org.id, org_name = %org.name))]
    pub async fn configure(&self, org: &Organization) -> SyncResult<Vec<Datasource>> {
        let desired = generate_datasources(self.config, org)?;
        self.reconcile(org, desired).await
    }

    /// Converges the organization's datasources to `desired`.
    ///
    /// Existing datasources are fetched fresh. The first pass updates every
    /// existing datasource that is desired and deletes the operator-managed
    /// ones that are not; the second pass creates whatever is still missing.
    pub async fn reconcile(
        &self,
        org: &Organization,
        mut desired: Vec<Datasource>,
    ) -> SyncResult<Vec<Datasource>> {
        if !org.is_created() {
            return Err(SyncError::OrganizationNotFound {
                name: org.name.clone(),
            });
        }

        within_organization(self.client, org, |client| async move {
            let existing = client
                .list_datasources()
                .await
                .map_err(|e| SyncError::api("list", "datasources", &org.name, e))?;
            debug!(existing = existing.len(), desired = desired.len(), "reconciling datasources");

            for current in existing {
                match desired.iter_mut().find(|d| d.uid == current.uid) {
                    Some(datasource) => {
                        info!(uid = %datasource.uid, "updating datasource");
                        datasource.id = current.id;
                        datasource.id = client
                            .update_datasource(&current.uid, datasource)
                            .await
                            .map_err(|e| SyncError::api("update", "datasource", &current.uid, e))?;
                    }
                    None if current.is_managed() => {
                        info!(uid = %current.uid, "deleting datasource");
                        match client.delete_datasource(&current.uid).await {
                            Ok(()) => {}
                            Err(err) if err.is_not_found() => {
                                debug!(uid = %current.uid, "datasource already deleted");
                            }
                            Err(err) => {
                                return Err(SyncError::api("delete", "datasource", &current.uid, err))
                            }
                        }
                    }
                    None => debug!(uid = %current.uid, "leaving unmanaged datasource untouched"),
                }
            }

            for datasource in desired.iter_mut().filter(|d| d.id == 0) {
                info!(uid = %datasource.uid, "creating datasource");
                datasource.id = client
                    .add_datasource(datasource)
                    .await
                    .map_err(|e| SyncError::api("create", "datasource", &datasource.uid, e))?;
            }

            Ok::<_, SyncError>(desired)
        })
        .await
    }
}
