//! Organization-scoped execution.
//!
//! Grafana selects the organization per request. Instead of switching a
//! selector on a shared client and restoring it afterwards, a scope hands the
//! closure its own handle bound to the organization. The caller's handle is
//! never touched, so nothing needs restoring on any exit path and concurrent
//! scopes on one client cannot observe each other.

use grafana_client::GrafanaApi;
use grafana_domain::Organization;
use std::future::Future;
use tracing::{info_span, Instrument};

use crate::error::SyncResult;

/// Runs `f` with a client handle scoped to `org`.
///
/// Everything logged while `f` runs carries the organization id and name.
pub async fn within_organization<C, F, Fut, T>(client: &C, org: &Organization, f: F) -> SyncResult<T>
where
    C: GrafanaApi,
    F: FnOnce(C) -> Fut,
    Fut: Future<Output = SyncResult<T>>,
{
    let scoped = client.with_org_id(org.id);
    let span = info_span!("organization", org_id = org.id, org_name = %org.name);

    f(scoped).instrument(span).await
}
