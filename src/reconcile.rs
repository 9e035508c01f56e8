// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::bundle::Manifest;
use crate::context::Context;
use crate::mutate::Mutator;
use crate::types::v1alpha1::cert_manager::CertManager;
use crate::types::v1alpha1::status::{Status, state::State};
use crate::{context, types};
use kube::Resource;
use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::runtime::reflector::ObjectRef;
use snafu::Snafu;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

mod rbac;

#[derive(Snafu, Debug)]
pub enum Error {
    #[snafu(transparent)]
    Context { source: context::Error },

    #[snafu(transparent)]
    Types { source: types::error::Error },
}

pub async fn reconcile_cert_manager(
    cm: Arc<CertManager>,
    ctx: Arc<Context>,
) -> Result<Action, Error> {
    let latest = ctx.get_cluster::<CertManager>(&cm.name()).await?;

    if latest.metadata.deletion_timestamp.is_some() {
        debug!(
            "cert manager {} is deleted, deletion_timestamp is {:?}",
            latest.name(),
            latest.metadata.deletion_timestamp
        );
        return Ok(Action::await_change());
    }

    if let Err(e) = apply_and_report(&latest, &ctx).await {
        report_failure(&latest, &ctx, &e).await;
        return Err(e);
    }

    // owned objects are watched; the requeue covers drift the watches miss
    Ok(Action::requeue(Duration::from_secs(300)))
}

/// Maps an owned object to the `CertManager` resources that control it.
///
/// The owner is cluster scoped, so the reference never carries the child's namespace.
pub fn owning_cert_managers<K: Resource>(object: K) -> Vec<ObjectRef<CertManager>> {
    let api_version = CertManager::api_version(&());
    let kind = CertManager::kind(&());

    object
        .meta()
        .owner_references
        .iter()
        .flatten()
        .filter(|owner| owner.api_version == api_version && owner.kind == kind)
        .map(|owner| ObjectRef::new(&owner.name))
        .collect()
}

async fn apply_and_report(latest: &CertManager, ctx: &Context) -> Result<(), Error> {
    let mutator = Mutator::for_cert_manager(latest);
    let manifests = rbac::apply_bundle(latest, &mutator, ctx).await?;

    for message in unmatched_overlay_messages(&mutator, &manifests) {
        warn!("{}", message);
        if let Err(record_err) = ctx
            .record(latest, EventType::Warning, "OverlayUnmatched", &message)
            .await
        {
            warn!("record event for {} failed: {}", latest.name(), record_err);
        }
    }

    let status = applied_status(
        latest.status.as_ref(),
        latest.metadata.generation,
        manifests.len(),
    );
    ctx.update_status(latest, &status).await?;

    info!(
        "applied {} RBAC objects into namespace {}",
        manifests.len(),
        latest.spec.namespace
    );
    Ok(())
}

/// Marks `latest` as failed. Errors here are logged only, `error` is what the caller returns.
async fn report_failure(latest: &CertManager, ctx: &Context, error: &Error) {
    let status = failed_status(latest.status.as_ref(), latest.metadata.generation, error);
    if let Err(status_err) = ctx.update_status(latest, &status).await {
        warn!("update status of {} failed: {}", latest.name(), status_err);
    }
    if let Err(record_err) = ctx
        .record(latest, EventType::Warning, "ApplyFailed", &error.to_string())
        .await
    {
        warn!("record event for {} failed: {}", latest.name(), record_err);
    }
}

fn unmatched_overlay_messages(mutator: &Mutator, manifests: &[Manifest]) -> Vec<String> {
    mutator
        .unmatched(manifests)
        .into_iter()
        .map(|overlay| {
            format!(
                "overlay for {} '{}' matches no generated object",
                overlay.kind, overlay.name
            )
        })
        .collect()
}

/// Status after a successful apply.
///
/// The apply time only moves when the result differs from `previous`, so a
/// steady state does not rewrite the status on every pass.
fn applied_status(previous: Option<&Status>, generation: Option<i64>, applied: usize) -> Status {
    let mut status = Status {
        current_state: State::Applied,
        applied_resources: i32::try_from(applied).unwrap_or(i32::MAX),
        observed_generation: generation,
        message: None,
        last_applied_time: None,
    };

    status.last_applied_time = match previous {
        Some(prev)
            if prev.current_state == status.current_state
                && prev.applied_resources == status.applied_resources
                && prev.observed_generation == status.observed_generation =>
        {
            prev.last_applied_time.clone()
        }
        _ => Some(chrono::Utc::now().to_rfc3339()),
    };

    status
}

fn failed_status(previous: Option<&Status>, generation: Option<i64>, error: &Error) -> Status {
    Status {
        current_state: State::Failed,
        applied_resources: previous.map(|s| s.applied_resources).unwrap_or_default(),
        observed_generation: generation,
        message: Some(error.to_string()),
        last_applied_time: previous.and_then(|s| s.last_applied_time.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::Bundle;
    use crate::types::v1alpha1::overlay::Overlay;
    use k8s_openapi::api::core::v1 as corev1;
    use k8s_openapi::api::rbac::v1 as rbacv1;

    #[test]
    fn test_namespaced_child_maps_to_cluster_scoped_owner() {
        let cm = crate::tests::create_test_cert_manager("cert-manager", None);
        let mutator = Mutator::for_cert_manager(&cm);

        let sa = Bundle::new("cert-manager")
            .controller_service_account(&mutator)
            .expect("service account builds");
        assert_eq!(sa.metadata.namespace.as_deref(), Some("cert-manager"));

        let owners = owning_cert_managers(sa);
        assert_eq!(owners, vec![ObjectRef::from_obj(&cm)]);
        assert_eq!(owners[0].namespace, None);
        assert_eq!(owners[0].name, "test-cert-manager");
    }

    #[test]
    fn test_cluster_child_maps_to_owner() {
        let cm = crate::tests::create_test_cert_manager("cert-manager", None);
        let mutator = Mutator::for_cert_manager(&cm);

        let role = Bundle::default()
            .view_cluster_role(&mutator)
            .expect("cluster role builds");

        assert_eq!(owning_cert_managers(role), vec![ObjectRef::from_obj(&cm)]);
    }

    #[test]
    fn test_foreign_owners_are_ignored() {
        let mut sa = corev1::ServiceAccount::default();
        sa.metadata.owner_references = Some(vec![
            k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference {
                api_version: "apps/v1".to_string(),
                kind: "Deployment".to_string(),
                name: "test-cert-manager".to_string(),
                uid: "other".to_string(),
                ..Default::default()
            },
        ]);

        assert!(owning_cert_managers(sa).is_empty());
        assert!(owning_cert_managers(rbacv1::Role::default()).is_empty());
    }

    #[test]
    fn test_unmatched_overlay_messages() {
        let mutator = Mutator::new().with_overlays(vec![Overlay {
            kind: "Role".to_string(),
            name: "does-not-exist".to_string(),
            namespace: None,
            patch: serde_json::json!({}),
        }]);
        let manifests = Bundle::default()
            .manifests(&mutator)
            .expect("bundle builds");

        assert_eq!(
            unmatched_overlay_messages(&mutator, &manifests),
            vec!["overlay for Role 'does-not-exist' matches no generated object".to_string()]
        );
    }

    #[tokio::test]
    async fn test_report_failure_tolerates_unreachable_api() {
        let ctx = crate::tests::create_unreachable_context();
        let cm = crate::tests::create_test_cert_manager("cert-manager", None);
        let error = Error::Types {
            source: types::error::Error::NoNamespace,
        };

        // status and event writes both fail; neither replaces the original error
        report_failure(&cm, &ctx, &error).await;
    }

    #[tokio::test]
    async fn test_apply_failure_is_returned() {
        let ctx = crate::tests::create_unreachable_context();
        let cm = crate::tests::create_test_cert_manager("cert-manager", None);

        let err = apply_and_report(&cm, &ctx)
            .await
            .expect_err("nothing can be applied");
        assert!(matches!(err, Error::Context { .. }));
    }

    #[test]
    fn test_applied_status_sets_time_on_first_apply() {
        let status = applied_status(None, Some(1), 37);

        assert_eq!(status.current_state, State::Applied);
        assert_eq!(status.applied_resources, 37);
        assert_eq!(status.observed_generation, Some(1));
        assert!(status.last_applied_time.is_some());
    }

    #[test]
    fn test_applied_status_is_stable_in_steady_state() {
        let previous = Status {
            current_state: State::Applied,
            applied_resources: 37,
            observed_generation: Some(2),
            message: None,
            last_applied_time: Some("2025-01-01T00:00:00+00:00".to_string()),
        };

        let status = applied_status(Some(&previous), Some(2), 37);
        assert_eq!(status, previous);
    }

    #[test]
    fn test_applied_status_refreshes_on_new_generation() {
        let previous = Status {
            current_state: State::Applied,
            applied_resources: 37,
            observed_generation: Some(2),
            message: None,
            last_applied_time: Some("2025-01-01T00:00:00+00:00".to_string()),
        };

        let status = applied_status(Some(&previous), Some(3), 37);
        assert_eq!(status.observed_generation, Some(3));
        assert_ne!(status.last_applied_time, previous.last_applied_time);
    }

    #[test]
    fn test_failed_status_keeps_last_success() {
        let previous = Status {
            current_state: State::Applied,
            applied_resources: 37,
            observed_generation: Some(2),
            message: None,
            last_applied_time: Some("2025-01-01T00:00:00+00:00".to_string()),
        };
        let error = Error::Types {
            source: types::error::Error::InvalidOverlay {
                kind: "Role".to_string(),
                name: "x".to_string(),
            },
        };

        let status = failed_status(Some(&previous), Some(3), &error);
        assert_eq!(status.current_state, State::Failed);
        assert_eq!(status.applied_resources, 37);
        assert_eq!(status.last_applied_time, previous.last_applied_time);
        assert_eq!(
            status.message.as_deref(),
            Some("overlay for Role 'x' must be a JSON object")
        );
    }
}
