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

//! RBAC objects for a bundled cert-manager installation.
//!
//! Every builder creates one object from literal data, substitutes the
//! install namespace, passes it through a [`Mutate`] hook and returns it.

use crate::mutate::Mutate;
use crate::types::error::Error;
use k8s_openapi::Resource as _;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::api::rbac::v1 as rbacv1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use serde::Serialize;
use std::collections::BTreeMap;
use strum::Display;

pub mod cluster_role;
pub mod cluster_role_binding;
pub mod role;
pub mod role_binding;
pub mod service_account;

pub const DEFAULT_NAMESPACE: &str = "cert-manager";
pub const DEFAULT_LEADER_ELECTION_NAMESPACE: &str = "kube-system";

/// Upstream release the rules are taken from.
pub const CERT_MANAGER_VERSION: &str = "v1.14.4";

const INSTANCE: &str = "cert-manager";

pub const CAINJECTOR_SERVICE_ACCOUNT: &str = "cert-manager-cainjector";
pub const CONTROLLER_SERVICE_ACCOUNT: &str = "cert-manager";
pub const WEBHOOK_SERVICE_ACCOUNT: &str = "cert-manager-webhook";
pub const STARTUPAPICHECK_SERVICE_ACCOUNT: &str = "cert-manager-startupapicheck";

/// The cert-manager component an object belongs to.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Component {
    Cainjector,
    Controller,
    Webhook,
    Startupapicheck,
}

impl Component {
    /// value of the `app` and `app.kubernetes.io/name` labels
    pub fn app(&self) -> &'static str {
        match self {
            Component::Cainjector => "cainjector",
            Component::Controller => "cert-manager",
            Component::Webhook => "webhook",
            Component::Startupapicheck => "startupapicheck",
        }
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        [
            ("app", self.app().to_owned()),
            ("app.kubernetes.io/name", self.app().to_owned()),
            ("app.kubernetes.io/instance", INSTANCE.to_owned()),
            ("app.kubernetes.io/component", self.to_string()),
            ("app.kubernetes.io/version", CERT_MANAGER_VERSION.to_owned()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
    }
}

/// Input of every builder: where cert-manager and its leases live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bundle {
    pub namespace: String,
    pub leader_election_namespace: String,
}

impl Default for Bundle {
    fn default() -> Self {
        Bundle::new(DEFAULT_NAMESPACE)
    }
}

impl Bundle {
    pub fn new(namespace: impl Into<String>) -> Self {
        Bundle {
            namespace: namespace.into(),
            leader_election_namespace: DEFAULT_LEADER_ELECTION_NAMESPACE.to_owned(),
        }
    }

    pub fn with_leader_election_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.leader_election_namespace = namespace.into();
        self
    }

    /// Builds every object of the bundle in apply order.
    ///
    /// Stops at the first error returned by `mutator`.
    pub fn manifests<M: Mutate>(&self, mutator: &M) -> Result<Vec<Manifest>, Error> {
        let manifests = vec![
            // service accounts
            self.cainjector_service_account(mutator)?.into(),
            self.controller_service_account(mutator)?.into(),
            self.webhook_service_account(mutator)?.into(),
            self.startupapicheck_service_account(mutator)?.into(),
            // cluster roles
            self.cainjector_cluster_role(mutator)?.into(),
            self.controller_issuers_cluster_role(mutator)?.into(),
            self.controller_clusterissuers_cluster_role(mutator)?.into(),
            self.controller_certificates_cluster_role(mutator)?.into(),
            self.controller_orders_cluster_role(mutator)?.into(),
            self.controller_challenges_cluster_role(mutator)?.into(),
            self.controller_ingress_shim_cluster_role(mutator)?.into(),
            self.cluster_view_cluster_role(mutator)?.into(),
            self.view_cluster_role(mutator)?.into(),
            self.edit_cluster_role(mutator)?.into(),
            self.controller_approve_cluster_role(mutator)?.into(),
            self.controller_certificatesigningrequests_cluster_role(mutator)?.into(),
            self.webhook_subjectaccessreviews_cluster_role(mutator)?.into(),
            // cluster role bindings
            self.cainjector_cluster_role_binding(mutator)?.into(),
            self.controller_issuers_cluster_role_binding(mutator)?.into(),
            self.controller_clusterissuers_cluster_role_binding(mutator)?.into(),
            self.controller_certificates_cluster_role_binding(mutator)?.into(),
            self.controller_orders_cluster_role_binding(mutator)?.into(),
            self.controller_challenges_cluster_role_binding(mutator)?.into(),
            self.controller_ingress_shim_cluster_role_binding(mutator)?.into(),
            self.controller_approve_cluster_role_binding(mutator)?.into(),
            self.controller_certificatesigningrequests_cluster_role_binding(mutator)?
                .into(),
            self.webhook_subjectaccessreviews_cluster_role_binding(mutator)?.into(),
            // roles
            self.cainjector_leaderelection_role(mutator)?.into(),
            self.controller_leaderelection_role(mutator)?.into(),
            self.tokenrequest_role(mutator)?.into(),
            self.webhook_dynamic_serving_role(mutator)?.into(),
            self.startupapicheck_create_cert_role(mutator)?.into(),
            // role bindings
            self.cainjector_leaderelection_role_binding(mutator)?.into(),
            self.controller_leaderelection_role_binding(mutator)?.into(),
            self.tokenrequest_role_binding(mutator)?.into(),
            self.webhook_dynamic_serving_role_binding(mutator)?.into(),
            self.startupapicheck_create_cert_role_binding(mutator)?.into(),
        ];

        Ok(manifests)
    }

    fn object_meta(
        &self,
        name: &str,
        namespace: Option<&str>,
        component: Component,
    ) -> metav1::ObjectMeta {
        metav1::ObjectMeta {
            name: Some(name.to_owned()),
            namespace: namespace.map(str::to_owned),
            labels: Some(component.labels()),
            ..Default::default()
        }
    }

    fn service_account_subject(&self, service_account: &str) -> rbacv1::Subject {
        rbacv1::Subject {
            api_group: Some(String::new()),
            kind: corev1::ServiceAccount::KIND.to_owned(),
            name: service_account.to_owned(),
            namespace: Some(self.namespace.clone()),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

fn rule(api_groups: &[&str], resources: &[&str], verbs: &[&str]) -> rbacv1::PolicyRule {
    rbacv1::PolicyRule {
        api_groups: Some(strings(api_groups)),
        resources: Some(strings(resources)),
        verbs: strings(verbs),
        ..Default::default()
    }
}

fn named_rule(
    api_groups: &[&str],
    resources: &[&str],
    resource_names: &[&str],
    verbs: &[&str],
) -> rbacv1::PolicyRule {
    rbacv1::PolicyRule {
        resource_names: Some(strings(resource_names)),
        ..rule(api_groups, resources, verbs)
    }
}

/// Any object the bundle produces.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Manifest {
    ServiceAccount(corev1::ServiceAccount),
    ClusterRole(rbacv1::ClusterRole),
    ClusterRoleBinding(rbacv1::ClusterRoleBinding),
    Role(rbacv1::Role),
    RoleBinding(rbacv1::RoleBinding),
}

impl Manifest {
    pub fn kind(&self) -> &'static str {
        match self {
            Manifest::ServiceAccount(_) => corev1::ServiceAccount::KIND,
            Manifest::ClusterRole(_) => rbacv1::ClusterRole::KIND,
            Manifest::ClusterRoleBinding(_) => rbacv1::ClusterRoleBinding::KIND,
            Manifest::Role(_) => rbacv1::Role::KIND,
            Manifest::RoleBinding(_) => rbacv1::RoleBinding::KIND,
        }
    }

    pub fn meta(&self) -> &metav1::ObjectMeta {
        match self {
            Manifest::ServiceAccount(o) => &o.metadata,
            Manifest::ClusterRole(o) => &o.metadata,
            Manifest::ClusterRoleBinding(o) => &o.metadata,
            Manifest::Role(o) => &o.metadata,
            Manifest::RoleBinding(o) => &o.metadata,
        }
    }

    pub fn name(&self) -> String {
        self.meta().name.clone().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<String> {
        self.meta().namespace.clone()
    }
}

impl From<corev1::ServiceAccount> for Manifest {
    fn from(value: corev1::ServiceAccount) -> Self {
        Manifest::ServiceAccount(value)
    }
}

impl From<rbacv1::ClusterRole> for Manifest {
    fn from(value: rbacv1::ClusterRole) -> Self {
        Manifest::ClusterRole(value)
    }
}

impl From<rbacv1::ClusterRoleBinding> for Manifest {
    fn from(value: rbacv1::ClusterRoleBinding) -> Self {
        Manifest::ClusterRoleBinding(value)
    }
}

impl From<rbacv1::Role> for Manifest {
    fn from(value: rbacv1::Role) -> Self {
        Manifest::Role(value)
    }
}

impl From<rbacv1::RoleBinding> for Manifest {
    fn from(value: rbacv1::RoleBinding) -> Self {
        Manifest::RoleBinding(value)
    }
}

/// Renders manifests as a multi-document YAML stream.
pub fn render_yaml(manifests: &[Manifest]) -> Result<String, Error> {
    let mut out = String::new();
    for manifest in manifests {
        out.push_str("---\n");
        out.push_str(&serde_yaml_ng::to_string(manifest)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutate::{Identity, Mutate, Mutator};
    use crate::types::v1alpha1::overlay::Overlay;
    use std::collections::HashSet;

    fn manifests(bundle: &Bundle) -> Vec<Manifest> {
        bundle.manifests(&Identity).expect("identity never fails")
    }

    #[test]
    fn test_manifest_counts_per_kind() {
        let all = manifests(&Bundle::default());

        let count = |kind: &str| all.iter().filter(|m| m.kind() == kind).count();
        assert_eq!(all.len(), 37);
        assert_eq!(count("ServiceAccount"), 4);
        assert_eq!(count("ClusterRole"), 13);
        assert_eq!(count("ClusterRoleBinding"), 10);
        assert_eq!(count("Role"), 5);
        assert_eq!(count("RoleBinding"), 5);
    }

    #[test]
    fn test_manifests_are_in_apply_order() {
        let order = ["ServiceAccount", "ClusterRole", "ClusterRoleBinding", "Role", "RoleBinding"];
        let all = manifests(&Bundle::default());

        let ranks: Vec<usize> = all
            .iter()
            .map(|m| order.iter().position(|k| *k == m.kind()).expect("known kind"))
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_names_unique_per_kind_and_namespace() {
        let all = manifests(&Bundle::default());

        let mut seen = HashSet::new();
        for m in &all {
            assert!(
                seen.insert((m.kind(), m.namespace(), m.name())),
                "duplicate {} {}",
                m.kind(),
                m.name()
            );
        }
    }

    #[test]
    fn test_namespace_substituted_everywhere() {
        let bundle = Bundle::new("security").with_leader_election_namespace("leases");
        let all = manifests(&bundle);

        for m in &all {
            match m {
                Manifest::ClusterRole(_) | Manifest::ClusterRoleBinding(_) => {
                    assert_eq!(m.namespace(), None, "{} is cluster scoped", m.name())
                }
                Manifest::ServiceAccount(_) => {
                    assert_eq!(m.namespace().as_deref(), Some("security"))
                }
                Manifest::Role(_) | Manifest::RoleBinding(_) => {
                    let ns = m.namespace().expect("namespaced");
                    assert!(ns == "security" || ns == "leases", "unexpected namespace {ns}");
                }
            }
        }

        let subjects = all.iter().flat_map(|m| match m {
            Manifest::ClusterRoleBinding(b) => b.subjects.clone().unwrap_or_default(),
            Manifest::RoleBinding(b) => b.subjects.clone().unwrap_or_default(),
            _ => Vec::new(),
        });
        for subject in subjects {
            assert_eq!(subject.kind, "ServiceAccount");
            assert_eq!(subject.namespace.as_deref(), Some("security"));
        }
    }

    #[test]
    fn test_bindings_reference_bundle_objects() {
        let all = manifests(&Bundle::default());

        let names = |kind: &str| -> HashSet<String> {
            all.iter().filter(|m| m.kind() == kind).map(Manifest::name).collect()
        };
        let cluster_roles = names("ClusterRole");
        let roles = names("Role");
        let service_accounts = names("ServiceAccount");

        for m in &all {
            let (role_ref, subjects) = match m {
                Manifest::ClusterRoleBinding(b) => (&b.role_ref, b.subjects.clone()),
                Manifest::RoleBinding(b) => (&b.role_ref, b.subjects.clone()),
                _ => continue,
            };

            assert_eq!(role_ref.api_group, "rbac.authorization.k8s.io");
            match role_ref.kind.as_str() {
                "ClusterRole" => assert!(cluster_roles.contains(&role_ref.name)),
                "Role" => assert!(roles.contains(&role_ref.name)),
                other => panic!("unexpected role kind {other}"),
            }

            for subject in subjects.expect("binding has subjects") {
                assert!(service_accounts.contains(&subject.name), "{}", subject.name);
            }
        }
    }

    #[test]
    fn test_component_labels() {
        let labels = Component::Controller.labels();

        assert_eq!(labels["app"], "cert-manager");
        assert_eq!(labels["app.kubernetes.io/name"], "cert-manager");
        assert_eq!(labels["app.kubernetes.io/component"], "controller");
        assert_eq!(labels["app.kubernetes.io/instance"], "cert-manager");
        assert_eq!(labels["app.kubernetes.io/version"], CERT_MANAGER_VERSION);

        assert_eq!(Component::Cainjector.labels()["app"], "cainjector");
        assert_eq!(Component::Startupapicheck.to_string(), "startupapicheck");
    }

    #[test]
    fn test_render_yaml_documents() {
        let all = manifests(&Bundle::default());
        let yaml = render_yaml(&all).expect("render");

        assert_eq!(yaml.matches("---\n").count(), all.len());
        assert!(yaml.starts_with("---\napiVersion: v1\nkind: ServiceAccount\n"));
        assert!(yaml.contains("kind: ClusterRoleBinding"));
    }

    #[test]
    fn test_manifests_through_cert_manager_mutator() {
        let mut cm = crate::tests::create_test_cert_manager("cert-manager", None);
        cm.spec.common_labels = BTreeMap::from([
            ("team".to_string(), "platform".to_string()),
            (
                "rbac.authorization.k8s.io/aggregate-to-view".to_string(),
                "false".to_string(),
            ),
        ]);
        cm.spec.overlays = vec![Overlay {
            kind: "Role".to_string(),
            name: role::CONTROLLER_LEADERELECTION.to_string(),
            namespace: Some("kube-system".to_string()),
            patch: serde_json::json!({
                "metadata": { "annotations": { "example.com/owner": "platform" } }
            }),
        }];
        let mutator = Mutator::for_cert_manager(&cm);

        let all = cm.bundle().manifests(&mutator).expect("bundle builds");
        assert_eq!(all.len(), 37);

        for manifest in &all {
            let meta = manifest.meta();
            let controllers: Vec<_> = meta
                .owner_references
                .iter()
                .flatten()
                .filter(|owner| owner.controller == Some(true))
                .collect();
            assert_eq!(controllers.len(), 1, "{} {}", manifest.kind(), manifest.name());
            assert_eq!(controllers[0].uid, "test-uid-123");

            let labels = meta.labels.as_ref().expect("labels set");
            assert_eq!(labels["team"], "platform");
        }

        let view = all
            .iter()
            .find(|m| m.kind() == "ClusterRole" && m.name() == "cert-manager-view")
            .expect("view role present");
        let view_labels = view.meta().labels.as_ref().expect("labels set");
        assert_eq!(view_labels["rbac.authorization.k8s.io/aggregate-to-view"], "true");

        let leader_election = all
            .iter()
            .find(|m| m.kind() == "Role" && m.name() == role::CONTROLLER_LEADERELECTION)
            .expect("leader election role present");
        assert_eq!(leader_election.namespace().as_deref(), Some("kube-system"));
        let annotations = leader_election
            .meta()
            .annotations
            .as_ref()
            .expect("overlay applied");
        assert_eq!(annotations["example.com/owner"], "platform");

        assert!(mutator.unmatched(&all).is_empty());
    }

    struct Failing;

    impl Mutate for Failing {
        fn mutate<K>(&self, _object: &mut K) -> Result<(), Error>
        where
            K: kube::Resource<DynamicType = ()> + Serialize + serde::de::DeserializeOwned,
        {
            Err(Error::InvalidOverlay {
                kind: "ServiceAccount".to_string(),
                name: "rejected".to_string(),
            })
        }
    }

    #[test]
    fn test_manifests_propagate_mutate_error() {
        let err = Bundle::default()
            .manifests(&Failing)
            .expect_err("hook error propagates");
        assert!(matches!(err, Error::InvalidOverlay { ref name, .. } if name == "rejected"));
    }
}
