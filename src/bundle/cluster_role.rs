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

use super::{Bundle, Component, named_rule, rule};
use crate::mutate::Mutate;
use crate::types::error::Error;
use k8s_openapi::api::rbac::v1 as rbacv1;

pub const CAINJECTOR: &str = "cert-manager-cainjector";
pub const CONTROLLER_ISSUERS: &str = "cert-manager-controller-issuers";
pub const CONTROLLER_CLUSTERISSUERS: &str = "cert-manager-controller-clusterissuers";
pub const CONTROLLER_CERTIFICATES: &str = "cert-manager-controller-certificates";
pub const CONTROLLER_ORDERS: &str = "cert-manager-controller-orders";
pub const CONTROLLER_CHALLENGES: &str = "cert-manager-controller-challenges";
pub const CONTROLLER_INGRESS_SHIM: &str = "cert-manager-controller-ingress-shim";
pub const CLUSTER_VIEW: &str = "cert-manager-cluster-view";
pub const VIEW: &str = "cert-manager-view";
pub const EDIT: &str = "cert-manager-edit";
pub const CONTROLLER_APPROVE: &str = "cert-manager-controller-approve:cert-manager-io";
pub const CONTROLLER_CERTIFICATESIGNINGREQUESTS: &str =
    "cert-manager-controller-certificatesigningrequests";
pub const WEBHOOK_SUBJECTACCESSREVIEWS: &str = "cert-manager-webhook:subjectaccessreviews";

const CORE: &str = "";
const CERT_MANAGER: &str = "cert-manager.io";
const ACME: &str = "acme.cert-manager.io";
const NETWORKING: &str = "networking.k8s.io";
const GATEWAY: &str = "gateway.networking.k8s.io";
const CERTIFICATES: &str = "certificates.k8s.io";
const AUTHORIZATION: &str = "authorization.k8s.io";

const READ: &[&str] = &["get", "list", "watch"];
const SIGNERS: &[&str] = &["issuers.cert-manager.io/*", "clusterissuers.cert-manager.io/*"];

const AGGREGATE_TO_VIEW: &str = "rbac.authorization.k8s.io/aggregate-to-view";
const AGGREGATE_TO_EDIT: &str = "rbac.authorization.k8s.io/aggregate-to-edit";
const AGGREGATE_TO_ADMIN: &str = "rbac.authorization.k8s.io/aggregate-to-admin";
const AGGREGATE_TO_CLUSTER_READER: &str = "rbac.authorization.k8s.io/aggregate-to-cluster-reader";

impl Bundle {
    fn cluster_role(
        &self,
        name: &str,
        component: Component,
        aggregate_to: &[&str],
        rules: Vec<rbacv1::PolicyRule>,
    ) -> rbacv1::ClusterRole {
        let mut metadata = self.object_meta(name, None, component);
        if let Some(labels) = metadata.labels.as_mut() {
            labels.extend(
                aggregate_to
                    .iter()
                    .map(|label| ((*label).to_owned(), "true".to_owned())),
            );
        }

        rbacv1::ClusterRole {
            metadata,
            rules: Some(rules),
            ..Default::default()
        }
    }

    pub fn cainjector_cluster_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRole, Error> {
        let write = &["get", "list", "watch", "update", "patch"];
        let mut role = self.cluster_role(
            CAINJECTOR,
            Component::Cainjector,
            &[],
            vec![
                rule(&[CERT_MANAGER], &["certificates"], READ),
                rule(&[CORE], &["secrets"], READ),
                rule(&[CORE], &["events"], &["get", "create", "update", "patch"]),
                rule(
                    &["admissionregistration.k8s.io"],
                    &["validatingwebhookconfigurations", "mutatingwebhookconfigurations"],
                    write,
                ),
                rule(&["apiregistration.k8s.io"], &["apiservices"], write),
                rule(&["apiextensions.k8s.io"], &["customresourcedefinitions"], write),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn controller_issuers_cluster_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRole, Error> {
        let mut role = self.cluster_role(
            CONTROLLER_ISSUERS,
            Component::Controller,
            &[],
            vec![
                rule(&[CERT_MANAGER], &["issuers", "issuers/status"], &["update", "patch"]),
                rule(&[CERT_MANAGER], &["issuers"], READ),
                rule(
                    &[CORE],
                    &["secrets"],
                    &["get", "list", "watch", "create", "update", "delete"],
                ),
                rule(&[CORE], &["events"], &["create", "patch"]),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn controller_clusterissuers_cluster_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRole, Error> {
        let mut role = self.cluster_role(
            CONTROLLER_CLUSTERISSUERS,
            Component::Controller,
            &[],
            vec![
                rule(
                    &[CERT_MANAGER],
                    &["clusterissuers", "clusterissuers/status"],
                    &["update", "patch"],
                ),
                rule(&[CERT_MANAGER], &["clusterissuers"], READ),
                rule(
                    &[CORE],
                    &["secrets"],
                    &["get", "list", "watch", "create", "update", "delete"],
                ),
                rule(&[CORE], &["events"], &["create", "patch"]),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn controller_certificates_cluster_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRole, Error> {
        let mut role = self.cluster_role(
            CONTROLLER_CERTIFICATES,
            Component::Controller,
            &[],
            vec![
                rule(
                    &[CERT_MANAGER],
                    &[
                        "certificates",
                        "certificates/status",
                        "certificaterequests",
                        "certificaterequests/status",
                    ],
                    &["update", "patch"],
                ),
                rule(
                    &[CERT_MANAGER],
                    &["certificates", "certificaterequests", "clusterissuers", "issuers"],
                    READ,
                ),
                rule(
                    &[CERT_MANAGER],
                    &["certificates/finalizers", "certificaterequests/finalizers"],
                    &["update"],
                ),
                rule(
                    &[ACME],
                    &["orders"],
                    &["create", "delete", "get", "list", "watch"],
                ),
                rule(
                    &[CORE],
                    &["secrets"],
                    &["get", "list", "watch", "create", "update", "delete", "patch"],
                ),
                rule(&[CORE], &["events"], &["create", "patch"]),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn controller_orders_cluster_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRole, Error> {
        let mut role = self.cluster_role(
            CONTROLLER_ORDERS,
            Component::Controller,
            &[],
            vec![
                rule(&[ACME], &["orders", "orders/status"], &["update", "patch"]),
                rule(&[ACME], &["orders", "challenges"], READ),
                rule(&[CERT_MANAGER], &["clusterissuers", "issuers"], READ),
                rule(&[ACME], &["challenges"], &["create", "delete"]),
                rule(&[ACME], &["orders/finalizers"], &["update"]),
                rule(&[CORE], &["secrets"], READ),
                rule(&[CORE], &["events"], &["create", "patch"]),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn controller_challenges_cluster_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRole, Error> {
        let solver = &["get", "list", "watch", "create", "delete", "update"];
        let mut role = self.cluster_role(
            CONTROLLER_CHALLENGES,
            Component::Controller,
            &[],
            vec![
                rule(&[ACME], &["challenges", "challenges/status"], &["update", "patch"]),
                rule(&[ACME], &["challenges"], READ),
                rule(&[CERT_MANAGER], &["issuers", "clusterissuers"], READ),
                rule(&[CORE], &["secrets"], READ),
                rule(&[CORE], &["events"], &["create", "patch"]),
                rule(
                    &[CORE],
                    &["pods", "services"],
                    &["get", "list", "watch", "create", "delete"],
                ),
                rule(&[NETWORKING], &["ingresses"], solver),
                rule(&[GATEWAY], &["httproutes"], solver),
                rule(&["route.openshift.io"], &["routes/custom-host"], &["create"]),
                rule(&[ACME], &["challenges/finalizers"], &["update"]),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn controller_ingress_shim_cluster_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRole, Error> {
        let mut role = self.cluster_role(
            CONTROLLER_INGRESS_SHIM,
            Component::Controller,
            &[],
            vec![
                rule(
                    &[CERT_MANAGER],
                    &["certificates", "certificaterequests"],
                    &["create", "update", "delete"],
                ),
                rule(
                    &[CERT_MANAGER],
                    &["certificates", "certificaterequests", "issuers", "clusterissuers"],
                    READ,
                ),
                rule(&[NETWORKING], &["ingresses"], READ),
                rule(&[NETWORKING], &["ingresses/finalizers"], &["update"]),
                rule(&[GATEWAY], &["gateways", "httproutes"], READ),
                rule(
                    &[GATEWAY],
                    &["gateways/finalizers", "httproutes/finalizers"],
                    &["update"],
                ),
                rule(&[CORE], &["events"], &["create", "patch"]),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn cluster_view_cluster_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRole, Error> {
        let mut role = self.cluster_role(
            CLUSTER_VIEW,
            Component::Controller,
            &[AGGREGATE_TO_CLUSTER_READER],
            vec![rule(&[CERT_MANAGER], &["clusterissuers"], READ)],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn view_cluster_role<M: Mutate>(&self, mutator: &M) -> Result<rbacv1::ClusterRole, Error> {
        let mut role = self.cluster_role(
            VIEW,
            Component::Controller,
            &[
                AGGREGATE_TO_VIEW,
                AGGREGATE_TO_EDIT,
                AGGREGATE_TO_ADMIN,
                AGGREGATE_TO_CLUSTER_READER,
            ],
            vec![
                rule(
                    &[CERT_MANAGER],
                    &["certificates", "certificaterequests", "issuers"],
                    READ,
                ),
                rule(&[ACME], &["challenges", "orders"], READ),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn edit_cluster_role<M: Mutate>(&self, mutator: &M) -> Result<rbacv1::ClusterRole, Error> {
        let write = &["create", "delete", "deletecollection", "patch", "update"];
        let mut role = self.cluster_role(
            EDIT,
            Component::Controller,
            &[AGGREGATE_TO_EDIT, AGGREGATE_TO_ADMIN],
            vec![
                rule(
                    &[CERT_MANAGER],
                    &["certificates", "certificaterequests", "issuers"],
                    write,
                ),
                rule(&[CERT_MANAGER], &["certificates/status"], &["update"]),
                rule(&[ACME], &["challenges", "orders"], write),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn controller_approve_cluster_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRole, Error> {
        let mut role = self.cluster_role(
            CONTROLLER_APPROVE,
            Component::Controller,
            &[],
            vec![named_rule(&[CERT_MANAGER], &["signers"], SIGNERS, &["approve"])],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn controller_certificatesigningrequests_cluster_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRole, Error> {
        let mut role = self.cluster_role(
            CONTROLLER_CERTIFICATESIGNINGREQUESTS,
            Component::Controller,
            &[],
            vec![
                rule(
                    &[CERTIFICATES],
                    &["certificatesigningrequests"],
                    &["get", "list", "watch", "update"],
                ),
                rule(
                    &[CERTIFICATES],
                    &["certificatesigningrequests/status"],
                    &["update", "patch"],
                ),
                named_rule(&[CERTIFICATES], &["signers"], SIGNERS, &["sign"]),
                rule(&[AUTHORIZATION], &["subjectaccessreviews"], &["create"]),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn webhook_subjectaccessreviews_cluster_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRole, Error> {
        let mut role = self.cluster_role(
            WEBHOOK_SUBJECTACCESSREVIEWS,
            Component::Webhook,
            &[],
            vec![rule(&[AUTHORIZATION], &["subjectaccessreviews"], &["create"])],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutate::Identity;

    fn find<'a>(
        rules: &'a [rbacv1::PolicyRule],
        group: &str,
        resource: &str,
    ) -> Vec<&'a rbacv1::PolicyRule> {
        rules
            .iter()
            .filter(|r| {
                r.api_groups.as_deref() == Some(&[group.to_string()][..])
                    && r.resources
                        .as_ref()
                        .is_some_and(|res| res.iter().any(|x| x == resource))
            })
            .collect()
    }

    #[test]
    fn test_cluster_roles_are_cluster_scoped() {
        let bundle = Bundle::new("security");
        let role = bundle
            .cainjector_cluster_role(&Identity)
            .expect("identity never fails");

        assert_eq!(role.metadata.name.as_deref(), Some(CAINJECTOR));
        assert_eq!(role.metadata.namespace, None);
        assert_eq!(
            role.metadata.labels.expect("labels")["app.kubernetes.io/component"],
            "cainjector"
        );
    }

    #[test]
    fn test_cainjector_can_patch_webhook_configurations() {
        let role = Bundle::default()
            .cainjector_cluster_role(&Identity)
            .expect("identity never fails");
        let rules = role.rules.expect("rules");

        let matches = find(&rules, "admissionregistration.k8s.io", "mutatingwebhookconfigurations");
        assert_eq!(matches.len(), 1);
        assert!(matches[0].verbs.contains(&"patch".to_string()));
        assert_eq!(find(&rules, "apiextensions.k8s.io", "customresourcedefinitions").len(), 1);
    }

    #[test]
    fn test_certificates_role_manages_secrets_and_orders() {
        let role = Bundle::default()
            .controller_certificates_cluster_role(&Identity)
            .expect("identity never fails");
        let rules = role.rules.expect("rules");

        let secrets = find(&rules, "", "secrets");
        assert_eq!(secrets.len(), 1);
        assert_eq!(
            secrets[0].verbs,
            ["get", "list", "watch", "create", "update", "delete", "patch"]
        );

        let orders = find(&rules, "acme.cert-manager.io", "orders");
        assert_eq!(orders.len(), 1);
        assert!(orders[0].verbs.contains(&"create".to_string()));
    }

    #[test]
    fn test_challenges_role_can_solve_http01() {
        let role = Bundle::default()
            .controller_challenges_cluster_role(&Identity)
            .expect("identity never fails");
        let rules = role.rules.expect("rules");

        assert_eq!(find(&rules, "networking.k8s.io", "ingresses").len(), 1);
        assert_eq!(find(&rules, "gateway.networking.k8s.io", "httproutes").len(), 1);
        assert_eq!(find(&rules, "", "pods").len(), 1);
        assert_eq!(find(&rules, "route.openshift.io", "routes/custom-host").len(), 1);
    }

    #[test]
    fn test_view_and_edit_roles_aggregate() {
        let bundle = Bundle::default();

        let view = bundle.view_cluster_role(&Identity).expect("view");
        let labels = view.metadata.labels.expect("labels");
        for key in [
            AGGREGATE_TO_VIEW,
            AGGREGATE_TO_EDIT,
            AGGREGATE_TO_ADMIN,
            AGGREGATE_TO_CLUSTER_READER,
        ] {
            assert_eq!(labels[key], "true", "{key}");
        }

        let edit = bundle.edit_cluster_role(&Identity).expect("edit");
        let labels = edit.metadata.labels.expect("labels");
        assert_eq!(labels[AGGREGATE_TO_EDIT], "true");
        assert_eq!(labels[AGGREGATE_TO_ADMIN], "true");
        assert!(!labels.contains_key(AGGREGATE_TO_VIEW));

        let cluster_view = bundle.cluster_view_cluster_role(&Identity).expect("cluster view");
        let labels = cluster_view.metadata.labels.expect("labels");
        assert_eq!(labels[AGGREGATE_TO_CLUSTER_READER], "true");
        assert!(!labels.contains_key(AGGREGATE_TO_ADMIN));
    }

    #[test]
    fn test_signer_rules_are_restricted_to_cert_manager_issuers() {
        let bundle = Bundle::default();

        let approve = bundle.controller_approve_cluster_role(&Identity).expect("approve");
        let rules = approve.rules.expect("rules");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].verbs, ["approve"]);
        assert_eq!(rules[0].resource_names.as_deref(), Some(&strings_of(SIGNERS)[..]));

        let csr = bundle
            .controller_certificatesigningrequests_cluster_role(&Identity)
            .expect("csr");
        let rules = csr.rules.expect("rules");
        let sign = find(&rules, "certificates.k8s.io", "signers");
        assert_eq!(sign.len(), 1);
        assert_eq!(sign[0].verbs, ["sign"]);
        assert_eq!(sign[0].resource_names.as_deref(), Some(&strings_of(SIGNERS)[..]));
    }

    #[test]
    fn test_webhook_role_only_creates_subjectaccessreviews() {
        let role = Bundle::default()
            .webhook_subjectaccessreviews_cluster_role(&Identity)
            .expect("identity never fails");
        let rules = role.rules.expect("rules");

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].verbs, ["create"]);
        assert_eq!(rules[0].resources, Some(vec!["subjectaccessreviews".to_string()]));
    }

    fn strings_of(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }
}
