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

use crate::bundle::{Bundle, DEFAULT_LEADER_ELECTION_NAMESPACE, DEFAULT_NAMESPACE};
use crate::types::v1alpha1::overlay::Overlay;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use kube::{CustomResource, KubeSchema, Resource, ResourceExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_owned()
}

/// Desired installation of the cert-manager RBAC bundle.
///
/// The resource is cluster scoped because it owns ClusterRoles and
/// ClusterRoleBindings, which cannot carry a namespaced owner.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, KubeSchema)]
#[kube(
    group = "operator.cert-manager.io",
    version = "v1alpha1",
    kind = "CertManager",
    status = "crate::types::v1alpha1::status::Status",
    shortname = "cm",
    plural = "certmanagers",
    singular = "certmanager",
    printcolumn = r#"{"name":"Namespace", "type":"string", "jsonPath":".spec.namespace"}"#,
    printcolumn = r#"{"name":"State", "type":"string", "jsonPath":".status.currentState"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#,
    crates(serde_json = "k8s_openapi::serde_json")
)]
#[serde(rename_all = "camelCase")]
pub struct CertManagerSpec {
    /// Namespace the cert-manager components run in.
    #[serde(default = "default_namespace")]
    #[x_kube(validation = Rule::new("self.size() > 0").message("namespace must not be empty"))]
    pub namespace: String,

    /// Namespace holding the leader election leases. Defaults to kube-system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_election_namespace: Option<String>,

    /// Labels added to every generated object.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub common_labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overlays: Vec<Overlay>,
}

impl Default for CertManagerSpec {
    fn default() -> Self {
        CertManagerSpec {
            namespace: default_namespace(),
            leader_election_namespace: None,
            common_labels: BTreeMap::new(),
            overlays: Vec::new(),
        }
    }
}

impl CertManager {
    pub fn name(&self) -> String {
        ResourceExt::name_any(self)
    }

    pub fn leader_election_namespace(&self) -> String {
        self.spec
            .leader_election_namespace
            .clone()
            .unwrap_or_else(|| DEFAULT_LEADER_ELECTION_NAMESPACE.to_owned())
    }

    /// the RBAC bundle described by this resource
    pub fn bundle(&self) -> Bundle {
        Bundle {
            namespace: self.spec.namespace.clone(),
            leader_election_namespace: self.leader_election_namespace(),
        }
    }

    /// a new owner reference for cert manager
    pub fn new_owner_ref(&self) -> metav1::OwnerReference {
        metav1::OwnerReference {
            api_version: Self::api_version(&()).to_string(),
            kind: Self::kind(&()).to_string(),
            name: self.name(),
            uid: self.meta().uid.clone().unwrap_or_default(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }
}
