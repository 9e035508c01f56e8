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

use super::{
    Bundle, CAINJECTOR_SERVICE_ACCOUNT, CONTROLLER_SERVICE_ACCOUNT, Component, named_rule, rule,
};
use crate::mutate::Mutate;
use crate::types::error::Error;
use k8s_openapi::api::rbac::v1 as rbacv1;

pub const CAINJECTOR_LEADERELECTION: &str = "cert-manager-cainjector:leaderelection";
pub const CONTROLLER_LEADERELECTION: &str = "cert-manager:leaderelection";
pub const TOKENREQUEST: &str = "cert-manager-tokenrequest";
pub const WEBHOOK_DYNAMIC_SERVING: &str = "cert-manager-webhook:dynamic-serving";
pub const STARTUPAPICHECK_CREATE_CERT: &str = "cert-manager-startupapicheck:create-cert";

const CAINJECTOR_LEASE: &str = const_str::concat!(CAINJECTOR_SERVICE_ACCOUNT, "-leader-election");
const CAINJECTOR_LEASE_CORE: &str =
    const_str::concat!(CAINJECTOR_SERVICE_ACCOUNT, "-leader-election-core");
const CONTROLLER_LEASE: &str = "cert-manager-controller";
const WEBHOOK_CA_SECRET: &str = "cert-manager-webhook-ca";

const COORDINATION: &str = "coordination.k8s.io";

impl Bundle {
    fn role(
        &self,
        name: &str,
        namespace: &str,
        component: Component,
        rules: Vec<rbacv1::PolicyRule>,
    ) -> rbacv1::Role {
        rbacv1::Role {
            metadata: self.object_meta(name, Some(namespace), component),
            rules: Some(rules),
        }
    }

    pub fn cainjector_leaderelection_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::Role, Error> {
        let mut role = self.role(
            CAINJECTOR_LEADERELECTION,
            &self.leader_election_namespace,
            Component::Cainjector,
            vec![
                named_rule(
                    &[COORDINATION],
                    &["leases"],
                    &[CAINJECTOR_LEASE, CAINJECTOR_LEASE_CORE],
                    &["get", "update", "patch"],
                ),
                rule(&[COORDINATION], &["leases"], &["create"]),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn controller_leaderelection_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::Role, Error> {
        let mut role = self.role(
            CONTROLLER_LEADERELECTION,
            &self.leader_election_namespace,
            Component::Controller,
            vec![
                named_rule(
                    &[COORDINATION],
                    &["leases"],
                    &[CONTROLLER_LEASE],
                    &["get", "update", "patch"],
                ),
                rule(&[COORDINATION], &["leases"], &["create"]),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    /// Lets the controller request tokens for its own service account.
    pub fn tokenrequest_role<M: Mutate>(&self, mutator: &M) -> Result<rbacv1::Role, Error> {
        let mut role = self.role(
            TOKENREQUEST,
            &self.namespace,
            Component::Controller,
            vec![named_rule(
                &[""],
                &["serviceaccounts/token"],
                &[CONTROLLER_SERVICE_ACCOUNT],
                &["create"],
            )],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn webhook_dynamic_serving_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::Role, Error> {
        let mut role = self.role(
            WEBHOOK_DYNAMIC_SERVING,
            &self.namespace,
            Component::Webhook,
            vec![
                named_rule(
                    &[""],
                    &["secrets"],
                    &[WEBHOOK_CA_SECRET],
                    &["get", "list", "watch", "update"],
                ),
                // names of new objects cannot be restricted
                rule(&[""], &["secrets"], &["create"]),
            ],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }

    pub fn startupapicheck_create_cert_role<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::Role, Error> {
        let mut role = self.role(
            STARTUPAPICHECK_CREATE_CERT,
            &self.namespace,
            Component::Startupapicheck,
            vec![rule(&["cert-manager.io"], &["certificates"], &["create"])],
        );
        mutator.mutate(&mut role)?;
        Ok(role)
    }
}
