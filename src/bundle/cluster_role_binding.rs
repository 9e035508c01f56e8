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
    Bundle, CAINJECTOR_SERVICE_ACCOUNT, CONTROLLER_SERVICE_ACCOUNT, Component,
    WEBHOOK_SERVICE_ACCOUNT, cluster_role,
};
use crate::mutate::Mutate;
use crate::types::error::Error;
use k8s_openapi::Resource as _;
use k8s_openapi::api::rbac::v1 as rbacv1;

impl Bundle {
    /// Binds the ClusterRole `role` to `service_account`. The binding shares the role's name.
    fn cluster_role_binding(
        &self,
        role: &str,
        component: Component,
        service_account: &str,
    ) -> rbacv1::ClusterRoleBinding {
        rbacv1::ClusterRoleBinding {
            metadata: self.object_meta(role, None, component),
            role_ref: rbacv1::RoleRef {
                api_group: rbacv1::ClusterRole::GROUP.to_owned(),
                kind: rbacv1::ClusterRole::KIND.to_owned(),
                name: role.to_owned(),
            },
            subjects: Some(vec![self.service_account_subject(service_account)]),
        }
    }

    fn controller_cluster_role_binding<M: Mutate>(
        &self,
        role: &str,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRoleBinding, Error> {
        let mut binding =
            self.cluster_role_binding(role, Component::Controller, CONTROLLER_SERVICE_ACCOUNT);
        mutator.mutate(&mut binding)?;
        Ok(binding)
    }

    pub fn cainjector_cluster_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRoleBinding, Error> {
        let mut binding = self.cluster_role_binding(
            cluster_role::CAINJECTOR,
            Component::Cainjector,
            CAINJECTOR_SERVICE_ACCOUNT,
        );
        mutator.mutate(&mut binding)?;
        Ok(binding)
    }

    pub fn controller_issuers_cluster_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRoleBinding, Error> {
        self.controller_cluster_role_binding(cluster_role::CONTROLLER_ISSUERS, mutator)
    }

    pub fn controller_clusterissuers_cluster_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRoleBinding, Error> {
        self.controller_cluster_role_binding(cluster_role::CONTROLLER_CLUSTERISSUERS, mutator)
    }

    pub fn controller_certificates_cluster_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRoleBinding, Error> {
        self.controller_cluster_role_binding(cluster_role::CONTROLLER_CERTIFICATES, mutator)
    }

    pub fn controller_orders_cluster_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRoleBinding, Error> {
        self.controller_cluster_role_binding(cluster_role::CONTROLLER_ORDERS, mutator)
    }

    pub fn controller_challenges_cluster_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRoleBinding, Error> {
        self.controller_cluster_role_binding(cluster_role::CONTROLLER_CHALLENGES, mutator)
    }

    pub fn controller_ingress_shim_cluster_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRoleBinding, Error> {
        self.controller_cluster_role_binding(cluster_role::CONTROLLER_INGRESS_SHIM, mutator)
    }

    pub fn controller_approve_cluster_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRoleBinding, Error> {
        self.controller_cluster_role_binding(cluster_role::CONTROLLER_APPROVE, mutator)
    }

    pub fn controller_certificatesigningrequests_cluster_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRoleBinding, Error> {
        self.controller_cluster_role_binding(
            cluster_role::CONTROLLER_CERTIFICATESIGNINGREQUESTS,
            mutator,
        )
    }

    pub fn webhook_subjectaccessreviews_cluster_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::ClusterRoleBinding, Error> {
        let mut binding = self.cluster_role_binding(
            cluster_role::WEBHOOK_SUBJECTACCESSREVIEWS,
            Component::Webhook,
            WEBHOOK_SERVICE_ACCOUNT,
        );
        mutator.mutate(&mut binding)?;
        Ok(binding)
    }
}
