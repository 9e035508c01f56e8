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
    STARTUPAPICHECK_SERVICE_ACCOUNT, WEBHOOK_SERVICE_ACCOUNT, role,
};
use crate::mutate::Mutate;
use crate::types::error::Error;
use k8s_openapi::Resource as _;
use k8s_openapi::api::rbac::v1 as rbacv1;

pub const TOKENREQUEST: &str =
    const_str::concat!(CONTROLLER_SERVICE_ACCOUNT, "-", role::TOKENREQUEST);

impl Bundle {
    fn role_binding(
        &self,
        name: &str,
        namespace: &str,
        role_name: &str,
        component: Component,
        service_account: &str,
    ) -> rbacv1::RoleBinding {
        rbacv1::RoleBinding {
            metadata: self.object_meta(name, Some(namespace), component),
            role_ref: rbacv1::RoleRef {
                api_group: rbacv1::Role::GROUP.to_owned(),
                kind: rbacv1::Role::KIND.to_owned(),
                name: role_name.to_owned(),
            },
            subjects: Some(vec![self.service_account_subject(service_account)]),
        }
    }

    pub fn cainjector_leaderelection_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::RoleBinding, Error> {
        let mut binding = self.role_binding(
            role::CAINJECTOR_LEADERELECTION,
            &self.leader_election_namespace,
            role::CAINJECTOR_LEADERELECTION,
            Component::Cainjector,
            CAINJECTOR_SERVICE_ACCOUNT,
        );
        mutator.mutate(&mut binding)?;
        Ok(binding)
    }

    pub fn controller_leaderelection_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::RoleBinding, Error> {
        let mut binding = self.role_binding(
            role::CONTROLLER_LEADERELECTION,
            &self.leader_election_namespace,
            role::CONTROLLER_LEADERELECTION,
            Component::Controller,
            CONTROLLER_SERVICE_ACCOUNT,
        );
        mutator.mutate(&mut binding)?;
        Ok(binding)
    }

    pub fn tokenrequest_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::RoleBinding, Error> {
        let mut binding = self.role_binding(
            TOKENREQUEST,
            &self.namespace,
            role::TOKENREQUEST,
            Component::Controller,
            CONTROLLER_SERVICE_ACCOUNT,
        );
        mutator.mutate(&mut binding)?;
        Ok(binding)
    }

    pub fn webhook_dynamic_serving_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::RoleBinding, Error> {
        let mut binding = self.role_binding(
            role::WEBHOOK_DYNAMIC_SERVING,
            &self.namespace,
            role::WEBHOOK_DYNAMIC_SERVING,
            Component::Webhook,
            WEBHOOK_SERVICE_ACCOUNT,
        );
        mutator.mutate(&mut binding)?;
        Ok(binding)
    }

    pub fn startupapicheck_create_cert_role_binding<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<rbacv1::RoleBinding, Error> {
        let mut binding = self.role_binding(
            role::STARTUPAPICHECK_CREATE_CERT,
            &self.namespace,
            role::STARTUPAPICHECK_CREATE_CERT,
            Component::Startupapicheck,
            STARTUPAPICHECK_SERVICE_ACCOUNT,
        );
        mutator.mutate(&mut binding)?;
        Ok(binding)
    }
}
