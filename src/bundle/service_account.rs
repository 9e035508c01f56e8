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
    STARTUPAPICHECK_SERVICE_ACCOUNT, WEBHOOK_SERVICE_ACCOUNT,
};
use crate::mutate::Mutate;
use crate::types::error::Error;
use k8s_openapi::api::core::v1 as corev1;

impl Bundle {
    fn service_account(&self, name: &str, component: Component) -> corev1::ServiceAccount {
        corev1::ServiceAccount {
            metadata: self.object_meta(name, Some(self.namespace.as_str()), component),
            automount_service_account_token: Some(true),
            ..Default::default()
        }
    }

    pub fn cainjector_service_account<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<corev1::ServiceAccount, Error> {
        let mut sa = self.service_account(CAINJECTOR_SERVICE_ACCOUNT, Component::Cainjector);
        mutator.mutate(&mut sa)?;
        Ok(sa)
    }

    pub fn controller_service_account<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<corev1::ServiceAccount, Error> {
        let mut sa = self.service_account(CONTROLLER_SERVICE_ACCOUNT, Component::Controller);
        mutator.mutate(&mut sa)?;
        Ok(sa)
    }

    pub fn webhook_service_account<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<corev1::ServiceAccount, Error> {
        let mut sa = self.service_account(WEBHOOK_SERVICE_ACCOUNT, Component::Webhook);
        mutator.mutate(&mut sa)?;
        Ok(sa)
    }

    pub fn startupapicheck_service_account<M: Mutate>(
        &self,
        mutator: &M,
    ) -> Result<corev1::ServiceAccount, Error> {
        let mut sa =
            self.service_account(STARTUPAPICHECK_SERVICE_ACCOUNT, Component::Startupapicheck);
        mutator.mutate(&mut sa)?;
        Ok(sa)
    }
}
