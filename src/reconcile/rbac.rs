// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::Error;
use crate::bundle::Manifest;
use crate::context::Context;
use crate::mutate::Mutator;
use crate::types::error::NoNamespaceSnafu;
use crate::types::v1alpha1::cert_manager::CertManager;
use snafu::OptionExt;
use tracing::debug;

/// Builds the bundle for `cm` and server-side applies every object in order.
pub async fn apply_bundle(
    cm: &CertManager,
    mutator: &Mutator,
    ctx: &Context,
) -> Result<Vec<Manifest>, Error> {
    let manifests = cm.bundle().manifests(mutator)?;

    for manifest in &manifests {
        apply_manifest(manifest, ctx).await?;
    }

    Ok(manifests)
}

async fn apply_manifest(manifest: &Manifest, ctx: &Context) -> Result<(), Error> {
    debug!("apply {} {:?}/{}", manifest.kind(), manifest.namespace(), manifest.name());

    match manifest {
        Manifest::ServiceAccount(sa) => {
            ctx.apply(sa, &namespace_of(manifest)?).await?;
        }
        Manifest::ClusterRole(role) => {
            ctx.apply_cluster(role).await?;
        }
        Manifest::ClusterRoleBinding(binding) => {
            ctx.apply_cluster(binding).await?;
        }
        Manifest::Role(role) => {
            ctx.apply(role, &namespace_of(manifest)?).await?;
        }
        Manifest::RoleBinding(binding) => {
            ctx.apply(binding, &namespace_of(manifest)?).await?;
        }
    }

    Ok(())
}

fn namespace_of(manifest: &Manifest) -> Result<String, Error> {
    Ok(manifest.namespace().context(NoNamespaceSnafu)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::Bundle;
    use crate::mutate::Identity;
    use k8s_openapi::api::rbac::v1 as rbacv1;

    #[test]
    fn test_namespace_of_namespaced_manifest() {
        let role = Bundle::new("security")
            .tokenrequest_role(&Identity)
            .expect("identity never fails");

        let ns = namespace_of(&Manifest::Role(role)).expect("namespaced");
        assert_eq!(ns, "security");
    }

    #[test]
    fn test_namespace_of_missing_namespace() {
        let role = Manifest::Role(rbacv1::Role::default());

        let err = namespace_of(&role).expect_err("no namespace");
        assert!(matches!(
            err,
            Error::Types {
                source: crate::types::error::Error::NoNamespace
            }
        ));
    }
}
