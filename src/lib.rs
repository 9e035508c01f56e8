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

use crate::bundle::Bundle;
use crate::context::Context;
use crate::error_policy::error_policy;
use crate::mutate::Mutator;
use crate::reconcile::{owning_cert_managers, reconcile_cert_manager};
use crate::types::v1alpha1::cert_manager::CertManager;
use futures::StreamExt;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::api::rbac::v1 as rbacv1;
use kube::CustomResourceExt;
use kube::runtime::{Controller, watcher};
use kube::{Api, Client};
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod bundle;
mod context;
pub mod error_policy;
pub mod mutate;
pub mod reconcile;
pub mod types;


pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::try_default().await?;
    let cert_manager_client = Api::<CertManager>::all(client.clone());

    let context = Context::new(client.clone());
    // namespaced children are mapped by hand: `owns` would look the
    // cluster-scoped owner up under the child's namespace
    Controller::new(cert_manager_client, watcher::Config::default())
        .watches(
            Api::<corev1::ServiceAccount>::all(client.clone()),
            watcher::Config::default(),
            owning_cert_managers,
        )
        .owns(
            Api::<rbacv1::ClusterRole>::all(client.clone()),
            watcher::Config::default(),
        )
        .owns(
            Api::<rbacv1::ClusterRoleBinding>::all(client.clone()),
            watcher::Config::default(),
        )
        .watches(
            Api::<rbacv1::Role>::all(client.clone()),
            watcher::Config::default(),
            owning_cert_managers,
        )
        .watches(
            Api::<rbacv1::RoleBinding>::all(client.clone()),
            watcher::Config::default(),
            owning_cert_managers,
        )
        .shutdown_on_signal()
        .run(reconcile_cert_manager, error_policy, Arc::new(context))
        .for_each(|res| async move {
            match res {
                Ok((cm, _)) => info!("cert manager {} is up to date", cm.name),
                Err(e) => warn!("reconcile failed: {}", e),
            }
        })
        .await;

    Ok(())
}

async fn output(file: Option<String>) -> std::io::Result<Pin<Box<dyn AsyncWrite + Send>>> {
    Ok(if let Some(file) = file {
        Box::pin(
            tokio::fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(file)
                .await?,
        )
    } else {
        Box::pin(tokio::io::stdout())
    })
}

pub async fn crd(file: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = output(file).await?;

    writer
        .write_all(serde_yaml_ng::to_string(&CertManager::crd())?.as_bytes())
        .await?;
    writer.flush().await?;

    Ok(())
}

/// Writes the RBAC bundle as YAML without talking to a cluster.
pub async fn render(
    bundle: Bundle,
    labels: BTreeMap<String, String>,
    file: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mutator = Mutator::new().with_labels(labels);
    let manifests = bundle.manifests(&mutator)?;

    let mut writer = output(file).await?;
    writer
        .write_all(bundle::render_yaml(&manifests)?.as_bytes())
        .await?;
    writer.flush().await?;

    Ok(())
}
