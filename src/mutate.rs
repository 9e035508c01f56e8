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

//! Hooks applied to every object the bundle builds before it is returned.

use crate::bundle::Manifest;
use crate::types::error::{Error, ImmutableFieldModifiedSnafu, InvalidOverlaySnafu};
use crate::types::v1alpha1::cert_manager::CertManager;
use crate::types::v1alpha1::overlay::Overlay;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use kube::{Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::debug;

/// Fields an overlay is not allowed to touch, with their JSON pointers.
const IMMUTABLE_FIELDS: [(&str, &str); 4] = [
    ("apiVersion", "/apiVersion"),
    ("kind", "/kind"),
    ("metadata.name", "/metadata/name"),
    ("metadata.namespace", "/metadata/namespace"),
];

pub trait Mutate {
    /// Customizes a freshly built object in place.
    ///
    /// Errors are returned to the builder's caller unchanged.
    fn mutate<K>(&self, object: &mut K) -> Result<(), Error>
    where
        K: Resource<DynamicType = ()> + Serialize + DeserializeOwned;
}

/// Leaves every object as built.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Mutate for Identity {
    fn mutate<K>(&self, _object: &mut K) -> Result<(), Error>
    where
        K: Resource<DynamicType = ()> + Serialize + DeserializeOwned,
    {
        Ok(())
    }
}

/// The operator's hook: common labels, an owner reference and user overlays.
#[derive(Clone, Debug, Default)]
pub struct Mutator {
    labels: BTreeMap<String, String>,
    owner: Option<metav1::OwnerReference>,
    overlays: Vec<Overlay>,
}

impl Mutator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_cert_manager(cm: &CertManager) -> Self {
        Self::new()
            .with_labels(cm.spec.common_labels.clone())
            .with_owner(cm.new_owner_ref())
            .with_overlays(cm.spec.overlays.clone())
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels.extend(labels);
        self
    }

    pub fn with_owner(mut self, owner: metav1::OwnerReference) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_overlays(mut self, overlays: Vec<Overlay>) -> Self {
        self.overlays.extend(overlays);
        self
    }

    /// Overlays that select none of the given manifests.
    pub fn unmatched<'a>(&'a self, manifests: &[Manifest]) -> Vec<&'a Overlay> {
        self.overlays
            .iter()
            .filter(|overlay| {
                !manifests
                    .iter()
                    .any(|m| overlay.matches(m.kind(), &m.name(), m.namespace().as_deref()))
            })
            .collect()
    }
}

impl Mutate for Mutator {
    fn mutate<K>(&self, object: &mut K) -> Result<(), Error>
    where
        K: Resource<DynamicType = ()> + Serialize + DeserializeOwned,
    {
        let meta = object.meta_mut();

        // builder labels win so selectors on component labels stay stable
        if !self.labels.is_empty() {
            let labels = meta.labels.get_or_insert_with(BTreeMap::new);
            for (key, value) in &self.labels {
                labels.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        if let Some(owner) = &self.owner {
            let owners = meta.owner_references.get_or_insert_with(Vec::new);
            if !owners.iter().any(|o| o.uid == owner.uid) {
                owners.push(owner.clone());
            }
        }

        let kind = K::kind(&());
        let name = object.name_any();
        let namespace = object.namespace();

        for overlay in self
            .overlays
            .iter()
            .filter(|o| o.matches(&kind, &name, namespace.as_deref()))
        {
            debug!("applying overlay to {} {}", kind, name);
            apply_overlay(object, overlay)?;
        }

        Ok(())
    }
}

fn apply_overlay<K>(object: &mut K, overlay: &Overlay) -> Result<(), Error>
where
    K: Resource<DynamicType = ()> + Serialize + DeserializeOwned,
{
    if !overlay.patch.is_object() {
        return InvalidOverlaySnafu {
            kind: overlay.kind.clone(),
            name: overlay.name.clone(),
        }
        .fail();
    }

    let original = serde_json::to_value(&*object)?;
    let mut patched = original.clone();
    json_patch::merge(&mut patched, &overlay.patch);

    for (field, pointer) in IMMUTABLE_FIELDS {
        let before = original.pointer(pointer);
        let after = patched.pointer(pointer);
        if before != after {
            return ImmutableFieldModifiedSnafu {
                name: format!("{} '{}'", overlay.kind, overlay.name),
                field,
                message: format!("overlay changes {:?} to {:?}", before, after),
            }
            .fail();
        }
    }

    *object = serde_json::from_value(patched)?;
    Ok(())
}
