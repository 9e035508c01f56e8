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

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};

/// A JSON merge patch (RFC 7386) applied to one generated object.
///
/// The target is selected by `kind` and `name`. `namespace` narrows the match
/// for namespaced objects and must be left empty for cluster scoped ones.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub kind: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[schemars(schema_with = "preserve_unknown_fields")]
    pub patch: serde_json::Value,
}

fn preserve_unknown_fields(_: &mut SchemaGenerator) -> Schema {
    json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true
    })
}

impl Overlay {
    pub fn matches(&self, kind: &str, name: &str, namespace: Option<&str>) -> bool {
        if self.kind != kind || self.name != name {
            return false;
        }

        match self.namespace.as_deref() {
            Some(ns) => namespace == Some(ns),
            None => true,
        }
    }
}
