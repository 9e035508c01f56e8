// Copyright 2024 RustFS Team
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

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use operator::bundle::{Bundle, DEFAULT_LEADER_ELECTION_NAMESPACE, DEFAULT_NAMESPACE};
use shadow_rs::shadow;

shadow!(build);

#[derive(Parser)]
#[command(name = "certmanager-op")]
#[command(about = "cert-manager RBAC Operator CLI", long_about = None)]
#[command(version = build::PKG_VERSION, long_version = build::CLAP_LONG_VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Output CRDs in YAML
    Crd {
        /// Optional output path. If not set, the output will be written to stdout.
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Output the cert-manager RBAC objects in YAML
    Render {
        /// Namespace the cert-manager components run in
        #[arg(
            short,
            long,
            env = "CERT_MANAGER_NAMESPACE",
            default_value = DEFAULT_NAMESPACE,
            value_parser = NonEmptyStringValueParser::new()
        )]
        namespace: String,

        /// Namespace holding the leader election leases
        #[arg(
            long,
            default_value = DEFAULT_LEADER_ELECTION_NAMESPACE,
            value_parser = NonEmptyStringValueParser::new()
        )]
        leader_election_namespace: String,

        /// Extra label added to every object, as key=value. May be repeated.
        #[arg(short, long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,

        /// Optional output path. If not set, the output will be written to stdout.
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Run the controller
    Server {},
}

fn parse_label(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("invalid label '{}', expected key=value", s)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crd { file } => operator::crd(file).await?,
        Commands::Render {
            namespace,
            leader_election_namespace,
            labels,
            file,
        } => {
            let bundle =
                Bundle::new(namespace).with_leader_election_namespace(leader_election_namespace);
            operator::render(bundle, labels.into_iter().collect(), file).await?
        }
        Commands::Server {} => {
            operator::init_tracing();
            operator::run().await?
        }
    }

    Ok(())
}
