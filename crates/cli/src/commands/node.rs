//! Node Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use nodeinit_common::{NodeCredentialsResponse, NodeId};

use crate::client::ApiClient;
use crate::output::{print_item, print_success, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum NodeCommands {
    /// Assign a node to an organization, replacing any previous owner
    Map {
        /// Node identifier, e.g. uk-sa2341-hnode-a1-0001
        node: String,

        /// Owning organization
        #[arg(short, long)]
        org: String,
    },

    /// Show the organization credentials a node resolves to
    Get {
        /// Node identifier
        node: String,

        /// Only succeed if the node belongs to this organization
        #[arg(short, long)]
        org: Option<String>,
    },
}

/// Node display wrapper for serialization
#[derive(Serialize)]
pub struct NodeDisplay {
    pub node: String,
    pub node_type: String,
    pub org: String,
    pub ip: String,
}

impl NodeDisplay {
    fn new(node: &NodeId, creds: NodeCredentialsResponse) -> Self {
        Self {
            node: node.to_string(),
            node_type: node.node_type().as_str().to_string(),
            org: creds.org,
            ip: creds.ip,
        }
    }
}

impl TableDisplay for NodeDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Node", "Type", "Org", "IP"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.node.clone(),
            self.node_type.clone(),
            self.org.clone(),
            self.ip.clone(),
        ]
    }
}

pub async fn execute(cmd: NodeCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        NodeCommands::Map { node, org } => {
            let node = NodeId::canonicalize(&node)?;
            let mapping = client.map_node(&node, &org).await?;
            print_success(&format!("Node {} mapped to '{}'", mapping.node, mapping.org));
        }

        NodeCommands::Get { node, org } => {
            let node = NodeId::canonicalize(&node)?;
            let creds = client.get_node(&node, org.as_deref()).await?;
            print_item(&NodeDisplay::new(&node, creds), format);
        }
    }

    Ok(())
}
