//! Bootstrap Command
//!
//! Drives the bootstrap protocol the way a field node does, for checking a
//! node's readiness before it ships.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use nodeinit_common::BootstrapResponse;

use crate::client::ApiClient;
use crate::output::{print_item, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct BootstrapArgs {
    /// Node identifier
    pub node: String,
}

#[derive(Serialize)]
pub struct BootstrapDisplay {
    pub organization: String,
    pub ip: String,
    pub certificate: String,
}

impl From<BootstrapResponse> for BootstrapDisplay {
    fn from(resp: BootstrapResponse) -> Self {
        Self {
            organization: resp.organization,
            ip: resp.ip,
            certificate: resp.certificate,
        }
    }
}

impl TableDisplay for BootstrapDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Organization", "IP", "Certificate"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.organization.clone(),
            self.ip.clone(),
            format!("{} base64 chars", self.certificate.len()),
        ]
    }
}

pub async fn execute(args: BootstrapArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    // The service canonicalizes; pass the identifier through as a node would.
    let resp = client.bootstrap(&args.node).await?;
    print_item(&BootstrapDisplay::from(resp), format);
    Ok(())
}
