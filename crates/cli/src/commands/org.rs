//! Organization Commands

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;

use nodeinit_common::{validate_org_name, OrgAddress, OrgResponse};

use crate::client::ApiClient;
use crate::output::{print_item, print_list, print_success, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum OrgCommands {
    /// List all organizations
    List,

    /// Show an organization's certificate and address
    Get {
        /// Organization name
        name: String,
    },

    /// Create or replace an organization's certificate and address
    Put {
        /// Organization name
        name: String,

        /// Certificate file
        #[arg(short, long)]
        cert: PathBuf,

        /// Organization address (IP or CIDR, e.g. 10.0.0.5 or 10.0.0.0/24)
        #[arg(short, long)]
        ip: String,
    },
}

/// Organization display wrapper for serialization
#[derive(Serialize)]
pub struct OrgDisplay {
    pub name: String,
    pub ip: String,
    pub certificate: String,
}

impl From<OrgResponse> for OrgDisplay {
    fn from(org: OrgResponse) -> Self {
        Self {
            name: org.org,
            ip: org.ip,
            certificate: org.certificate,
        }
    }
}

impl TableDisplay for OrgDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "IP", "Certificate"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), self.ip.clone(), abbreviate(&self.certificate)]
    }
}

#[derive(Serialize)]
pub struct OrgNameDisplay {
    pub name: String,
}

impl TableDisplay for OrgNameDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone()]
    }
}

/// Shorten long base64 certificates for table cells
fn abbreviate(encoded: &str) -> String {
    const KEEP: usize = 24;
    if encoded.len() <= KEEP {
        encoded.to_string()
    } else {
        format!("{}… ({} chars)", &encoded[..KEEP], encoded.len())
    }
}

pub async fn execute(cmd: OrgCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        OrgCommands::List => {
            let names = client.list_orgs().await?;
            let displays: Vec<OrgNameDisplay> =
                names.into_iter().map(|name| OrgNameDisplay { name }).collect();
            print_list(&displays, format);
        }

        OrgCommands::Get { name } => {
            let org = client.get_org(&name).await?;
            print_item(&OrgDisplay::from(org), format);
        }

        OrgCommands::Put { name, cert, ip } => {
            let name = validate_org_name(&name)?;
            OrgAddress::parse(&ip)?;
            let certificate = std::fs::read(&cert)
                .with_context(|| format!("Failed to read certificate {}", cert.display()))?;

            let org = client.upsert_org(&name, &certificate, &ip).await?;
            print_success(&format!("Organization '{}' saved", org.org));
            print_item(&OrgDisplay::from(org), format);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("Qw=="), "Qw==");
        let long = "A".repeat(100);
        assert_eq!(abbreviate(&long), format!("{}… (100 chars)", "A".repeat(24)));
    }
}
