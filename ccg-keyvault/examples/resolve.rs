//! Resolve a gMSA credential from the command line.
//!
//! ```text
//! cargo run -p ccg-keyvault --example resolve -- \
//!     "keyVaultName=kv;clientId=<guid>;keyVaultSecret=gmsa;logFile=C:\ccg\ccg.log"
//! ```
//!
//! Only works on an Azure VM with the identity assigned. Set
//! `RUST_LOG=debug` for request-level diagnostics.

use ccg_keyvault::CredentialBroker;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let input = std::env::args()
        .nth(1)
        .ok_or("usage: resolve <plugin input>")?;

    let creds = CredentialBroker::new().get_password_credentials(&input)?;
    println!("domain:   {}", creds.domain_name());
    println!("username: {}", creds.username());
    println!("password: {}", creds.masked_password());
    Ok(())
}
