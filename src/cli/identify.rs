use anyhow::{anyhow, Result};
use clap::Args;

use crate::config::Config;
use crate::models::ConsolidatedIdentity;
use crate::reconcile::{IdentifyRequest, ReconcileError, Reconciler};

#[derive(Args, Debug)]
pub struct IdentifyArgs {
    #[arg(short, long)]
    pub email: Option<String>,
    #[arg(short, long)]
    pub phone: Option<String>,
}

/// Execute the identify command
pub fn run_identify(config: &Config, args: IdentifyArgs) -> Result<()> {
    let identity = identify(config, IdentifyRequest::new(args.email, args.phone))?;
    println!("{}", serde_json::to_string_pretty(&identity)?);
    Ok(())
}

fn identify(config: &Config, request: IdentifyRequest) -> Result<ConsolidatedIdentity> {
    // Validate first so bad input never opens or creates a database
    config.validation.validate(&request)?;

    let reconciler = Reconciler::new(config.open_database()?, config.validation);
    reconciler.resolve(&request).map_err(|e| match e {
        ReconcileError::Validation(v) => anyhow!(v),
        ReconcileError::Store(_) => {
            tracing::error!("identify failed: {}", e);
            anyhow!(e.public_message())
        }
    })
}
