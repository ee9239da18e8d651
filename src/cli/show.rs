use anyhow::{anyhow, Result};
use clap::Args;

use crate::config::Config;
use crate::db::Database;
use crate::models::{ConsolidatedIdentity, ContactId};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Id of any contact in the cluster
    pub id: ContactId,
}

/// Execute the show command
pub fn run_show(config: &Config, args: ShowArgs) -> Result<()> {
    let db = config.open_database()?;
    let identity = cluster_of(&db, args.id)?;
    println!("{}", serde_json::to_string_pretty(&identity)?);
    Ok(())
}

/// Consolidated view of the cluster containing `id`, read-only.
fn cluster_of(db: &Database, id: ContactId) -> Result<ConsolidatedIdentity> {
    let contact = db
        .get_contact_by_id(id)?
        .ok_or_else(|| anyhow!("No contact found with ID: {}", id))?;

    let primary_id = contact
        .primary_id()
        .ok_or_else(|| anyhow!("Contact {} is a secondary with no linked primary", id))?;
    let cluster = db.list_cluster(primary_id)?;
    Ok(ConsolidatedIdentity::from_cluster(primary_id, &cluster))
}
