use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod clear;
pub mod identify;
pub mod serve;
pub mod show;

pub use clear::run_clear;
pub use identify::{run_identify, IdentifyArgs};
pub use serve::{run_serve, ServeArgs};
pub use show::{run_show, ShowArgs};

use crate::reconcile::ValidationPolicy;

#[derive(Parser, Debug)]
#[command(name = "contactlink")]
#[command(about = "Reconcile contact records into consolidated identities")]
#[command(version)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "CONTACTLINK_DB", value_name = "PATH")]
    pub db: Option<PathBuf>,
    /// How strictly email and phone formats are checked
    #[arg(long, global = true, value_enum, default_value_t = ValidationPolicy::Strict)]
    pub validation: ValidationPolicy,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve POST /identify over HTTP
    Serve(ServeArgs),
    /// Resolve one email/phone pair and print the identity
    Identify(IdentifyArgs),
    /// Print the identity containing a contact id
    Show(ShowArgs),
    /// Delete every stored contact
    Clear,
}
