//! `serve`: run the identify endpoint over HTTP.

use anyhow::Result;
use clap::Args;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod server;
pub mod types;

pub use server::IdentifyServer;

use crate::config::Config;

/// Default port, matching the conventional `PORT` fallback.
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
}

impl ServeArgs {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn run_serve(config: &Config, args: &ServeArgs) -> Result<()> {
    let server = IdentifyServer::new(config)?;
    let shutdown = Arc::new(AtomicBool::new(false));

    ctrlc_handler(Arc::clone(&shutdown));

    println!("Press Ctrl+C to stop");
    server.start(&args.addr(), shutdown)
}

fn ctrlc_handler(shutdown: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("received Ctrl+C, shutting down");
        shutdown.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!("could not install Ctrl+C handler: {}", e);
    }
}
