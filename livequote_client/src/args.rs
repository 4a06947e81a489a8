//! Command-line arguments for the live quote client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::path::PathBuf;

use clap::Parser;
use livequote_store::ViewTab;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Feed server IP address (IPv4 or IPv6).
    #[clap(long, default_value = "127.0.0.1")]
    pub server_ip: String,

    /// Local UDP port to bind; 0 picks a free port.
    #[clap(long, default_value_t = 0)]
    pub listen_port: u16,

    /// Definition catalog as returned by the definitions service (JSON).
    #[clap(long)]
    pub catalog: String,

    /// File holding the favorites JSON array. Created on the first toggle.
    #[clap(long, default_value = "currencyFavorites.json")]
    pub favorites: PathBuf,

    /// Tab shown at startup.
    #[clap(long, value_enum, default_value_t = ViewTab::Currency)]
    pub tab: ViewTab,

    /// Optional JSON file overriding the instrument keys of each tab.
    #[clap(long)]
    pub tabs: Option<PathBuf>,

    /// Optional JSON object mapping instrument ids to display titles.
    #[clap(long)]
    pub titles: Option<PathBuf>,

    /// Minimum delay between two table redraws, in milliseconds.
    #[clap(long, default_value_t = 1000)]
    pub render_ms: u64,
}
