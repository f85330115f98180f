use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rentals_core::{Category, SortDirection, SortKey};

#[derive(Parser)]
#[command(name = "rentals")]
#[command(about = "Browse and manage rental listings, online or off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local cache database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Listings API base URL (overrides RENTALS_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Work offline: queue every change locally without contacting the server
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List listings, optionally filtered and sorted
    #[command(alias = "ls")]
    List {
        /// Only show listings in this category
        #[arg(short, long, value_parser = parse_category)]
        category: Option<Category>,
        /// Sort field
        #[arg(long, value_enum)]
        sort: Option<SortField>,
        /// Sort order
        #[arg(long, value_enum, default_value_t = SortOrder::Asc)]
        order: SortOrder,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a listing
    #[command(alias = "new")]
    Add(AddArgs),
    /// Change fields of an existing listing
    #[command(alias = "edit")]
    Update(UpdateArgs),
    /// Delete a listing
    #[command(alias = "rm")]
    Delete {
        /// Listing ID
        id: String,
    },
    /// Probe the server and replay queued changes
    Sync,
    /// Show connectivity, pending changes, and a per-category summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add the demo catalogue one listing at a time
    Seed {
        /// Delay between listings, in milliseconds
        #[arg(long, default_value = "1000", value_name = "MS")]
        interval_ms: u64,
        /// Only add the first N demo listings
        #[arg(long, value_name = "N")]
        count: Option<usize>,
    },
    /// Keep probing the server and replay changes whenever it comes back
    Watch {
        /// Probe interval in seconds (overrides RENTALS_PROBE_INTERVAL_SECS)
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
        interval: Option<u64>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Listing title
    #[arg(long)]
    pub title: String,
    /// Listing category
    #[arg(long, value_parser = parse_category)]
    pub category: Category,
    /// Price per rental period (whole units)
    #[arg(long, allow_negative_numbers = true)]
    pub price: i64,
    /// Free-form description
    #[arg(long)]
    pub description: String,
    /// Owner name
    #[arg(long)]
    pub owner: String,
    /// Location
    #[arg(long)]
    pub location: String,
    /// Upload date as YYYY-MM-DD (defaults to today)
    #[arg(long, value_name = "DATE")]
    pub upload_date: Option<String>,
    /// Explicit listing ID (a UUID is generated when omitted)
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    /// Listing ID
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, value_parser = parse_category)]
    pub category: Option<Category>,
    #[arg(long, allow_negative_numbers = true)]
    pub price: Option<i64>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub owner: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long, value_name = "DATE")]
    pub upload_date: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SortField {
    Price,
    UploadDate,
}

impl From<SortField> for SortKey {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Price => Self::Price,
            SortField::UploadDate => Self::UploadDate,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<SortOrder> for SortDirection {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Self::Asc,
            SortOrder::Desc => Self::Desc,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn parse_category(value: &str) -> Result<Category, String> {
    value.parse().map_err(|error| format!("{error}"))
}
