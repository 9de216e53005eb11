use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

mod admin;
mod ingest;
mod search;

#[derive(Debug, Parser)]
#[command(name = "pricewatch-cli")]
#[command(about = "Pricewatch ingestion and product-grouping CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// Ingest a scraped snapshot file (JSON array of scraped items).
    Ingest {
        /// Path to the snapshot file.
        #[arg(long)]
        file: PathBuf,
        /// Delivery pincode the batch was scraped for.
        #[arg(long)]
        pincode: String,
        /// Batch timestamp (RFC 3339); defaults to now. One timestamp is
        /// applied to every record of the batch.
        #[arg(long)]
        scraped_at: Option<String>,
        /// Resolve and report without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },
    /// Merge a multi-platform listing file into unified products and print
    /// them as JSON (display-time merge; touches no persistent state).
    MergeSearch {
        /// JSON object mapping platform key to an array of listings.
        #[arg(long)]
        file: PathBuf,
    },
    /// List groups, largest first.
    Groups {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Move all members of --source into --target and dissolve the source.
    MergeGroups {
        #[arg(long)]
        source: Uuid,
        #[arg(long)]
        target: Uuid,
    },
    /// Remove one member from a group (deletes the group if emptied).
    RemoveMember {
        #[arg(long)]
        group: Uuid,
        #[arg(long)]
        platform: String,
        #[arg(long)]
        product_id: String,
    },
    /// Rename a group's primary display name.
    RenameGroup {
        #[arg(long)]
        group: Uuid,
        #[arg(long)]
        name: String,
    },
    /// Dissolve a group entirely; its members regroup on the next ingest.
    DeleteGroup {
        #[arg(long)]
        group: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate => admin::run_migrate().await,
        Commands::Ingest {
            file,
            pincode,
            scraped_at,
            dry_run,
        } => ingest::run_ingest(&file, &pincode, scraped_at.as_deref(), dry_run).await,
        Commands::MergeSearch { file } => search::run_merge_search(&file),
        Commands::Groups { limit } => admin::run_list_groups(limit).await,
        Commands::MergeGroups { source, target } => admin::run_merge_groups(source, target).await,
        Commands::RemoveMember {
            group,
            platform,
            product_id,
        } => admin::run_remove_member(group, &platform, &product_id).await,
        Commands::RenameGroup { group, name } => admin::run_rename_group(group, &name).await,
        Commands::DeleteGroup { group } => admin::run_delete_group(group).await,
    }
}
