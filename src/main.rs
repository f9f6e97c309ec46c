use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use listing_store::models::display::{format_bedroom_label, format_currency_aed};
use listing_store::{
    connect, BackendKind, Property, PropertyQuery, PropertyStore, StoreConfig, VisibilityFilter,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "listing-store", about = "Manage property listings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List merged listings
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = Visibility::All)]
        visibility: Visibility,
        /// Only listings the public site shows
        #[arg(long)]
        public: bool,
    },
    /// Print one listing as JSON
    Show { id: String },
    /// Create or replace a listing from a JSON file
    Upsert { file: PathBuf },
    /// Delete a custom listing
    Remove { id: String },
    /// Hide a visible listing or show a hidden one
    Toggle { id: String },
    /// Listing counters
    Stats,
    /// Copy the built-in catalog into the configured backend
    Seed,
    /// Print the listing count every time it changes
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
enum Visibility {
    All,
    Visible,
    Hidden,
}

impl From<Visibility> for VisibilityFilter {
    fn from(value: Visibility) -> Self {
        match value {
            Visibility::All => VisibilityFilter::All,
            Visibility::Visible => VisibilityFilter::Visible,
            Visibility::Hidden => VisibilityFilter::Hidden,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = StoreConfig::from_env();
    let backend = connect(&config).context("Failed to set up property backend")?;
    let store = PropertyStore::open(backend).await;

    // Backend mode has nothing cached until the first fetch.
    if store.kind() == BackendKind::Remote {
        store.refresh().await;
    }

    match cli.command {
        Command::List {
            search,
            visibility,
            public,
        } => {
            let properties = if public {
                store.visible_listings()
            } else {
                store.query(&PropertyQuery {
                    search,
                    visibility: visibility.into(),
                })
            };
            print_listing(&properties);
        }
        Command::Show { id } => match store.find_by_id(&id) {
            Some(property) => println!("{}", serde_json::to_string_pretty(&property)?),
            None => bail!("No property with id {}", id),
        },
        Command::Upsert { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut property: Property =
                serde_json::from_str(&raw).context("Failed to parse property JSON")?;
            if property.id.trim().is_empty() {
                bail!("Property id must not be empty");
            }

            let previous = store.find_by_id(&property.id).filter(Property::is_custom);
            property.touch(previous.as_ref(), Utc::now());
            let id = property.id.clone();
            store.upsert(property).await.context("Failed to save property")?;
            info!("💾 Saved property {}", id);
        }
        Command::Remove { id } => {
            match store.find_by_id(&id) {
                Some(property) if property.is_custom() => {}
                Some(_) => bail!("{} is a built-in listing and cannot be deleted", id),
                None => bail!("No property with id {}", id),
            }
            store.remove(&id).await.context("Failed to delete property")?;
            info!("🗑️  Removed property {}", id);
        }
        Command::Toggle { id } => match store.toggle_visibility(&id).await? {
            Some(property) => info!(
                "{} is now {}",
                property.name,
                if property.visible { "visible" } else { "hidden" }
            ),
            None => bail!("No property with id {}", id),
        },
        Command::Stats => {
            let stats = store.stats();
            println!("Total:   {}", stats.total);
            println!("Visible: {}", stats.visible);
            println!("Hidden:  {}", stats.hidden);
            println!("Custom:  {}", stats.custom);
        }
        Command::Seed => {
            let count = store.seed_catalog().await.context("Failed to seed catalog")?;
            info!("✅ Seeded {} built-in properties into {} storage", count, store.kind());
        }
        Command::Watch => watch(store).await?,
    }

    Ok(())
}

async fn watch(store: Arc<PropertyStore>) -> anyhow::Result<()> {
    info!("Watching for listing changes, press Ctrl-C to stop");

    let observed = Arc::clone(&store);
    let subscription = store.subscribe(move || {
        let stats = observed.stats();
        info!(
            "Listings changed: {} total, {} visible, {} custom",
            stats.total, stats.visible, stats.custom
        );
    });

    tokio::signal::ctrl_c().await?;
    subscription.unsubscribe();
    Ok(())
}

fn print_listing(properties: &[Property]) {
    for (i, property) in properties.iter().enumerate() {
        println!("{}. {} ({})", i + 1, property.name, format_currency_aed(&property.price));
        println!(
            "   {}, {} baths, {} sqft",
            format_bedroom_label(property.bedrooms, property.maids_room.unwrap_or(false)),
            property.bathrooms,
            property.sqft
        );
        match &property.subcluster {
            Some(subcluster) => println!("   Area: {} / {}", property.neighborhood, subcluster),
            None => println!("   Area: {}", property.neighborhood),
        }
        println!("   ID: {}", property.id);
        println!(
            "   {}",
            property.availability.clone().unwrap_or_default().info().label
        );
        if !property.is_visible() {
            println!("   (hidden)");
        }
        println!();
    }
    info!("{} properties", properties.len());
}
