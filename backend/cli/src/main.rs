mod app;
mod config;
mod controls;
mod prompt;
mod terminal_output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};

use pricesnap_core::{FixedLocation, GeoPosition, LocationSource, NoLocation, RecordDraft};
use pricesnap_media::{parse_data_url, ImagePayload};
use pricesnap_store::{HistoryFilter, HistorySummary, JsonFileSlot, RecordStore, SaveStatus};
use pricesnap_understanding::create_provider;

use app::{AddOutcome, App};
use config::Settings;
use terminal_output::{
    format_price, note_error, note_info, note_success, note_warn, render_records, render_summary,
    Note,
};

#[derive(Parser)]
#[command(name = "pricesnap")]
#[command(about = "PriceSnap: photograph price tags, keep a purchase history, ask about it")]
#[command(version)]
struct Cli {
    /// Configuration directory (defaults to $PRICESNAP_CONFIG_DIR or ~/.pricesnap)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Copy)]
struct LocationArgs {
    /// Latitude to attach to the record
    #[arg(long, allow_negative_numbers = true, requires = "lon")]
    lat: Option<f64>,
    /// Longitude to attach to the record
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    lon: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a product and price from a photo, review it, and save it
    Scan {
        /// Photo of a receipt or price tag
        image: PathBuf,
        /// Override the extracted product name
        #[arg(long)]
        name: Option<String>,
        /// Override the extracted price
        #[arg(long, allow_negative_numbers = true)]
        price: Option<f64>,
        #[command(flatten)]
        location: LocationArgs,
        /// Save without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Add a record by hand
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        price: f64,
        /// Optional photo, stored downscaled with the record
        #[arg(long)]
        image: Option<PathBuf>,
        #[command(flatten)]
        location: LocationArgs,
    },
    /// List the purchase history, newest first
    List {
        /// Case-insensitive product name search
        #[arg(short, long)]
        search: Option<String>,
        /// Only records from this day (YYYY-MM-DD, UTC)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one record in full
    Show { id: String },
    /// Delete a record
    Delete { id: String },
    /// Ask a question about your purchase history
    Ask {
        #[arg(trailing_var_arg = true)]
        query: Vec<String>,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Write a starter config.yaml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        note_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_dir = cli.config_dir.unwrap_or_else(pricesnap_config::config_dir);
    let settings = Settings::load(config_dir).await?;

    pricesnap_logging::init_logger(settings.log_dir(), settings.log_level(), settings.json_logs());
    debug!(config_dir = %settings.config_dir.display(), "Settings loaded");
    // Validation ran before the subscriber existed; replay its warnings.
    for warning in pricesnap_config::validate(&settings.config).warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }

    let mut app = build_app(&settings)?;

    match cli.command {
        Commands::Scan { image, name, price, location, yes } => {
            let payload = ImagePayload::from_path(&image).await?;
            note_info(&format!("Reading {}...", payload.source));
            let proposal = app.propose_from_image(&payload).await?;
            info!(width = proposal.width, height = proposal.height, "Image preprocessed");

            let mut draft = proposal.draft;
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(price) = price {
                draft.price = price;
            }
            note_info(&format!("Found \"{}\" at {}", draft.name, format_price(draft.price)));

            let draft = if yes {
                draft
            } else {
                let stdin = std::io::stdin();
                let mut input = stdin.lock();
                let mut output = std::io::stdout();
                match prompt::review_draft(draft, &mut input, &mut output)? {
                    Some(draft) => draft,
                    None => {
                        note_info("Discarded; nothing saved.");
                        return Ok(());
                    }
                }
            };
            confirm_and_report(&mut app, draft, location_source(location, &settings)?.as_ref())
        }
        Commands::Add { name, price, image, location } => {
            let mut draft = RecordDraft::new(name, price);
            if let Some(path) = image {
                let payload = ImagePayload::from_path(&path).await?;
                let processed = payload.preprocess(settings.preprocess_options()).await?;
                draft = draft.with_image_url(processed.to_data_url());
            }
            confirm_and_report(&mut app, draft, location_source(location, &settings)?.as_ref())
        }
        Commands::List { search, date, json } => {
            let mut filter = HistoryFilter::new();
            if let Some(search) = search {
                filter = filter.with_search(search);
            }
            if let Some(date) = date {
                filter = filter.with_date(date);
            }
            let view = app.view(&filter);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else if app.records().is_empty() {
                note_info("No records yet. Add one with `pricesnap scan <image>`.");
            } else {
                print!("{}", render_records(&view));
                println!("{}", render_summary(&HistorySummary::of(&view)));
            }
            Ok(())
        }
        Commands::Show { id } => {
            let record = app
                .get(&id)
                .ok_or_else(|| pricesnap_core::SnapError::NotFound(id.clone()))?;
            println!("ID:       {}", record.id);
            println!("Product:  {}", record.name);
            println!("Price:    {}", format_price(record.price));
            println!("Date:     {}", record.date.to_rfc3339());
            match record.location {
                Some(l) => println!("Location: {:.6}, {:.6}", l.latitude, l.longitude),
                None => println!("Location: -"),
            }
            match parse_data_url(&record.image_url) {
                Some((mime, bytes)) => println!("Image:    {mime}, {} bytes", bytes.len()),
                None => println!("Image:    -"),
            }
            Ok(())
        }
        Commands::Delete { id } => {
            let (removed, status) = app.delete(&id)?;
            note_success(&format!("Deleted \"{}\"", removed.name));
            if let Some(note) = save_notes(&status) {
                note.print();
            }
            Ok(())
        }
        Commands::Ask { query } => {
            let query = query.join(" ");
            match app.ask(&query).await? {
                Some(answer) => println!("{answer}"),
                None => note_info("Nothing to ask."),
            }
            Ok(())
        }
        Commands::Config { action } => run_config(&settings, action).await,
    }
}

fn build_app(settings: &Settings) -> Result<App<JsonFileSlot>> {
    let store = RecordStore::load(JsonFileSlot::new(settings.storage_path()));
    let provider = match settings.provider_settings()? {
        Some(provider_settings) => Some(create_provider(&provider_settings)?),
        None => {
            debug!("No inference API key configured");
            None
        }
    };
    Ok(App::new(store, provider, settings.preprocess_options()))
}

/// Flags win over the configured default; without either, geolocation is unavailable.
fn location_source(args: LocationArgs, settings: &Settings) -> Result<Box<dyn LocationSource>> {
    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        return Ok(Box::new(FixedLocation(GeoPosition::new(lat, lon)?)));
    }
    Ok(match settings.default_location() {
        Some(position) => Box::new(FixedLocation(position)),
        None => Box::new(NoLocation),
    })
}

fn confirm_and_report(
    app: &mut App<JsonFileSlot>,
    draft: RecordDraft,
    location: &dyn LocationSource,
) -> Result<()> {
    let outcome = app.confirm(draft, location)?;
    for note in add_outcome_notes(&outcome) {
        note.print();
    }
    Ok(())
}

fn add_outcome_notes(outcome: &AddOutcome) -> Vec<Note> {
    let mut notes = vec![Note::Success(format!(
        "Saved \"{}\" at {} ({})",
        outcome.record.name,
        format_price(outcome.record.price),
        outcome.record.id
    ))];
    if let Some(warning) = &outcome.location_warning {
        notes.push(Note::Warn(format!("Saved without location: {warning}")));
    }
    notes.extend(save_notes(&outcome.save_status));
    notes
}

fn save_notes(status: &SaveStatus) -> Option<Note> {
    status.warning().map(|warning| Note::Warn(warning.to_string()))
}

async fn run_config(settings: &Settings, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let value = serde_json::to_value(&settings.config)?;
            println!("{}", serde_json::to_string_pretty(&pricesnap_config::redact(&value))?);
        }
        ConfigAction::Init { force } => {
            let path = pricesnap_config::config_file_path(&settings.config_dir);
            if path.exists() && !force {
                note_warn(&format!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                ));
                return Ok(());
            }
            let mut starter = pricesnap_config::PriceSnapConfig::default();
            starter.inference.provider = Some(pricesnap_config::defaults::DEFAULT_PROVIDER.into());
            starter.image.max_dimension = Some(pricesnap_config::defaults::DEFAULT_MAX_DIMENSION);
            starter.image.quality = Some(pricesnap_config::defaults::DEFAULT_JPEG_QUALITY);
            pricesnap_config::write_config(&starter, &path)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            note_success(&format!("Wrote {}", path.display()));
            note_info("Set GEMINI_API_KEY (or inference.apiKey) before scanning.");
        }
    }
    Ok(())
}
