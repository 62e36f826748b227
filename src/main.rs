//! Operator CLI for the mail-triage backend.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use mail_triage::config::AppConfig;
use mail_triage::db::Database;
use mail_triage::export;
use mail_triage::formatters::{
    chart_date, datetime_local_to_iso, display_date_time, location_short,
};
use mail_triage::inbound::InboundPayload;
use mail_triage::locations::LocationClient;
use mail_triage::logging::{init_logging, OperationTimer};
use mail_triage::metrics::MetricsCollector;
use mail_triage::models::{
    EmailFilter, LocationUpdate, NewEmailRecord, NewProfile, Role,
};
use mail_triage::repository::SqliteEmailRepository;
use mail_triage::service::{EmailService, ProfileService};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an inbound webhook payload (JSON from file or stdin)
    Ingest {
        /// Path to the payload file; stdin when omitted
        #[arg(short, long)]
        payload: Option<PathBuf>,
    },
    /// List email records
    List {
        /// Only unclassified records
        #[arg(long)]
        pending: bool,

        /// Case-insensitive search over sender, recipient and subject
        #[arg(short, long)]
        search: Option<String>,

        /// Date filter (YYYY-MM-DD prefix of the send timestamp)
        #[arg(short, long)]
        date: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one email record
    Show {
        /// Record id
        #[arg(short, long)]
        id: String,
    },
    /// Enter an email manually (requires a location; stored classified)
    New {
        /// Sender address
        #[arg(long)]
        sender: String,

        /// Recipient address(es), comma-separated
        #[arg(long)]
        recipient: String,

        /// Subject line
        #[arg(long)]
        subject: String,

        /// Body text
        #[arg(long)]
        body: Option<String>,

        /// Send date-time (YYYY-MM-DDTHH:MM)
        #[arg(long)]
        sent_at: String,

        /// State code (UF)
        #[arg(long)]
        uf: String,

        /// Municipality name
        #[arg(long)]
        municipality: String,

        /// Creating operator's profile id
        #[arg(long)]
        creator: Option<String>,
    },
    /// Assign or correct the location of one record
    Classify {
        /// Record id
        #[arg(short, long)]
        id: String,

        /// State code (UF)
        #[arg(long)]
        uf: String,

        /// Municipality name
        #[arg(long)]
        municipality: String,
    },
    /// Apply a batch of classification edits from a JSON file
    ClassifyBatch {
        /// Path to a JSON array of {id, state_code, municipality}
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete one record (immediate, no soft-delete)
    Delete {
        /// Record id
        #[arg(short, long)]
        id: String,
    },
    /// Print dashboard statistics
    Stats,
    /// Export records as CSV
    Export {
        /// Only unclassified records
        #[arg(long)]
        pending: bool,

        /// Case-insensitive search over sender, recipient and subject
        #[arg(short, long)]
        search: Option<String>,

        /// Date filter (YYYY-MM-DD prefix of the send timestamp)
        #[arg(short, long)]
        date: Option<String>,

        /// Output file; defaults into the configured export directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List states from the reference API
    States,
    /// List municipalities of one state from the reference API
    Municipalities {
        /// State code (UF)
        #[arg(long)]
        uf: String,
    },
    /// Persist a reference-data snapshot into the local store
    SyncLocations {
        /// State codes to sync municipalities for; all states when omitted
        #[arg(long)]
        uf: Vec<String>,
    },
    /// Manage operator profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Register a profile
    Add {
        /// External identity id
        #[arg(long)]
        id: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Account email
        #[arg(long)]
        email: String,

        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
    /// Show a profile
    Show {
        /// Profile id
        #[arg(long)]
        id: String,
    },
    /// Edit a profile
    Set {
        /// Profile id
        #[arg(long)]
        id: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New account email
        #[arg(long)]
        email: Option<String>,

        /// New role (admin | collaborator)
        #[arg(long)]
        role: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; the guard must outlive the process
    let _guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(std::path::Path::new),
    )?;

    info!("Starting mail-triage");

    let cli = Cli::parse();

    let database = Database::new(&config.get_database_url())?;
    let emails = EmailService::new(Box::new(SqliteEmailRepository::new(database.clone())));

    match cli.command {
        Commands::Ingest { payload } => ingest(&config, &emails, payload).await?,
        Commands::List {
            pending,
            search,
            date,
            json,
        } => list(&emails, pending, search, date, json).await?,
        Commands::Show { id } => show(&emails, &id).await?,
        Commands::New {
            sender,
            recipient,
            subject,
            body,
            sent_at,
            uf,
            municipality,
            creator,
        } => {
            let record = emails
                .create_manual(NewEmailRecord {
                    sender,
                    recipient,
                    subject,
                    body,
                    sent_at: datetime_local_to_iso(&sent_at),
                    state_code: Some(uf),
                    municipality: Some(municipality),
                    classified: true,
                    created_by: creator,
                })
                .await?;
            println!("Created email {}", record.id);
        }
        Commands::Classify { id, uf, municipality } => {
            let record = emails.classify(&id, &uf, &municipality).await?;
            println!(
                "Classified {} as {}",
                record.id,
                location_short(record.state_code.as_deref(), record.municipality.as_deref())
            );
        }
        Commands::ClassifyBatch { file } => classify_batch(&emails, &file).await?,
        Commands::Delete { id } => {
            emails.delete(&id).await?;
            println!("Deleted email {id}");
        }
        Commands::Stats => print_stats(&emails).await?,
        Commands::Export {
            pending,
            search,
            date,
            output,
        } => export_csv(&config, &emails, pending, search, date, output).await?,
        Commands::States => {
            let client = location_client(&config)?;
            for state in client.states().await? {
                println!("{}  {}", state.sigla, state.nome);
            }
        }
        Commands::Municipalities { uf } => {
            let client = location_client(&config)?;
            for municipality in client.municipalities(&uf).await? {
                println!("{}", municipality.nome);
            }
        }
        Commands::SyncLocations { uf } => sync_locations(&config, &database, uf).await?,
        Commands::Profile { action } => profile_command(&database, action)?,
    }

    Ok(())
}

fn location_client(config: &AppConfig) -> Result<LocationClient> {
    Ok(LocationClient::new(
        &config.reference.base_url,
        Duration::from_secs(config.reference.timeout_secs),
    )?)
}

/// Store an inbound webhook payload
async fn ingest(config: &AppConfig, emails: &EmailService, payload: Option<PathBuf>) -> Result<()> {
    let raw = match payload {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read payload file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let payload: InboundPayload =
        serde_json::from_str(&raw).context("Payload is not valid JSON")?;

    let record = emails.ingest(&payload, &config.inbound.system_address).await?;
    println!("Stored inbound email {}", record.id);

    Ok(())
}

/// List email records
async fn list(
    emails: &EmailService,
    pending: bool,
    search: Option<String>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let filter = EmailFilter { search, date };
    let records = if pending {
        emails.list_pending(&filter).await?
    } else {
        emails.list(&filter).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    info!("Found {} records", records.len());
    for record in &records {
        println!(
            "{}  {}  {}  {}  {}",
            record.id,
            display_date_time(&record.sent_at),
            record.sender,
            record.subject,
            location_short(record.state_code.as_deref(), record.municipality.as_deref()),
        );
    }

    Ok(())
}

/// Show one email record
async fn show(emails: &EmailService, id: &str) -> Result<()> {
    let Some(record) = emails.get(id).await? else {
        warn!(email_id = %id, "record not found");
        println!("Email {id} not found");
        return Ok(());
    };

    println!("Id:         {}", record.id);
    println!("Sender:     {}", record.sender);
    println!("Recipient:  {}", record.recipient);
    println!("Subject:    {}", record.subject);
    println!("Sent at:    {}", display_date_time(&record.sent_at));
    println!(
        "Location:   {}",
        location_short(record.state_code.as_deref(), record.municipality.as_deref())
    );
    println!("Classified: {}", if record.classified { "yes" } else { "no" });
    if let Some(creator) = &record.created_by {
        println!("Created by: {creator}");
    }
    if let Some(body) = &record.body {
        println!("\n{body}");
    }

    Ok(())
}

/// Apply a batch of classification edits from a JSON file
async fn classify_batch(emails: &EmailService, file: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read batch file {}", file.display()))?;
    let updates: Vec<LocationUpdate> =
        serde_json::from_str(&raw).context("Batch file is not a JSON array of updates")?;

    let total = updates.len();
    let outcome = emails.save_pending(updates).await?;

    println!(
        "Applied {} of {} updates ({} skipped as incomplete)",
        outcome.applied.len(),
        total,
        total - outcome.applied.len() - outcome.failed.len(),
    );
    for (id, message) in &outcome.failed {
        println!("  failed {id}: {message}");
    }

    Ok(())
}

/// Print dashboard statistics
async fn print_stats(emails: &EmailService) -> Result<()> {
    let timer = OperationTimer::new("dashboard-stats");

    let stats = emails.stats().await?;
    println!("Total:      {}", stats.total);
    println!("Classified: {}", stats.classified);
    println!("Pending:    {}", stats.pending);

    let by_state = emails.counts_by_state().await?;
    if !by_state.is_empty() {
        println!("\nBy state:");
        for entry in &by_state {
            println!("  {}  {}", entry.state_code, entry.count);
        }
    }

    let top = emails.top_recipients().await?;
    if !top.is_empty() {
        println!("\nTop recipients:");
        for entry in &top {
            println!("  {}  {}", entry.address, entry.count);
        }
    }

    println!("\nLast 7 days:");
    for point in emails.trend().await? {
        println!("  {}  {}", chart_date(&point.date), point.count);
    }

    timer.finish();
    Ok(())
}

/// Export records as CSV
async fn export_csv(
    config: &AppConfig,
    emails: &EmailService,
    pending: bool,
    search: Option<String>,
    date: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let filter = EmailFilter { search, date };
    let records = if pending {
        emails.list_pending(&filter).await?
    } else {
        emails.list(&filter).await?
    };

    let path = output.unwrap_or_else(|| {
        let name = if pending { "emails_pendentes.csv" } else { "emails.csv" };
        PathBuf::from(&config.export.output_directory).join(name)
    });

    export::export_to_path(&records, &path)?;
    MetricsCollector::default().record_export(records.len());

    println!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

/// Persist a reference-data snapshot into the local store
async fn sync_locations(config: &AppConfig, database: &Database, ufs: Vec<String>) -> Result<()> {
    let client = location_client(config)?;

    let states = client.states().await?;
    database.replace_states(&states)?;
    println!("Synced {} states", states.len());

    let targets: Vec<String> = if ufs.is_empty() {
        states.iter().map(|state| state.sigla.clone()).collect()
    } else {
        ufs
    };

    for uf in &targets {
        let municipalities = client.municipalities(uf).await?;
        database.replace_municipalities(uf, &municipalities)?;
        println!("Synced {} municipalities for {uf}", municipalities.len());
    }

    Ok(())
}

/// Manage operator profiles
fn profile_command(database: &Database, action: ProfileAction) -> Result<()> {
    let profiles = ProfileService::new(database.clone());

    match action {
        ProfileAction::Add { id, name, email, admin } => {
            let profile = profiles.create(NewProfile {
                id,
                name,
                email,
                role: if admin { Role::Admin } else { Role::Collaborator },
            })?;
            println!("Created profile {} ({})", profile.id, profile.role.as_str());
        }
        ProfileAction::Show { id } => match profiles.get(&id)? {
            Some(profile) => {
                println!("Id:    {}", profile.id);
                println!("Name:  {}", profile.name);
                println!("Email: {}", profile.email);
                println!("Role:  {}", profile.role.as_str());
            }
            None => println!("Profile {id} not found"),
        },
        ProfileAction::Set { id, name, email, role } => {
            let role = match role.as_deref() {
                Some(value) => Some(
                    Role::parse(value)
                        .with_context(|| format!("Unknown role: {value}"))?,
                ),
                None => None,
            };
            let profile = profiles.update(&id, name.as_deref(), email.as_deref(), role)?;
            println!("Updated profile {}", profile.id);
        }
    }

    Ok(())
}
