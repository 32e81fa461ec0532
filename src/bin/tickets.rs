use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::Path;
use std::time::Duration;
use ticket_triage::domain::model::{NewTicket, Ticket, TicketFilter, TicketStatus};
use ticket_triage::domain::ports::TicketClassifier;
use ticket_triage::utils::{logger, validation::Validate};
use ticket_triage::{
    ClassifierService, HttpClassifierClient, LocalStorage, TicketStore, TriageConfig, TriageError,
};

#[derive(Parser)]
#[command(name = "tickets")]
#[command(about = "Submit support tickets and work through them")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override store.tickets_path from config
    #[arg(long)]
    tickets: Option<String>,

    /// Override store.classifier_url from config
    #[arg(long)]
    classifier_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a new ticket and classify it
    Submit {
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long)]
        text: String,

        /// Classify in-process with the local model artifacts instead of the API
        #[arg(long)]
        offline: bool,
    },
    /// List tickets, optionally filtered
    List {
        #[arg(long)]
        status: Option<TicketStatus>,

        #[arg(long)]
        category: Option<String>,
    },
    /// Show one ticket in full
    Show { id: u64 },
    /// Update status and admin response of a ticket
    Respond {
        id: u64,

        #[arg(long)]
        status: TicketStatus,

        #[arg(long, default_value = "")]
        response: String,
    },
    /// List known categories
    Categories,
}

fn open_store(tickets_path: &str) -> TicketStore<LocalStorage> {
    let path = Path::new(tickets_path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| ticket_triage::app::ticket_store::DEFAULT_TICKETS_FILE.to_string());

    TicketStore::with_file_name(LocalStorage::new(dir), file_name)
}

fn print_ticket(ticket: &Ticket) {
    println!("### Ticket #{}", ticket.id);
    println!("From:       {}", ticket.name);
    if !ticket.email.is_empty() {
        println!("Email:      {}", ticket.email);
    }
    println!("Time:       {}", ticket.timestamp);
    println!("Category:   {}", ticket.category);
    println!("Confidence: {:.1}%", ticket.confidence * 100.0);
    println!("Status:     {}", ticket.status);
    println!();
    if ticket.text.is_empty() {
        println!("(no ticket text)");
    } else {
        println!("{}", ticket.text);
    }
    if !ticket.admin_response.is_empty() {
        println!();
        println!("Response: {}", ticket.admin_response);
    }
}

/// 讀取設定檔並套用命令列覆寫
fn load_config(args: &Args) -> anyhow::Result<TriageConfig> {
    let mut config = TriageConfig::load(args.config.as_deref())
        .with_context(|| format!("loading config {:?}", args.config))?;
    if let Some(tickets) = &args.tickets {
        config.store.tickets_path = tickets.clone();
    }
    if let Some(url) = &args.classifier_url {
        config.store.classifier_url = url.clone();
    }
    Ok(config)
}

async fn run(command: Command, config: TriageConfig) -> anyhow::Result<()> {
    config.validate()?;

    let store = open_store(&config.store.tickets_path);

    match command {
        Command::Submit {
            name,
            email,
            text,
            offline,
        } => {
            let classifier: Box<dyn TicketClassifier> = if offline {
                tracing::info!("🔧 Classifying offline with local artifacts");
                Box::new(ClassifierService::load(&config.artifacts)?)
            } else {
                Box::new(HttpClassifierClient::new(
                    config.store.classifier_url.clone(),
                    Duration::from_secs(config.store.timeout_seconds),
                ))
            };

            let submission = store
                .submit(classifier.as_ref(), NewTicket { name, email, text })
                .await?;

            println!("✅ Ticket #{} submitted", submission.ticket.id);
            println!("Category:   {}", submission.ticket.category);
            println!(
                "Confidence: {:.1}%",
                submission.ticket.confidence * 100.0
            );
            if submission.spam {
                println!("⚠️  Marked as SPAM");
            }
        }
        Command::List { status, category } => {
            let new_count = store.new_count().await?;
            if new_count > 0 {
                println!("⚠️  {} new tickets", new_count);
            }

            let tickets = store.list(&TicketFilter { status, category }).await?;
            if tickets.is_empty() {
                println!("No tickets");
                return Ok(());
            }

            println!(
                "{:<5} {:<20} {:<16} {:<12} Response",
                "ID", "Name", "Category", "Status"
            );
            for t in tickets {
                println!(
                    "{:<5} {:<20} {:<16} {:<12} {}",
                    t.id,
                    t.name,
                    t.category,
                    t.status.as_str(),
                    t.response_preview()
                );
            }
        }
        Command::Show { id } => {
            let ticket = store.get(id).await?;
            print_ticket(&ticket);
        }
        Command::Respond {
            id,
            status,
            response,
        } => {
            let ticket = store.respond(id, status, response).await?;
            println!("✅ Ticket #{} saved with status {}", ticket.id, ticket.status);
        }
        Command::Categories => {
            for category in store.categories().await? {
                println!("{}", category);
            }
        }
    }

    Ok(())
}

fn exit_with(e: anyhow::Error) -> ! {
    match e.downcast_ref::<TriageError>() {
        Some(err) => {
            tracing::error!("❌ {} (Severity: {:?})", err, err.severity());
            eprintln!("❌ {}", err.user_friendly_message());
            std::process::exit(err.exit_code());
        }
        None => {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };

    // 初始化日誌
    logger::init_logger(args.verbose, &config.logging.level, config.logging.json);

    if let Err(e) = run(args.command, config).await {
        exit_with(e);
    }
}
