use clap::{Parser, Subcommand};
use evangelist::backend::http::HttpSuiteBackend;
use evangelist::config::ClientConfig;
use evangelist::gateway::ConfigPersistenceGateway;
use evangelist::invocation::{FieldPath, RenderedBody, render_request};
use evangelist::session::{EditorSession, NotificationLevel};
use evangelist::workflow::StepName;
use evangelist::workflow::columns::validate_columns;
use evangelist::workflow::loader::{load_config_from_json, write_config_to_json};
use evangelist::SuiteBackend;
use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{Result, anyhow};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides EVANGELIST_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the suite's current workflow configuration (or a fresh draft)
    Show {
        #[arg(long, short)]
        suite: Uuid,

        /// Also write the configuration to this file
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Ask the backend to set up the suite's workflow
    Init {
        #[arg(long, short)]
        suite: Uuid,
    },

    /// Test a single pipeline step
    Test {
        #[arg(long, short)]
        suite: Uuid,

        /// preprocessing | invocation | postprocessing | evaluation
        #[arg(long)]
        step: StepName,
    },

    /// Test every step in order, stopping at the first failure
    TestAll {
        #[arg(long, short)]
        suite: Uuid,
    },

    /// Save a configuration file as the suite's next version
    Save {
        #[arg(long, short)]
        suite: Uuid,

        /// Path to a `{"workflow": ...}` JSON document
        #[arg(long, short)]
        file: PathBuf,
    },

    /// Render the invocation request a dataset row would produce
    Preview {
        /// Path to a `{"workflow": ...}` JSON document
        #[arg(long, short)]
        file: PathBuf,

        /// Dataset row as JSON
        #[arg(long, short)]
        row: String,

        /// Send the request and apply the postprocessing field path
        #[arg(long)]
        send: bool,
    },
}

fn backend(api_url: Option<String>) -> Result<Arc<dyn SuiteBackend>> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = api_url {
        config = config.with_base_url(url);
    }
    info!("Using backend at {}", config.base_url);
    Ok(Arc::new(HttpSuiteBackend::new(config)?))
}

fn print_notifications(session: &EditorSession) {
    for note in session.notifications() {
        match note.level {
            NotificationLevel::Error => warn!("{}", note.message),
            _ => info!("{}", note.message),
        }
    }
}

fn print_statuses(session: &EditorSession) {
    for step in StepName::ALL {
        let run = session.run_of(step);
        match run.error {
            Some(error) => println!("{:<15} {:?}: {}", step, run.status, error),
            None => println!("{:<15} {:?}", step, run.status),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Show { suite, out } => {
            let backend = backend(cli.api_url)?;
            let session = EditorSession::open(backend.clone(), Some(suite)).await;
            print_notifications(&session);

            let draft = session.draft();
            if let Some(dataset_id) = session.suite().and_then(|s| s.dataset_id) {
                let preview = backend.dataset_preview(dataset_id, 5).await;
                match preview {
                    Ok(preview) => {
                        for issue in validate_columns(draft, &preview.columns) {
                            warn!("Column check: {:?}", issue);
                        }
                    }
                    Err(e) => warn!("Could not fetch dataset preview: {}", e),
                }
            }

            println!("{}", serde_json::to_string_pretty(&draft.clone().into_document())?);
            if let Some(path) = out {
                write_config_to_json(&path.to_string_lossy(), draft)?;
                info!("Wrote configuration to {}", path.display());
            }
        }

        Commands::Init { suite } => {
            let gateway = ConfigPersistenceGateway::new(backend(cli.api_url)?);
            gateway.initialize_remote(suite).await?;
            info!("Workflow initialized for suite {}", suite);
        }

        Commands::Test { suite, step } => {
            let mut session = EditorSession::open(backend(cli.api_url)?, Some(suite)).await;
            // A fresh session has nothing tested, so run the predecessors first
            for prev in StepName::ALL.into_iter().take(step.index()) {
                if session.test_step(prev).await.is_none() {
                    break;
                }
            }
            if let Some(result) = session.test_step(step).await {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            print_notifications(&session);
            print_statuses(&session);
        }

        Commands::TestAll { suite } => {
            let mut session = EditorSession::open(backend(cli.api_url)?, Some(suite)).await;
            let passed = session.test_all_steps().await.is_some();
            print_notifications(&session);
            print_statuses(&session);
            if !passed {
                return Err(anyhow!("workflow test failed"));
            }
        }

        Commands::Save { suite, file } => {
            let config = load_config_from_json(&file.to_string_lossy())?;
            let gateway = ConfigPersistenceGateway::new(backend(cli.api_url)?);
            let version = gateway.save(suite, &config).await?;
            println!("Saved version {}", version);
        }

        Commands::Preview { file, row, send } => {
            let config = load_config_from_json(&file.to_string_lossy())?;
            let row: serde_json::Value = serde_json::from_str(&row)?;
            let request = render_request(&config.steps.invocation.input, &row)?;

            println!("{:?} {}", request.method, request.url);
            for (key, value) in &request.headers {
                println!("{}: {}", key, value);
            }
            match &request.body {
                RenderedBody::None => {}
                RenderedBody::Json(map) => println!("{}", serde_json::to_string_pretty(map)?),
                RenderedBody::Form(pairs) => println!("{:?}", pairs),
            }

            if send {
                let client = reqwest::Client::new();
                let body = request.send(&client).await?;

                let path = FieldPath::parse(&config.steps.postprocessing.input.field)?;
                let output = path.extract(&body)?;
                println!("{}", serde_json::to_string_pretty(output)?);
            }
        }
    }

    Ok(())
}
