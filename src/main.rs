use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use funnelctl::config::Config;
use funnelctl::funnel::http::format_api_error;
use funnelctl::funnel::FunnelClient;
use funnelctl::mapping::model;
use funnelctl::resource::export::{self, AnyExport, ExportKind};
use funnelctl::resource::{data_source, export_field, workspace};
use funnelctl::FunnelError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage Funnel workspaces, data sources and exports
#[derive(Parser, Debug)]
#[command(name = "funnelctl", version = funnelctl::VERSION, about, long_about = None)]
struct Args {
    /// Config file (defaults to <config dir>/funnelctl/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Funnel environment: us, eu, stage, dev or a control-plane URL
    #[arg(long, global = true)]
    environment: Option<String>,

    /// Subscription ID, e.g. fsXXXXXXXXXXX
    #[arg(long, global = true)]
    subscription_id: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Subscription workspaces
    #[command(subcommand)]
    Workspace(WorkspaceCommand),
    /// Data exports
    #[command(subcommand)]
    Export(ExportCommand),
    /// Workspace data sources
    #[command(subcommand)]
    DataSource(DataSourceCommand),
    /// Field lookup
    #[command(subcommand)]
    Field(FieldCommand),
}

#[derive(Subcommand, Debug)]
enum WorkspaceCommand {
    List,
    Get { id: String },
    Create { name: String },
    Rename { id: String, name: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum ExportCommand {
    /// Create the export in FILE, or update it when the file carries an id
    Apply { file: PathBuf },
    /// Read an export given as <workspace_id>/<export_id>
    Get { kind: ExportKind, id: String },
    Delete { kind: ExportKind, id: String },
    /// Print the payload FILE would send, without calling the API
    Render { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum DataSourceCommand {
    Apply { file: PathBuf },
    Get { workspace: String, id: String },
    Delete { workspace: String, id: String },
}

#[derive(Subcommand, Debug)]
enum FieldCommand {
    Get {
        workspace: String,
        id: String,
        /// Column name in the export (defaults to the field name)
        #[arg(long)]
        export_name: Option<String>,
        /// Column type in the export
        #[arg(long)]
        export_type: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("funnelctl {} started with log level: {:?}", funnelctl::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("funnelctl").join("funnelctl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".funnelctl").join("funnelctl.log");
    }
    PathBuf::from("funnelctl.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    // Rendering is offline
    if let Command::Export(ExportCommand::Render { file }) = &args.command {
        let export: AnyExport = read_resource_file(file)?;
        return print(&export.render()?);
    }

    let client = connect(&args).await?;

    match args.command {
        Command::Workspace(command) => run_workspace(&client, command).await,
        Command::Export(command) => run_export(&client, command).await,
        Command::DataSource(command) => run_data_source(&client, command).await,
        Command::Field(command) => run_field(&client, command).await,
    }
}

async fn connect(args: &Args) -> Result<FunnelClient> {
    let mut config = Config::load(args.config.as_deref())?.with_env();
    if let Some(environment) = &args.environment {
        config.environment = Some(environment.clone());
    }
    if let Some(subscription_id) = &args.subscription_id {
        config.subscription_id = Some(subscription_id.clone());
    }

    let settings = config.resolve()?;
    tracing::debug!("Resolved settings: {:?}", settings);

    FunnelClient::connect(&settings)
        .await
        .context("Could not authenticate with Funnel")
}

async fn run_workspace(client: &FunnelClient, command: WorkspaceCommand) -> Result<()> {
    match command {
        WorkspaceCommand::List => {
            let workspaces = workspace::list_workspaces(client)
                .await
                .map_err(api_error)
                .context("Unable to read workspaces")?;
            print(&workspaces)
        }
        WorkspaceCommand::Get { id } => {
            let found = workspace::read_workspace(client, &id)
                .await
                .map_err(api_error)
                .with_context(|| format!("Could not read workspace ID {}", id))?;
            print_found(found, "workspace", &id)
        }
        WorkspaceCommand::Create { name } => {
            let requested = model::Workspace {
                id: None,
                name: Some(name),
            };
            let created = workspace::create_workspace(client, &requested)
                .await
                .map_err(|e| match e {
                    FunnelError::Forbidden { details } => anyhow!(
                        "Workspace limit reached: workspace could not be created because your subscription has reached its workspace limit: {}",
                        details
                    ),
                    other => api_error(other),
                })
                .context("Could not create workspace")?;
            print(&created)
        }
        WorkspaceCommand::Rename { id, name } => {
            let renamed = model::Workspace {
                id: Some(id.clone()),
                name: Some(name),
            };
            let updated = workspace::update_workspace(client, &renamed)
                .await
                .map_err(api_error)
                .with_context(|| format!("Could not update workspace ID {}", id))?;
            print(&updated)
        }
        WorkspaceCommand::Delete { id } => {
            workspace::delete_workspace(client, &id)
                .await
                .map_err(api_error)
                .with_context(|| format!("Could not delete workspace ID {}", id))?;
            println!("Deleted workspace {}", id);
            Ok(())
        }
    }
}

async fn run_export(client: &FunnelClient, command: ExportCommand) -> Result<()> {
    match command {
        ExportCommand::Apply { file } => {
            let requested: AnyExport = read_resource_file(&file)?;
            let creating = requested.shared().id.is_none();
            let applied = requested.apply(client).await.map_err(|e| match e {
                FunnelError::Conflict { details } if creating => anyhow!(
                    "Export in the same workspace with same destination configuration already exists: {}",
                    details
                ),
                other => api_error(other),
            });
            let applied = if creating {
                applied.context("Could not create export")?
            } else {
                applied.context("Could not update export")?
            };
            print(&applied)
        }
        ExportCommand::Get { kind, id } => {
            let found = kind
                .import(client, &id)
                .await
                .map_err(api_error)
                .with_context(|| format!("Could not read export {}", id))?;
            print(&found)
        }
        ExportCommand::Delete { kind, id } => {
            let (workspace, export_id) = export::parse_import_id(&id)?;
            // Refuse to delete an export of another destination
            if kind
                .read(client, workspace, export_id)
                .await
                .map_err(api_error)
                .with_context(|| format!("Could not read export {}", id))?
                .is_none()
            {
                println!("Export {} does not exist", id);
                return Ok(());
            }
            export::delete_export(client, workspace, export_id)
                .await
                .map_err(api_error)
                .with_context(|| format!("Could not delete export {}", id))?;
            println!("Deleted export {}", id);
            Ok(())
        }
        ExportCommand::Render { file } => {
            let export: AnyExport = read_resource_file(&file)?;
            print(&export.render()?)
        }
    }
}

async fn run_data_source(client: &FunnelClient, command: DataSourceCommand) -> Result<()> {
    match command {
        DataSourceCommand::Apply { file } => {
            let requested: model::DataSource = read_resource_file(&file)?;
            let applied = if requested.id.is_none() {
                data_source::create_data_source(client, &requested)
                    .await
                    .map_err(|e| match e {
                        FunnelError::Conflict { details } => anyhow!(
                            "Data source already exists: a data source with the same configuration already exists: {}",
                            details
                        ),
                        other => api_error(other),
                    })
                    .context("Could not create data source")?
            } else {
                data_source::update_data_source(client, &requested)
                    .await
                    .map_err(api_error)
                    .context("Could not update data source")?
            };
            print(&applied)
        }
        DataSourceCommand::Get { workspace, id } => {
            let found = data_source::read_data_source(client, &workspace, &id)
                .await
                .map_err(api_error)
                .with_context(|| format!("Could not read data source ID {}", id))?;
            print_found(found, "data source", &id)
        }
        DataSourceCommand::Delete { workspace, id } => {
            data_source::delete_data_source(client, &workspace, &id)
                .await
                .map_err(api_error)
                .with_context(|| format!("Could not delete data source ID {}", id))?;
            println!("Deleted data source {}", id);
            Ok(())
        }
    }
}

async fn run_field(client: &FunnelClient, command: FieldCommand) -> Result<()> {
    match command {
        FieldCommand::Get {
            workspace,
            id,
            export_name,
            export_type,
        } => {
            let field = export_field::get_export_field(
                client,
                &workspace,
                &id,
                export_name.as_deref(),
                export_type.as_deref(),
            )
            .await
            .map_err(api_error)
            .with_context(|| format!("Unable to read field {}", id))?;
            print(&field)
        }
    }
}

/// Replace status-code errors with a readable summary
fn api_error(error: FunnelError) -> anyhow::Error {
    match error.status_code() {
        Some(_) if !matches!(error, FunnelError::Auth { .. }) => anyhow!(format_api_error(&error)),
        _ => anyhow::Error::new(error),
    }
}

fn read_resource_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read resource file {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse resource file {}", path.display()))
}

fn print<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    print!("{}", serde_yaml::to_string(value)?);
    Ok(())
}

fn print_found<T: Serialize>(found: Option<T>, what: &str, id: &str) -> Result<()> {
    match found {
        Some(value) => print(&value),
        None => {
            println!("No {} with ID {}", what, id);
            Ok(())
        }
    }
}
