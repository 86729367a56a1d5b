//! Portal CLI - Command-line front end for the exam portal
//!
//! Stands in for the browser UI: every session and API operation is a
//! subcommand, notices are printed, and requested navigations are shown.

mod console;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::{ConsoleNavigator, ConsoleNotifier};
use portal_client::{
    AdminApi, AdminQuery, ApiClient, AuthApi, ExportScope, FileTokenStore, LogKind, LogQuery,
    Navigator, Notifier, SessionContext, SessionStore, SystemLogApi,
};
use portal_client::api::DEFAULT_PAGE_SIZE;
use portal_client::routes::{RouteRedirect, Router};
use portal_core::{
    default_config_path, init_logging, log_operation_error, log_operation_start,
    log_operation_success, AdminUpdate, Credentials, LogRecord, LoggingConfig, PortalConfig, Role,
    StaffRegistration, StudentRegistration,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Command-line client for the exam administration portal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Portal(PortalCommands),

    /// Manage configuration
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

/// Commands that talk to the backend
#[derive(Subcommand)]
enum PortalCommands {
    /// Log in and land on the role's dashboard
    Login {
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Change the current user's password
    Passwd {
        #[arg(long)]
        old: String,

        #[arg(long)]
        new: String,
    },

    /// Register a student account
    Register {
        username: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        grade: Option<String>,

        #[arg(long)]
        college_id: Option<i64>,
    },

    /// List colleges offered at registration
    Colleges,

    /// Switch the session to another user (admin only)
    Impersonate { user_id: i64 },

    /// Manage administrator accounts
    Admins {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Browse, clear and export system logs
    Logs {
        #[command(subcommand)]
        command: LogCommands,
    },

    /// Inspect the route table and guard
    Routes {
        #[command(subcommand)]
        command: RouteCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    List {
        #[arg(long)]
        keyword: Option<String>,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    Show {
        admin_id: i64,
    },
    Update {
        admin_id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        other: Option<String>,
    },
    Status {
        admin_id: i64,

        #[arg(value_enum)]
        state: AccountState,
    },
    Delete {
        admin_id: i64,
    },
    /// Create a teacher or admin account
    Add {
        username: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        name: String,

        /// admin or teacher
        #[arg(long, default_value = "admin")]
        role: Role,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        college_id: Option<i64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AccountState {
    Enable,
    Disable,
}

#[derive(Subcommand)]
enum LogCommands {
    List {
        /// operation, login or error
        #[arg(default_value = "operation")]
        kind: LogKind,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        operation: Option<i64>,

        #[arg(long)]
        action_type: Option<i64>,

        #[arg(long)]
        ip: Option<String>,

        #[arg(long)]
        error_info: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
    },
    Clear {
        kind: LogKind,
    },
    /// Download logs as a spreadsheet
    Export {
        /// all or error
        #[arg(default_value = "all")]
        scope: ExportScope,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Stats {
        #[arg(value_enum)]
        view: StatsView,

        /// Number of users for frequent-users
        #[arg(long)]
        limit: Option<u32>,
    },
    ByUser {
        user_id: i64,
    },
    ByIp {
        ip: String,
    },
    ByType {
        action_type: i64,
    },
    /// Count a user's operations
    Count {
        user_id: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatsView {
    OperationTypes,
    FrequentUsers,
    IpAccess,
}

#[derive(Subcommand)]
enum RouteCommands {
    List,
    /// Resolve a path through the guard for the current session
    Check { path: String },
}

/// The wired client stack
struct Portal {
    session: Arc<SessionContext>,
    client: Arc<ApiClient>,
    store: SessionStore,
    router: Router,
}

impl Portal {
    async fn connect(config: &PortalConfig) -> Result<Self> {
        config.validate()?;

        let storage = Arc::new(FileTokenStore::new(&config.storage.token_file));
        let session = Arc::new(SessionContext::new(storage));
        let navigator: Arc<dyn Navigator> = Arc::new(ConsoleNavigator);
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);

        let client = Arc::new(ApiClient::new(
            config.api.clone(),
            session.clone(),
            navigator.clone(),
            notifier,
        )?);
        let store = SessionStore::new(client.clone());
        let router = Router::from_config(&config.guard, session.clone(), navigator);

        let restored = store.restore().await;
        debug!(restored, "Durable session checked");

        Ok(Self {
            session,
            client,
            store,
            router,
        })
    }

    fn auth(&self) -> AuthApi {
        AuthApi::new(self.client.clone())
    }

    fn admin(&self) -> AdminApi {
        AdminApi::new(self.client.clone())
    }

    fn logs(&self) -> SystemLogApi {
        SystemLogApi::new(self.client.clone())
    }

    /// A restored session has a token but no profile until fetched
    async fn ensure_profile(&self) -> bool {
        if self.session.is_authenticated().await && self.session.user().await.is_none() {
            return self.store.fetch_current_user().await;
        }
        true
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = load_config(&config_path)?;

    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        config.logging.clone()
    };
    init_logging(&logging_config).map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting portal CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Config {
            init,
            show,
            validate,
        } => handle_config(&config_path, &config, init, show, validate),
        Commands::Portal(command) => {
            let portal = Portal::connect(&config).await?;
            run(&portal, command).await
        }
    }
}

fn load_config(path: &Path) -> Result<PortalConfig> {
    if path.exists() {
        info!("Loading configuration from {:?}", path);
    } else {
        info!("No configuration file found, using defaults");
    }
    Ok(PortalConfig::load_or_default(path)?)
}

async fn run(portal: &Portal, command: PortalCommands) -> Result<()> {
    match command {
        PortalCommands::Login { username, password } => {
            if !portal.store.login(&Credentials::new(username, password)).await {
                bail!("Login failed");
            }
            if let Some(user) = portal.session.user().await {
                println!("👤 Logged in as {} (id {})", user.username, user.user_id);
            }
        }
        PortalCommands::Logout => {
            if !portal.store.logout().await {
                bail!("Logout did not reach the backend; the local session was cleared anyway");
            }
        }
        PortalCommands::Whoami => {
            if !portal.session.is_authenticated().await {
                println!("🔒 Not logged in");
                return Ok(());
            }
            if !portal.store.fetch_current_user().await {
                bail!("Could not fetch the current user");
            }
            if let Some(user) = portal.session.user().await {
                println!("👤 {} (id {})", user.username, user.user_id);
                match user.role() {
                    Some(role) => println!("   role:  {}", role),
                    None => println!("   role:  unknown ({})", user.role),
                }
                if let Some(email) = &user.email {
                    println!("   email: {}", email);
                }
                if let Some(phone) = &user.phone {
                    println!("   phone: {}", phone);
                }
            }
        }
        PortalCommands::Passwd { old, new } => {
            if !portal.store.change_password(&old, &new).await {
                bail!("Password was not changed");
            }
        }
        PortalCommands::Register {
            username,
            password,
            name,
            email,
            phone,
            grade,
            college_id,
        } => {
            let form = StudentRegistration {
                username,
                password,
                name,
                email,
                phone,
                grade,
                college_id,
                ..Default::default()
            };
            if !portal.store.register_student(&form).await {
                bail!("Registration failed");
            }
        }
        PortalCommands::Colleges => {
            let colleges = portal.auth().colleges().await?;
            println!("{}", serde_json::to_string_pretty(&colleges)?);
        }
        PortalCommands::Impersonate { user_id } => {
            if !portal.store.simulate_login(user_id).await {
                bail!("Impersonation failed");
            }
        }
        PortalCommands::Admins { command } => handle_admins(portal, command).await?,
        PortalCommands::Logs { command } => handle_logs(portal, command).await?,
        PortalCommands::Routes { command } => handle_routes(portal, command).await?,
    }

    Ok(())
}

async fn handle_admins(portal: &Portal, command: AdminCommands) -> Result<()> {
    let api = portal.admin();

    match command {
        AdminCommands::List {
            keyword,
            page,
            size,
        } => {
            let result = api
                .list_admins(&AdminQuery {
                    keyword,
                    page_num: Some(page),
                    page_size: Some(size),
                })
                .await?;
            println!("📋 {} administrator(s), page {}", result.total, page);
            for admin in &result.records {
                let username = admin
                    .user
                    .as_ref()
                    .map(|u| u.username.as_str())
                    .unwrap_or("-");
                println!(
                    "  {:>6}  user {:>6}  {:<16} {}",
                    admin.admin_id,
                    admin.user_id,
                    username,
                    admin.name.as_deref().unwrap_or("")
                );
            }
        }
        AdminCommands::Show { admin_id } => {
            let admin = api.get_admin(admin_id).await?;
            println!("{}", serde_json::to_string_pretty(&admin)?);
        }
        AdminCommands::Update {
            admin_id,
            name,
            phone,
            email,
            other,
        } => {
            let update = AdminUpdate {
                name,
                phone,
                email,
                other,
                ..Default::default()
            };
            api.update_admin(admin_id, &update).await?;
            println!("✅ Administrator {} updated", admin_id);
        }
        AdminCommands::Status { admin_id, state } => {
            let enabled = matches!(state, AccountState::Enable);
            api.update_admin_status(admin_id, enabled).await?;
            println!(
                "✅ Administrator {} {}",
                admin_id,
                if enabled { "enabled" } else { "disabled" }
            );
        }
        AdminCommands::Delete { admin_id } => {
            api.delete_admin(admin_id).await?;
            println!("🗑️  Administrator {} deleted", admin_id);
        }
        AdminCommands::Add {
            username,
            password,
            name,
            role,
            email,
            phone,
            college_id,
        } => {
            if role == Role::Student {
                bail!("Students register themselves with 'portal register'");
            }
            let form = StaffRegistration {
                username: username.clone(),
                password,
                role: role.code(),
                name,
                sex: None,
                phone,
                email,
                college_id,
                permission: None,
                other: None,
            };
            portal.auth().register_staff(&form).await?;
            println!("✅ Created {} account {}", role, username);
        }
    }

    Ok(())
}

async fn handle_logs(portal: &Portal, command: LogCommands) -> Result<()> {
    let api = portal.logs();

    match command {
        LogCommands::List {
            kind,
            username,
            operation,
            action_type,
            ip,
            error_info,
            start,
            end,
            page,
            size,
        } => {
            let query = LogQuery {
                username,
                operation,
                action_type,
                ip,
                error_info,
                start_time: start,
                end_time: end,
                page_num: Some(page),
                page_size: Some(size),
            };
            let result = api.list(kind, &query).await?;
            println!(
                "📋 {} {} log(s), page {}",
                result.total,
                kind.segment(),
                page
            );
            print_logs(&result.records);
        }
        LogCommands::Clear { kind } => {
            api.clear(kind).await?;
            println!("🧹 Cleared {} logs", kind.segment());
        }
        LogCommands::Export {
            scope,
            start,
            end,
            output,
        } => {
            log_operation_start!("export_logs", scope = scope.segment());
            let payload = api
                .export(scope, start.as_deref(), end.as_deref())
                .await
                .inspect_err(|e| {
                    log_operation_error!("export_logs", e);
                })?;

            let path = output
                .or_else(|| payload.filename().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(format!("{}-logs.xlsx", scope.segment())));
            tokio::fs::write(&path, &payload.bytes).await?;

            log_operation_success!("export_logs", bytes = payload.len());
            println!("📄 Saved {} bytes to {}", payload.len(), path.display());
        }
        LogCommands::Stats { view, limit } => {
            let stats = match view {
                StatsView::OperationTypes => api.operation_type_stats().await?,
                StatsView::FrequentUsers => api.frequent_users(limit).await?,
                StatsView::IpAccess => api.ip_access_stats().await?,
            };
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        LogCommands::ByUser { user_id } => print_logs(&api.by_user(user_id).await?),
        LogCommands::ByIp { ip } => print_logs(&api.by_ip(&ip).await?),
        LogCommands::ByType { action_type } => print_logs(&api.by_type(action_type).await?),
        LogCommands::Count { user_id } => {
            let count = api.count_user_operations(user_id).await?;
            println!("📊 User {} performed {} operation(s)", user_id, count);
        }
    }

    Ok(())
}

fn print_logs(records: &[LogRecord]) {
    if records.is_empty() {
        println!("  (no entries)");
    }
    for record in records {
        println!(
            "  {:>6}  {:<19}  {:<15}  {}",
            record.log_id,
            record.created_time.as_deref().unwrap_or("-"),
            record.ip_address.as_deref().unwrap_or("-"),
            record.action_description.as_deref().unwrap_or("")
        );
    }
}

async fn handle_routes(portal: &Portal, command: RouteCommands) -> Result<()> {
    match command {
        RouteCommands::List => {
            println!("🗺️  Routes (guard: {:?})", portal.router.guard().mode());
            for entry in portal.router.table().entries() {
                let roles = if entry.roles.is_empty() {
                    "-".to_string()
                } else {
                    entry
                        .roles
                        .iter()
                        .map(Role::to_string)
                        .collect::<Vec<_>>()
                        .join(",")
                };
                let redirect = match entry.redirect {
                    Some(RouteRedirect::To(target)) => format!(" -> {}", target),
                    Some(RouteRedirect::Home) => " -> (landing route)".to_string(),
                    None => String::new(),
                };
                println!(
                    "  {:<36} {:<26} {:<8}{}",
                    entry.path, entry.view, roles, redirect
                );
            }
        }
        RouteCommands::Check { path } => {
            if !portal.ensure_profile().await {
                bail!("Could not load the current user");
            }
            let destination = portal.router.navigate(&path).await?;
            if destination == path {
                println!("✅ {} is reachable", path);
            } else {
                println!("↪️  {} redirects to {}", path, destination);
            }
        }
    }

    Ok(())
}

fn handle_config(
    path: &Path,
    config: &PortalConfig,
    init: bool,
    show: bool,
    validate: bool,
) -> Result<()> {
    if init {
        PortalConfig::default().save_to_file(path)?;
        println!("✅ Configuration initialized at: {}", path.display());
        println!("📝 Edit api.base_url to point at your portal backend.");
    }

    if show {
        println!("📋 Current configuration ({}):", path.display());
        println!("{}", toml::to_string_pretty(config)?);
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e.into());
            }
        }
    }

    if !(init || show || validate) {
        println!("Nothing to do. Use --init, --show or --validate.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_is_dispatched_apart_from_backend_commands() {
        let cli = Cli::try_parse_from(["portal", "config", "--show"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { show: true, .. }));

        let cli = Cli::try_parse_from(["portal", "login", "admin", "-p", "admin123"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Portal(PortalCommands::Login { .. })
        ));

        let cli = Cli::try_parse_from(["portal", "logs", "export", "error"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Portal(PortalCommands::Logs {
                command: LogCommands::Export {
                    scope: ExportScope::Error,
                    ..
                }
            })
        ));
    }
}
