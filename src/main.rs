use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use salesdesk::app::App;
use salesdesk::config::{ClientConfig, ConfigError};
use salesdesk::net::error::ApiError;
use salesdesk::net::types::{
    BranchCreate, BranchUpdate, DailyReportCreate, DailyReportUpdate, LoginRequest, Pagination, ReportQuery,
    ReportStatus, Role, UserCreate, UserProfile, UserUpdate,
};
use salesdesk::routes::{GuardOutcome, Route};
use salesdesk::state::session::SessionError;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not signed in; run `salesdesk login` first")]
    NotSignedIn,
    #[error("session expired; run `salesdesk login` to sign in again")]
    SessionExpired,
    #[error("session is still loading")]
    SessionLoading,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "salesdesk", about = "Daily sales-report client")]
struct Cli {
    /// Overrides the configured API base URL.
    #[arg(long, env = "SALESDESK_API_BASE_URL")]
    base_url: Option<String>,

    /// Overrides where the session is persisted.
    #[arg(long, env = "SALESDESK_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session.
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted.
        #[arg(long, env = "SALESDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out. Always clears the local session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    Reports(ReportsCommand),
    Branches(BranchesCommand),
    Users(UsersCommand),
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long)]
    skip: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
}

impl From<PageArgs> for Pagination {
    fn from(args: PageArgs) -> Self {
        Self { skip: args.skip, limit: args.limit }
    }
}

// =============================================================================
// REPORTS
// =============================================================================

#[derive(Args, Debug)]
struct ReportsCommand {
    #[command(subcommand)]
    command: ReportsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ReportsSubcommand {
    List {
        #[arg(long)]
        user_id: Option<i64>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        date: String,
        #[arg(long)]
        content: String,
        /// Author; defaults to the signed-in user. Admins and managers only.
        #[arg(long)]
        user_id: Option<i64>,
        #[arg(long)]
        customer_id: Option<i64>,
        #[arg(long)]
        branch_id: Option<i64>,
        #[arg(long)]
        status: Option<ReportStatus>,
    },
    Update {
        id: i64,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        customer_id: Option<i64>,
        #[arg(long)]
        branch_id: Option<i64>,
        #[arg(long)]
        status: Option<ReportStatus>,
    },
    Delete {
        id: i64,
    },
}

// =============================================================================
// BRANCHES
// =============================================================================

#[derive(Args, Debug)]
struct BranchesCommand {
    #[command(subcommand)]
    command: BranchesSubcommand,
}

#[derive(Subcommand, Debug)]
enum BranchesSubcommand {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    Delete {
        id: i64,
    },
}

// =============================================================================
// USERS
// =============================================================================

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "staff")]
        role: Role,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        branch_id: Option<i64>,
        #[arg(long)]
        department_id: Option<i64>,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(session_file) = cli.session_file {
        config = config.with_session_file(session_file);
    }

    let app = App::from_config(config)?;
    app.start().await;
    // A restart requested during startup lands where this process already is.
    if let Some(route) = app.restart.take() {
        tracing::info!(%route, "stored session was rejected at startup");
    }

    let result = run(&app, cli.command).await;
    if let Some(route) = app.restart.take() {
        tracing::warn!(%route, "session ended mid-command");
        return Err(CliError::SessionExpired);
    }
    result
}

async fn run(app: &App, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { email, password } => run_login(app, email, password).await,
        Command::Logout => run_logout(app).await,
        Command::Whoami => {
            enter(app, Route::Dashboard)?;
            let dashboard = app.dashboard().await?.ok_or(CliError::NotSignedIn)?;
            print_json(&dashboard)
        }
        Command::Reports(reports) => run_reports(app, reports).await,
        Command::Branches(branches) => run_branches(app, branches).await,
        Command::Users(users) => run_users(app, users).await,
    }
}

/// Apply the route guard. Returns the route that ends up rendered.
fn enter(app: &App, route: Route) -> Result<Route, CliError> {
    match app.navigate(route) {
        GuardOutcome::Render(rendered) => Ok(rendered),
        GuardOutcome::Redirect(Route::Login) => Err(CliError::NotSignedIn),
        GuardOutcome::Redirect(other) => Ok(other),
        GuardOutcome::Wait => Err(CliError::SessionLoading),
    }
}

fn signed_in_user(app: &App) -> Result<UserProfile, CliError> {
    app.session.snapshot().user.ok_or(CliError::NotSignedIn)
}

fn require(allowed: bool, what: &str) -> Result<(), CliError> {
    if allowed { Ok(()) } else { Err(CliError::PermissionDenied(what.to_owned())) }
}

// =============================================================================
// SESSION COMMANDS
// =============================================================================

async fn run_login(app: &App, email: String, password: Option<String>) -> Result<(), CliError> {
    if enter(app, Route::Login)? != Route::Login {
        eprintln!("already signed in");
        return print_json(&signed_in_user(app)?);
    }
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };
    let user = app.session.login(&LoginRequest { email, password }).await?;
    print_json(&user)
}

async fn run_logout(app: &App) -> Result<(), CliError> {
    if app.session.is_authenticated() {
        app.session.logout().await;
    } else {
        app.session.invalidation().invalidate();
    }
    // The user asked to leave; a 401 from the logout call changes nothing.
    app.restart.take();
    eprintln!("signed out");
    Ok(())
}

fn read_password() -> Result<String, CliError> {
    eprint!("password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_owned();
    if password.is_empty() {
        return Err(CliError::InvalidInput("password is required".to_owned()));
    }
    Ok(password)
}

// =============================================================================
// RESOURCE COMMANDS
// =============================================================================

async fn run_reports(app: &App, reports: ReportsCommand) -> Result<(), CliError> {
    enter(app, Route::Reports)?;
    let user = signed_in_user(app)?;
    let client = &app.client;
    match reports.command {
        ReportsSubcommand::List { user_id, start_date, end_date, page } => {
            let query = ReportQuery { user_id, start_date, end_date, page: page.into() };
            print_json(&client.list_reports(&query).await?)
        }
        ReportsSubcommand::Get { id } => print_json(&client.get_report(id).await?),
        ReportsSubcommand::Create { date, content, user_id, customer_id, branch_id, status } => {
            let status = writable_status(status)?;
            let user_id = match user_id {
                Some(other) if other != user.id => {
                    require(user.role.can_manage_users(), "filing reports for another user")?;
                    other
                }
                _ => user.id,
            };
            let report =
                DailyReportCreate { user_id, report_date: date, content, customer_id, branch_id, status };
            print_json(&client.create_report(&report).await?)
        }
        ReportsSubcommand::Update { id, date, content, customer_id, branch_id, status } => {
            let status = writable_status(status)?;
            let update = DailyReportUpdate { report_date: date, content, customer_id, branch_id, status };
            print_json(&client.update_report(id, &update).await?)
        }
        ReportsSubcommand::Delete { id } => {
            let report = client.get_report(id).await?;
            require(report.is_owned_by(&user), "deleting another user's report")?;
            client.delete_report(id).await?;
            eprintln!("deleted report {id}");
            Ok(())
        }
    }
}

/// Approval is a server-side transition; clients only write draft or submitted.
fn writable_status(status: Option<ReportStatus>) -> Result<Option<ReportStatus>, CliError> {
    match status {
        Some(ReportStatus::Approved) => {
            Err(CliError::InvalidInput("status must be draft or submitted".to_owned()))
        }
        other => Ok(other),
    }
}

async fn run_branches(app: &App, branches: BranchesCommand) -> Result<(), CliError> {
    enter(app, Route::Branches)?;
    let user = signed_in_user(app)?;
    require(Route::Branches.visible_to(user.role), "branch management")?;
    let client = &app.client;
    match branches.command {
        BranchesSubcommand::List { page } => print_json(&client.list_branches(page.into()).await?),
        BranchesSubcommand::Get { id } => print_json(&client.get_branch(id).await?),
        BranchesSubcommand::Create { name, address, phone } => {
            require(user.role.can_manage_branches(), "creating branches")?;
            let branch = BranchCreate { company_id: user.company_id, name, address, phone };
            print_json(&client.create_branch(&branch).await?)
        }
        BranchesSubcommand::Update { id, name, address, phone } => {
            require(user.role.can_manage_branches(), "editing branches")?;
            let update = BranchUpdate { name, address, phone };
            print_json(&client.update_branch(id, &update).await?)
        }
        BranchesSubcommand::Delete { id } => {
            require(user.role.can_manage_branches(), "deleting branches")?;
            client.delete_branch(id).await?;
            eprintln!("deleted branch {id}");
            Ok(())
        }
    }
}

async fn run_users(app: &App, users: UsersCommand) -> Result<(), CliError> {
    enter(app, Route::Users)?;
    let user = signed_in_user(app)?;
    require(Route::Users.visible_to(user.role), "user management")?;
    let client = &app.client;
    match users.command {
        UsersSubcommand::List { page } => print_json(&client.list_users(page.into()).await?),
        UsersSubcommand::Get { id } => print_json(&client.get_user(id).await?),
        UsersSubcommand::Create { name, email, password, role, position, branch_id, department_id } => {
            require(user.role.can_assign(role), "assigning that role")?;
            let create = UserCreate {
                company_id: user.company_id,
                name,
                email,
                password,
                role,
                position,
                branch_id,
                department_id,
            };
            print_json(&client.create_user(&create).await?)
        }
        UsersSubcommand::Update { id, name, email, role, position, password } => {
            if let Some(role) = role {
                require(user.role.can_assign(role), "assigning that role")?;
            }
            let update = UserUpdate { name, email, role, position, password };
            print_json(&client.update_user(id, &update).await?)
        }
        UsersSubcommand::Delete { id } => {
            client.delete_user(id).await?;
            eprintln!("deleted user {id}");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
