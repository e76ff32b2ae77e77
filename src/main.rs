mod api;
mod client;
mod collect;
mod config;
mod dispatch;
mod document;
mod logging;
mod nodes;
mod organizations;
mod prompt;
mod session;
mod users;

use crate::api::Platform;
use crate::config::{Overrides, Scope, resolve, save};
use crate::nodes::NodeInitArgs;
use crate::organizations::OrganizationInitArgs;
use crate::prompt::TerminalPrompter;
use crate::session::Session;
use crate::users::{CredentialArgs, UserCreateArgs};
use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use std::io;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "prvd",
    version,
    about = "CLI for provisioning networks, nodes, organizations and users on the Provide platform"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "API token override for this invocation (otherwise read from config)"
    )]
    token: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "URL",
        help = "Base URL for the ident API (defaults to https://ident.provide.services)"
    )]
    ident_url: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "URL",
        help = "Base URL for the goldmine API (defaults to https://goldmine.provide.services)"
    )]
    goldmine_url: Option<String>,

    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Increase log verbosity (-v info, -vv debug); PROVIDE_LOG overrides"
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Persist credentials and endpoints to the chosen scope
    ///
    /// Takes the global --token, --ident-url and --goldmine-url values.
    Configure {
        #[arg(long = "network", value_name = "NETWORK_ID", help = "Default network id")]
        network: Option<String>,
        #[arg(
            long,
            value_enum,
            default_value_t = ScopeArg::User,
            help = "Where to write the config (local project dir or user config dir)"
        )]
        scope: ScopeArg,
    },
    /// Manage network nodes
    #[command(subcommand)]
    #[command(alias = "node")]
    Nodes(NodesCommand),
    /// Manage organizations
    #[command(subcommand)]
    #[command(alias = "orgs")]
    Organizations(OrganizationsCommand),
    /// Create users and authenticate
    #[command(subcommand)]
    #[command(alias = "user")]
    Users(UsersCommand),
    /// Show current configuration (secrets masked)
    ConfigShow,
    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
enum NodesCommand {
    /// Initialize a new node on a network
    Init(NodeInitArgs),
}

#[derive(Subcommand)]
enum OrganizationsCommand {
    /// Initialize a new organization
    Init(OrganizationInitArgs),
}

#[derive(Subcommand)]
enum UsersCommand {
    /// Create a new user, then authenticate as that user
    Create(UserCreateArgs),
    /// Authenticate and store the issued API token
    Authenticate(CredentialArgs),
}

impl Commands {
    /// Completes "Failed to ..." in the failure log line.
    fn action(&self) -> &'static str {
        match self {
            Commands::Configure { .. } => "save configuration",
            Commands::Nodes(_) => "initialize node",
            Commands::Organizations(_) => "initialize organization",
            Commands::Users(UsersCommand::Create(_)) => "create user",
            Commands::Users(UsersCommand::Authenticate(_)) => "authenticate",
            Commands::ConfigShow => "show configuration",
            Commands::Completion { .. } => "generate completions",
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Local,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Local => Scope::Local,
            ScopeArg::User => Scope::User,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init(cli.verbose) {
        eprintln!("failed to initialize logging: {err}");
    }

    let action = cli.command.action();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Failed to {action}; {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let overrides = Overrides {
        api_token: cli.token,
        ident_url: cli.ident_url,
        goldmine_url: cli.goldmine_url,
    };

    match cli.command {
        Commands::Configure { network, scope } => {
            let mut existing = config::load_scope(scope.into(), &cwd)?;
            if overrides.api_token.is_some() {
                existing.api_token = overrides.api_token;
            }
            if overrides.ident_url.is_some() {
                existing.ident_url = overrides.ident_url;
            }
            if overrides.goldmine_url.is_some() {
                existing.goldmine_url = overrides.goldmine_url;
            }
            if network.is_some() {
                existing.network_id = network;
            }

            let path = save(scope.into(), &existing, &cwd)?;
            println!("Saved configuration to {}", path.display());
        }
        Commands::ConfigShow => {
            let merged = config::load(&cwd)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&config::masked(&merged))?
            );
        }
        Commands::Completion { shell } => {
            use clap_complete::{generate, shells};
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            match shell {
                CompletionShell::Bash => generate(shells::Bash, &mut cmd, bin, &mut io::stdout()),
                CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, bin, &mut io::stdout()),
                CompletionShell::Fish => generate(shells::Fish, &mut cmd, bin, &mut io::stdout()),
                CompletionShell::PowerShell => {
                    generate(shells::PowerShell, &mut cmd, bin, &mut io::stdout())
                }
            }
        }
        Commands::Nodes(NodesCommand::Init(args)) => {
            let (mut session, platform) = open_session(&cwd, overrides)?;
            nodes::init(args, &mut session, &platform, &mut io::stdout().lock())?;
            if let Some(node_id) = session.node_id() {
                info!(node_id, "node initialized");
            }
        }
        Commands::Organizations(OrganizationsCommand::Init(args)) => {
            let (mut session, platform) = open_session(&cwd, overrides)?;
            organizations::init(args, &mut session, &platform, &mut io::stdout().lock())?;
            if let Some(organization_id) = session.organization_id() {
                info!(organization_id, "organization initialized");
            }
        }
        Commands::Users(users_cmd) => {
            let (mut session, platform) = open_session(&cwd, overrides)?;
            let mut prompter = TerminalPrompter::new();
            let mut out = io::stdout().lock();
            match users_cmd {
                UsersCommand::Create(args) => {
                    users::create(args, &mut session, &platform, &mut prompter, &mut out)?;
                    if let Some(user_id) = session.user_id() {
                        info!(user_id, "user created");
                    }
                }
                UsersCommand::Authenticate(args) => {
                    users::authenticate(args, &mut session, &platform, &mut prompter, &mut out)?;
                }
            }
            if let Some(token) = session.issued_token() {
                let path = config::store_token(&cwd, token)?;
                info!("stored API token in {}", path.display());
            }
        }
    }

    Ok(())
}

/// One session per invocation, seeded from the resolved configuration.
fn open_session(cwd: &Path, overrides: Overrides) -> Result<(Session, Platform)> {
    let effective = resolve(cwd, overrides)?;
    let platform = Platform::new(&effective.ident_url, &effective.goldmine_url);
    Ok((Session::new(&effective), platform))
}
