// DrawX CLI - inspect and update local settings from a shell

mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use drawx_config::{local, LocalSettingsConfig};
use drawx_session::FileSessionRegistry;
use drawx_settings::{LoginState, SessionError, SettingsCache, SettingsError};

use exit_codes::{session_exit_code, settings_exit_code, EXIT_SESSION_AMBIGUOUS, EXIT_SUCCESS};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("DRAWX_COMMIT"), ")",
    "\ntarget:  ", env!("DRAWX_TARGET"),
);

#[derive(Parser)]
#[command(name = "drawx")]
#[command(about = "Inspect and update DrawX local settings")]
#[command(version)]
#[command(long_version = LONG_VERSION)]
struct Cli {
    /// Settings database (defaults to the platform data dir)
    #[arg(long, global = true, env = local::SETTINGS_PATH_ENV)]
    store: Option<PathBuf>,

    /// Directory of logged-in session records
    #[arg(long, global = true, env = local::SESSIONS_DIR_ENV)]
    sessions_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the sync server and login settings (password never shown)
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save sync server credentials
    #[command(after_help = "\
Examples:
  drawx set-credentials example.com alice --password secret
  DRAWX_PASSWORD=secret drawx set-credentials example.com:1234 alice

A host without a port gets the default port 9080.")]
    SetCredentials {
        /// Server host, optionally with :port
        host: String,

        /// User name on the sync server
        username: String,

        /// Password
        #[arg(long, env = "DRAWX_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show which user is logged in
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every logged-in user, most recent first
    Sessions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = LocalSettingsConfig::at(cli.store.unwrap_or_else(local::settings_path));
    let sessions = FileSessionRegistry::new(cli.sessions_dir.unwrap_or_else(local::sessions_dir));

    // Without settings storage there is nothing useful to do
    let cache = SettingsCache::init_local_settings(&config, sessions).map_err(|e| {
        CliError::settings(e).with_hint(format!("settings store: {}", config.path.display()))
    })?;

    match cli.command {
        Commands::Show { json } => cmd_show(&cache, json),
        Commands::SetCredentials { host, username, password } => {
            cmd_set_credentials(&cache, &host, &username, &password)
        }
        Commands::Whoami { json } => cmd_whoami(&cache, json),
        Commands::Sessions { json } => cmd_sessions(cache.sessions(), json),
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn settings(err: SettingsError) -> Self {
        Self { code: settings_exit_code(&err), message: err.to_string(), hint: None }
    }

    pub fn session(err: SessionError) -> Self {
        Self { code: session_exit_code(&err), message: err.to_string(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// show
// ============================================================================

fn cmd_show(cache: &SettingsCache, json: bool) -> Result<(), CliError> {
    let settings = cache.settings().map_err(CliError::settings)?;

    if json {
        let output = serde_json::json!({
            "server_host": settings.server_name(),
            "server_port": settings.server_host.as_ref().map(|_| settings.server_port()),
            "username": settings.username,
            "has_credentials": cache.has_credentials(),
        });
        println!("{}", output);
        return Ok(());
    }

    match settings.server_name() {
        Some(name) => println!("server:      {}:{}", name, settings.server_port()),
        None => println!("server:      (not configured)"),
    }
    println!("username:    {}", settings.username);
    println!("password:    {}", if settings.password.is_empty() { "(empty)" } else { "(set)" });
    println!("credentials: {}", if cache.has_credentials() { "complete" } else { "incomplete" });
    Ok(())
}

// ============================================================================
// set-credentials
// ============================================================================

fn cmd_set_credentials(cache: &SettingsCache, host: &str, username: &str, password: &str) -> Result<(), CliError> {
    let changed = cache
        .update_credentials(host, username, password)
        .map_err(CliError::settings)?;
    println!("{}", if changed { "changed" } else { "unchanged" });
    Ok(())
}

// ============================================================================
// whoami / sessions
// ============================================================================

fn cmd_whoami(cache: &SettingsCache, json: bool) -> Result<(), CliError> {
    let state = cache.login_state().map_err(CliError::session)?;

    if json {
        let output = match &state {
            LoginState::LoggedIn(identity) => serde_json::json!({ "state": "logged_in", "identity": identity }),
            LoginState::NoSession => serde_json::json!({ "state": "none" }),
            LoginState::Ambiguous { sessions } => serde_json::json!({ "state": "ambiguous", "sessions": sessions }),
        };
        println!("{}", output);
    } else {
        match &state {
            LoginState::LoggedIn(identity) => println!("{} @ {}", identity.user, identity.server_url),
            LoginState::NoSession => println!("not logged in"),
            LoginState::Ambiguous { sessions } => println!("{} users logged in", sessions),
        }
    }

    match state {
        LoginState::Ambiguous { .. } => Err(CliError {
            code: EXIT_SESSION_AMBIGUOUS,
            message: String::new(),
            hint: Some("run `drawx sessions` to see who is logged in".to_string()),
        }),
        _ => Ok(()),
    }
}

fn cmd_sessions(registry: &FileSessionRegistry, json: bool) -> Result<(), CliError> {
    let sessions = registry.list_sessions().map_err(CliError::session)?;

    if json {
        let output = serde_json::to_string_pretty(&sessions)
            .map_err(|e| CliError { code: exit_codes::EXIT_ERROR, message: e.to_string(), hint: None })?;
        println!("{}", output);
        return Ok(());
    }

    if sessions.is_empty() {
        eprintln!("Nobody is logged in.");
        return Ok(());
    }

    println!("{:<20} {:<24} {}", "USER", "LOGGED IN", "SERVER");
    println!("{}", "-".repeat(72));
    for s in &sessions {
        println!(
            "{:<20} {:<24} {}",
            s.user,
            s.logged_in_at.format("%Y-%m-%d %H:%M:%S"),
            s.server_url
        );
    }
    Ok(())
}
