#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use access::{
    AccessPolicy, AuthSession, BackendError, FileStore, GuardDecision, HttpSessionBackend, LoginReason, Role,
    RouteGuard, SessionClaims, StoreError, TokenError, TokenFormat, TokenStore, User,
};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid user JSON: {0}")]
    InvalidUser(serde_json::Error),
    #[error("session storage failed: {0}")]
    Store(#[from] StoreError),
    #[error("backend client failed: {0}")]
    Backend(#[from] BackendError),
    #[error("token rejected: {0}")]
    Token(#[from] TokenError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "ballotctl", about = "Election admin session and access CLI")]
struct Cli {
    /// JSON file holding the persisted session.
    #[arg(long, env = "BALLOTCTL_STORE", default_value = "ballotctl-session.json")]
    store: PathBuf,

    /// Base URL of the auth backend; logout posts to `<url>/auth/logout`.
    #[arg(long, env = "BALLOTCTL_BACKEND_URL", default_value = "http://127.0.0.1:3000/api")]
    backend_url: String,

    #[arg(long, env = "BALLOTCTL_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a session issued by the login endpoint.
    Login(LoginArgs),
    /// Sign out locally and invalidate the session remotely.
    Logout,
    /// Show the stored user.
    Whoami {
        /// Token layout used to report expiry.
        #[arg(long, default_value = "compact")]
        format: TokenFormat,
    },
    Token(TokenCommand),
    Guard(GuardCommand),
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    token: String,
    /// User record as JSON: `{"id":..,"name":..,"email":..,"role":..,"role_id":..}`.
    #[arg(long)]
    user: String,
    /// Role label to store; defaults to the user's role.
    #[arg(long)]
    role: Option<String>,
}

#[derive(Args, Debug)]
struct TokenCommand {
    #[command(subcommand)]
    command: TokenSubcommand,
}

#[derive(Subcommand, Debug)]
enum TokenSubcommand {
    /// Decode a token's claims.
    Inspect {
        token: String,
        #[arg(long, default_value = "compact")]
        format: TokenFormat,
    },
    /// Produce an unsigned token for local testing.
    Mint {
        #[arg(long)]
        role: Role,
        #[arg(long, default_value_t = 3600)]
        ttl_secs: i64,
        #[arg(long, default_value = "compact")]
        format: TokenFormat,
    },
}

#[derive(Args, Debug)]
struct GuardCommand {
    #[command(subcommand)]
    command: GuardSubcommand,
}

#[derive(Subcommand, Debug)]
enum GuardSubcommand {
    /// Show what the route guard decides for a path and token.
    Check {
        path: String,
        #[arg(long)]
        token: Option<String>,
        #[arg(long, default_value = "compact")]
        format: TokenFormat,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Login(args) => run_login(open_session(&cli.store, &cli.backend_url, cli.timeout_secs)?, args),
        Command::Logout => run_logout(open_session(&cli.store, &cli.backend_url, cli.timeout_secs)?).await,
        Command::Whoami { format } => {
            run_whoami(&open_session(&cli.store, &cli.backend_url, cli.timeout_secs)?, format)
        }
        Command::Token(token) => run_token(token),
        Command::Guard(guard) => run_guard(guard),
    }
}

fn open_session(store: &Path, backend_url: &str, timeout_secs: u64) -> Result<AuthSession, CliError> {
    let store = TokenStore::new(Arc::new(FileStore::new(store)));
    let backend = HttpSessionBackend::new(backend_url, Duration::from_secs(timeout_secs))?;
    Ok(AuthSession::restored(store, Arc::new(backend)))
}

fn run_login(mut session: AuthSession, args: LoginArgs) -> Result<(), CliError> {
    let user: User = serde_json::from_str(&args.user).map_err(CliError::InvalidUser)?;
    let role = resolve_role(&user, args.role);

    if let Some(previous) = session.user() {
        eprintln!("replacing session for {}", previous.email);
    }
    session.login(user.clone(), args.token, role)?;
    print_json(&serde_json::to_value(&user)?)
}

async fn run_logout(mut session: AuthSession) -> Result<(), CliError> {
    let was_logged_in = session.is_logged_in();
    let task = session.logout();
    if let Err(e) = task.finish().await {
        eprintln!("remote logout failed: {e}");
    }
    println!("{}", if was_logged_in { "signed out" } else { "not logged in" });
    Ok(())
}

fn run_whoami(session: &AuthSession, format: TokenFormat) -> Result<(), CliError> {
    match whoami_report(session, format, access::unix_now()) {
        Some(report) => print_json(&report),
        None => {
            println!("not logged in");
            Ok(())
        }
    }
}

/// `expired` is present only when the stored token decodes with `format`.
fn whoami_report(session: &AuthSession, format: TokenFormat, now: i64) -> Option<Value> {
    let user = session.user()?;
    let mut out = json!({ "user": user, "role": session.role() });
    if let Some(claims) = session.token().and_then(|t| SessionClaims::parse(t, format).ok()) {
        out["expired"] = Value::Bool(claims.is_expired(now));
    }
    Some(out)
}

fn run_token(token: TokenCommand) -> Result<(), CliError> {
    match token.command {
        TokenSubcommand::Inspect { token, format } => {
            let claims = SessionClaims::parse(&token, format)?;
            print_json(&describe_claims(&claims, access::unix_now()))
        }
        TokenSubcommand::Mint { role, ttl_secs, format } => {
            let claims = SessionClaims::new(role, access::unix_now() + ttl_secs);
            println!("{}", claims.encode_unsigned(format));
            Ok(())
        }
    }
}

fn run_guard(guard: GuardCommand) -> Result<(), CliError> {
    match guard.command {
        GuardSubcommand::Check { path, token, format } => {
            let guard = RouteGuard::new(AccessPolicy::default(), format);
            let decision = guard.check(&path, token.as_deref(), access::unix_now());
            print_json(&describe_decision(&decision))
        }
    }
}

fn resolve_role(user: &User, role: Option<String>) -> String {
    role.filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| user.role.as_str().to_owned())
}

fn describe_claims(claims: &SessionClaims, now: i64) -> Value {
    json!({
        "role": claims.role(),
        "role_id": claims.role_id(),
        "exp": claims.exp(),
        "expired": claims.is_expired(now),
    })
}

fn describe_decision(decision: &GuardDecision) -> Value {
    let outcome = match decision {
        GuardDecision::Exempt => "exempt",
        GuardDecision::Allow { .. } => "allow",
        GuardDecision::Login { reason: LoginReason::MissingToken, .. } => "login",
        GuardDecision::Login { reason: LoginReason::MalformedToken, .. } => "login (malformed token)",
        GuardDecision::Login { reason: LoginReason::Expired, .. } => "login (expired)",
        GuardDecision::Unauthorized { .. } => "unauthorized",
    };
    json!({
        "decision": outcome,
        "location": decision.location(),
        "clears_cookie": decision.clears_cookie(),
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
