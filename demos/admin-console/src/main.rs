use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use banquet::prelude::*;
use clap::{Parser, Subcommand};
use http::Method;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "admin-console")]
#[command(about = "Terminal client for the catering admin API")]
#[command(version)]
struct Cli {
    /// Base URL of the admin API.
    #[arg(long, env = "BANQUET_API_URL", default_value = "http://localhost:4000")]
    api_url: String,

    /// Where the session is kept between runs.
    #[arg(long, env = "BANQUET_SESSION_FILE", default_value = ".banquet-session.json")]
    session_file: PathBuf,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "banquet=info,admin_console=info,warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session.
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "BANQUET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Ask the server whether the stored session is still valid.
    Whoami,
    /// Authenticated request to any API path.
    Get { path: String },
    /// List dashboard users.
    Users,
    /// Show what the dashboard would do when navigating to a page.
    Route { path: String },
    /// Sign out and forget the session.
    Logout,
    /// Read API paths from stdin, one per line, until idle too long.
    Shell {
        /// Seconds without input before the session is dropped.
        #[arg(long, env = "BANQUET_IDLE_SECS", default_value_t = IdleConfig::DEFAULT_TIMEOUT_SECS)]
        idle_secs: u64,
    },
}

type Console = SessionCoordinator<ReqwestTransport, FileStore>;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn run(cli: Cli) -> Result<(), BanquetError> {
    let transport = ReqwestTransport::builder()
        .base_url(cli.api_url)
        .timeout(Duration::from_secs(15))
        .user_agent(concat!("admin-console/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let store = Arc::new(FileStore::new(cli.session_file));
    let console = SessionCoordinator::new(transport, store, SessionConfig::default());

    match cli.command {
        Command::Login { username, password } => {
            let session = console.login(&username, &password).await?;
            println!(
                "signed in as {username} (access token valid for {}s)",
                session.access_ttl_secs
            );
        }
        Command::Whoami => match console.verify_session().await {
            SessionCheck::Active(profile) => println!("{profile:#}"),
            SessionCheck::NoSession => println!("not signed in"),
            SessionCheck::Rejected => {
                println!("{}", LogoutReason::SessionExpired.message());
            }
            SessionCheck::Unknown => println!("server unreachable, session kept"),
        },
        Command::Get { path } => fetch(&console, &path).await?,
        Command::Users => fetch(&console, banquet::endpoints::USERS_PATH).await?,
        Command::Route { path } => {
            let has_session = console.session().is_some();
            match RouteGuard::default().decide(&path, has_session) {
                RouteDecision::Allow => println!("allow {path}"),
                RouteDecision::Redirect(to) => println!("redirect {path} -> {to}"),
            }
        }
        Command::Logout => {
            console.logout().await;
            println!("signed out");
        }
        Command::Shell { idle_secs } => {
            shell(&console, IdleConfig { timeout_secs: idle_secs }).await?;
        }
    }
    Ok(())
}

async fn fetch(console: &Console, path: &str) -> Result<(), BanquetError> {
    let response = console
        .authenticated_request(ApiRequest::new(Method::GET, path))
        .await?;

    if response.is_unauthorized() {
        println!("{}", LogoutReason::SessionExpired.message());
        println!("sign in again: {}", login_redirect(Some(LogoutReason::SessionExpired), Some(path)));
        return Ok(());
    }

    match response.json::<serde_json::Value>() {
        Ok(body) => println!("{} {body:#}", response.status),
        Err(_) => println!("{} {}", response.status, response.text()),
    }
    Ok(())
}

async fn shell(console: &Console, idle: IdleConfig) -> Result<(), BanquetError> {
    let (mut guard, activity) = console.start_idle_guard(idle);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    tracing::info!(timeout_secs = guard.timeout().as_secs(), "shell started");
    loop {
        tokio::select! {
            reason = guard.expired() => {
                println!("{}", reason.message());
                println!("sign in again: {}", login_redirect(Some(reason), None));
                return Ok(());
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { return Ok(()) };
                activity.record(Activity::KeyPress);
                let path = line.trim();
                if !path.is_empty() {
                    fetch(console, path).await?;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    banquet::telemetry::init(&cli.log)?;
    run(cli).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cli(api_url: &str, session_file: &std::path::Path, args: &[&str]) -> Cli {
        let mut argv = vec![
            "admin-console".to_owned(),
            "--api-url".to_owned(),
            api_url.to_owned(),
            "--session-file".to_owned(),
            session_file.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| (*a).to_owned()));
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_parses_login() {
        let parsed = Cli::try_parse_from([
            "admin-console", "login", "--username", "ada", "--password", "pw",
        ])
        .unwrap();
        assert!(matches!(
            parsed.command,
            Command::Login { ref username, .. } if username == "ada"
        ));
    }

    #[test]
    fn test_cli_shell_defaults_to_ten_minutes() {
        let parsed = Cli::try_parse_from(["admin-console", "shell"]).unwrap();
        match parsed.command {
            Command::Shell { idle_secs } => assert_eq!(idle_secs, 600),
            other => panic!("expected shell, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_persists_session_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "A1",
                "refreshToken": "R1",
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.json");

        run(cli(&server.uri(), &file, &["login", "-u", "ada", "-p", "pw"]))
            .await
            .unwrap();

        let stored = FileStore::new(&file).load().expect("session written");
        assert_eq!(stored.access_token, "A1");

        run(cli(&server.uri(), &file, &["logout"])).await.unwrap();
        assert!(FileStore::new(&file).load().is_none());
    }
}
