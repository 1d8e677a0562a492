use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, Level};

mod cli;
mod sandbox;
mod screens;

use cli::{Cli, Commands};
use screens::{Command, SessionScreens};
use shared::config::ClientConfig;
use shared::models::identity::ClientIdentity;
use shared::repositories::session_repository::HttpSessionRepository;
use shared::services::session_service::SessionService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Sandbox { interval_ms } => sandbox::run(Duration::from_millis(*interval_ms)).await,
        Commands::Create {
            track,
            questions,
            win_type,
            win_value,
        } => {
            let remote = Remote::connect(&cli)?;
            let created = remote
                .service
                .create_session(track, *questions, (*win_type).into(), *win_value)
                .await?;
            println!("Share this code with your opponent: {}", created.session_code);
            remote.play(&created.session_id).await
        }
        Commands::Join { code } => {
            let remote = Remote::connect(&cli)?;
            let joined = remote.service.join_session(code).await?;
            remote.play(&joined.session_id).await
        }
    }
}

/// A player talking to the real session API.
struct Remote {
    identity: ClientIdentity,
    repository: Arc<HttpSessionRepository>,
    service: SessionService,
    poll_interval: Duration,
}

impl Remote {
    fn connect(cli: &Cli) -> anyhow::Result<Self> {
        let config = load_config(cli)?;
        let identity = match &cli.user_id {
            Some(user_id) => ClientIdentity::new(user_id, user_id),
            None => ClientIdentity::from_bearer_token(&config.auth_token)?,
        };
        let poll_interval = config.poll_interval;
        let repository = Arc::new(HttpSessionRepository::new(config)?);
        debug!("Acting as {}", identity.user_id);

        Ok(Remote {
            identity,
            service: SessionService::new(repository.clone()),
            repository,
            poll_interval,
        })
    }

    async fn play(self, session_id: &str) -> anyhow::Result<()> {
        let screens = SessionScreens::new(
            session_id,
            &self.identity.user_id,
            self.repository,
            self.poll_interval,
        );
        let mut commands = spawn_stdin_reader();
        let screen = screens.run(&mut commands).await?;
        for line in screens.conclude(screen).await {
            println!("{}", line);
        }
        Ok(())
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) if cli.base_url.is_some() && cli.token.is_some() => {
            debug!("Ignoring environment configuration: {}", e);
            ClientConfig::default()
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(token) = &cli.token {
        config = config.with_auth_token(token);
    }
    config.validate()?;
    Ok(config)
}

fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<Command> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match Command::parse(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => println!("Unknown command '{}'. Use 'r' or 'q'.", line.trim()),
            }
        }
    });
    rx
}
