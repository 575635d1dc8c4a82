use std::error::Error;
use std::sync::{Arc, OnceLock};

use clap::{Parser, Subcommand};
use game::controller::{Command, Controller, HELP};
use game::dispatcher::ActionDispatcher;
use game::lobby::{format_players, Lobby};
use game::session::GameSession;
use models::identity::{ClientIdentity, IdentityStore};
use models::settings::Settings;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use transport::adapter::TransportAdapter;
use transport::http::HttpGameServer;
use transport::push::WsConnector;
use utils::logger::LogLevel;

mod game;
mod models;
mod transport;
mod utils;

pub static SETTINGS: OnceLock<Settings> = OnceLock::new();

#[derive(Parser)]
#[command(name = "stab-client", version, about = "Terminal client for Stab Your Friends")]
struct Cli {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Create a new game and wait for players
    Create { username: String },
    /// Join an existing game by its code
    Join { code: String, username: String },
    /// Show who joined the current game
    Players,
    /// Play the current game (default)
    Play,
    /// Forget the stored game
    Leave,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let loaded = Settings::load()?;
    let settings = SETTINGS.get_or_init(|| loaded);

    match settings.log_level.parse::<LogLevel>() {
        Ok(level) => utils::logger::Logger::set_level(level),
        Err(error) => logger!(WARN, "[SETTINGS] {error}, keeping `info`"),
    }

    let store = IdentityStore::new(&settings.identity_file);
    let server = Arc::new(HttpGameServer::new(settings.http_base()));
    let lobby = Lobby::new(server, IdentityStore::new(&settings.identity_file));

    match cli.command.unwrap_or(CliCommand::Play) {
        CliCommand::Create { username } => {
            let identity = lobby.create_game(&username).await?;
            println!("Game code: {}", identity.game_code());
            waiting_room(&lobby, settings, &identity).await;
            run_game(settings, identity).await;
        }
        CliCommand::Join { code, username } => {
            let identity = lobby.join_game(&code, &username).await?;
            waiting_room(&lobby, settings, &identity).await;
            run_game(settings, identity).await;
        }
        CliCommand::Players => {
            let identity = store.load()?;
            let players = lobby.list_players(identity.game_code()).await?;
            println!("{}", format_players(&players));
        }
        CliCommand::Play => {
            let identity = store.load()?;
            run_game(settings, identity).await;
        }
        CliCommand::Leave => {
            store.clear()?;
            println!("Left the game.");
        }
    }

    Ok(())
}

/// Prints the player list whenever it changes until Enter is pressed.
async fn waiting_room(lobby: &Lobby, settings: &Settings, identity: &ClientIdentity) {
    println!("Waiting for players in `{}`, press Enter to start.", identity.game_code());
    let (tx, mut rx) = mpsc::channel(4);
    let watcher = lobby.watch_players(identity.game_code(), settings.lobby_poll_interval(), tx);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_shown = String::new();

    loop {
        tokio::select! {
            Some(players) = rx.recv() => {
                let shown = format_players(&players);
                if shown != last_shown {
                    println!("{shown}");
                    last_shown = shown;
                }
            }
            _ = lines.next_line() => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    watcher.abort();
}

async fn run_game(settings: &'static Settings, identity: ClientIdentity) {
    logger!(INFO, "[SESSION] Playing `{}` as `{}`", identity.game_code(), identity.username());
    let server = Arc::new(HttpGameServer::new(settings.http_base()));
    let connector = Arc::new(WsConnector::new(move |code: &str| settings.push_url(code)));
    let (snapshot_tx, mut snapshot_rx) = mpsc::channel(32);
    let (notice_tx, mut notice_rx) = mpsc::channel(8);

    let mut adapter = TransportAdapter::new(
        identity.game_code(),
        server.clone(),
        connector,
        snapshot_tx,
        settings.reconnect_delay(),
    );
    adapter.connect();
    // The first poll tick fires right away and doubles as the initial fetch.
    adapter.start_fallback_polling(settings.poll_interval());

    let poller = adapter.poller();
    let dispatcher = ActionDispatcher::new(server, poller.clone(), notice_tx);
    let mut controller = Controller::new(GameSession::new(identity), dispatcher, poller);
    logger!(DEBUG, "[SESSION] Acting as `{}`", controller.session().identity().player_id());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        tokio::select! {
            Some(snapshot) = snapshot_rx.recv() => {
                controller.on_snapshot(snapshot);
                print_view(&controller);
            }
            Some(notice) = notice_rx.recv() => {
                controller.on_notice(notice);
                print_view(&controller);
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        controller.on_command(command);
                        print_view(&controller);
                    }
                    Err(error) => println!("{error} ({HELP})"),
                },
                Ok(None) => break,
                Err(error) => {
                    logger!(ERROR, "[SESSION] Unable to read input ({error})");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    adapter.shutdown();
}

fn print_view(controller: &Controller) {
    if let Some(view) = controller.session().view() {
        println!("\n{}", view.to_text());
    }
}
