//! Interactive terminal front end for SnapGPT.
//!
//! Presentation only: parses commands, forwards them to the controller and
//! prints the resulting transcript entries.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use snapgpt_application::{ChatController, ControllerPhase};
use snapgpt_core::config::BackendConfig;
use snapgpt_core::session::{Sender, Session};
use snapgpt_interaction::BackendApiClient;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;

#[derive(Parser)]
#[command(name = "snapgpt")]
#[command(about = "SnapGPT - multimodal chat with PDF-grounded question answering", long_about = None)]
struct Cli {
    /// Backend base URL (overrides config file and environment)
    #[arg(long)]
    base_url: Option<String>,
    /// Default chat model (overrides config file and environment)
    #[arg(long)]
    model: Option<String>,
}

const HELP: &str = "\
Commands:
  /new                     start a new chat
  /list                    list chats grouped by date
  /switch <n|id>           switch to a chat (index from /list or id)
  /rename <n|id> <name>    rename a chat
  /delete <n|id>           delete a chat
  /pdf <path>              upload a PDF and enter PDF mode
  /image <path>            attach an image to the next message
  /clear-image             drop the pending image
  /exit-pdf                leave PDF mode
  /model <name>            change the chat model for this session
  /reset                   reset the backend session and start a new chat
  /help                    show this help
  /quit                    exit
Anything else is sent as a chat message.";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = BackendConfig::load()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(model) = cli.model {
        config.chat_model = model;
    }

    let gateway = Arc::new(BackendApiClient::from_config(&config));
    let controller = ChatController::new(gateway, config);

    println!("SnapGPT - type /help for commands");
    repl(&controller).await
}

async fn repl(controller: &ChatController) -> Result<()> {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} > ", controller.header_label().await);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" || input == "/exit" {
            break;
        }
        handle(controller, input).await?;
    }
    Ok(())
}

async fn handle(controller: &ChatController, input: &str) -> Result<()> {
    if let Some(rest) = input.strip_prefix('/') {
        let (command, arg) = match rest.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (rest, ""),
        };
        match command {
            "help" => println!("{HELP}"),
            "new" => {
                controller.create_new().await;
                println!("Started a new chat.");
            }
            "list" => print_session_list(controller).await,
            "switch" => match resolve_session(controller, arg).await {
                Some(id) => match controller.switch_to(&id).await {
                    Ok(()) => print_transcript(controller).await,
                    Err(err) => println!("{err}"),
                },
                None => println!("No such chat: {arg}"),
            },
            "rename" => {
                let (target, name) = match arg.split_once(' ') {
                    Some((target, name)) => (target, name.trim()),
                    None => (arg, ""),
                };
                match resolve_session(controller, target).await {
                    Some(id) => controller.rename_session(&id, name).await,
                    None => println!("No such chat: {target}"),
                }
            }
            "delete" => match resolve_session(controller, arg).await {
                Some(id) => controller.delete_session(&id).await,
                None => println!("No such chat: {arg}"),
            },
            "pdf" => upload_pdf(controller, arg).await?,
            "image" => attach_image(controller, arg).await?,
            "clear-image" => controller.clear_image().await,
            "exit-pdf" => {
                controller.exit_pdf_mode().await;
                print_last_bot_message(controller).await;
            }
            "model" => controller.set_model(arg).await,
            "reset" => {
                controller.reset_chat().await;
                println!("Chat reset.");
            }
            _ => println!("Unknown command: /{command} (try /help)"),
        }
        return Ok(());
    }

    if controller.phase().await != ControllerPhase::Idle {
        println!("Still working on the previous request...");
        return Ok(());
    }
    controller.send_message(input).await;
    print_last_bot_message(controller).await;
    Ok(())
}

async fn upload_pdf(controller: &ChatController, path: &str) -> Result<()> {
    if path.is_empty() {
        println!("Usage: /pdf <path>");
        return Ok(());
    }
    let file = match tokio::fs::read(path).await {
        Ok(file) => file,
        Err(err) => {
            println!("Could not read {path}: {err}");
            return Ok(());
        }
    };
    let file_name = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    println!("Processing PDF...");
    controller.upload_pdf(file, &file_name).await;
    print_transcript_tail(controller, 2).await;
    Ok(())
}

async fn attach_image(controller: &ChatController, path: &str) -> Result<()> {
    if path.is_empty() {
        println!("Usage: /image <path>");
        return Ok(());
    }
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            println!("Could not read {path}: {err}");
            return Ok(());
        }
    };
    let media_type = mime_guess::from_path(path).first_or_octet_stream();
    controller.attach_image(&bytes, media_type.essence_str()).await;
    println!("Image attached to the next message.");
    Ok(())
}

/// Resolves a 1-based index from the last `/list` output or a session id.
async fn resolve_session(controller: &ChatController, arg: &str) -> Option<String> {
    let sessions = controller.sessions().await;
    if let Ok(index) = arg.parse::<usize>() {
        return sessions.get(index.checked_sub(1)?).map(|s| s.id.clone());
    }
    sessions.iter().find(|s| s.id == arg).map(|s| s.id.clone())
}

async fn print_session_list(controller: &ChatController) {
    let sessions = controller.sessions().await;
    let groups = controller.grouped_sessions(Utc::now()).await;
    let active = controller.active_session_id().await;

    let index_of = |session: &Session| {
        sessions
            .iter()
            .position(|s| s.id == session.id)
            .map(|i| i + 1)
            .unwrap_or(0)
    };
    let print_bucket = |title: &str, bucket: &[Session]| {
        if bucket.is_empty() {
            return;
        }
        println!("{title}");
        for session in bucket {
            let marker = if session.id == active { "*" } else { " " };
            println!("{marker} {:>2}. {}", index_of(session), session.display_label());
        }
    };

    print_bucket("Today", &groups.today);
    print_bucket("Yesterday", &groups.yesterday);
    print_bucket("Previous 7 Days", &groups.previous_7_days);
    print_bucket("Older", &groups.older);
}

async fn print_transcript(controller: &ChatController) {
    for message in controller.transcript().await {
        print_message(&message.sender, &message.text);
    }
}

async fn print_transcript_tail(controller: &ChatController, count: usize) {
    let transcript = controller.transcript().await;
    let start = transcript.len().saturating_sub(count);
    for message in &transcript[start..] {
        print_message(&message.sender, &message.text);
    }
}

async fn print_last_bot_message(controller: &ChatController) {
    if let Some(message) = controller
        .transcript()
        .await
        .iter()
        .rev()
        .find(|m| m.sender == Sender::Bot)
    {
        print_message(&message.sender, &message.text);
    }
}

fn print_message(sender: &Sender, text: &str) {
    match sender {
        Sender::User => println!("you: {text}"),
        Sender::Bot => println!("bot: {text}"),
    }
}
