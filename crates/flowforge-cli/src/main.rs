mod host;
mod logging;

use anyhow::Context;
use chat_client::mask_secret;
use chat_core::{extract, paths, CodeBlock, ConversationTurn, Role, Segment, SettingsUpdate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use session_manager::{
    ConfigStore, ConversationSession, EncryptedFileSecretStore, JsonFileStore, TranscriptStore,
};
use sidebar_panel::{render_transcript, EditorHost, InboundMessage, OutboundMessage, PanelBridge};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::host::TerminalHost;

#[derive(Parser)]
#[command(name = "flowforge")]
#[command(about = "Chat with GitHub Models from the terminal")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// File that "insert" appends code to (stdout when unset)
    #[arg(long, env = "FLOWFORGE_INSERT_FILE")]
    insert_file: Option<PathBuf>,

    /// File standing in for the editor selection; `send` quotes it and
    /// `enhance` rewrites it in place
    #[arg(long, env = "FLOWFORGE_SELECTION_FILE")]
    selection_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive chat
    Chat,
    /// Send a single message, quoting the selection when there is one
    Send {
        /// Message content
        message: String,
    },
    /// Rewrite a prompt to be clearer, without touching the conversation.
    /// With a selection, the selection is enhanced and replaced; otherwise
    /// the result is also copied to the clipboard
    Enhance {
        prompt: Option<String>,
    },
    /// View the conversation
    History {
        /// Print the panel HTML instead of plain text
        #[arg(long, conflicts_with = "json")]
        html: bool,
        /// Print raw turns as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget the conversation
    Clear,
    /// Store the GitHub token (prompts when omitted)
    SetKey {
        key: Option<String>,
    },
    /// Show or change settings
    Settings {
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long)]
        save_history: Option<bool>,
    },
}

/// Bridge driven inline: each message is handled to completion, then the
/// replies it produced are drained.
struct Panel {
    session: Arc<ConversationSession>,
    config: Arc<ConfigStore>,
    bridge: PanelBridge,
    outbound: mpsc::Receiver<OutboundMessage>,
    last_blocks: Vec<CodeBlock>,
}

impl Panel {
    async fn open(
        insert_file: Option<PathBuf>,
        selection_file: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let dir = paths::ensure_flowforge_dir()
            .with_context(|| format!("Failed to create {}", paths::flowforge_dir().display()))?;
        log::debug!("Data directory: {}", dir.display());

        let secrets = Arc::new(EncryptedFileSecretStore::open(
            paths::secrets_json_path(),
            &paths::secret_key_path(),
        )?);
        let config = Arc::new(ConfigStore::new(secrets, paths::config_json_path()));
        let store = TranscriptStore::new(Arc::new(JsonFileStore::new(paths::state_json_path())));
        let session = Arc::new(ConversationSession::new(config.load().await?, store).await?);

        let host: Arc<dyn EditorHost> = Arc::new(TerminalHost::new(insert_file, selection_file));
        let (tx, rx) = mpsc::channel(8);
        let bridge = PanelBridge::new(Arc::clone(&session), Arc::clone(&config), host, tx);

        Ok(Self {
            session,
            config,
            bridge,
            outbound: rx,
            last_blocks: Vec::new(),
        })
    }

    async fn dispatch(&mut self, message: InboundMessage) -> anyhow::Result<Vec<OutboundMessage>> {
        let handled = self.bridge.handle(message).await;
        let replies = self.drain();
        handled?;
        Ok(replies)
    }

    async fn ask(&mut self, prompt: &str) -> anyhow::Result<Vec<OutboundMessage>> {
        let handled = self.bridge.ask(prompt).await;
        let replies = self.drain();
        handled?;
        Ok(replies)
    }

    fn drain(&mut self) -> Vec<OutboundMessage> {
        let mut replies = Vec::new();
        while let Ok(reply) = self.outbound.try_recv() {
            replies.push(reply);
        }
        replies
    }

    /// Print replies; returns the first error reply, if any.
    fn show(&mut self, replies: Vec<OutboundMessage>) -> Option<String> {
        let mut failure = None;
        for reply in replies {
            match reply {
                OutboundMessage::UpdateResponse { value, is_error } => {
                    if is_error == Some(true) {
                        println!("{}", format!("❌ {}", value).red());
                        failure.get_or_insert(value);
                    } else {
                        println!("{}", "Assistant:".green().bold());
                        self.last_blocks = print_reply(&value);
                    }
                }
                OutboundMessage::ModelInfo { value } => {
                    println!("{}", format!("Model: {}", value).dimmed());
                }
                OutboundMessage::LoadedConversation { value } => print_turns(&value),
                OutboundMessage::ClearConversation => {
                    self.last_blocks.clear();
                    println!("{}", "🧹 Conversation cleared".cyan());
                }
            }
        }
        failure
    }
}

/// Print prose as-is and code blocks numbered, so they can be copied by index.
fn print_reply(content: &str) -> Vec<CodeBlock> {
    let extraction = extract(content);
    let mut index = 0;
    for segment in extraction.segments() {
        match segment {
            Segment::Text(text) => println!("{}", text.trim_end()),
            Segment::Code(block) => {
                index += 1;
                println!("{}", format!("┌─ [{}] {}", index, block.language).dimmed());
                println!("{}", block.code.yellow());
                println!("{}", "└─".dimmed());
            }
        }
    }
    extraction.blocks
}

fn print_turns(turns: &[ConversationTurn]) {
    if turns.is_empty() {
        println!("{}", "No conversation yet".dimmed());
        return;
    }
    for turn in turns {
        match turn.role {
            Role::User => println!("{} {}", "You:".cyan().bold(), turn.content),
            Role::Assistant => {
                println!("{}", "Assistant:".green().bold());
                print_reply(&turn.content);
            }
            Role::System => continue,
        }
        println!();
    }
}

fn block_by_index(blocks: &[CodeBlock], arg: &str) -> Option<String> {
    let index: usize = arg.trim().parse().ok()?;
    blocks.get(index.checked_sub(1)?).map(|b| b.code.clone())
}

fn print_chat_help() {
    println!("{}", "Commands:".bold());
    println!("  /clear               forget the conversation");
    println!("  /key [token]         store a GitHub token");
    println!("  /model <name>        switch model");
    println!("  /temperature <0..1>  set sampling temperature");
    println!("  /history             show the conversation");
    println!("  /enhance [prompt]    rewrite the selection, or a prompt");
    println!("  /copy <n>            copy code block n of the last reply");
    println!("  /insert <n>          insert code block n of the last reply");
    println!("  exit | quit          leave");
}

async fn run_interactive_chat(panel: &mut Panel) -> anyhow::Result<()> {
    println!("{}", "🤖 FlowForge Chat".cyan().bold());
    let replies = panel.dispatch(InboundMessage::GetModelInfo).await?;
    panel.show(replies);
    if !panel.session.status().await.can_send() {
        println!("{}", "No token configured yet, use /key".yellow());
    }
    println!("{}", "Type /help for commands, 'exit' or 'quit' to leave".dimmed());
    println!();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "👋 Goodbye!".cyan());
            break;
        }
        if input.is_empty() {
            continue;
        }

        let (command, arg) = match input.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (input, ""),
        };

        let message = match command {
            "/help" => {
                print_chat_help();
                continue;
            }
            "/clear" => InboundMessage::ClearConversation,
            "/key" => InboundMessage::ConfigureApiKey {
                value: (!arg.is_empty()).then(|| arg.to_string()),
            },
            "/model" if !arg.is_empty() => InboundMessage::UpdateSettings {
                value: SettingsUpdate {
                    selected_model: Some(arg.to_string()),
                    ..Default::default()
                },
            },
            "/temperature" => match arg.parse::<f32>() {
                Ok(temperature) => InboundMessage::UpdateSettings {
                    value: SettingsUpdate {
                        temperature: Some(temperature),
                        ..Default::default()
                    },
                },
                Err(_) => {
                    println!("{}", "Usage: /temperature <0..1>".yellow());
                    continue;
                }
            },
            "/history" => InboundMessage::LoadConversation,
            "/enhance" => {
                let prompt = (!arg.is_empty()).then_some(arg);
                if let Some(enhanced) = panel.bridge.enhance_prompt(prompt).await {
                    println!("{}\n{}", "Enhanced prompt:".green().bold(), enhanced);
                }
                continue;
            }
            "/copy" | "/insert" => match block_by_index(&panel.last_blocks, arg) {
                Some(code) if command == "/copy" => InboundMessage::CopyToClipboard { value: code },
                Some(code) => InboundMessage::InsertToEditor { value: code },
                None => {
                    println!("{}", format!("Usage: {} <block number>", command).yellow());
                    continue;
                }
            },
            other if other.starts_with('/') => {
                println!("{}", format!("Unknown command {}, try /help", other).yellow());
                continue;
            }
            _ => InboundMessage::SubmitQuery {
                value: input.to_string(),
            },
        };

        match panel.dispatch(message).await {
            Ok(replies) => {
                panel.show(replies);
            }
            Err(e) => println!("{}", format!("❌ Error: {}", e).red()),
        }
        println!();
    }

    Ok(())
}

async fn show_settings(panel: &Panel) -> anyhow::Result<()> {
    let settings = panel.session.settings().await;
    let token = panel
        .config
        .api_key()
        .await?
        .map(|key| mask_secret(&key))
        .unwrap_or_else(|| "(not set)".to_string());

    println!("{} {}", "Model:".bold(), settings.selected_model);
    println!("{} {}", "Temperature:".bold(), settings.temperature);
    println!("{} {}", "Save history:".bold(), settings.save_history);
    println!("{} {}", "API base:".bold(), settings.api_base);
    println!("{} {}", "Token:".bold(), token);
    println!("{} {:?}", "Status:".bold(), panel.session.status().await);
    println!(
        "{}",
        format!("Settings file: {}", panel.config.settings_path().display()).dimmed()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    let mut panel = Panel::open(cli.insert_file, cli.selection_file).await?;

    match cli.command {
        Commands::Chat => run_interactive_chat(&mut panel).await,
        Commands::Send { message } => {
            let replies = panel.ask(&message).await?;
            match panel.show(replies) {
                Some(error) => anyhow::bail!(error),
                None => Ok(()),
            }
        }
        Commands::Enhance { prompt } => match panel.bridge.enhance_prompt(prompt.as_deref()).await {
            Some(enhanced) => {
                println!("{}", enhanced);
                Ok(())
            }
            None => anyhow::bail!("Nothing enhanced: pass a prompt or a non-empty --selection-file"),
        },
        Commands::History { html, json } => {
            let turns = panel.session.history().await;
            if html {
                println!("{}", render_transcript(&turns));
            } else if json {
                println!("{}", serde_json::to_string_pretty(&turns)?);
            } else {
                let replies = panel.dispatch(InboundMessage::LoadConversation).await?;
                panel.show(replies);
            }
            Ok(())
        }
        Commands::Clear => {
            let replies = panel.dispatch(InboundMessage::ClearConversation).await?;
            panel.show(replies);
            Ok(())
        }
        Commands::SetKey { key } => {
            let replies = panel
                .dispatch(InboundMessage::ConfigureApiKey { value: key })
                .await?;
            if replies.is_empty() {
                println!("{}", "No token entered, nothing changed".yellow());
            }
            panel.show(replies);
            Ok(())
        }
        Commands::Settings {
            model,
            temperature,
            save_history,
        } => {
            let update = SettingsUpdate {
                selected_model: model,
                temperature,
                save_history,
            };
            if update.is_empty() {
                return show_settings(&panel).await;
            }
            let replies = panel
                .dispatch(InboundMessage::UpdateSettings { value: update })
                .await?;
            panel.show(replies);
            show_settings(&panel).await
        }
    }
}
