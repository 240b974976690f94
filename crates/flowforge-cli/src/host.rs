//! Terminal stand-in for the editor

use async_trait::async_trait;
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use sidebar_panel::{EditorHost, HostError};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

pub struct TerminalHost {
    /// Inserted code is appended here; printed to stdout when unset.
    insert_file: Option<PathBuf>,
    /// Whole file is the "selection"; enhancing a selection rewrites it.
    selection_file: Option<PathBuf>,
}

impl TerminalHost {
    pub fn new(insert_file: Option<PathBuf>, selection_file: Option<PathBuf>) -> Self {
        Self {
            insert_file,
            selection_file,
        }
    }
}

/// Read the token without echoing it. Piped input is read as a plain line.
fn read_secret_line() -> io::Result<Option<String>> {
    print!("{} ", "GitHub Token (input hidden):".cyan().bold());
    io::stdout().flush()?;

    if !io::stdin().is_terminal() {
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        return Ok(Some(input.trim().to_string()));
    }

    terminal::enable_raw_mode()?;
    let read = read_hidden();
    terminal::disable_raw_mode()?;
    println!();
    read
}

fn read_hidden() -> io::Result<Option<String>> {
    hidden_input(std::iter::from_fn(|| Some(event::read())))
}

/// Collect keystrokes until Enter; Esc or Ctrl-C cancels.
fn hidden_input(events: impl Iterator<Item = io::Result<Event>>) -> io::Result<Option<String>> {
    let mut input = String::new();
    for event in events {
        let Event::Key(key) = event? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(Some(input.trim().to_string())),
            KeyCode::Esc => return Ok(None),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(None)
            }
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            _ => {}
        }
    }
    Ok(None)
}

#[async_trait]
impl EditorHost for TerminalHost {
    async fn copy_to_clipboard(&self, text: &str) -> Result<(), HostError> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard =
                arboard::Clipboard::new().map_err(|e| HostError::Clipboard(e.to_string()))?;
            clipboard
                .set_text(text)
                .map_err(|e| HostError::Clipboard(e.to_string()))
        })
        .await
        .map_err(|e| HostError::Other(e.to_string()))?
    }

    async fn insert_text(&self, text: &str) -> Result<(), HostError> {
        let Some(path) = &self.insert_file else {
            println!("{}", text);
            return Ok(());
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| HostError::Other(format!("{}: {}", path.display(), e)))?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| HostError::Other(e.to_string()))?;
        if !text.ends_with('\n') {
            file.write_all(b"\n")
                .await
                .map_err(|e| HostError::Other(e.to_string()))?;
        }
        log::debug!("Inserted {} bytes into {}", text.len(), path.display());
        Ok(())
    }

    async fn selected_text(&self) -> Option<String> {
        let path = self.selection_file.as_ref()?;
        match tokio::fs::read_to_string(path).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to read selection {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn replace_selection(&self, text: &str) -> Result<(), HostError> {
        let Some(path) = &self.selection_file else {
            return Err(HostError::Other("No selection to replace".into()));
        };
        tokio::fs::write(path, text)
            .await
            .map_err(|e| HostError::Other(format!("{}: {}", path.display(), e)))?;
        println!("{}", format!("✅ Updated {}", path.display()).green());
        Ok(())
    }

    async fn prompt_api_key(&self) -> Option<String> {
        match tokio::task::spawn_blocking(read_secret_line).await {
            Ok(Ok(Some(key))) if !key.is_empty() => Some(key),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                log::warn!("Failed to read token: {}", e);
                None
            }
            Err(e) => {
                log::warn!("Token prompt task failed: {}", e);
                None
            }
        }
    }

    async fn show_info(&self, message: &str) {
        println!("{}", format!("✅ {}", message).green());
    }

    async fn show_error(&self, message: &str) {
        eprintln!("{}", format!("❌ {}", message).red());
    }
}
