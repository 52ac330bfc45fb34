//! Main chat loop orchestration.
//!
//! Reads prompts, runs them through the session, and prints reply chunks
//! as they arrive. Slash commands are handled locally.

use std::io::Write;
use std::time::Duration;

use console::style;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use chatbridge_core::session::ChatSession;
use chatbridge_types::chat::{Language, Prompt};

use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

/// Spinner shown while waiting for the first chunk of a reply.
pub fn thinking_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run the interactive chat loop until `/exit`, Ctrl+D or Ctrl+C.
pub async fn run_chat_loop(
    session: &ChatSession,
    mut language: Option<Language>,
) -> anyhow::Result<()> {
    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof | InputEvent::Interrupted => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }

                if let Some(cmd) = commands::parse(&text) {
                    match cmd {
                        ChatCommand::Help => commands::print_help(),
                        ChatCommand::Exit => {
                            println!("\n  {}", style("Session ended.").dim());
                            break;
                        }
                        ChatCommand::Memory => print_memory(session),
                        ChatCommand::Lang(None) => {
                            let current = language
                                .or(session.settings().default_language)
                                .map(|l| l.to_string())
                                .unwrap_or_else(|| "unset".to_string());
                            println!("\n  {} {}\n", style("Language:").bold(), current);
                        }
                        ChatCommand::Lang(Some(tag)) => match tag.parse::<Language>() {
                            Ok(lang) => {
                                language = Some(lang);
                                println!(
                                    "\n  {} Answers will be in {}.\n",
                                    style("*").cyan().bold(),
                                    style(lang).cyan()
                                );
                            }
                            Err(e) => {
                                println!("\n  {} {e}\n", style("!").yellow().bold());
                            }
                        },
                        ChatCommand::Unknown(name) => {
                            println!(
                                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                                style("?").yellow().bold(),
                                style(name).dim()
                            );
                        }
                    }
                    continue;
                }

                let mut prompt = Prompt::new(text);
                if let Some(lang) = language {
                    prompt = prompt.with_language(lang);
                }
                print_reply(session, prompt).await;
            }
        }
    }

    Ok(())
}

/// Submit one prompt and print its chunks as they arrive.
async fn print_reply(session: &ChatSession, prompt: Prompt) {
    let spinner = thinking_spinner("thinking...");
    let mut stream = session.process(prompt);
    let mut started = false;

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                if !started {
                    spinner.finish_and_clear();
                    started = true;
                    print!("\n  {} ", style("Bot >").cyan().bold());
                }
                print!("{}", chunk.text);
                let _ = std::io::stdout().flush();
            }
            Err(e) => {
                spinner.finish_and_clear();
                warn!(error = %e, retryable = e.is_retryable(), "Prompt processing failed");
                eprintln!("\n  {} {e}", style("!").red().bold());
                if e.is_retryable() {
                    eprintln!("  {}", style("Send the message again to retry, /exit to quit.").dim());
                }
                println!();
                return;
            }
        }
    }

    if !started {
        spinner.finish_and_clear();
    }
    println!("\n");
}

fn print_memory(session: &ChatSession) {
    let snapshot = session.memory().snapshot();
    println!();
    println!("  {}", style("Memory summary:").bold());
    if snapshot.summary.is_empty() {
        println!("  {}", style("(empty)").dim());
    } else {
        for line in snapshot.summary.lines() {
            println!("  {line}");
        }
    }
    println!(
        "\n  {} {} characters\n",
        style("Unsummarized transcript:").bold(),
        snapshot.raw_transcript.chars().count()
    );
}
