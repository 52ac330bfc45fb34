//! Welcome banner display for chat sessions.

use console::style;

/// Print the welcome banner at the start of a chat session.
pub fn print_welcome_banner(provider: &str, model: &str, server_url: &str, streaming: bool) {
    let mode = if streaming { "streaming" } else { "single reply" };

    println!();
    println!("  {}", style("chatbridge").cyan().bold());
    println!();
    println!("  {}  {} ({})", style("Model:").bold(), style(model).dim(), style(provider).dim());
    println!("  {}   {}", style("Mode:").bold(), style(mode).dim());
    println!("  {} {}", style("Server:").bold(), style(server_url).cyan());
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
