//! `cbridge config`: print the resolved configuration.

use console::style;

use chatbridge_types::config::BridgeConfig;

/// Render the configuration as TOML, followed by the API key status.
///
/// The key itself is never printed.
pub fn render_config(config: &BridgeConfig, api_key_set: bool) -> anyhow::Result<String> {
    let mut rendered = toml::to_string_pretty(config)?;
    let status = if api_key_set { "set (redacted)" } else { "missing" };
    rendered.push_str(&format!("\n# api key: {status}\n"));
    Ok(rendered)
}

pub fn print_config(config: &BridgeConfig, api_key_set: bool) -> anyhow::Result<()> {
    println!("{}", render_config(config, api_key_set)?);
    if !api_key_set {
        eprintln!(
            "  {} Set CHATBRIDGE_API_KEY (or OPENAI_API_KEY) before chatting.",
            style("!").yellow().bold()
        );
    }
    Ok(())
}
