//! `clinicchat status`: Show the effective configuration.

use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let file = super::config_file(config_path);

    println!("🩺 ClinicChat Status");
    println!("====================");
    println!("  Config file:  {}", file.display());
    println!("  Provider:     {}", config.provider);
    println!("  Model:        {}", config.assistant.model);
    println!("  Max tokens:   {}", config.assistant.max_output_tokens);
    println!("  Temperature:  {}", config.assistant.temperature);
    println!("  API key:      {}", if config.has_api_key() { "configured" } else { "missing" });
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Origins:      {}", config.gateway.allowed_origins.join(", "));
    println!("  Auth:         {}", if config.auth.require_auth { "required" } else { "disabled" });
    println!("  Tokens:       {}", config.auth.tokens.len());
    println!("  Error detail: {}", if config.gateway.expose_error_detail { "exposed" } else { "hidden" });

    if file.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, using defaults. Run `clinicchat init` to create one.");
    }

    Ok(())
}
