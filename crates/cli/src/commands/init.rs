//! `clinicchat init`: Write a default config file.

use std::path::Path;

use clinicchat_config::AppConfig;

pub async fn run(config_path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = super::config_file(config_path);

    println!("🩺 ClinicChat — Setup");
    println!("=====================\n");

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    if path.exists() && !force {
        println!("⚠️  Config already exists at: {}", path.display());
        println!("   Edit it manually or re-run with --force.\n");
        return Ok(());
    }

    std::fs::write(&path, AppConfig::default_toml())?;
    println!("✅ Wrote config to: {}", path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set CLINICCHAT_API_KEY or add api_key to the config");
    println!("   2. Add patient tokens under [[auth.tokens]]");
    println!("   3. Run: clinicchat serve\n");

    Ok(())
}
