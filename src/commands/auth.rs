use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::AppConfig;

/// Run the consent flow even when a cached token exists.
pub async fn run(config: &AppConfig) -> Result<()> {
    let manager = calsync_google::credential_manager(&config.google)?;

    println!("Authorizing calsync with Google Calendar...");
    manager.reauthorize().await?;

    println!("{}", "Authorization successful!".green());
    println!(
        "Token cached at {}",
        config.google.token_cache_path.display().dimmed()
    );
    println!("\nRun `calsync` to sync the next {} days.", config.sync.window_days);

    Ok(())
}
