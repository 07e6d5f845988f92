use std::time::Duration;

use {
    anyhow::Result,
    pixelbot_config::ContentConfig,
    pixelbot_media::{ContentFetcher, ValidationRules},
};

pub fn fetcher(config: &ContentConfig) -> Result<ContentFetcher> {
    let rules = ValidationRules::default().with_limits(config.max_bytes, config.width, config.height);
    Ok(ContentFetcher::new(
        rules,
        Duration::from_millis(config.fetch_timeout_ms),
    )?)
}

pub async fn validate_content(config: &ContentConfig, source: &str) -> Result<()> {
    let fetcher = fetcher(config)?;
    match fetcher.load_validated(source).await {
        Ok(content) => {
            println!(
                "ok: {} ({} bytes, {}x{}, {})",
                source, content.size, content.width, content.height, content.mime
            );
            Ok(())
        },
        Err(e) => {
            eprintln!("rejected: {source}: {e}");
            std::process::exit(1);
        },
    }
}
