use std::fs;
use std::sync::Arc;

use zimer_chat::app::App;
use zimer_chat::config::ChatConfig;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_logging()?;

    let config = ChatConfig::load()?;
    tracing::info!(backend_url = %config.backend_url, "starting zimer-chat");

    let terminal = ratatui::init();
    let result = App::new(config).run(terminal).await;
    ratatui::restore();
    result
}

/// Logs go to a file; the terminal itself belongs to ratatui.
fn init_logging() -> color_eyre::Result<()> {
    fs::create_dir_all("logs")?;
    let log_file = fs::File::create("logs/zimer-chat.log")?;
    tracing_subscriber::fmt()
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}
