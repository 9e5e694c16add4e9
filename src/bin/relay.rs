use twilio_callflow::config::RelayConfig;
use twilio_callflow::relay::{answer, Command, StartCallClient};

use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(true)
                .with_line_number(true),
        )
        .with(tracing_subscriber::filter::Targets::new().with_targets([
            ("hyper", tracing_subscriber::filter::LevelFilter::OFF),
            ("twilio_callflow", tracing_subscriber::filter::LevelFilter::DEBUG),
            ("callflow_relay", tracing_subscriber::filter::LevelFilter::DEBUG),
        ]));
    tracing::subscriber::set_global_default(subscriber)?;

    let config = RelayConfig::from_env()?;
    if config.backend_url.is_empty() {
        warn!("BASE_URL not set; /call requests will fail");
    }
    let client = Arc::new(StartCallClient::new(config.backend_url)?);
    let bot = Bot::new(config.bot_token);

    let handler = Update::filter_message()
        .filter_command::<Command>()
        .endpoint(answer);

    info!("Bot started and polling...");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![client])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}
