use twilio_callflow::config::Config;
use twilio_callflow::provider::TwilioClient;
use twilio_callflow::types::AppState;

use std::sync::Arc;
use tracing::info;
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
            ("tower_http", tracing_subscriber::filter::LevelFilter::DEBUG),
            ("twilio_callflow", tracing_subscriber::filter::LevelFilter::DEBUG),
            ("callflow", tracing_subscriber::filter::LevelFilter::DEBUG),
        ]));
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env()?;
    tokio::fs::create_dir_all(&config.voice_dir).await?;
    info!(
        bind_addr=%config.bind_addr,
        voice_dir=%config.voice_dir.display(),
        speech_key=config.openai_api_key.is_some(),
        "starting call orchestrator"
    );

    let provider = TwilioClient::new(
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
    );
    let app_state = Arc::new(AppState {
        provider: Arc::new(provider),
        from_number: config.twilio_from_number.clone(),
        base_url: config.base_url.clone(),
    });

    let app = twilio_callflow::app(app_state, &config.voice_dir);

    axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
