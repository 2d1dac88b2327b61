use anyhow::{Context, Result};
use clap::Parser;
use dysphasia_assist::audio::normalizer_from_config;
use dysphasia_assist::options::GeminiTextGenerator;
use dysphasia_assist::speech::{
    GoogleSpeechRecognizer, GoogleTextToSpeech, RecognitionOptions, VoiceOptions,
};
use dysphasia_assist::{
    create_router, AppState, Config, CredentialFile, InMemorySessionStore, OptionSynthesizer,
    SessionStore, Speaker, Transcriber, TurnController, TurnSettings,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "dysphasia-assist", about = "Multiple-choice communication aid for patients with expressive dysphasia")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/dysphasia-assist")]
    config: String,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    if cfg.speech.api_key.is_empty() {
        warn!("No speech API key configured; transcription and synthesis will fail");
    }
    if cfg.generator.api_key.is_empty() {
        warn!("No generator API key configured; fallback options will be used");
    }

    let speech_timeout = Duration::from_secs(cfg.speech.timeout_secs);
    let recognizer = Arc::new(GoogleSpeechRecognizer::new(&cfg.speech.api_key, speech_timeout)?);
    let synthesizer = Arc::new(GoogleTextToSpeech::new(&cfg.speech.api_key, speech_timeout)?);
    let generator = Arc::new(GeminiTextGenerator::new(
        &cfg.generator.api_key,
        &cfg.generator.model,
        Duration::from_secs(cfg.generator.timeout_secs),
    )?);

    let normalizer = normalizer_from_config(&cfg.audio);
    info!("Audio normalizer: {}", normalizer.name());

    tokio::fs::create_dir_all(&cfg.audio.artifacts_path)
        .await
        .with_context(|| format!("Failed to create {}", cfg.audio.artifacts_path))?;

    let mut store = InMemorySessionStore::new();
    if cfg.auth.session_idle_secs > 0 {
        store = store.with_idle_timeout(Duration::from_secs(cfg.auth.session_idle_secs));
    }
    let sessions: Arc<dyn SessionStore> = Arc::new(store);
    let identity = Arc::new(CredentialFile::load(&cfg.auth.credentials_file)?);

    let controller = Arc::new(TurnController::new(
        Arc::clone(&sessions),
        normalizer,
        Transcriber::new(recognizer, RecognitionOptions::from(&cfg.speech)),
        OptionSynthesizer::new(generator).with_max_attempts(cfg.generator.max_attempts),
        Speaker::new(
            synthesizer,
            VoiceOptions::from(&cfg.speech),
            &cfg.audio.artifacts_path,
        ),
        TurnSettings::from_config(&cfg.audio, &cfg.speech),
    ));

    if cfg.auth.session_idle_secs > 0 {
        let sweeper = Arc::clone(&controller);
        let period = Duration::from_secs(cfg.auth.session_sweep_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let expired = sweeper.expire_idle_sessions().await;
                if expired > 0 {
                    info!("Expired {} idle sessions", expired);
                }
            }
        });
    }

    let state = AppState::new(sessions, identity, controller, &cfg.audio.artifacts_path)
        .with_body_limit(cfg.audio.request_body_limit());
    let app = create_router(state);

    let bind = args.bind.unwrap_or(cfg.service.http.bind);
    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server error")?;

    Ok(())
}
