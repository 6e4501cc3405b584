use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coach::config::Config;
use coach::ingest::LocalFile;
use coach::interview::prepare_interview;
use coach::llm_client::GeminiClient;
use coach::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting interview coach v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let resume_path = args
        .next()
        .context("usage: coach <resume.{pdf,docx,txt}> [job-description.txt]")?;
    let job_description = match args.next() {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read job description from {path}"))?,
        None => String::new(),
    };

    let generator = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_base.clone(),
        config.gemini_model.clone(),
        config.generation_timeout,
    )?;
    info!("Generator initialized (model: {})", generator.model());

    let state = AppState::new(Arc::new(generator), config.default_difficulty);
    let _notifier = state.store.spawn_notifier();
    let _subscription = state.store.subscribe(|session| {
        tracing::debug!(
            "Session updated: resume={:?} questions={}",
            session.resume_file,
            session.question_count()
        );
    });

    let upload = LocalFile::open(&resume_path)
        .await
        .with_context(|| format!("Failed to open {resume_path}"))?;

    let questions = match prepare_interview(&state, &upload, &job_description).await {
        Ok(questions) => questions,
        Err(e) => {
            let (code, message) = e.user_facing();
            anyhow::bail!("{code}: {message}");
        }
    };

    if let Some(reason) = questions.fallback_reason() {
        warn!("Serving default questions: {reason:?}");
    }

    println!("{}", serde_json::to_string_pretty(questions.value())?);

    Ok(())
}
