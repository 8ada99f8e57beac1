use medicare_service::embeddings::{Embedder, RigEmbedder, SAMPLE_TEXTS, cosine_similarity};
use medicare_service::AppConfig;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = AppConfig::from_env()?;
    if let Err(e) = config.google_api_key() {
        error!(error = %e, "Set GOOGLE_API_KEY to generate embeddings");
        return Ok(());
    }

    let embedder = RigEmbedder::new(Arc::new(config));
    let texts: Vec<String> = SAMPLE_TEXTS.iter().map(|s| s.to_string()).collect();

    info!(model = embedder.model_id(), "Embedding sample texts");
    let embeddings = embedder.embed_texts(&texts).await?;

    for (text, vector) in texts.iter().zip(&embeddings) {
        let preview: Vec<String> = vector.iter().take(5).map(|v| format!("{v:.4}")).collect();
        println!("Text: {text}");
        println!("  dimensions: {}", vector.len());
        println!("  first values: [{}, ...]", preview.join(", "));
    }

    println!();
    println!("Pairwise cosine similarity:");
    for i in 0..embeddings.len() {
        for j in (i + 1)..embeddings.len() {
            if let Some(score) = cosine_similarity(&embeddings[i], &embeddings[j]) {
                println!("  [{i}] vs [{j}]: {score:.4}");
            }
        }
    }

    Ok(())
}
