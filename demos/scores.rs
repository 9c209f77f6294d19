//! Demo of submitting scores with the public key only
//!
//! Run with: `LANGFUSE_PUBLIC_KEY=pk-lf-... cargo run --example scores`

use langfuse_web::{CreateScore, IdGenerator, LangfuseWeb, ScoreDataType};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "langfuse_web=debug".into()),
        )
        .init();

    let client = LangfuseWeb::from_env()?;
    println!("Submitting scores to {}", client.base_url());

    // Scores usually refer to a trace created by a backend service
    let trace_id = std::env::var("LANGFUSE_TRACE_ID").unwrap_or_else(|_| "demo-trace".to_string());

    // Numeric score
    client
        .score(
            CreateScore::builder()
                .trace_id(&trace_id)
                .name("response_quality")
                .value(0.85)
                .data_type(ScoreDataType::Numeric)
                .comment("Good response with code example")
                .build(),
        )
        .await?;
    println!("Created quality score");

    // Categorical score
    client
        .score(CreateScore::categorical(&trace_id, "user_sentiment", "positive"))
        .await?;
    println!("Created sentiment score");

    // Binary score with a deterministic ID, so resubmitting updates it
    let mut thumbs_up = CreateScore::binary(&trace_id, "thumbs_up", true);
    thumbs_up.id = Some(IdGenerator::from_components(&[&trace_id, "thumbs_up"]));
    client.score(thumbs_up).await?;
    println!("Created feedback score");

    Ok(())
}
