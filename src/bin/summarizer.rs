use anyhow::Context;
use chrono::Utc;
use slack_summarizer::ai::LlmClient;
use slack_summarizer::core::config::AppConfig;
use slack_summarizer::pipeline::PipelineRunner;
use slack_summarizer::slack::SlackClient;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    slack_summarizer::setup_logging();

    let config = AppConfig::from_env().inspect_err(|e| error!("Config error: {}", e))?;
    let slack = SlackClient::new(&config).context("Failed to initialize Slack client")?;
    let llm = LlmClient::new(&config).context("Failed to initialize OpenAI client")?;

    info!(
        "Starting summary run (model {}, language {}, dry run: {})",
        llm.model_name(),
        config.language,
        config.dry_run
    );

    let runner = PipelineRunner::new(&config, slack, llm)?;
    let report = runner.run(Utc::now()).await?;

    for (channel, outcome) in &report.outcomes {
        info!("#{} ({}): {:?}", channel.name, channel.id, outcome);
    }

    Ok(())
}
