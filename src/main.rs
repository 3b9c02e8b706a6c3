//! Interactive entry point: read one question, run the pipeline, print
//! the answer.

use std::io::Write;
use std::sync::Arc;

use qa_pipeline::{
    init_telemetry, AnswerStep, OpenAiClient, OpenAiClientConfig, Pipeline, PipelineConfig,
    RetrieveStep, RetryPolicy, StepExecutor, StepLogger, SummarizeStep, WorkflowState,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The credential check is fatal before any step runs, and before
    // telemetry, so a missing key surfaces as a plain startup message.
    let config = match PipelineConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ Workflow failed: {err}");
            std::process::exit(1);
        }
    };

    let _telemetry = init_telemetry(&config);
    let logger = StepLogger::new(&config.log_file);

    match run(&config, logger.clone()).await {
        Ok(answer) => {
            println!("\n✅ Final Answer:\n{answer}");
        }
        Err(err) => {
            logger.log_error("pipeline", &format!("{err:?}"));
            eprintln!("❌ Workflow failed: {err}");
            std::process::exit(1);
        }
    }
}

async fn run(config: &PipelineConfig, logger: StepLogger) -> qa_pipeline::Result<String> {
    let mut client_config = OpenAiClientConfig::new(config.api_key.clone());
    client_config.model = config.model.clone();
    let client = OpenAiClient::new(client_config)
        .map_err(|e| qa_pipeline::Error::Config(format!("failed to build completion client: {e}")))?;

    let executor = StepExecutor::new(Arc::new(client), RetryPolicy::default());
    let pipeline = Pipeline::new(executor, logger)
        .with_step(RetrieveStep::new(config.context_file.clone()))
        .with_step(SummarizeStep::new())
        .with_step(AnswerStep::new());

    let question = read_question()?;
    let state = pipeline.run(WorkflowState::new(question)).await?;

    // The answer step always fills this field when it completes.
    Ok(state.answer.unwrap_or_default())
}

fn read_question() -> qa_pipeline::Result<String> {
    print!("Ask a question: ");
    std::io::stdout().flush()?;

    let mut question = String::new();
    std::io::stdin().read_line(&mut question)?;
    Ok(question.trim().to_string())
}
