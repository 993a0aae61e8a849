use crate::output;
use anyhow::Result;
use clap::Args;
use config::Config;
use resilience::{ErrorGuidance, RetryPlanner, classify_message};

#[derive(Args)]
pub struct ClassifyArgs {
    #[arg(help = "Error message to classify")]
    pub message: String,

    #[arg(long, default_value_t = 0, help = "Attempts already made")]
    pub attempt: u32,
}

pub fn run(args: ClassifyArgs, config: &Config, json: bool) -> Result<()> {
    let planner = RetryPlanner::from_config(&config.retry);
    let kind = classify_message(&args.message);
    let guidance = ErrorGuidance::for_error(&planner, kind, args.attempt);

    if json {
        println!("{}", serde_json::to_string_pretty(&guidance)?);
        return Ok(());
    }

    output::header("Error Classification");
    println!();
    output::field("kind", kind.as_str());
    output::field("retryable", &output::yes_no(guidance.retryable));
    output::field("automatic", &output::yes_no(guidance.automatic));
    output::field(
        "success rate",
        &format!("{}%", guidance.estimated_success_rate),
    );
    println!();
    output::subheader("User message:");
    println!("  {}", guidance.user_message);
    println!();
    output::hint(&guidance.suggested_action);
    Ok(())
}
