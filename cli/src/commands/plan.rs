use crate::output;
use ai_core::{ErrorKind, InputModifications, RetryPlan};
use anyhow::Result;
use clap::Args;
use config::Config;
use resilience::RetryPlanner;

#[derive(Args)]
pub struct PlanArgs {
    #[arg(long, help = "Error kind, e.g. json_parse_error or rate_limit_error")]
    pub kind: ErrorKind,

    #[arg(long, default_value_t = 0, help = "Attempts already made")]
    pub attempt: u32,

    #[arg(long, default_value = "generic", help = "Operation type the plan is for")]
    pub operation: String,
}

pub fn run(args: PlanArgs, config: &Config, json: bool) -> Result<()> {
    let planner = RetryPlanner::from_config(&config.retry);
    let max_retries = planner.max_retries(args.kind);
    let plan = planner.plan(args.kind, args.attempt, &args.operation);

    if json {
        let output = serde_json::json!({
            "kind": args.kind,
            "attempt": args.attempt,
            "operation": args.operation,
            "max_retries": max_retries,
            "delay_ladder": planner.delay_ladder(args.kind),
            "plan": plan
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    output::header(&format!("Retry Plan: {}", args.kind));
    println!();
    output::field("operation", &args.operation);
    output::field("attempt", &format!("{} of {}", args.attempt, max_retries));

    match plan {
        Some(plan) => print_plan(&plan),
        None => {
            println!();
            output::warn(&format!(
                "No further retries: {} allows {} attempt(s)",
                args.kind, max_retries
            ));
        }
    }
    Ok(())
}

fn print_plan(plan: &RetryPlan) {
    output::field("next attempt", &plan.next_attempt_number.to_string());
    output::field("strategy", &plan.strategy.to_string());
    output::field("delay", &format!("{:.1}s", plan.delay_seconds));
    output::field("automatic", &output::yes_no(plan.automatic));
    output::field("success rate", &format!("{}%", plan.estimated_success_rate));

    match &plan.input_modifications {
        InputModifications::None => {}
        InputModifications::JsonParse {
            temperature,
            max_tokens,
        } => {
            output::field("modify", &format!("temperature={temperature}, max_tokens={max_tokens}"));
        }
        InputModifications::Generation {
            item_count_limit,
            complexity,
        } => {
            output::field("modify", &format!("items<={item_count_limit}, complexity={complexity}"));
        }
        InputModifications::Analysis {
            simplified_prompt,
            content_limit_chars,
        } => {
            output::field(
                "modify",
                &format!("simplified_prompt={simplified_prompt}, content<={content_limit_chars} chars"),
            );
        }
        InputModifications::Document { text_only } => {
            output::field("modify", &format!("text_only={text_only}"));
        }
    }
}
