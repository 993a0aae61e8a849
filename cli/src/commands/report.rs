use crate::{output, runtime};
use ai_core::keys::today;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use config::Config;
use observability::CostScope;
use serde::Serialize;

#[derive(Args)]
pub struct ReportArgs {
    #[arg(long, value_name = "YYYY-MM-DD", help = "Day to report, defaults to today (UTC)")]
    pub date: Option<NaiveDate>,

    #[arg(long, help = "Include success rate, latency, and tokens for this operation type")]
    pub operation: Option<String>,
}

#[derive(Serialize)]
struct OperationReport {
    operation_type: String,
    success_rate_percent: f64,
    average_latency_ms: f64,
    daily_tokens: u64,
    daily_cost: f64,
}

pub async fn run(args: ReportArgs, config: &Config, json: bool) -> Result<()> {
    let layer = runtime::layer(config).await;
    let date = args.date.unwrap_or_else(today);

    let daily_cost = layer.analytics.daily_cost(&CostScope::Platform, date).await;
    let monthly_cost = layer.analytics.monthly_cost(&CostScope::Platform, date).await;
    let hourly = layer.analytics.hourly_usage_pattern(date).await;
    let errors = layer.tracker.daily_error_counts(date).await;

    let operation = match &args.operation {
        Some(op) => Some(OperationReport {
            operation_type: op.clone(),
            success_rate_percent: layer.analytics.success_rate(op, date).await,
            average_latency_ms: layer.analytics.average_latency(op).await,
            daily_tokens: layer.analytics.daily_tokens(op, date).await,
            daily_cost: layer
                .analytics
                .daily_cost(&CostScope::Operation(op.clone()), date)
                .await,
        }),
        None => None,
    };

    let risk = layer.assess_day(date).await;

    if json {
        let output = serde_json::json!({
            "date": date,
            "daily_cost": daily_cost,
            "monthly_cost": monthly_cost,
            "hourly_requests": hourly,
            "errors": errors,
            "operation": operation,
            "risk": risk
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    output::header(&format!("AI Usage Report {date}"));
    println!();
    output::subheader("Platform:");
    output::field("requests", &format!("{:.0}", risk.current.request_count));
    output::field("errors", &format!("{:.0}", risk.current.error_count));
    output::field("error rate", &format!("{:.1}%", risk.current.error_rate_percent()));
    output::field("avg latency", &format!("{:.0}ms", risk.current.avg_latency_ms));
    output::field("peak/minute", &format!("{:.0}", risk.current.peak_per_minute));
    output::field("cost today", &format!("${daily_cost:.4}"));
    output::field("cost month", &format!("${monthly_cost:.4}"));

    if let Some(op) = &operation {
        println!();
        output::subheader(&format!("Operation {}:", op.operation_type));
        output::field("success rate", &format!("{:.1}%", op.success_rate_percent));
        output::field("avg latency", &format!("{:.0}ms", op.average_latency_ms));
        output::field("tokens", &op.daily_tokens.to_string());
        output::field("cost", &format!("${:.4}", op.daily_cost));
    }

    if errors.total > 0 {
        println!();
        output::subheader(&format!("Tracked errors ({}):", errors.total));
        for (kind, count) in &errors.by_kind {
            output::field(kind.as_str(), &count.to_string());
        }
    }

    println!();
    output::subheader(&format!(
        "Risk: {} (score {})",
        output::risk_label(risk.assessment.risk.level),
        risk.assessment.risk.score
    ));
    for anomaly in &risk.assessment.anomalies {
        println!("  - [{}] {}: {}", anomaly.severity, anomaly.anomaly_type, anomaly.description);
    }
    for recommendation in &risk.assessment.recommendations {
        output::hint(recommendation);
    }
    if risk.assessment.anomalies.is_empty() {
        output::success("No usage anomalies");
    }
    Ok(())
}
