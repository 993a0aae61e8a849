use crate::{output, runtime};
use anyhow::Result;
use clap::Args;
use config::Config;

#[derive(Args)]
pub struct AlertsArgs {
    #[arg(long, default_value_t = 10, help = "Maximum entries per list")]
    pub limit: usize,
}

pub async fn run(args: AlertsArgs, config: &Config, json: bool) -> Result<()> {
    let layer = runtime::layer(config).await;
    let alerts = layer.monitor.recent_alerts(args.limit).await;
    let errors = layer.tracker.recent_errors(args.limit).await;

    if json {
        let output = serde_json::json!({
            "alerts": alerts,
            "errors": errors
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    output::header("Reliability Alerts");
    println!();
    if alerts.is_empty() {
        output::success("No recent alerts");
    }
    for alert in &alerts {
        println!(
            "  {} [{}] {} {}/{}: {}",
            alert.timestamp.format("%Y-%m-%d %H:%M:%S"),
            alert.severity,
            alert.anomaly_type,
            alert.model,
            alert.operation_type,
            alert.description
        );
    }

    println!();
    output::header("Recent Errors");
    println!();
    if errors.is_empty() {
        output::success("No recent errors");
    }
    for error in &errors {
        println!(
            "  {} [{}] {} (retry {}): {}",
            error.timestamp.format("%Y-%m-%d %H:%M:%S"),
            error.severity,
            error.error_kind,
            error.retry_count,
            error.message
        );
    }
    Ok(())
}
