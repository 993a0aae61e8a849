use colored::Colorize;
use observability::RiskSeverity;

pub fn header(title: &str) {
    println!("{}", title.bold().underline());
}

pub fn subheader(title: &str) {
    println!("{}", title.bold());
}

pub fn hint(msg: &str) {
    println!("{} {}", "hint:".cyan().bold(), msg.dimmed());
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Aligned `label: value` row.
pub fn field(label: &str, value: &str) {
    println!("  {:<14} {}", format!("{label}:").dimmed(), value);
}

pub fn yes_no(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".red().to_string()
    }
}

pub fn risk_label(level: RiskSeverity) -> String {
    let label = level.to_string();
    match level {
        RiskSeverity::Low => label.green().to_string(),
        RiskSeverity::Medium => label.yellow().to_string(),
        RiskSeverity::High => label.red().to_string(),
        RiskSeverity::Critical => label.red().bold().to_string(),
    }
}
