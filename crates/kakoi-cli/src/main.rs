//! kakoi command-line interface.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use kakoi_engine::{run_analysis, AnalysisConfig, EvaluationStats, RiskEngine};
use kakoi_model::ParsedModel;
use kakoi_types::{Risk, RiskStatus};

#[derive(Parser)]
#[command(
    name = "kakoi",
    version,
    about = "Threat-modeling engine: evaluates security-risk rules against an architecture model"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Link a model, evaluate all risk rules and write a JSON risk report
    Analyze {
        /// Architecture model file (JSON)
        #[arg(long)]
        model: PathBuf,
        /// Comma-separated rule ids to skip
        #[arg(long, value_delimiter = ',')]
        skip_rules: Vec<String>,
        /// Custom risk rule plugin executable (repeatable)
        #[arg(long = "custom-rule")]
        custom_rules: Vec<PathBuf>,
        /// Tolerate risk-tracking entries that match no generated risk
        #[arg(long)]
        ignore_orphaned_risk_tracking: bool,
        /// Additional technology definitions (JSON) merged over the built-in catalog
        #[arg(long)]
        technology_file: Option<PathBuf>,
        /// Bound each plugin call to this many seconds
        #[arg(long)]
        plugin_timeout_secs: Option<u64>,
        /// Report output file; stdout when absent
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the built-in rule catalog
    ListRules,
}

#[derive(Serialize)]
struct ReportRisk {
    #[serde(flatten)]
    risk: Risk,
    risk_status: RiskStatus,
}

#[derive(Serialize)]
struct Report {
    title: String,
    date: chrono::NaiveDate,
    business_criticality: kakoi_types::Criticality,
    stats: EvaluationStats,
    risks: Vec<ReportRisk>,
}

fn build_report(model: &ParsedModel, stats: EvaluationStats) -> Report {
    let mut risks = Vec::new();
    for category_id in model.sorted_risk_category_ids() {
        for risk in model.sorted_risks_of_category(&category_id) {
            let risk_status = model.risk_tracking_status(&risk);
            risks.push(ReportRisk { risk, risk_status });
        }
    }
    Report {
        title: model.title.clone(),
        date: model.date,
        business_criticality: model.business_criticality,
        stats,
        risks,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Analyze {
            model,
            skip_rules,
            custom_rules,
            ignore_orphaned_risk_tracking,
            technology_file,
            plugin_timeout_secs,
            output,
        } => {
            let config = AnalysisConfig {
                model_file: model,
                skip_rules,
                custom_rule_plugins: custom_rules,
                ignore_orphaned_risk_tracking,
                technology_file,
                plugin_timeout_secs,
            };
            let (parsed, stats) = run_analysis(&config).await?;
            info!(
                risks = parsed.total_risk_count(),
                executed = stats.rules_executed,
                failed = stats.rules_failed,
                "analysis finished"
            );
            let report = build_report(&parsed, stats);
            let rendered =
                serde_json::to_string_pretty(&report).context("serializing risk report")?;
            match output {
                Some(path) => std::fs::write(&path, rendered)
                    .with_context(|| format!("writing report to {}", path.display()))?,
                None => println!("{rendered}"),
            }
        }
        Command::ListRules => {
            let engine = RiskEngine::new();
            for category in engine.builtin_categories() {
                println!("{:<42} {}", category.id, category.title);
            }
        }
    }
    Ok(())
}
