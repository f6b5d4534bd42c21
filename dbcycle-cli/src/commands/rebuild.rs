use std::sync::Arc;

use anyhow::{Context, Result};
use dbcycle_orchestrations::{Orchestrator, RebuildError, RebuildReport, RenderClient, ServiceOutcome};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::config::{env_var_for, Config};

pub async fn run(output: OutputFormat) -> Result<()> {
    let config = Config::load()?;

    // A missing key is reported by the rebuild alongside the other fields
    let api_key = config.rebuild.api_key.clone().unwrap_or_default();
    let client = RenderClient::new(config.base_url.clone(), api_key).context("Failed to build HTTP client")?;
    info!("Rebuilding database against {}", config.base_url);
    let orchestrator = Orchestrator::new(Arc::new(client), config.rebuild);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping rebuild...");
            on_signal.cancel();
        }
    });

    let report = match orchestrator.rebuild(cancel).await {
        Ok(report) => report,
        Err(RebuildError::Configuration { missing }) => {
            let vars: Vec<&str> = missing.iter().map(|field| env_var_for(field)).collect();
            anyhow::bail!("Missing required configuration: {}", vars.join(", "));
        }
        Err(e) => return Err(e.into()),
    };

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print!("{}", render_table(&report)),
    }

    if !report.all_deployed() {
        let failed = report.services.iter().filter(|s| s.outcome != ServiceOutcome::Deployed).count();
        anyhow::bail!("{} of {} service(s) did not deploy", failed, report.services.len());
    }

    Ok(())
}

fn render_table(report: &RebuildReport) -> String {
    let mut out = String::new();
    let db = &report.database;

    out.push_str(&format!("Rebuild {}\n", report.run_id));
    out.push_str(&format!("{}\n\n", "=".repeat(60)));
    out.push_str("Database:\n");
    out.push_str(&format!("  Name:               {}\n", db.name));
    out.push_str(&format!("  ID:                 {}\n", db.id));
    out.push_str(&format!("  Status:             {}\n", db.status));
    out.push_str(&format!("  Plan:               {}\n", db.plan.as_deref().unwrap_or("-")));
    out.push_str(&format!("  Region:             {}\n", db.region.as_deref().unwrap_or("-")));
    out.push_str(&format!(
        "  Replaced:           {}\n\n",
        report.deleted_database_id.as_deref().unwrap_or("-")
    ));

    out.push_str(&format!("{:<24} {:<28} {:<14} {}\n", "SERVICE", "ID", "OUTCOME", "DETAIL"));
    out.push_str(&format!("{}\n", "-".repeat(85)));
    for service in &report.services {
        let detail = service
            .outcome
            .failure()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<24} {:<28} {:<14} {}\n",
            service.name,
            service.id,
            service.outcome.label(),
            detail
        ));
    }

    let elapsed = report.finished_at - report.started_at;
    out.push_str(&format!(
        "\n{} service(s), finished in {}s\n",
        report.services.len(),
        elapsed.num_seconds()
    ));
    out
}
