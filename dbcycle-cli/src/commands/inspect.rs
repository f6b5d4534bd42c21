use anyhow::Result;
use dbcycle_models::{ConnectionInfo, DatabaseResource};
use dbcycle_orchestrations::activities::{database_lifecycle, queries};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::commands::read_only_client;
use crate::config::Config;

pub async fn run_owner(output: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let client = read_only_client(&config)?;

    let owner = queries::get_owner(client.as_ref()).await?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&owner)?),
        OutputFormat::Table => {
            println!("Owner: {}", owner.id);
            println!("{}", "=".repeat(60));
            println!("  Name:               {}", owner.name.as_deref().unwrap_or("-"));
            println!("  Email:              {}", owner.email.as_deref().unwrap_or("-"));
        }
    }

    Ok(())
}

pub async fn run_services(output: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let client = read_only_client(&config)?;

    let services = queries::list_dependent_services(client.as_ref()).await?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&services)?),
        OutputFormat::Table => {
            println!("{:<28} {:<28} {:<10}", "ID", "NAME", "SUSPENDED");
            println!("{}", "-".repeat(70));

            for service in &services {
                println!(
                    "{:<28} {:<28} {:<10}",
                    service.id,
                    service.name,
                    service.suspended.as_deref().unwrap_or("-")
                );
            }

            println!();
            println!("{} web service(s) found", services.len());
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct DatabaseView {
    database: DatabaseResource,
    #[serde(skip_serializing_if = "Option::is_none")]
    connection: Option<ConnectionInfo>,
}

pub async fn run_database(output: OutputFormat, show_secrets: bool) -> Result<()> {
    let config = Config::load()?;
    let client = read_only_client(&config)?;

    let Some(database) = queries::get_current_database(client.as_ref()).await? else {
        match output {
            OutputFormat::Json => println!("null"),
            OutputFormat::Table => println!("No free-tier database found; a rebuild would only create one"),
        }
        return Ok(());
    };

    let connection = if show_secrets {
        Some(database_lifecycle::get_connection_info(client.as_ref(), &database.id).await?)
    } else {
        None
    };

    match output {
        OutputFormat::Json => {
            let view = DatabaseView { database, connection };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        OutputFormat::Table => {
            println!("Database: {}", database.name);
            println!("{}", "=".repeat(60));
            println!();
            println!("  ID:                 {}", database.id);
            println!("  Status:             {}", database.status);
            println!("  Plan:               {}", database.plan.as_deref().unwrap_or("-"));
            println!("  Region:             {}", database.region.as_deref().unwrap_or("-"));
            println!("  Version:            {}", database.version.as_deref().unwrap_or("-"));
            println!(
                "  Created:            {}",
                database
                    .created_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string())
            );

            if let Some(info) = connection {
                println!();
                println!("Connection:");
                println!("  Internal:           {}", info.internal_connection_string);
                if let Some(external) = info.external_connection_string {
                    println!("  External:           {}", external);
                }
                if let Some(psql) = info.psql_command {
                    println!("  psql:               {}", psql);
                }
            }
        }
    }

    Ok(())
}
