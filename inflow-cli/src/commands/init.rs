//! Init command - set up the inflow directory

use anyhow::{Context, Result};

use inflow_core::config::Config;
use inflow_core::InflowContext;

use super::get_inflow_dir;
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let inflow_dir = get_inflow_dir();
    let existed = inflow_dir.join("inflow.duckdb").exists();

    std::fs::create_dir_all(&inflow_dir)
        .with_context(|| format!("Failed to create inflow directory: {:?}", inflow_dir))?;

    // Opening the context creates the database and applies migrations
    let ctx = InflowContext::new(&inflow_dir).context("Failed to initialize inflow context")?;

    // Write a settings file so users have something to edit
    if !inflow_dir.join("settings.json").exists() {
        Config::load(&inflow_dir)?.save(&inflow_dir)?;
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "directory": inflow_dir.to_string_lossy(),
                "database": ctx.store.db_path().to_string_lossy(),
                "alreadyInitialized": existed,
            })
        );
        return Ok(());
    }

    if existed {
        println!("Already initialized at {}", inflow_dir.display());
    } else {
        output::success(&format!("Initialized inflow in {}", inflow_dir.display()));
    }
    println!("  Database: {}", ctx.store.db_path().display());
    println!("  Settings: {}", inflow_dir.join("settings.json").display());
    println!();
    println!("Import your first statement with: inflow import <file>");

    Ok(())
}
