//! History command - show past statement imports

use anyhow::Result;

use super::get_context;
use crate::output;

pub async fn run(limit: usize, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let records = ctx.import_service.history().recent(limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No imports recorded yet.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["When", "File", "Format", "Imported", "Batch"]);
    for record in &records {
        table.add_row(vec![
            record.committed_at.format("%Y-%m-%d %H:%M").to_string(),
            record.file_name.clone(),
            record.format.to_uppercase(),
            format!("{} of {}", record.imported, record.total),
            output::short_id(&record.batch_id),
        ]);
    }
    println!("{}", table);

    Ok(())
}
