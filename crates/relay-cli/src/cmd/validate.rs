use crate::output::{print_json, print_table};
use anyhow::{Context, Result};
use relay_core::config::WarnLevel;
use relay_core::Registry;
use std::path::Path;

pub fn run(config_file: &Path, json: bool) -> Result<()> {
    let registry = Registry::load(config_file)
        .with_context(|| format!("failed to load configuration from {}", config_file.display()))?;
    let warnings = registry.validate();

    if json {
        let projects: Vec<_> = registry.iter().collect();
        return print_json(&serde_json::json!({
            "projects": projects,
            "warnings": warnings,
        }));
    }

    if registry.is_empty() {
        println!("No projects configured.");
    } else {
        let headers = &["REPO", "DIR", "UP", "DOWN", "RESTART", "QUEUE"];
        let rows: Vec<Vec<String>> = registry
            .iter()
            .map(|p| {
                vec![
                    p.repo.clone(),
                    p.dir.clone(),
                    p.up_commands.len().to_string(),
                    p.down_commands.len().to_string(),
                    p.restart_commands
                        .as_ref()
                        .map_or_else(|| "-".to_string(), |c| c.len().to_string()),
                    p.target_queue().unwrap_or("(default)").to_string(),
                ]
            })
            .collect();
        print_table(headers, rows);
    }

    if warnings.is_empty() {
        println!("\nConfig OK: {} project(s)", registry.len());
        return Ok(());
    }

    println!();
    for w in &warnings {
        let label = match w.level {
            WarnLevel::Error => "error",
            WarnLevel::Warning => "warning",
        };
        println!("{label}: {}", w.message);
    }
    Ok(())
}
