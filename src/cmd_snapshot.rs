//! Snapshot subcommand handlers.

use std::collections::HashMap;

use chrono::SecondsFormat;
use cronwright_config::Config;
use cronwright_protocols::ScheduleKey;
use cronwright_snapshot::Snapshot;
use tracing::warn;

use crate::adapters::{open_registry, open_snapshot_store};
use crate::cli::SnapshotAction;

/// Handle snapshot subcommands.
pub(crate) async fn handle_snapshot_command(
    action: SnapshotAction,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SnapshotAction::Show { format } => snapshot_show(config, &format).await,
    }
}

async fn snapshot_show(config: &Config, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_snapshot_store(config).await?;
    let snapshot = store.try_load().await?;

    // Launch plan names are a convenience; the snapshot is still shown
    // when the registry cannot be read.
    let names = match launch_plan_names(config).await {
        Ok(names) => names,
        Err(e) => {
            warn!("Registry unavailable, showing keys only: {}", e);
            HashMap::new()
        }
    };

    println!("Snapshot: {}", store.location());
    print!("{}", render(&snapshot, &names, format)?);
    Ok(())
}

async fn launch_plan_names(
    config: &Config,
) -> Result<HashMap<ScheduleKey, String>, Box<dyn std::error::Error>> {
    let registry = open_registry(config).await?;
    Ok(registry
        .list_active()
        .await?
        .into_iter()
        .map(|entity| (entity.key(), entity.identifier.to_string()))
        .collect())
}

fn render(
    snapshot: &Snapshot,
    names: &HashMap<ScheduleKey, String>,
    format: &str,
) -> Result<String, serde_json::Error> {
    if format == "json" {
        let entries: serde_json::Map<String, serde_json::Value> = snapshot
            .iter()
            .map(|(key, at)| {
                (
                    key.to_string(),
                    serde_json::json!({
                        "last_fire_time": at.to_rfc3339_opts(SecondsFormat::Millis, true),
                        "launch_plan": names.get(key),
                    }),
                )
            })
            .collect();
        return Ok(format!(
            "{}\n",
            serde_json::to_string_pretty(&serde_json::Value::Object(entries))?
        ));
    }

    if snapshot.is_empty() {
        return Ok("No recorded fire times.\n".to_string());
    }

    let mut out = format!("{:<22} {:<26} {}\n", "KEY", "LAST FIRE", "LAUNCH PLAN");
    out.push_str(&"-".repeat(90));
    out.push('\n');
    for (key, at) in snapshot.iter() {
        let name = names.get(key).map(String::as_str).unwrap_or("-");
        out.push_str(&format!(
            "{:<22} {:<26} {}\n",
            key.to_string(),
            at.to_rfc3339_opts(SecondsFormat::Secs, true),
            name
        ));
    }
    Ok(out)
}
