//! Schedule subcommand handlers.

use cronwright_config::Config;
use cronwright_protocols::{
    parse, FixedRateUnit, Identifier, RawSchedule, SchedulableEntity, ScheduleRegistry,
};
use tracing::info;

use crate::adapters::open_registry;
use crate::cli::{IdentityArgs, ScheduleAction};

/// Handle schedule subcommands.
pub(crate) async fn handle_schedule_command(
    action: ScheduleAction,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = open_registry(config).await?;

    match action {
        ScheduleAction::Upsert {
            identity,
            cron,
            rate,
            unit,
            kickoff_arg,
        } => {
            let raw = raw_schedule(cron, rate, unit.as_deref())?;
            schedule_upsert(registry.as_ref(), identity, &raw, kickoff_arg).await
        }
        ScheduleAction::Deactivate { identity } => {
            let identifier = identifier(identity);
            registry.deactivate(&identifier).await?;
            info!(launch_plan = %identifier, "Schedule deactivated");
            println!("Deactivated {}", identifier);
            Ok(())
        }
        ScheduleAction::List { format } => schedule_list(registry.as_ref(), &format).await,
    }
}

fn identifier(args: IdentityArgs) -> Identifier {
    Identifier::new(args.project, args.domain, args.name, args.version)
}

fn raw_schedule(
    cron: Option<String>,
    rate: Option<u32>,
    unit: Option<&str>,
) -> Result<RawSchedule, Box<dyn std::error::Error>> {
    let unit = unit.map(str::parse::<FixedRateUnit>).transpose()?;
    Ok(RawSchedule {
        cron_expression: cron,
        rate,
        unit,
        ..Default::default()
    })
}

async fn schedule_upsert(
    registry: &dyn ScheduleRegistry,
    identity: IdentityArgs,
    raw: &RawSchedule,
    kickoff_arg: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = parse(raw)?;
    let entity = SchedulableEntity::new(identifier(identity), spec)
        .with_kickoff_time_input_arg(kickoff_arg);
    let key = entity.key();

    registry.upsert(entity.clone()).await?;
    info!(launch_plan = %entity.identifier, schedule_key = %key, "Schedule upserted");
    println!("{} {} [{}]", entity.identifier, entity.schedule, key);
    Ok(())
}

async fn schedule_list(
    registry: &dyn ScheduleRegistry,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let entities = registry.list_active().await?;

    if entities.is_empty() {
        println!("No active schedules.");
        return Ok(());
    }

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&entities)?);
        }
        _ => {
            println!("{:<22} {:<45} {:<28} {}", "KEY", "LAUNCH PLAN", "SCHEDULE", "KICKOFF ARG");
            println!("{}", "-".repeat(110));
            for entity in entities {
                let kickoff = entity.kickoff_arg().unwrap_or("-");
                println!(
                    "{:<22} {:<45} {:<28} {}",
                    entity.key().to_string(),
                    entity.identifier.to_string(),
                    entity.schedule.to_string(),
                    kickoff
                );
            }
        }
    }

    Ok(())
}
