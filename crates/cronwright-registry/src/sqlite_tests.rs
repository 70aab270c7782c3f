use super::*;
use cronwright_protocols::FixedRateUnit;
use tempfile::TempDir;

fn entity(name: &str) -> SchedulableEntity {
    SchedulableEntity::new(
        Identifier::new("flytesnacks", "development", name, "v1"),
        ScheduleSpec::cron("0 */5 * * * *"),
    )
}

#[tokio::test]
async fn test_upsert_and_get() {
    let registry = SqliteScheduleRegistry::in_memory().await.unwrap();
    let e = entity("nightly").with_kickoff_time_input_arg("kickoff_time");
    registry.upsert(e.clone()).await.unwrap();

    let stored = registry.get(&e.identifier).await.unwrap().unwrap();
    assert_eq!(stored, e);
}

#[tokio::test]
async fn test_get_missing() {
    let registry = SqliteScheduleRegistry::in_memory().await.unwrap();
    let missing = Identifier::new("p", "d", "none", "v1");
    assert!(registry.get(&missing).await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_replaces_schedule() {
    let registry = SqliteScheduleRegistry::in_memory().await.unwrap();
    let e = entity("report");
    registry.upsert(e.clone()).await.unwrap();

    let changed = SchedulableEntity {
        schedule: ScheduleSpec::fixed_rate(2, FixedRateUnit::Hour),
        ..e.clone()
    };
    registry.upsert(changed.clone()).await.unwrap();

    let active = registry.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].schedule, changed.schedule);
}

#[tokio::test]
async fn test_deactivate_and_reactivate() {
    let registry = SqliteScheduleRegistry::in_memory().await.unwrap();
    let e = entity("report");
    registry.upsert(e.clone()).await.unwrap();

    registry.deactivate(&e.identifier).await.unwrap();
    assert!(registry.list_active().await.unwrap().is_empty());
    assert!(!registry.get(&e.identifier).await.unwrap().unwrap().active);

    registry.upsert(e.clone()).await.unwrap();
    assert_eq!(registry.list_active().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deactivate_unknown_is_not_found() {
    let registry = SqliteScheduleRegistry::in_memory().await.unwrap();
    let result = registry
        .deactivate(&Identifier::new("p", "d", "ghost", "v1"))
        .await;
    assert!(matches!(result, Err(RegistryError::NotFound(_))));
}

#[tokio::test]
async fn test_invalid_cron_is_rejected() {
    let registry = SqliteScheduleRegistry::in_memory().await.unwrap();
    let bad = SchedulableEntity::new(
        Identifier::new("p", "d", "bad", "v1"),
        ScheduleSpec::cron("every tuesday"),
    );
    let id = bad.identifier.clone();

    assert!(matches!(
        registry.upsert(bad).await,
        Err(RegistryError::Validation(_))
    ));
    assert!(registry.get(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_active_is_ordered_and_filtered() {
    let registry = SqliteScheduleRegistry::in_memory().await.unwrap();
    for name in ["c", "a", "b"] {
        registry.upsert(entity(name)).await.unwrap();
    }
    registry.deactivate(&entity("b").identifier).await.unwrap();

    let names: Vec<_> = registry
        .list_active()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.identifier.name)
        .collect();
    assert_eq!(names, vec!["a", "c"]);
}

#[tokio::test]
async fn test_corrupt_row_is_skipped() {
    let registry = SqliteScheduleRegistry::in_memory().await.unwrap();
    registry.upsert(entity("good")).await.unwrap();
    registry
        .conn
        .call(|conn| {
            conn.execute(
                "INSERT INTO schedulable_entities
                     (project, domain, name, version, schedule_spec, created_at, updated_at)
                 VALUES ('p', 'd', 'broken', 'v1', '{not json', 'x', 'x')",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

    let active = registry.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].identifier.name, "good");
}

#[tokio::test]
async fn test_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("registry.db");

    {
        let registry = SqliteScheduleRegistry::open(&path).await.unwrap();
        registry.upsert(entity("durable")).await.unwrap();
    }

    let reopened = SqliteScheduleRegistry::open(&path).await.unwrap();
    assert_eq!(reopened.list_active().await.unwrap().len(), 1);
}
