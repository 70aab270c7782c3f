use super::*;
use chrono::TimeZone;

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, h, m, s).unwrap()
}

// -- normalize_cron ------------------------------------------------------

#[test]
fn test_normalize_five_fields_prepends_seconds() {
    assert_eq!(normalize_cron("*/15 * * * *").unwrap(), "0 */15 * * * *");
    assert_eq!(normalize_cron("  30 2 1 * *  ").unwrap(), "0 30 2 1 * *");
}

#[test]
fn test_normalize_six_fields_passthrough() {
    assert_eq!(normalize_cron("0 */5 * * * *").unwrap(), "0 */5 * * * *");
}

#[test]
fn test_normalize_descriptors() {
    assert_eq!(normalize_cron("@hourly").unwrap(), "0 0 * * * *");
    assert_eq!(normalize_cron("@daily").unwrap(), "0 0 0 * * *");
    assert_eq!(normalize_cron("@ANNUALLY").unwrap(), "0 0 0 1 1 *");
    assert!(normalize_cron("@fortnightly").is_err());
}

#[test]
fn test_normalize_rejects_wrong_field_count() {
    assert!(normalize_cron("* *").is_err());
    assert!(normalize_cron("").is_err());
}

// -- parse -----------------------------------------------------------------

#[test]
fn test_parse_cron_expression() {
    let spec = parse(&RawSchedule::cron("*/5 * * * *")).unwrap();
    assert_eq!(spec, ScheduleSpec::cron("0 */5 * * * *"));
}

#[test]
fn test_parse_cron_fields() {
    let raw = RawSchedule {
        cron_fields: Some(CronFields {
            seconds: "0".to_string(),
            minutes: "30".to_string(),
            hours: "9".to_string(),
            day_of_month: "*".to_string(),
            month: "*".to_string(),
            day_of_week: Some("MON-FRI".to_string()),
        }),
        ..Default::default()
    };
    let spec = parse(&raw).unwrap();
    assert_eq!(spec, ScheduleSpec::cron("0 30 9 * * MON-FRI"));
}

#[test]
fn test_parse_cron_fields_without_day_of_week() {
    let raw = RawSchedule {
        cron_fields: Some(CronFields {
            seconds: "0".to_string(),
            minutes: "0".to_string(),
            hours: "12".to_string(),
            day_of_month: "1".to_string(),
            month: "*".to_string(),
            day_of_week: None,
        }),
        ..Default::default()
    };
    assert_eq!(parse(&raw).unwrap(), ScheduleSpec::cron("0 0 12 1 * *"));
}

#[test]
fn test_parse_fixed_rate() {
    let spec = parse(&RawSchedule::rate(10, FixedRateUnit::Minute)).unwrap();
    assert_eq!(spec, ScheduleSpec::fixed_rate(10, FixedRateUnit::Minute));
}

#[test]
fn test_parse_nothing_populated_is_invalid() {
    let err = parse(&RawSchedule::default()).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidScheduleExpression(_)));

    let err = parse(&RawSchedule::cron("   ")).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidScheduleExpression(_)));
}

#[test]
fn test_parse_two_variants_is_invalid() {
    let raw = RawSchedule {
        cron_expression: Some("0 * * * * *".to_string()),
        rate: Some(1),
        unit: Some(FixedRateUnit::Hour),
        ..Default::default()
    };
    assert!(matches!(
        parse(&raw).unwrap_err(),
        ScheduleError::InvalidScheduleExpression(_)
    ));
}

#[test]
fn test_parse_rate_without_unit_is_invalid() {
    let raw = RawSchedule {
        rate: Some(5),
        ..Default::default()
    };
    assert!(parse(&raw).is_err());
}

#[test]
fn test_parse_zero_rate_is_invalid() {
    let err = parse(&RawSchedule::rate(0, FixedRateUnit::Day)).unwrap_err();
    assert!(matches!(err, ScheduleError::EmptyFixedRate));
}

#[test]
fn test_parse_bad_cron_grammar() {
    let err = parse(&RawSchedule::cron("0 61 * * * *")).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidScheduleExpression(_)));

    assert!(parse(&RawSchedule::cron("not a cron expression")).is_err());
}

#[test]
fn test_parse_is_deterministic() {
    let raw = RawSchedule::cron("@weekly");
    assert_eq!(parse(&raw).unwrap(), parse(&raw).unwrap());
}

#[test]
fn test_unit_from_str() {
    assert_eq!("minutes".parse::<FixedRateUnit>().unwrap(), FixedRateUnit::Minute);
    assert_eq!("H".parse::<FixedRateUnit>().unwrap(), FixedRateUnit::Hour);
    assert_eq!("day".parse::<FixedRateUnit>().unwrap(), FixedRateUnit::Day);
    assert!("week".parse::<FixedRateUnit>().is_err());
}

#[test]
fn test_spec_display() {
    assert_eq!(
        ScheduleSpec::fixed_rate(1, FixedRateUnit::Hour).to_string(),
        "every 1 hour"
    );
    assert_eq!(
        ScheduleSpec::fixed_rate(3, FixedRateUnit::Day).to_string(),
        "every 3 days"
    );
    assert_eq!(
        ScheduleSpec::cron("0 * * * * *").to_string(),
        "cron(0 * * * * *)"
    );
}

#[test]
fn test_spec_serde_tagged() {
    let spec = ScheduleSpec::fixed_rate(5, FixedRateUnit::Minute);
    let json = serde_json::to_value(&spec).unwrap();
    assert_eq!(json["type"], "fixed_rate");
    assert_eq!(json["unit"], "minute");
}

// -- next_fire_time --------------------------------------------------------

#[test]
fn test_next_fire_time_cron_is_strictly_after() {
    let spec = ScheduleSpec::cron("0 * * * * *");
    assert_eq!(next_fire_time(&spec, at(10, 0, 0)).unwrap(), at(10, 1, 0));
    assert_eq!(next_fire_time(&spec, at(10, 0, 30)).unwrap(), at(10, 1, 0));
}

#[test]
fn test_next_fire_time_fixed_rate() {
    let spec = ScheduleSpec::fixed_rate(2, FixedRateUnit::Hour);
    assert_eq!(next_fire_time(&spec, at(10, 15, 0)).unwrap(), at(12, 15, 0));
}

#[test]
fn test_next_fire_time_exhausted_schedule() {
    // Only fires in 2020.
    let spec = ScheduleSpec::cron("0 0 0 1 1 * 2020");
    let err = next_fire_time(&spec, at(0, 0, 0)).unwrap_err();
    assert!(matches!(err, ScheduleError::NoUpcomingFire(_)));
}

// -- enumerate_fire_times --------------------------------------------------

#[test]
fn test_enumerate_every_minute_catch_up() {
    let spec = ScheduleSpec::cron("0 * * * * *");
    let t0 = at(10, 0, 0);
    let to = t0 + Duration::minutes(5) + Duration::seconds(30);

    let ticks = enumerate_fire_times(&spec, t0, to).unwrap();
    assert_eq!(ticks.len(), 5);
    for (i, tick) in ticks.iter().enumerate() {
        assert_eq!(*tick, t0 + Duration::minutes(i as i64 + 1));
    }
}

#[test]
fn test_enumerate_includes_upper_bound() {
    let spec = ScheduleSpec::fixed_rate(1, FixedRateUnit::Minute);
    let t0 = at(8, 0, 0);
    let ticks = enumerate_fire_times(&spec, t0, t0 + Duration::minutes(3)).unwrap();
    assert_eq!(ticks.len(), 3);
    assert_eq!(ticks.last().copied(), Some(t0 + Duration::minutes(3)));
}

#[test]
fn test_enumerate_excludes_lower_bound() {
    let spec = ScheduleSpec::cron("0 * * * * *");
    let t0 = at(10, 0, 0);
    let ticks = enumerate_fire_times(&spec, t0, t0 + Duration::seconds(59)).unwrap();
    assert!(ticks.is_empty());
}

#[test]
fn test_enumerate_empty_window() {
    let spec = ScheduleSpec::fixed_rate(1, FixedRateUnit::Day);
    let t0 = at(10, 0, 0);
    assert!(enumerate_fire_times(&spec, t0, t0).unwrap().is_empty());
    assert!(enumerate_fire_times(&spec, t0, t0 - Duration::hours(1))
        .unwrap()
        .is_empty());
}

#[test]
fn test_enumerate_exhausted_schedule_terminates() {
    let spec = ScheduleSpec::cron("0 0 0 1 1 * 2020");
    let ticks = enumerate_fire_times(&spec, at(0, 0, 0), at(23, 0, 0)).unwrap();
    assert!(ticks.is_empty());
}

#[test]
fn test_enumerate_invalid_spec_errors() {
    let spec = ScheduleSpec::fixed_rate(0, FixedRateUnit::Minute);
    assert!(enumerate_fire_times(&spec, at(0, 0, 0), at(1, 0, 0)).is_err());
}
