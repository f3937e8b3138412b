use logsight_forwarder::domain::{ALLOWED_LEVELS, Event, ValidationError};
use logsight_forwarder::mapper::{
    LogBatchMapper, LogField, LogMapper, LogMappingError, Mapper, MappingSummary, StringMapper,
    TagsMapper,
};
use serde_json::json;

fn event(value: serde_json::Value) -> Event {
    Event::from_value(value).unwrap()
}

fn batch_mapper(level: Mapper) -> LogBatchMapper {
    LogBatchMapper {
        application_name: Mapper::key("service").into(),
        tag: Mapper::key("env").into(),
        log: LogMapper {
            timestamp: Mapper::key("time").into(),
            message: Mapper::key("message").into(),
            level: level.into(),
            tags: TagsMapper::default(),
        },
    }
}

#[test]
fn test_every_severity_is_accepted_in_any_case() {
    let mapper = batch_mapper(Mapper::key("level"));
    for level in ALLOWED_LEVELS {
        for spelled in [level.to_string(), level.to_lowercase()] {
            let log = mapper
                .log
                .to_log(&event(json!({
                    "time": "2022-04-04T09:00:35",
                    "message": "m",
                    "level": spelled
                })))
                .unwrap();
            assert_eq!(log.level, level);
        }
    }
}

#[test]
fn test_timestamp_forms() {
    let mapper = batch_mapper(Mapper::constant("info"));
    let accepted = [
        "2022-04-04T09:00:35",
        "2022-04-04T09:00:35.123Z",
        "2022-04-04T09:00:35+00:00",
    ];
    for time in accepted {
        let ev = event(json!({ "time": time, "message": "m" }));
        assert!(mapper.log.to_log(&ev).is_ok(), "{time}");
    }

    for time in ["2022-04-04T09:00", "2022-04-04T09:00:35Z+02:00"] {
        let ev = event(json!({ "time": time, "message": "m" }));
        assert!(
            matches!(
                mapper.log.to_log(&ev),
                Err(LogMappingError::Validation(ValidationError::InvalidTimestamp { .. }))
            ),
            "{time}"
        );
    }
}

#[test]
fn test_constant_is_independent_of_event() {
    let mapper = StringMapper::new(Mapper::constant("fixed"));
    for value in [json!({}), json!({ "fixed": "no" }), json!({ "a": { "b": 1 } })] {
        assert_eq!(mapper.map(&event(value)).unwrap(), "fixed");
    }
}

#[test]
fn test_grouping_by_application_and_tag() {
    let mapper = batch_mapper(Mapper::constant("info"));
    let events: Vec<_> = [
        ("api", "prod", "1"),
        ("api", "dev", "2"),
        ("db", "prod", "3"),
        ("api", "prod", "4"),
    ]
    .into_iter()
    .map(|(service, env, message)| {
        event(json!({
            "service": service,
            "env": env,
            "time": "2022-04-04T09:00:35",
            "message": message
        }))
    })
    .collect();

    let grouping = mapper.to_log_batches(&events);
    let keys: Vec<_> = grouping
        .batches
        .iter()
        .map(|b| (b.batch.application_name.as_str(), b.batch.tag.as_str(), b.batch.len()))
        .collect();
    assert_eq!(keys, [("api", "prod", 2), ("api", "dev", 1), ("db", "prod", 1)]);

    let api_prod = &grouping.batches[0];
    assert_eq!(api_prod.batch.logs[0].message, "1");
    assert_eq!(api_prod.batch.logs[1].message, "4");
    assert_eq!(api_prod.event_indices, [0, 3]);
}

#[test]
fn test_info_and_bogus_under_one_key() {
    let mapper = LogBatchMapper {
        application_name: Mapper::constant("svc").into(),
        tag: Mapper::constant("default").into(),
        log: LogMapper {
            timestamp: Mapper::constant("2022-04-04T09:00:35").into(),
            message: Mapper::key("message").into(),
            level: Mapper::key("level").into(),
            tags: TagsMapper::default(),
        },
    };
    let events = vec![
        event(json!({ "message": "fine", "level": "info" })),
        event(json!({ "message": "odd", "level": "BOGUS" })),
    ];

    let grouping = mapper.to_log_batches(&events);
    assert_eq!(grouping.batches.len(), 1);
    assert_eq!(grouping.batches[0].batch.logs.len(), 1);
    assert_eq!(grouping.failed.len(), 1);
    assert_eq!(grouping.failed[0].error.field(), LogField::Level);

    match grouping.summary(events.len()) {
        Err(MappingSummary::PartiallyFailed { failed, total, causes }) => {
            assert_eq!((failed, total), (1, 2));
            assert!(causes.contains("BOGUS"));
        }
        other => panic!("expected PartiallyFailed, got {other:?}"),
    }
}
