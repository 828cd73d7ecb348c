use dk_protocol::ReadingSink;
use dk_storage::{InMemoryReadingSink, TracingReadingSink};
use domain::{AccessFunction, Reading, ReadingError, ReadingValue, ValueType};

#[tokio::test]
async fn keeps_readings_in_arrival_order() {
    let sink = InMemoryReadingSink::new();
    assert!(sink.is_empty());

    sink.accept(Reading::new("boiler", "T1", Ok(ReadingValue::Int32(300))))
        .await
        .expect("accept");
    sink.accept(Reading::new("boiler", "T2", Ok(ReadingValue::Bool(true))))
        .await
        .expect("accept");
    sink.accept(Reading::new("boiler", "T1", Ok(ReadingValue::Int32(301))))
        .await
        .expect("accept");

    assert_eq!(sink.len(), 3);
    let names: Vec<_> = sink.readings().into_iter().map(|r| r.tag_name).collect();
    assert_eq!(names, vec!["T1", "T2", "T1"]);

    let t1 = sink.readings_for("boiler", "T1");
    assert_eq!(t1.len(), 2);
    assert_eq!(t1[1].value(), Some(ReadingValue::Int32(301)));
    assert!(sink.readings_for("chiller", "T1").is_empty());
}

#[tokio::test]
async fn stores_error_readings() {
    let sink = InMemoryReadingSink::new();
    let mismatch = ReadingError::ConfigMismatch {
        value_type: ValueType::Float32,
        access: AccessFunction::ReadCoils,
    };
    sink.accept(Reading::new("boiler", "bad", Err(mismatch.clone())))
        .await
        .expect("accept");

    let stored = sink.readings();
    assert_eq!(stored[0].error(), Some(&mismatch));
    assert!(stored[0].value().is_none());
}

#[tokio::test]
async fn tracing_sink_accepts_everything() {
    let sink = TracingReadingSink;
    sink.accept(Reading::new("boiler", "T1", Ok(ReadingValue::Float32(1.5))))
        .await
        .expect("accept value");
    sink.accept(Reading::new(
        "boiler",
        "T2",
        Err(ReadingError::Transport("timeout".to_string())),
    ))
    .await
    .expect("accept error");
}
