use policy_chat::domain::MessageMetadata;

#[test]
fn given_success_when_building_metadata_then_error_flag_is_clear() {
    let metadata = MessageMetadata::success(250);

    assert_eq!(metadata.response_time_ms, Some(250));
    assert!(!metadata.error_occurred);
    assert_eq!(metadata.error_type, None);
}

#[test]
fn given_failure_when_building_metadata_then_error_type_is_recorded() {
    let metadata = MessageMetadata::failure(40, "network_error");

    assert!(metadata.error_occurred);
    assert_eq!(metadata.error_type.as_deref(), Some("network_error"));
}

#[test]
fn given_tool_calls_when_storing_then_column_is_comma_joined() {
    let metadata = MessageMetadata {
        tool_calls: Some(vec!["search_policies".to_string(), "lookup".to_string()]),
        ..MessageMetadata::default()
    };

    assert_eq!(
        metadata.tool_calls_column().as_deref(),
        Some("search_policies,lookup")
    );
}

#[test]
fn given_empty_tool_calls_when_storing_then_column_is_null() {
    let metadata = MessageMetadata {
        tool_calls: Some(Vec::new()),
        ..MessageMetadata::default()
    };

    assert_eq!(metadata.tool_calls_column(), None);
}

#[test]
fn given_stored_column_when_reading_then_tool_calls_are_split() {
    assert_eq!(
        MessageMetadata::tool_calls_from_column(Some("a,b")),
        Some(vec!["a".to_string(), "b".to_string()])
    );
    assert_eq!(MessageMetadata::tool_calls_from_column(Some("")), None);
    assert_eq!(MessageMetadata::tool_calls_from_column(None), None);
}

#[test]
fn given_partial_json_when_deserializing_then_missing_fields_default() {
    let metadata: MessageMetadata =
        serde_json::from_str(r#"{"response_time_ms": 12, "context_used": true}"#).unwrap();

    assert_eq!(metadata.response_time_ms, Some(12));
    assert_eq!(metadata.context_used, Some(true));
    assert!(!metadata.error_occurred);
    assert_eq!(metadata.tool_calls, None);
}
