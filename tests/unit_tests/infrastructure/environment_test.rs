use policy_chat::presentation::Environment;

#[test]
fn given_known_names_when_parsing_environment_then_maps_to_variant() {
    assert_eq!(Environment::try_from("local".to_string()), Ok(Environment::Local));
    assert_eq!(Environment::try_from("Development".to_string()), Ok(Environment::Local));
    assert_eq!(Environment::try_from("TEST".to_string()), Ok(Environment::Test));
    assert_eq!(Environment::try_from("production".to_string()), Ok(Environment::Prod));
}

#[test]
fn given_unknown_name_when_parsing_environment_then_error_lists_choices() {
    let error = Environment::try_from("staging".to_string()).unwrap_err();
    assert!(error.contains("staging"));
    assert!(error.contains("local, test, or prod"));
}

#[test]
fn given_environment_when_selecting_settings_file_then_uses_lowercase_suffix() {
    assert_eq!(Environment::Prod.as_file_suffix(), "prod");
    assert_eq!(Environment::Test.to_string(), "Test");
}
