use anyhow::Result;
use process_text_sender::config::{parse_duration, Config, DeliveryMode, FailurePolicy};
use process_text_sender::{parse_payload_args, InputPayload, ProcessFinder, PtsError, TargetSpec};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_full_job_config() {
    let json = r#"
    {
        "process_name": "notepad.exe",
        "window_title": "Untitled",
        "payloads": [
            {"text": "Hello\\nWorld"},
            {"text": "^s", "literal": true}
        ],
        "delivery_mode": "clipboard",
        "failure_policy": "abort_remaining",
        "input_idle_timeout": "2s",
        "focus_delay": 250,
        "paste_delay": "40ms",
        "verbose": true
    }
    "#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.process_name, "notepad.exe");
    assert_eq!(config.window_title.as_deref(), Some("Untitled"));
    assert_eq!(
        config.payloads,
        vec![
            InputPayload::escaped("Hello\\nWorld"),
            InputPayload::literal("^s"),
        ]
    );
    assert_eq!(config.delivery_mode, DeliveryMode::Clipboard);
    assert_eq!(config.failure_policy, FailurePolicy::AbortRemaining);
    assert_eq!(config.input_idle_timeout, Duration::from_secs(2));
    assert_eq!(config.focus_delay, Duration::from_millis(250));
    assert_eq!(config.paste_delay, Duration::from_millis(40));
    assert!(config.verbose);

    assert!(config.validate().is_ok());
    assert_eq!(
        config.target(),
        TargetSpec::new("notepad.exe").with_title("Untitled")
    );
}

#[test]
fn test_config_file_operations() -> Result<()> {
    let mut temp_file = NamedTempFile::new()?;

    let json_content = r#"
    {
        "process_name": "gedit",
        "payloads": [{"text": "line one\\tcolumn"}]
    }
    "#;
    temp_file.write_all(json_content.as_bytes())?;

    let config = Config::from_file(temp_file.path().to_str().unwrap())?;

    assert_eq!(config.process_name, "gedit");
    assert_eq!(config.payloads.len(), 1);
    assert!(!config.payloads[0].literal);
    assert!(config.validate().is_ok());

    Ok(())
}

#[test]
fn test_config_load_errors() -> Result<()> {
    let err = Config::from_file("/nonexistent/dir/job.json").unwrap_err();
    assert!(matches!(err, PtsError::ConfigLoad { .. }));

    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(br#"{"process_name": "x", "focus_delay": "soon"}"#)?;
    let err = Config::from_file(temp_file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("soon"), "{err}");

    Ok(())
}

#[test]
fn test_default_values() {
    let json = r#"
    {
        "process_name": "minimal"
    }
    "#;

    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.process_name, "minimal");
    assert_eq!(config.window_title, None);
    assert_eq!(config.delivery_mode, DeliveryMode::Auto);
    assert_eq!(config.failure_policy, FailurePolicy::ContinueWithNextPayload);
    assert_eq!(config.input_idle_timeout, Duration::from_millis(1000));
    assert_eq!(config.focus_delay, Duration::from_millis(100));
    assert_eq!(config.paste_delay, Duration::from_millis(80));
    assert!(!config.verbose);
    assert!(config.payloads.is_empty());

    // Should fail validation due to no payloads
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_errors() {
    let mut config = Config::new("   ");
    config.payloads.push(InputPayload::escaped("text"));
    assert!(config.validate().is_err());

    config.process_name = "editor".to_string();
    assert!(config.validate().is_ok());

    config.input_idle_timeout = Duration::from_secs(61);
    assert!(matches!(
        config.validate(),
        Err(PtsError::ConfigValidation(_))
    ));
}

#[test]
fn test_duration_parsing_edge_cases() {
    // Valid cases
    assert_eq!(parse_duration("0ms").unwrap(), Duration::from_millis(0));
    assert_eq!(parse_duration("1000").unwrap(), Duration::from_millis(1000));
    assert_eq!(parse_duration("5S").unwrap(), Duration::from_secs(5)); // Case insensitive
    assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120)); // Whitespace

    // Invalid cases
    assert!(parse_duration("").is_err());
    assert!(parse_duration("abc").is_err());
    assert!(parse_duration("1000x").is_err());
    assert!(parse_duration("-1000ms").is_err());
    assert!(parse_duration("99999999999999999999m").is_err());
}

#[test]
fn test_payload_arguments() {
    let args = ["Hello\\tWorld", "-r", "{F5}", "--raw", "--raw", "tail\\n"];
    let payloads = parse_payload_args(&args).unwrap();

    assert_eq!(
        payloads,
        vec![
            InputPayload::escaped("Hello\\tWorld"),
            InputPayload::literal("{F5}"),
            InputPayload::literal("--raw"),
            InputPayload::escaped("tail\\n"),
        ]
    );

    assert!(parse_payload_args::<&str>(&[]).unwrap().is_empty());
    assert!(matches!(
        parse_payload_args(&["-r"]),
        Err(PtsError::InvalidArguments(_))
    ));
}

// ProcessFinder tests

#[test]
fn test_process_finder_default() {
    let finder = ProcessFinder::default();
    let finder2 = finder.clone();
    drop(finder);
    drop(finder2);
}

#[test]
fn test_process_finder_nonexistent_process() {
    let finder = ProcessFinder::new();
    assert!(finder
        .find_by_name("nonexistent_process_xyz_123456")
        .is_empty());
}

// Error type tests

#[test]
fn test_error_types() {
    let err = PtsError::target_not_found("notepad");
    assert!(err.to_string().contains("notepad"));
    assert!(err.is_resolution_failure());

    let err = PtsError::invalid_markup("{NOPE}", "unknown key 'NOPE'");
    assert!(err.to_string().contains("{NOPE}"));
    assert!(!err.is_resolution_failure());

    let err = PtsError::config_validation("missing field");
    assert!(err.to_string().contains("missing field"));
}
