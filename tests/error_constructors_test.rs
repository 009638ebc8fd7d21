use entsoe::error::EntsoeError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(
        EntsoeError::config("x"),
        EntsoeError::Config { .. }
    ));
    assert!(matches!(EntsoeError::auth("x"), EntsoeError::Auth { .. }));
    assert!(matches!(
        EntsoeError::no_data("x"),
        EntsoeError::NoData { .. }
    ));
    assert!(matches!(
        EntsoeError::transport("x"),
        EntsoeError::Transport { .. }
    ));
}

#[test]
fn error_constructors_group_2() {
    assert!(matches!(
        EntsoeError::stale_data_expired("x"),
        EntsoeError::StaleDataExpired { .. }
    ));
    assert!(matches!(
        EntsoeError::serialization("x"),
        EntsoeError::Serialization { .. }
    ));
    assert!(matches!(EntsoeError::io("x"), EntsoeError::Io { .. }));
    assert!(matches!(
        EntsoeError::validation("f", "m"),
        EntsoeError::Validation { .. }
    ));
    assert!(matches!(
        EntsoeError::generic("x"),
        EntsoeError::Generic { .. }
    ));
}

#[test]
fn conversions_classify_upstream_failures() {
    let io: EntsoeError = std::io::Error::other("disk").into();
    assert!(matches!(io, EntsoeError::Io { .. }));

    let json: EntsoeError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(json, EntsoeError::Serialization { .. }));

    let xml: EntsoeError = quick_xml::de::from_str::<u32>("<a>x</a>").unwrap_err().into();
    assert!(xml.is_recoverable_fetch_failure());
}
