use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn falls_back_to_local_backend() {
    let settings = ClientSettings::from_sources(None, env_from(&[])).expect("settings");
    assert_eq!(settings.base_url().as_str(), DEFAULT_BASE_URL);
    assert!(!settings.trailing_slash());
    assert_eq!(settings.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    assert_eq!(
        settings.collection_url().expect("url").as_str(),
        "http://localhost:8000/api/actions"
    );
}

#[test]
fn trailing_slash_applies_to_collection_and_items() {
    let settings = ClientSettings::new("http://localhost:8000/api/")
        .expect("settings")
        .with_trailing_slash(true);
    assert_eq!(
        settings.collection_url().expect("url").as_str(),
        "http://localhost:8000/api/actions/"
    );
    assert_eq!(
        settings.item_url(ActionId(7)).expect("url").as_str(),
        "http://localhost:8000/api/actions/7/"
    );
}

#[test]
fn bare_paths_without_prefix() {
    let settings = ClientSettings::new("https://impact.example.org").expect("settings");
    assert_eq!(
        settings.item_url(ActionId(12)).expect("url").as_str(),
        "https://impact.example.org/actions/12"
    );
}

#[test]
fn env_overrides_file() {
    let file = r#"
base_url = "http://file.example:9000/api"
collection = "v2/actions"
trailing_slash = true
timeout_secs = 5
"#;
    let settings = ClientSettings::from_sources(
        Some(file),
        env_from(&[
            ("GREENSTEPS_API_URL", "http://env.example:8000"),
            ("GREENSTEPS_TRAILING_SLASH", "off"),
        ]),
    )
    .expect("settings");
    assert_eq!(
        settings.collection_url().expect("url").as_str(),
        "http://env.example:8000/v2/actions"
    );
    assert_eq!(settings.timeout(), Duration::from_secs(5));
}

#[test]
fn rejects_non_http_base_url() {
    let err = ClientSettings::from_sources(
        None,
        env_from(&[("GREENSTEPS_API_URL", "ftp://example.org/api")]),
    )
    .expect_err("should fail");
    assert!(err.to_string().contains("http(s)"));
}

#[test]
fn rejects_unparseable_flag_and_timeout() {
    assert!(ClientSettings::from_sources(
        None,
        env_from(&[("GREENSTEPS_TRAILING_SLASH", "maybe")])
    )
    .is_err());
    assert!(ClientSettings::from_sources(
        None,
        env_from(&[("GREENSTEPS_TIMEOUT_SECS", "soon")])
    )
    .is_err());
    assert!(ClientSettings::from_sources(
        None,
        env_from(&[("GREENSTEPS_TIMEOUT_SECS", "0")])
    )
    .is_err());
}

#[test]
fn rejects_unknown_file_keys() {
    assert!(ClientSettings::from_sources(Some("base = \"x\""), env_from(&[])).is_err());
}

#[test]
fn base_url_override_keeps_other_settings() {
    let settings = ClientSettings::new(DEFAULT_BASE_URL)
        .expect("settings")
        .with_trailing_slash(true)
        .with_base_url("http://10.0.0.5:9000/v2")
        .expect("override");
    assert_eq!(
        settings.collection_url().expect("url").as_str(),
        "http://10.0.0.5:9000/v2/actions/"
    );
    assert!(ClientSettings::new(DEFAULT_BASE_URL)
        .expect("settings")
        .with_base_url("ftp://example.org")
        .is_err());
}
