#![allow(clippy::unwrap_used)]
// Loading, saving and translating profiles from explicit file paths.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;
use tsoft_api::TlsMode;
use tsoft_config::{
    Config, ConfigError, Defaults, Profile, load_config_from, profile_to_client_config, save_config_to,
};

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(cfg.default_profile.as_deref(), Some("default"));
    assert_eq!(cfg.defaults, Defaults::default());
    assert!(cfg.profiles.is_empty());
}

#[test]
fn profiles_and_defaults_are_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
default_profile = "shop"

[defaults]
output = "json"
timeout = 45
debug = true

[profiles.shop]
base_url = "https://shop.example.com/rest1"
token = "plain-token"
image_concurrency = 4
"#,
    )
    .unwrap();

    let cfg = load_config_from(&path).unwrap();
    assert_eq!(cfg.active_profile_name(None), "shop");
    assert_eq!(cfg.active_profile_name(Some("other")), "other");
    assert_eq!(cfg.defaults.output, "json");
    assert!(!cfg.defaults.insecure);

    let profile = cfg.profile("shop").unwrap();
    assert_eq!(profile.image_concurrency, Some(4));

    let client = profile_to_client_config(profile, "shop", &cfg.defaults).unwrap();
    assert_eq!(client.base_url.as_str(), "https://shop.example.com/rest1");
    assert_eq!(client.token.expose_secret(), "plain-token");
    assert_eq!(client.transport.timeout, Duration::from_secs(45));
    assert_eq!(client.transport.tls, TlsMode::System);
    assert!(client.debug);
    assert_eq!(client.image_concurrency, 4);
    assert_eq!(client.detail_concurrency, 5);
}

#[test]
fn unknown_profile_lists_available() {
    let mut cfg = Config::default();
    cfg.profiles.insert("a".into(), Profile::new("https://a.test"));
    cfg.profiles.insert("b".into(), Profile::new("https://b.test"));

    let err = cfg.profile("c").unwrap_err();
    match err {
        ConfigError::UnknownProfile { name, available } => {
            assert_eq!(name, "c");
            assert_eq!(available, ["a", "b"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    cfg.profiles.insert(
        "default".into(),
        Profile {
            token_env: Some("SHOP_TOKEN".into()),
            timeout: Some(10),
            ..Profile::new("https://shop.example.com/rest1")
        },
    );
    save_config_to(&cfg, &path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("token_env = \"SHOP_TOKEN\""));
    assert!(!written.contains("ca_cert"));

    assert_eq!(load_config_from(&path).unwrap(), cfg);
}

#[test]
fn invalid_base_url_is_reported() {
    let profile = Profile {
        token: Some("t".into()),
        ..Profile::new("not a url")
    };
    let err = profile_to_client_config(&profile, "default", &Defaults::default()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl { .. }));
}
