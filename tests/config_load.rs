// tests/config_load.rs
use feed_event_relay::config::{Config, ENV_CONFIG_PATH};
use std::{env, fs};

#[test]
fn load_from_file_merges_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("relay.toml");
    fs::write(
        &p,
        r#"
[relay]
poll_interval_secs = 120

[[feeds]]
name = "Only Feed"
url = "https://rsshub.app/telegram/channel/only"
channel = "only"

[formatter]
view_post_label = "مشاهده کامل رویداد"
rtl_mark = true
"#,
    )
    .unwrap();

    let cfg = Config::load_from(&p).unwrap();
    assert_eq!(cfg.relay.poll_interval_secs, 120);
    assert_eq!(cfg.relay.max_items_per_feed, 10);
    assert_eq!(cfg.feeds.len(), 1);
    assert_eq!(cfg.formatter.view_post_label, "مشاهده کامل رویداد");
    assert!(cfg.formatter.rtl_mark);
    assert_eq!(cfg.formatter.max_message_chars, 4096);
    assert!(!cfg.detector.keywords.is_empty());
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("relay.toml");
    fs::write(&p, "[relay\npoll_interval_secs = ").unwrap();
    assert!(Config::load_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    // 1) Nothing on disk -> built-in defaults
    assert_eq!(Config::load_default().unwrap(), Config::default());

    // 2) ./config/relay.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/relay.toml"),
        "[relay]\npoll_interval_secs = 60\n",
    )
    .unwrap();
    assert_eq!(Config::load_default().unwrap().relay.poll_interval_secs, 60);

    // 3) Env wins
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "[relay]\npoll_interval_secs = 30\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(Config::load_default().unwrap().relay.poll_interval_secs, 30);

    // 4) Env pointing nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(Config::load_default().is_err());
    env::remove_var(ENV_CONFIG_PATH);

    env::set_current_dir(&old).unwrap();
}
