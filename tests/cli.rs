//! 离线 CLI 测试

use std::fs;

use assert_cmd::Command;
use tempfile::tempdir;

const PAGE: &str = r#"<html><head><meta charset="utf-8"></head><body><article><div data-testid="tweetText" lang="es">hola mundo</div></article></body></html>"#;

fn cli(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("tweet-translator").unwrap();
    cmd.current_dir(dir)
        .env_remove("DEEPL_API_KEY")
        .env_remove("TWEET_TRANSLATOR_API_URL")
        .env_remove("TWEET_TRANSLATOR_PROVIDER");
    cmd
}

/// 翻译服务不可达时页面原样输出
#[test]
fn test_unreachable_provider_leaves_page_unchanged() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("page.html");
    let output = dir.path().join("out.html");
    fs::write(&input, PAGE).unwrap();

    cli(dir.path())
        .arg(&input)
        .args(["--provider", "google", "--api-url", "http://127.0.0.1:9/", "-t", "en"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("hola mundo"));
    assert!(!html.contains("tweet-translator-toggle"));
    assert!(!html.contains("data-translated"));
}

/// 从 stdin 读取并写到 stdout
#[test]
fn test_stdin_to_stdout() {
    let dir = tempdir().unwrap();

    let assert = cli(dir.path())
        .args(["--provider", "deepl", "-"])
        .write_stdin(PAGE)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("<div data-testid=\"tweetText\" lang=\"es\">hola mundo</div>"));
}

#[test]
fn test_unknown_provider_fails() {
    let dir = tempdir().unwrap();

    cli(dir.path())
        .args(["--provider", "babelfish", "-"])
        .write_stdin(PAGE)
        .assert()
        .failure();
}

#[test]
fn test_env_docs() {
    let dir = tempdir().unwrap();

    let assert = cli(dir.path()).arg("--env-docs").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("TWEET_TRANSLATOR_LOG_LEVEL"));
    assert!(stdout.contains("TWITTER_BEARER_TOKEN"));
}

/// 偏好设置文件不存在时写入默认值，命令行语言写回文件
#[test]
fn test_preferences_file_is_seeded_and_updated() {
    let dir = tempdir().unwrap();
    let prefs = dir.path().join("state").join("prefs.json");

    cli(dir.path())
        .args(["--provider", "deepl", "-t", "ko"])
        .arg("--preferences")
        .arg(&prefs)
        .arg("-")
        .write_stdin(PAGE)
        .assert()
        .success();

    let stored: serde_json::Value = serde_json::from_str(&fs::read_to_string(&prefs).unwrap()).unwrap();
    assert_eq!(stored["targetLang"], "ko");
    assert_eq!(stored["sourceLang"], "auto");
    assert_eq!(stored["isEnabled"], true);
}

/// 偏好设置中关闭翻译时页面原样输出
#[test]
fn test_disabled_preferences_skip_translation() {
    let dir = tempdir().unwrap();
    let prefs = dir.path().join("prefs.json");
    fs::write(&prefs, r#"{"sourceLang": "es", "targetLang": "en", "isEnabled": false}"#).unwrap();

    let assert = cli(dir.path())
        .args(["--provider", "google", "--api-url", "http://127.0.0.1:9/"])
        .arg("--preferences")
        .arg(&prefs)
        .arg("-")
        .write_stdin(PAGE)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("hola mundo"));
    assert!(!stdout.contains("tweet-translator-toggle"));

    let stored: serde_json::Value = serde_json::from_str(&fs::read_to_string(&prefs).unwrap()).unwrap();
    assert_eq!(stored["isEnabled"], false);
    assert_eq!(stored["targetLang"], "en");
}
