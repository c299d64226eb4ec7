use std::path::PathBuf;
use std::process::{Command, Output};

/// Run the binary from an empty directory so no `.env` is picked up.
fn run_cli(args: &[&str], env: &[(&str, &str)]) -> Output {
    let workdir: PathBuf = std::env::temp_dir().join(format!("crypto-charts-cli-{}", std::process::id()));
    std::fs::create_dir_all(&workdir).expect("temp dir");

    let binary_path = assert_cmd::cargo::cargo_bin!("crypto-charts");
    let mut cmd = Command::new(binary_path);
    cmd.current_dir(&workdir)
        .args(args)
        .env_remove("CRYPTOCOM_API_KEY")
        .env_remove("CRYPTOCOM_API_SECRET")
        .env_remove("CRYPTOCOM_API_URL")
        .env_remove("COINGECKO_API_URL");
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().expect("cli runs")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_lists_both_providers() {
    let output = run_cli(&["--help"], &[]);
    assert!(output.status.success(), "help failed: {:?}", output);

    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    assert!(stdout.contains("coingecko"));
    assert!(stdout.contains("cryptocom"));
}

#[test]
fn cryptocom_without_credentials_fails_before_any_request() {
    let output = run_cli(&["cryptocom", "instruments"], &[]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Crypto.com configuration"), "stderr: {}", err);
    assert!(err.contains("CRYPTOCOM_API_KEY"), "stderr: {}", err);
}

#[test]
fn blank_secret_is_rejected() {
    let output = run_cli(
        &["cryptocom", "instruments"],
        &[("CRYPTOCOM_API_KEY", "key"), ("CRYPTOCOM_API_SECRET", "   ")],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("CRYPTOCOM_API_SECRET"));
}

#[test]
fn cryptocom_rejects_one_year_range() {
    let output = run_cli(
        &["cryptocom", "chart", "--instrument", "BTC_USDT", "--range", "1y"],
        &[("CRYPTOCOM_API_KEY", "key"), ("CRYPTOCOM_API_SECRET", "secret")],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("does not offer the 1y range"));
}

#[test]
fn unknown_range_is_a_usage_error() {
    let output = run_cli(&["coingecko", "chart", "--instrument", "bitcoin", "--range", "2w"], &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("2w"));
}

#[test]
fn unknown_provider_is_a_usage_error() {
    let output = run_cli(&["binance", "instruments"], &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("binance"));
}

#[test]
fn invalid_base_url_is_a_configuration_error() {
    let output = run_cli(&["coingecko", "instruments"], &[("COINGECKO_API_URL", "ftp://example.com")]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid CoinGecko configuration"));
}
