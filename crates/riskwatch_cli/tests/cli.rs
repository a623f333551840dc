use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("riskwatch").unwrap();
    cmd.current_dir(home.path())
        .env_remove("NEWS_API_KEY")
        .env_remove("MAIL_RELAY_URL")
        .env_remove("EMAIL_SMTP_SERVER")
        .env_remove("EMAIL_USER")
        .env_remove("EMAIL_PASS")
        .env_remove("MAIL_USER")
        .env_remove("MAIL_PASS")
        .env_remove("REPORT_RECIPIENT")
        .env_remove("RISKWATCH_LOG_DIR")
        .env("RISKWATCH_DB", home.path().join("tenants.db"));
    cmd
}

fn register(home: &TempDir, username: &str) {
    cmd(home)
        .args(["register", "--username", username, "--password", "pw"])
        .assert()
        .success()
        .stdout(contains(format!("registered {username}")));
}

#[test]
fn every_command_has_help() {
    let home = TempDir::new().unwrap();
    for command in [
        "register",
        "set-email",
        "add-company",
        "remove-company",
        "companies",
        "scan",
        "batch",
        "batch-users",
    ] {
        cmd(&home).args([command, "--help"]).assert().success();
    }
}

#[test]
fn tracked_companies_round_trip_through_the_store() {
    let home = TempDir::new().unwrap();
    register(&home, "alice");

    for company in ["Tesla", "Meta", "tesla"] {
        cmd(&home)
            .args(["add-company", "--username", "alice", "--password", "pw", company])
            .assert()
            .success();
    }
    cmd(&home)
        .args(["companies", "--username", "alice", "--password", "pw"])
        .assert()
        .success()
        .stdout("Tesla\nMeta\n");

    cmd(&home)
        .args(["remove-company", "--username", "alice", "--password", "pw", "Amazon"])
        .assert()
        .success()
        .stdout(contains("not tracking Amazon"));
}

#[test]
fn duplicate_registration_fails() {
    let home = TempDir::new().unwrap();
    register(&home, "alice");

    cmd(&home)
        .args(["register", "--username", "alice", "--password", "other"])
        .assert()
        .code(1)
        .stderr(contains("username already exists"));
}

#[test]
fn wrong_password_is_rejected() {
    let home = TempDir::new().unwrap();
    register(&home, "alice");

    cmd(&home)
        .args(["companies", "--username", "alice", "--password", "nope"])
        .assert()
        .code(1)
        .stderr(contains("invalid credentials"));
}

#[test]
fn password_can_come_from_stdin() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["register", "--username", "bob"])
        .write_stdin("from-stdin\n")
        .assert()
        .success();

    cmd(&home)
        .args(["set-email", "--username", "bob", "--email", "bob@example.test"])
        .write_stdin("from-stdin\n")
        .assert()
        .success()
        .stdout(contains("email updated"));
}

#[test]
fn batch_without_api_key_is_a_config_error() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["batch", "--dry-run"])
        .assert()
        .code(4)
        .stderr(contains("NEWS_API_KEY"));
}

#[test]
fn invalid_number_setting_is_a_config_error() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .env("FETCH_CONCURRENCY", "many")
        .args(["companies", "--username", "alice", "--password", "pw"])
        .assert()
        .code(4)
        .stderr(contains("FETCH_CONCURRENCY"));
}
