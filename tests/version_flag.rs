use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn prints_version() {
    Command::cargo_bin("kwoon")
        .expect("kwoon binary")
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn prints_help() {
    Command::cargo_bin("kwoon")
        .expect("kwoon binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Kwoon"))
        .stdout(contains("--version"));
}
