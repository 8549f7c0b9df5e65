use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("fatoura")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("invoices"))
        .stdout(predicate::str::contains("import"));
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("fatoura")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure();
}

#[test]
fn reconcile_confirm_requires_id() {
    Command::cargo_bin("fatoura")
        .unwrap()
        .args(["reconcile", "confirm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn completions_emit_script() {
    Command::cargo_bin("fatoura")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fatoura"));
}
