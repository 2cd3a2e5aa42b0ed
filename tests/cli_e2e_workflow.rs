//! End-to-end tests for the sync, apply, harvest, status and list commands
//! run as a binary against real git repositories.

mod common;

use std::fs;

use common::prelude::*;

#[test]
fn test_sync_apply_harvest_cycle() {
    let fixture = TestFixture::new()
        .with_lock_at_rev1()
        .with_patch(DEP, "001-test.patch", patches::NEW_FILE);

    fixture
        .command()
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] test_repo: cloned at"));
    assert_eq!(fixture.read_checkout("dummy.txt"), "v1\n");

    fixture
        .command()
        .args(["apply", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 applied, 0 already applied"))
        .stdout(predicate::str::contains("001-test.patch applied"));
    assert_eq!(fixture.read_checkout("new_file.txt"), "patched content\n");

    fixture.write_checkout("dummy.txt", "v1\nlocal\n");
    fixture
        .command()
        .args(["harvest", DEP, "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote 2 patches (replaced 1)"));
    assert_eq!(
        fixture.patch_names(DEP),
        vec!["dummy.txt.diff", "new_file.txt.diff"]
    );
    assert!(fixture.staged().is_empty());
}

#[test]
fn test_apply_no_reset_reports_already_applied() {
    let fixture = TestFixture::new()
        .with_lock_at_rev1()
        .with_patch(DEP, "001-test.patch", patches::NEW_FILE);

    fixture.command().arg("sync").assert().success();
    fixture.command().arg("apply").assert().success();
    fixture
        .command()
        .args(["apply", "--no-reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 applied, 1 already applied"));
}

#[test]
fn test_harvest_dry_run_leaves_store() {
    let fixture = TestFixture::new().with_lock_at_rev1();
    fixture.command().arg("sync").assert().success();

    fixture.write_checkout("dummy.txt", "v1\nlocal\n");
    fixture
        .command()
        .args(["harvest", DEP, "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dummy.txt.diff"))
        .stdout(predicate::str::contains("would write 1 patches"));
    assert!(!fixture.patch_dir(DEP).exists());
}

#[test]
fn test_harvest_unknown_dependency() {
    let fixture = TestFixture::new().with_lock_at_rev1();

    fixture
        .command()
        .args(["harvest", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("known: test_repo"));
}

#[test]
fn test_harvest_before_sync_reports_missing_checkout() {
    let fixture = TestFixture::new().with_lock_at_rev1();

    fixture
        .command()
        .args(["harvest", DEP])
        .assert()
        .failure()
        .stderr(predicate::str::contains("run `vendor-patch sync` first"));
}

#[test]
fn test_status_and_list() {
    let fixture = TestFixture::new()
        .with_lock_at_rev1()
        .with_patch(DEP, "001-test.patch", patches::NEW_FILE);

    fixture
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("test_repo: not checked out [1 patches]"));

    fixture.command().arg("sync").assert().success();
    fixture
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("test_repo: at {}", &fixture.rev1[..12])));

    fixture
        .command()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("test_repo @"))
        .stdout(predicate::str::contains("001-test.patch"));
}

#[test]
fn test_root_and_checkout_root_from_environment() {
    let fixture = TestFixture::new()
        .with_lock_at_rev1()
        .with_patch(DEP, "001-test.patch", patches::NEW_FILE);
    let elsewhere = assert_fs::TempDir::new().unwrap();

    fixture
        .command()
        .current_dir(elsewhere.path())
        .env("VENDOR_PATCH_ROOT", fixture.root())
        .env("VENDOR_PATCH_CHECKOUT_ROOT", elsewhere.path())
        .arg("sync")
        .assert()
        .success();

    assert!(elsewhere.path().join("src/test_repo/dummy.txt").exists());
    assert!(!fixture.checkout().exists());
}

#[test]
fn test_yaml_lock_file() {
    let fixture = TestFixture::new();
    let lock = fixture.root().join("deps.lock.yaml");
    fs::write(
        &lock,
        format!(
            "repos:\n  test_repo:\n    url: {}\n    rev: {}\n    path: src/test_repo\n",
            fixture.upstream().display(),
            fixture.rev2
        ),
    )
    .unwrap();

    fixture
        .command()
        .arg("--lock")
        .arg(&lock)
        .arg("sync")
        .assert()
        .success();
    assert_eq!(fixture.read_checkout("dummy.txt"), "v1\nv2\n");
}

#[test]
fn test_parallel_keep_going_sync() {
    let fixture = TestFixture::new();
    let rev1 = fixture.rev1.clone();
    let rev2 = fixture.rev2.clone();
    fixture.write_lock(&[("one", &rev1, "src/one"), ("two", &rev2, "src/two")]);

    fixture
        .command()
        .args(["sync", "--parallel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("one:"))
        .stdout(predicate::str::contains("two:"));
    assert_eq!(
        fs::read_to_string(fixture.checkout_at("src/two/dummy.txt")).unwrap(),
        "v1\nv2\n"
    );
}

#[test]
fn test_completions() {
    let mut cmd = cargo_bin_cmd!("vendor-patch");

    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vendor-patch"));
}
