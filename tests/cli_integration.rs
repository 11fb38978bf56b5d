//! CLI integration tests for gantry.
//!
//! These drive the binary the way a packaging front-end would, against a
//! scripted wrapped backend honoring the same subcommand contract.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the gantry binary command, rooted in the given project.
fn gantry(project_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gantry").unwrap();
    cmd.arg("--project-dir").arg(project_dir);
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// A wrapped backend covering the wheel/sdist hooks. `build-wheel` reports
/// the project name it saw on disk, which is how these tests observe the
/// scoped manifest rewrite from outside.
fn write_backend(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "fake-backend",
        r#"#!/bin/sh
case "$1" in
  capabilities)
    echo '["get-requires-for-build-wheel","get-requires-for-build-sdist","prepare-metadata-for-build-wheel","build-wheel","build-sdist"]'
    ;;
  get-requires-for-build-wheel) echo '["scikit-build-core"]' ;;
  get-requires-for-build-sdist) echo '[]' ;;
  prepare-metadata-for-build-wheel) echo "demo-0.1.0.dist-info" ;;
  build-wheel) sed -n 's/^name = "\(.*\)"$/\1/p' pyproject.toml ;;
  build-sdist) echo "demo-0.1.0.tar.gz" ;;
  *) exit 2 ;;
esac
"#,
    )
}

fn write_project(dir: &Path, backend: &Path, extra_table: &str) {
    fs::write(
        dir.join("pyproject.toml"),
        format!(
            r#"[build-system]
requires = ["gantry-build"]
build-backend = "gantry"

[project]
name = "demo"
version = "0.1.0"
dependencies = ["numpy", "rmm>=24.0"]

[tool.gantry]
build-backend = "{}"
{extra_table}"#,
            backend.display()
        ),
    )
    .unwrap();
}

// ============================================================================
// requirement hooks
// ============================================================================

#[test]
fn test_get_requires_merges_declarations_config_and_backend() {
    let tmp = temp_dir();
    let backend = write_backend(tmp.path());
    write_project(
        tmp.path(),
        &backend,
        "requires = [\"ninja\"]\nmatrix-entry = \"cuda=12\"\n",
    );
    fs::write(
        tmp.path().join("dependencies.yaml"),
        r#"build:
  common: ["cmake>=3.26.4"]
  specific:
    - matrix: { cuda: "12" }
      packages: ["rmm"]
    - matrix: {}
      packages: []
run:
  common: ["numpy"]
"#,
    )
    .unwrap();

    gantry(tmp.path())
        .arg("get-requires-for-build-wheel")
        .assert()
        .success()
        .stdout("[\"cmake>=3.26.4\",\"rmm-cu12>=0.0.0a0\",\"ninja\",\"scikit-build-core\"]\n");
}

#[test]
fn test_get_requires_editable_falls_back_without_backend_hook() {
    let tmp = temp_dir();
    let backend = write_backend(tmp.path());
    write_project(tmp.path(), &backend, "disable-cuda = true\n");

    // The backend exits 2 for the editable hook; gantry's own (empty) list
    // is the answer.
    gantry(tmp.path())
        .arg("get-requires-for-build-editable")
        .assert()
        .success()
        .stdout("[]\n");
}

// ============================================================================
// artifact hooks
// ============================================================================

#[test]
fn test_build_wheel_delegates_with_suffixed_metadata() {
    let tmp = temp_dir();
    let backend = write_backend(tmp.path());
    write_project(tmp.path(), &backend, "matrix-entry = \"cuda=12\"\n");
    let original = fs::read(tmp.path().join("pyproject.toml")).unwrap();

    gantry(tmp.path())
        .args(["build-wheel", "dist"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo-cu12"));

    // The manifest the backend saw was temporary; ours is untouched.
    assert_eq!(fs::read(tmp.path().join("pyproject.toml")).unwrap(), original);
    assert!(!tmp.path().join(".pyproject.toml.gantry.bak").exists());
}

#[test]
fn test_build_sdist_without_git_metadata_is_not_fatal() {
    let tmp = temp_dir();
    let backend = write_backend(tmp.path());
    write_project(tmp.path(), &backend, "disable-cuda = true\n");

    gantry(tmp.path())
        .args(["build-sdist", "dist"])
        .assert()
        .success()
        .stdout("demo-0.1.0.tar.gz\n");

    // No repository, so the default commit file was never created.
    assert!(!tmp.path().join("demo").join("GIT_COMMIT").exists());
}

#[test]
fn test_backend_failure_propagates() {
    let tmp = temp_dir();
    let backend = write_script(
        tmp.path(),
        "broken-backend",
        "#!/bin/sh\necho 'compiler exploded' >&2\nexit 1\n",
    );
    write_project(tmp.path(), &backend, "disable-cuda = true\n");

    gantry(tmp.path())
        .args(["build-sdist", "dist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("compiler exploded"));
}

// ============================================================================
// metadata and capabilities hooks
// ============================================================================

#[test]
fn test_prepare_metadata_prints_dist_info_name() {
    let tmp = temp_dir();
    let backend = write_backend(tmp.path());
    write_project(tmp.path(), &backend, "disable-cuda = true\n");

    gantry(tmp.path())
        .args(["prepare-metadata-for-build-wheel", "meta"])
        .assert()
        .success()
        .stdout("demo-0.1.0.dist-info\n");
}

#[test]
fn test_capabilities_reflect_backend_subset() {
    let tmp = temp_dir();
    let backend = write_backend(tmp.path());
    write_project(tmp.path(), &backend, "");

    gantry(tmp.path())
        .arg("capabilities")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("prepare-metadata-for-build-wheel")
                .and(predicate::str::contains("build-editable").not()),
        );
}

// ============================================================================
// configuration errors
// ============================================================================

#[test]
fn test_missing_gantry_table_fails() {
    let tmp = temp_dir();
    fs::write(
        tmp.path().join("pyproject.toml"),
        "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n",
    )
    .unwrap();

    gantry(tmp.path())
        .arg("get-requires-for-build-wheel")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tool.gantry"));
}

#[test]
fn test_malformed_matrix_entry_fails() {
    let tmp = temp_dir();
    let backend = write_backend(tmp.path());
    write_project(tmp.path(), &backend, "");

    gantry(tmp.path())
        .args(["-C", "matrix-entry=bad", "get-requires-for-build-wheel"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing `=`"));
}

#[test]
fn test_bool_option_rejects_alternative_spellings() {
    let tmp = temp_dir();
    let backend = write_backend(tmp.path());
    write_project(tmp.path(), &backend, "");

    gantry(tmp.path())
        .args(["-C", "disable-cuda=yes", "get-requires-for-build-wheel"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("`true` or `false`"));
}

// ============================================================================
// completions
// ============================================================================

#[test]
fn test_completions_generate() {
    let tmp = temp_dir();
    gantry(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gantry"));
}
