//! The `pgjb` command-line host.

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

use crate::common::pgjb;

fn project(templates: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, contents) in templates {
        let path = dir.path().join("queries").join(format!("{name}.sql"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

#[test]
fn test_render_with_variables() {
    let dir = project(&[("users/show", "SELECT * FROM users WHERE id = <%= quote id %> AND name = <%= quote name %>")]);

    pgjb(dir.path())
        .args(["render", "users/show", "--var", "id=42", "--var", "name=O'Brien"])
        .assert()
        .success()
        .stdout("SELECT * FROM users WHERE id = 42 AND name = 'O''Brien'\n");
}

#[test]
fn test_render_as_array() {
    let dir = project(&[("posts", "SELECT 1")]);

    pgjb(dir.path())
        .args(["render", "posts", "--as", "array"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "SELECT COALESCE(array_to_json(array_agg(row_to_json(array_row))),'[]'::json)\nFROM (\nSELECT 1\n) array_row",
        ));
}

#[test]
fn test_render_with_vars_file() {
    let dir = project(&[("q", "<%= a %>-<%= b.c %>")]);
    fs::write(dir.path().join("vars.json"), r#"{"a": "x", "b": {"c": 2}}"#).unwrap();

    pgjb(dir.path())
        .args(["render", "q", "--vars", "vars.json"])
        .assert()
        .success()
        .stdout("x-2\n");
}

#[test]
fn test_missing_template_suggests_similar_names() {
    let dir = project(&[("users/list", "SELECT 1")]);

    pgjb(dir.path())
        .args(["render", "users/lst"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Template users/lst was not found in any source paths"))
        .stderr(predicate::str::contains("users/list"));
}

#[test]
fn test_invalid_variable_is_reported() {
    let dir = project(&[("q", "SELECT 1")]);

    pgjb(dir.path())
        .args(["render", "q", "--var", "missing-equals"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid variable 'missing-equals'"));
}

#[test]
fn test_extra_paths_shadow_default_root() {
    let dir = project(&[("q", "default")]);
    let override_dir = dir.path().join("override");
    fs::create_dir_all(&override_dir).unwrap();
    fs::write(override_dir.join("q.sql"), "override").unwrap();

    pgjb(dir.path())
        .args(["-I", "override", "render", "q"])
        .assert()
        .success()
        .stdout("override\n");

    pgjb(dir.path())
        .args(["resolve", "q", "--path", "override"])
        .assert()
        .success()
        .stdout(predicate::str::contains("override").and(predicate::str::ends_with("q.sql\n")));
}

#[test]
fn test_config_file_paths_and_extension() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("sql")).unwrap();
    fs::write(dir.path().join("sql/report.pgsql"), "SELECT 'report'").unwrap();
    fs::write(dir.path().join("pgjb.toml"), "paths = ['sql']\nextension = 'pgsql'\n").unwrap();

    pgjb(dir.path()).args(["render", "report"]).assert().success().stdout("SELECT 'report'\n");
}

#[test]
fn test_explicit_config_path() {
    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join("conf");
    fs::create_dir_all(config_dir.join("templates")).unwrap();
    fs::write(config_dir.join("templates/q.sql"), "from config").unwrap();
    fs::write(config_dir.join("custom.toml"), "paths = ['templates']").unwrap();

    pgjb(dir.path())
        .args(["--config", "conf/custom.toml", "render", "q"])
        .assert()
        .success()
        .stdout("from config\n");
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pgjb.toml"), "unknown_key = 1").unwrap();

    pgjb(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_recursion_limit_from_config() {
    let dir = project(&[("loop", "<%= include 'loop' %>")]);
    fs::write(dir.path().join("pgjb.toml"), "max_depth = 3").unwrap();

    pgjb(dir.path())
        .args(["render", "loop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Maximum include depth (3) exceeded"));
}

#[test]
fn test_list_and_check() {
    let dir = project(&[("a", "SELECT 1"), ("nested/b", "SELECT <%= x %>"), ("bad", "<% array do %>")]);

    pgjb(dir.path()).arg("list").assert().success().stdout("a\nbad\nnested/b\n");

    pgjb(dir.path())
        .args(["check", "a", "nested/b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok").and(predicate::str::contains("nested/b")));

    pgjb(dir.path())
        .args(["check", "bad"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Template syntax error in 'bad' at line 1"));

    pgjb(dir.path())
        .args(["check", "--all"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("bad"))
        .stderr(predicate::str::contains("1 of 3 template(s) failed to compile"));
}

#[test]
fn test_list_with_no_templates_warns() {
    let dir = TempDir::new().unwrap();

    pgjb(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("No templates found"));

    pgjb(dir.path()).args(["--quiet", "list"]).assert().success().stderr("");
}
