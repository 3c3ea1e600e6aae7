//! Quoting hooks, providers and query execution.

use anyhow::Result;
use pgjbuilder::cli::PostgresQuoter;
use pgjbuilder::core::PgJbuilderError;
use pgjbuilder::templating::{Connection, Variables};
use pgjbuilder::test_utils::{RecordingConnection, TemplateDir};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::common::vars;

#[test]
fn test_quote_receives_raw_values() {
    let dir = TemplateDir::with_templates(&[(
        "query",
        "<%= quote name %>,<%= quote id %>,<%= quote ids %>,<%= quote missing %>",
    )])
    .unwrap();
    let engine = dir.engine();
    let connection = Arc::new(RecordingConnection::default());
    engine.set_connection(connection.clone());

    let sql = engine
        .render("query", &vars(json!({"name": "String", "id": 3, "ids": [1, 2]})))
        .unwrap();
    assert_eq!(sql, "'String',3,[1,2],NULL");
    assert_eq!(connection.quoted(), vec![json!("String"), json!(3), json!([1, 2]), Value::Null]);
}

#[test]
fn test_postgres_quoter_escapes_literals() {
    let dir = TemplateDir::with_templates(&[("search", "WHERE name = <%= quote term %>")]).unwrap();
    let engine = dir.engine();
    engine.set_connection(Arc::new(PostgresQuoter));

    let sql = engine.render("search", &vars(json!({"term": "O'Brien"}))).unwrap();
    assert_eq!(sql, "WHERE name = 'O''Brien'");
}

#[test]
fn test_provider_is_consulted_for_every_quote() {
    let dir = TemplateDir::with_templates(&[("query", "<%= quote a %> <%= quote b %>")]).unwrap();
    let engine = dir.engine();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    engine.set_connection_provider(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(RecordingConnection::default()) as Arc<dyn Connection>)
    });

    engine.render("query", &vars(json!({"a": 1, "b": 2}))).unwrap();
    engine.render("query", &vars(json!({"a": 1, "b": 2}))).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_templates_without_quote_need_no_connection() {
    let dir = TemplateDir::with_templates(&[("plain", "SELECT <%= n %>")]).unwrap();
    let engine = dir.engine();
    engine.set_connection_provider(|| anyhow::bail!("should not be called"));

    assert_eq!(engine.render("plain", &vars(json!({"n": 1}))).unwrap(), "SELECT 1");
}

struct FailingQuoter;

impl Connection for FailingQuoter {
    fn quote(&self, _value: &Value) -> Result<String> {
        Err(std::io::Error::other("connection reset").into())
    }
}

#[test]
fn test_quote_failures_propagate_untouched() {
    let dir = TemplateDir::with_templates(&[
        ("outer", "before <%= include 'inner' %> after"),
        ("inner", "<%= quote 1 %>"),
    ])
    .unwrap();
    let engine = dir.engine();
    engine.set_connection(Arc::new(FailingQuoter));

    let error = engine.render("outer", &Variables::new()).unwrap_err();
    let io_error = error.downcast_ref::<std::io::Error>().unwrap();
    assert_eq!(io_error.to_string(), "connection reset");
}

#[test]
fn test_provider_failure_aborts_render() {
    let dir = TemplateDir::with_templates(&[
        ("outer", "SELECT <%= include 'inner', id: 7 %>"),
        ("inner", "<%= quote id %>"),
    ])
    .unwrap();
    let engine = dir.engine();
    engine.set_connection_provider(|| Err(std::io::Error::other("pool exhausted").into()));

    let error = engine.render("outer", &Variables::new()).unwrap_err();
    let io_error = error.downcast_ref::<std::io::Error>().unwrap();
    assert_eq!(io_error.to_string(), "pool exhausted");

    let error = engine.render_array("outer", &Variables::new()).unwrap_err();
    assert!(error.downcast_ref::<std::io::Error>().is_some());
}

#[test]
fn test_select_helpers_run_wrapped_sql() {
    let dir = TemplateDir::with_templates(&[("users/list", "SELECT * FROM users")]).unwrap();
    let engine = dir.engine();
    let connection = Arc::new(RecordingConnection::returning(json!([{"id": 1}])));
    engine.set_connection(connection.clone());

    let value = engine.select_array("users/list", &Variables::new()).unwrap();
    assert_eq!(value, json!([{"id": 1}]));
    engine.select_object("users/list", &Variables::new()).unwrap();
    engine.select_value("users/list", &Variables::new()).unwrap();

    let executed = connection.executed();
    assert_eq!(executed.len(), 3);
    assert!(executed[0].starts_with("SELECT COALESCE(array_to_json("));
    assert!(executed[1].starts_with("SELECT COALESCE(row_to_json("));
    assert_eq!(executed[2], "SELECT * FROM users");
}

#[test]
fn test_select_requires_an_executing_connection() {
    let dir = TemplateDir::with_templates(&[("query", "SELECT 1")]).unwrap();
    let engine = dir.engine();

    let error = engine.select_value("query", &Variables::new()).unwrap_err();
    assert_eq!(
        error.downcast_ref::<PgJbuilderError>(),
        Some(&PgJbuilderError::ConnectionNotConfigured)
    );

    engine.set_connection(Arc::new(PostgresQuoter));
    let error = engine.select_value("query", &Variables::new()).unwrap_err();
    assert_eq!(
        error.downcast_ref::<PgJbuilderError>(),
        Some(&PgJbuilderError::QueryExecutionUnsupported)
    );
}
