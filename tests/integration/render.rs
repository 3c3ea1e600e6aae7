//! Rendering through the public engine API.

use pgjbuilder::core::PgJbuilderError;
use pgjbuilder::templating::{Engine, Variables, WrapKind};
use pgjbuilder::test_utils::{RecordingConnection, TemplateDir};
use serde_json::json;
use std::sync::Arc;

use crate::common::vars;

fn engine_for(dir: &TemplateDir) -> Engine {
    let engine = dir.engine();
    engine.set_connection(Arc::new(RecordingConnection::default()));
    engine
}

#[test]
fn test_render_returns_file_contents_verbatim() {
    let contents = "SELECT *\nFROM users\nWHERE active -- no tags here\n";
    let dir = TemplateDir::with_templates(&[("users/active", contents)]).unwrap();

    let sql = engine_for(&dir).render("users/active", &Variables::new()).unwrap();
    assert_eq!(sql, contents);
}

#[test]
fn test_nested_document_query() {
    let dir = TemplateDir::with_templates(&[
        (
            "users/show",
            "SELECT users.id, <%= array 'posts/for_user', user_id: id %> AS posts\n\
             FROM users WHERE users.id = <%= quote id %>",
        ),
        ("posts/for_user", "SELECT id, title FROM posts WHERE user_id = <%= quote user_id %>"),
    ])
    .unwrap();
    let engine = engine_for(&dir);

    let sql = engine.render_object("users/show", &vars(json!({"id": 7}))).unwrap();
    let posts = WrapKind::Array.wrap_fragment("\nSELECT id, title FROM posts WHERE user_id = 7\n");
    let body = format!("SELECT users.id, {posts} AS posts\nFROM users WHERE users.id = 7");
    assert_eq!(sql, WrapKind::Object.wrap_statement(&body));
}

#[test]
fn test_wrapped_fragments_contain_standalone_output() {
    let dir = TemplateDir::with_templates(&[
        ("outer", "<%= object 'inner', n: 1 %>"),
        ("inner", "SELECT <%= n %> AS n, <%= quote label %> AS label"),
    ])
    .unwrap();
    let engine = engine_for(&dir);
    let variables = vars(json!({"label": "x"}));

    let wrapped = engine.render("outer", &variables).unwrap();
    let mut standalone_vars = variables.clone();
    standalone_vars.insert("n".into(), json!(1));
    let standalone = engine.render("inner", &standalone_vars).unwrap();

    let prefix = "(SELECT COALESCE(row_to_json(object_row),'{}'::json) FROM (";
    let suffix = ")object_row)";
    assert!(wrapped.starts_with(prefix));
    assert!(wrapped.ends_with(suffix));
    assert_eq!(&wrapped[prefix.len()..wrapped.len() - suffix.len()], format!("\n{standalone}\n"));
}

#[test]
fn test_nearest_binding_wins_through_include_chain() {
    let dir = TemplateDir::with_templates(&[
        ("a", "<%= include 'b', who: 'b' %>|a:<%= who %>"),
        ("b", "<%= include 'c', who: 'c' %>|b:<%= who %>|<%= root %>"),
        ("c", "c:<%= who %>|<%= unbound %>"),
    ])
    .unwrap();

    let sql = engine_for(&dir).render("a", &vars(json!({"who": "a", "root": "r"}))).unwrap();
    assert_eq!(sql, "c:c||b:b|r|a:a");
}

#[test]
fn test_comments_and_escaped_delimiters() {
    let dir = TemplateDir::with_templates(&[(
        "doc",
        "<%# explains the query %>SELECT '<%%= not a tag %>' AS example",
    )])
    .unwrap();

    let sql = engine_for(&dir).render("doc", &Variables::new()).unwrap();
    assert_eq!(sql, "SELECT '<%= not a tag %>' AS example");
}

#[test]
fn test_syntax_error_names_template_and_line() {
    let dir = TemplateDir::with_templates(&[("broken", "SELECT 1\nFROM t\nWHERE <%= include %>")])
        .unwrap();

    let error = engine_for(&dir).render("broken", &Variables::new()).unwrap_err();
    match error.downcast_ref::<PgJbuilderError>() {
        Some(PgJbuilderError::TemplateSyntax {
            name,
            line,
            ..
        }) => {
            assert_eq!(name, "broken");
            assert_eq!(*line, 3);
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn test_mutual_recursion_is_stopped() {
    let dir = TemplateDir::with_templates(&[
        ("ping", "<%= include 'pong' %>"),
        ("pong", "<%= include 'ping' %>"),
    ])
    .unwrap();
    let engine = engine_for(&dir).with_max_depth(10);

    let error = engine.render("ping", &Variables::new()).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<PgJbuilderError>(),
        Some(PgJbuilderError::RecursionLimitExceeded { limit: 10, .. })
    ));
}

#[test]
fn test_includes_up_to_the_limit_succeed() {
    let mut templates = Vec::new();
    for level in 0..5 {
        templates.push((format!("level{level}"), format!("{level}<%= include 'level{}' %>", level + 1)));
    }
    templates.push(("level5".to_string(), "5".to_string()));
    let refs: Vec<(&str, &str)> = templates.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
    let dir = TemplateDir::with_templates(&refs).unwrap();

    let engine = engine_for(&dir).with_max_depth(5);
    assert_eq!(engine.render("level0", &Variables::new()).unwrap(), "012345");

    let engine = engine_for(&dir).with_max_depth(4);
    assert!(engine.render("level0", &Variables::new()).is_err());
}

#[test]
fn test_concurrent_renders_share_one_engine() {
    let dir = TemplateDir::with_templates(&[
        ("outer", "<%= include 'inner', n: n %>"),
        ("inner", "SELECT <%= n %>"),
    ])
    .unwrap();
    let engine = engine_for(&dir);

    std::thread::scope(|s| {
        for n in 0..8 {
            let engine = &engine;
            s.spawn(move || {
                for _ in 0..20 {
                    let sql = engine.render("outer", &vars(json!({"n": n}))).unwrap();
                    assert_eq!(sql, format!("SELECT {n}"));
                }
            });
        }
    });
    assert_eq!(engine.cache().len(), 2);
}
