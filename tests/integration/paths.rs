//! Search path ordering and shadowing.

use pgjbuilder::core::PgJbuilderError;
use pgjbuilder::templating::{Engine, PathResolver, Variables};
use pgjbuilder::test_utils::TemplateDir;

fn engine_over(roots: &[&TemplateDir]) -> Engine {
    let roots = roots.iter().map(|dir| dir.path().to_path_buf()).collect();
    Engine::with_resolver(PathResolver::new(roots, "sql"))
}

#[test]
fn test_prepended_root_shadows_default_root() {
    let default_root = TemplateDir::with_templates(&[("test1", "default test1"), ("test2", "default test2")])
        .unwrap();
    let app_root = TemplateDir::with_templates(&[("test2", "app test2")]).unwrap();
    let engine = engine_over(&[&default_root]);

    assert_eq!(engine.render("test2", &Variables::new()).unwrap(), "default test2");

    engine.paths().prepend(app_root.path());
    assert_eq!(engine.render("test2", &Variables::new()).unwrap(), "app test2");
    assert_eq!(engine.render("test1", &Variables::new()).unwrap(), "default test1");
}

#[test]
fn test_include_resolves_across_roots() {
    let shared = TemplateDir::with_templates(&[("fragments/limit", "LIMIT <%= n %>")]).unwrap();
    let app = TemplateDir::with_templates(&[("report", "SELECT 1 <%= include 'fragments/limit', n: 5 %>")])
        .unwrap();
    let engine = engine_over(&[&app, &shared]);

    assert_eq!(engine.render("report", &Variables::new()).unwrap(), "SELECT 1 LIMIT 5");
}

#[test]
fn test_not_found_carries_exact_name() {
    let root = TemplateDir::new().unwrap();
    let engine = engine_over(&[&root]);

    for name in ["template_does_not_exist", "deeply/nested/missing", "with.dots"] {
        let error = engine.render(name, &Variables::new()).unwrap_err();
        assert_eq!(
            error.downcast_ref::<PgJbuilderError>(),
            Some(&PgJbuilderError::TemplateNotFound {
                name: name.to_string(),
            })
        );
    }
}

#[cfg(unix)]
#[test]
fn test_backslash_names_render_or_report_not_found() {
    let root = TemplateDir::with_templates(&[("odd\\name", "SELECT 'odd'")]).unwrap();
    let engine = engine_over(&[&root]);

    assert_eq!(engine.render("odd\\name", &Variables::new()).unwrap(), "SELECT 'odd'");
    let error = engine.render("windows\\style", &Variables::new()).unwrap_err();
    assert_eq!(
        error.downcast_ref::<PgJbuilderError>(),
        Some(&PgJbuilderError::TemplateNotFound {
            name: "windows\\style".to_string(),
        })
    );
}

#[test]
fn test_template_created_after_a_miss_is_found() {
    let root = TemplateDir::new().unwrap();
    let engine = engine_over(&[&root]);

    assert!(engine.render("late", &Variables::new()).is_err());
    root.write("late", "here now").unwrap();
    assert_eq!(engine.render("late", &Variables::new()).unwrap(), "here now");
}

#[test]
fn test_traversal_names_are_rejected() {
    let root = TemplateDir::with_templates(&[("inside", "ok")]).unwrap();
    let engine = engine_over(&[&root]);

    let error = engine.render("../inside", &Variables::new()).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<PgJbuilderError>(),
        Some(PgJbuilderError::InvalidTemplateName { .. })
    ));
}

#[test]
fn test_available_templates_across_roots() {
    let first = TemplateDir::with_templates(&[("users/list", ""), ("users/show", "")]).unwrap();
    let second = TemplateDir::with_templates(&[("users/list", ""), ("orders", "")]).unwrap();
    let engine = engine_over(&[&first, &second]);

    assert_eq!(engine.paths().available_templates(), vec!["orders", "users/list", "users/show"]);
}
