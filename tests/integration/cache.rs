//! Compiled template cache behaviour.

use pgjbuilder::templating::Variables;
use pgjbuilder::test_utils::TemplateDir;

#[test]
fn test_cached_engine_reads_each_template_once() {
    let dir = TemplateDir::with_templates(&[("outer", "<%= include 'inner' %><%= include 'inner' %>"), ("inner", "x")])
        .unwrap();
    let engine = dir.engine();

    for _ in 0..10 {
        assert_eq!(engine.render("outer", &Variables::new()).unwrap(), "xx");
    }

    let stats = engine.cache().stats();
    assert_eq!(stats.reads, 2);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hits, 28);
}

#[test]
fn test_uncached_engine_reads_on_every_use() {
    let dir = TemplateDir::with_templates(&[("query", "SELECT 1")]).unwrap();
    let engine = dir.engine().with_caching(false);

    for _ in 0..4 {
        engine.render("query", &Variables::new()).unwrap();
    }
    assert_eq!(engine.cache().stats().reads, 4);
    assert!(engine.cache().is_empty());
}

#[test]
fn test_edits_show_after_clear_or_with_caching_off() {
    let dir = TemplateDir::with_templates(&[("query", "v1")]).unwrap();
    let engine = dir.engine();
    assert_eq!(engine.render("query", &Variables::new()).unwrap(), "v1");

    dir.write("query", "v2").unwrap();
    assert_eq!(engine.render("query", &Variables::new()).unwrap(), "v1");

    engine.clear_cache();
    assert_eq!(engine.cache().stats().reads, 0);
    assert_eq!(engine.render("query", &Variables::new()).unwrap(), "v2");

    dir.write("query", "v3").unwrap();
    engine.set_caching_enabled(false);
    assert!(!engine.caching_enabled());
    assert_eq!(engine.render("query", &Variables::new()).unwrap(), "v3");
}

#[test]
fn test_cached_template_survives_file_removal_until_cleared() {
    let dir = TemplateDir::with_templates(&[("query", "SELECT 1")]).unwrap();
    let engine = dir.engine();
    engine.compile("query").unwrap();

    dir.remove("query").unwrap();
    assert_eq!(engine.render("query", &Variables::new()).unwrap(), "SELECT 1");

    engine.clear_cache();
    assert!(engine.render("query", &Variables::new()).is_err());
}
