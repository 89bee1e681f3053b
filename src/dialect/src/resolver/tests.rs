//! Engine tests over small hand-built catalogs

use super::*;
use crate::catalog::DialectCatalog;
use crate::config::ResolverConfig;
use crate::error::DialectError;
use crate::types::DialectDefinition;
use std::collections::BTreeMap;
use std::sync::Arc;

fn catalog(dialects: Vec<DialectDefinition>) -> DialectCatalog {
    DialectCatalog::from_definitions(dialects).unwrap()
}

fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn resolve(catalog: &DialectCatalog, dialect: &str) -> crate::Result<BTreeMap<String, String>> {
    let cache = ResolutionCache::new();
    let config = ResolverConfig::default();
    ResolutionEngine::new(catalog, &cache, &config)
        .resolve(dialect)
        .map(|m| m.as_map().clone())
}

#[test]
fn test_no_parents_resolves_to_own_mappings() {
    let catalog = catalog(vec![DialectDefinition::new("scim")
        .with_mapping("userName", "root/username")
        .with_mapping("emails", "root/email")]);

    assert_eq!(
        resolve(&catalog, "scim").unwrap(),
        map(&[("userName", "root/username"), ("emails", "root/email")])
    );
}

#[test]
fn test_end_to_end_single_parent() {
    let catalog = catalog(vec![
        DialectDefinition::new("scim").with_mapping("userName", "root/username"),
        DialectDefinition::new("app1")
            .with_mapping("email", "root/email")
            .with_parent("scim"),
    ]);

    assert_eq!(
        resolve(&catalog, "app1").unwrap(),
        map(&[("userName", "root/username"), ("email", "root/email")])
    );
}

#[test]
fn test_own_mappings_win_over_inherited() {
    let catalog = catalog(vec![
        DialectDefinition::new("scim").with_mapping("userName", "root/username"),
        DialectDefinition::new("app1")
            .with_mapping("userName", "root/login")
            .with_parent("scim"),
    ]);

    assert_eq!(resolve(&catalog, "app1").unwrap()["userName"], "root/login");
}

#[test]
fn test_own_mappings_win_under_namespace_override() {
    let catalog = catalog(vec![
        DialectDefinition::new("P").with_mapping("P/name", "root/username"),
        DialectDefinition::new("D")
            .with_mapping("D/name", "root/display")
            .with_parent("P")
            .with_override_namespace(true),
    ]);

    assert_eq!(
        resolve(&catalog, "D").unwrap(),
        map(&[("D/name", "root/display")])
    );
}

#[test]
fn test_later_parent_wins() {
    let catalog = catalog(vec![
        DialectDefinition::new("p1")
            .with_mapping("email", "root/email")
            .with_mapping("phone", "root/phone"),
        DialectDefinition::new("p2").with_mapping("email", "root/mail"),
        DialectDefinition::new("d").with_parents(["p1", "p2"]),
        DialectDefinition::new("d_reversed").with_parents(["p2", "p1"]),
    ]);

    let d = resolve(&catalog, "d").unwrap();
    assert_eq!(d["email"], "root/mail");
    assert_eq!(d["phone"], "root/phone");

    let reversed = resolve(&catalog, "d_reversed").unwrap();
    assert_eq!(reversed["email"], "root/email");
}

#[test]
fn test_override_namespace_rewrites_inherited_keys() {
    let catalog = catalog(vec![
        DialectDefinition::new("P").with_mapping("P/name", "root/username"),
        DialectDefinition::new("D")
            .with_parent("P")
            .with_override_namespace(true),
    ]);

    let resolved = resolve(&catalog, "D").unwrap();
    assert_eq!(resolved, map(&[("D/name", "root/username")]));
    assert!(!resolved.contains_key("P/name"));
}

#[test]
fn test_without_override_keeps_inherited_keys() {
    let catalog = catalog(vec![
        DialectDefinition::new("P").with_mapping("P/name", "root/username"),
        DialectDefinition::new("D").with_parent("P"),
    ]);

    assert_eq!(resolve(&catalog, "D").unwrap(), map(&[("P/name", "root/username")]));
}

#[test]
fn test_override_applies_per_dialect_in_chain() {
    // G keeps its keys, P rewrites into P, D keeps P's rewritten keys
    let catalog = catalog(vec![
        DialectDefinition::new("G").with_mapping("G/email", "root/email"),
        DialectDefinition::new("P")
            .with_parent("G")
            .with_override_namespace(true),
        DialectDefinition::new("D").with_parent("P"),
    ]);

    assert_eq!(resolve(&catalog, "D").unwrap(), map(&[("P/email", "root/email")]));
}

#[test]
fn test_override_keeps_nested_key_paths() {
    let catalog = catalog(vec![
        DialectDefinition::new("P")
            .with_mapping("P/address/street", "root/street")
            .with_mapping("P/work/street", "root/work_street"),
        DialectDefinition::new("D")
            .with_parent("P")
            .with_override_namespace(true),
    ]);

    assert_eq!(
        resolve(&catalog, "D").unwrap(),
        map(&[
            ("D/address/street", "root/street"),
            ("D/work/street", "root/work_street"),
        ])
    );
}

#[test]
fn test_override_strips_grandparent_namespace() {
    // P passes G's keys through unchanged; D rewrites them from G's namespace
    let catalog = catalog(vec![
        DialectDefinition::new("http://idp/claims")
            .with_mapping("http://idp/claims/home/phone", "root/home_phone")
            .with_mapping("http://idp/claims/work/phone", "root/work_phone"),
        DialectDefinition::new("P").with_parent("http://idp/claims"),
        DialectDefinition::new("urn:acme:User")
            .with_parent("P")
            .with_override_namespace(true),
    ]);

    assert_eq!(
        resolve(&catalog, "urn:acme:User").unwrap(),
        map(&[
            ("urn:acme:User:home/phone", "root/home_phone"),
            ("urn:acme:User:work/phone", "root/work_phone"),
        ])
    );
}

#[test]
fn test_override_collisions_follow_parent_order() {
    let catalog = catalog(vec![
        DialectDefinition::new("A").with_mapping("A/name", "root/a"),
        DialectDefinition::new("B").with_mapping("B/name", "root/b"),
        DialectDefinition::new("D")
            .with_parents(["A", "B"])
            .with_override_namespace(true),
    ]);

    assert_eq!(resolve(&catalog, "D").unwrap(), map(&[("D/name", "root/b")]));
}

#[test]
fn test_transitive_inheritance() {
    let catalog = catalog(vec![
        DialectDefinition::new("core").with_mapping("id", "root/id"),
        DialectDefinition::new("scim")
            .with_mapping("userName", "root/username")
            .with_parent("core"),
        DialectDefinition::new("enterprise")
            .with_mapping("employeeNumber", "root/employee")
            .with_parent("scim"),
    ]);

    assert_eq!(
        resolve(&catalog, "enterprise").unwrap(),
        map(&[
            ("id", "root/id"),
            ("userName", "root/username"),
            ("employeeNumber", "root/employee"),
        ])
    );
}

#[test]
fn test_empty_dialect_resolves_to_empty_mapping() {
    let catalog = catalog(vec![DialectDefinition::new("base")]);
    assert!(resolve(&catalog, "base").unwrap().is_empty());
}

#[test]
fn test_unknown_dialect() {
    let catalog = catalog(vec![DialectDefinition::new("scim")]);
    assert!(matches!(
        resolve(&catalog, "oidc"),
        Err(DialectError::UnknownDialect(id)) if id == "oidc"
    ));
}

#[test]
fn test_missing_parent() {
    let catalog = catalog(vec![DialectDefinition::new("app1").with_parent("scim")]);

    match resolve(&catalog, "app1") {
        Err(DialectError::MissingParent { dialect, parent }) => {
            assert_eq!(dialect, "app1");
            assert_eq!(parent, "scim");
        }
        other => panic!("Expected MissingParent, got {:?}", other),
    }
}

#[test]
fn test_missing_grandparent_propagates() {
    let catalog = catalog(vec![
        DialectDefinition::new("scim").with_parent("core"),
        DialectDefinition::new("app1").with_parent("scim"),
    ]);

    assert!(matches!(
        resolve(&catalog, "app1"),
        Err(DialectError::MissingParent { dialect, .. }) if dialect == "scim"
    ));
}

#[test]
fn test_self_reference_cycle() {
    let catalog = catalog(vec![DialectDefinition::new("a")
        .with_mapping("x", "root/x")
        .with_parent("a")]);

    match resolve(&catalog, "a") {
        Err(DialectError::CyclicInheritance { cycle }) => assert_eq!(cycle, vec!["a", "a"]),
        other => panic!("Expected CyclicInheritance, got {:?}", other),
    }
}

#[test]
fn test_two_dialect_cycle() {
    let catalog = catalog(vec![
        DialectDefinition::new("a").with_parent("b"),
        DialectDefinition::new("b").with_parent("a"),
    ]);

    match resolve(&catalog, "a") {
        Err(DialectError::CyclicInheritance { cycle }) => assert_eq!(cycle, vec!["a", "b", "a"]),
        other => panic!("Expected CyclicInheritance, got {:?}", other),
    }
}

#[test]
fn test_three_dialect_cycle() {
    let catalog = catalog(vec![
        DialectDefinition::new("a").with_parent("b"),
        DialectDefinition::new("b").with_parent("c"),
        DialectDefinition::new("c").with_parent("a"),
    ]);

    match resolve(&catalog, "b") {
        Err(DialectError::CyclicInheritance { cycle }) => {
            assert_eq!(cycle, vec!["b", "c", "a", "b"])
        }
        other => panic!("Expected CyclicInheritance, got {:?}", other),
    }
}

#[test]
fn test_cycle_does_not_poison_unrelated_dialects() {
    let catalog = catalog(vec![
        DialectDefinition::new("a").with_parent("b"),
        DialectDefinition::new("b").with_parent("a"),
        DialectDefinition::new("scim").with_mapping("userName", "root/username"),
    ]);

    assert!(resolve(&catalog, "a").is_err());
    assert_eq!(
        resolve(&catalog, "scim").unwrap(),
        map(&[("userName", "root/username")])
    );
}

#[test]
fn test_diamond_is_not_a_cycle() {
    let catalog = catalog(vec![
        DialectDefinition::new("root").with_mapping("id", "root/id"),
        DialectDefinition::new("left").with_parent("root"),
        DialectDefinition::new("right").with_parent("root"),
        DialectDefinition::new("app").with_parents(["left", "right"]),
    ]);

    assert_eq!(resolve(&catalog, "app").unwrap(), map(&[("id", "root/id")]));
}

#[test]
fn test_repeated_resolution_uses_cache() {
    let catalog = catalog(vec![
        DialectDefinition::new("scim").with_mapping("userName", "root/username"),
        DialectDefinition::new("app1").with_parent("scim"),
    ]);
    let cache = ResolutionCache::new();
    let config = ResolverConfig::default();
    let engine = ResolutionEngine::new(&catalog, &cache, &config);

    let first = engine.resolve("app1").unwrap();
    assert!(cache.contains("app1"));
    assert!(cache.contains("scim"));

    let second = engine.resolve("app1").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn test_parent_cached_during_child_resolution_is_reused() {
    let catalog = catalog(vec![
        DialectDefinition::new("scim").with_mapping("userName", "root/username"),
        DialectDefinition::new("app1").with_parent("scim"),
    ]);
    let cache = ResolutionCache::new();
    let config = ResolverConfig::default();
    let engine = ResolutionEngine::new(&catalog, &cache, &config);

    engine.resolve("app1").unwrap();
    let hits_before = cache.stats().hits;
    engine.resolve("scim").unwrap();
    assert_eq!(cache.stats().hits, hits_before + 1);
}

#[test]
fn test_failed_resolution_is_not_cached() {
    let catalog = catalog(vec![DialectDefinition::new("app1").with_parent("ghost")]);
    let cache = ResolutionCache::new();
    let config = ResolverConfig::default();
    let engine = ResolutionEngine::new(&catalog, &cache, &config);

    assert!(engine.resolve("app1").is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_cache_disabled_recomputes() {
    let catalog = catalog(vec![DialectDefinition::new("scim").with_mapping("userName", "root/username")]);
    let cache = ResolutionCache::new();
    let config = ResolverConfig::default().with_cache(false);
    let engine = ResolutionEngine::new(&catalog, &cache, &config);

    let first = engine.resolve("scim").unwrap();
    let second = engine.resolve("scim").unwrap();

    assert_eq!(first, second);
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(cache.is_empty());
}

fn chain(len: usize) -> DialectCatalog {
    let dialects = (0..len)
        .map(|i| {
            let dialect = DialectDefinition::new(format!("d{}", i))
                .with_mapping(format!("claim{}", i), format!("root/claim{}", i));
            if i == 0 {
                dialect
            } else {
                dialect.with_parent(format!("d{}", i - 1))
            }
        })
        .collect();
    catalog(dialects)
}

#[test]
fn test_long_chain_resolves_cold_and_warm() {
    let catalog = chain(100);
    let cache = ResolutionCache::new();
    let config = ResolverConfig::default();
    let engine = ResolutionEngine::new(&catalog, &cache, &config);

    let cold = engine.resolve("d99").unwrap();
    assert_eq!(cold.len(), 100);
    assert_eq!(cold.get("claim0"), Some("root/claim0"));
    assert_eq!(cache.len(), 100);

    let warm = engine.resolve("d99").unwrap();
    assert!(Arc::ptr_eq(&cold, &warm));
}

#[test]
fn test_long_chain_result_independent_of_cache_state() {
    let catalog = chain(100);
    let config = ResolverConfig::default();

    // Ancestors resolved first, parents-first, as bulk resolution does
    let warmed = ResolutionCache::new();
    let engine = ResolutionEngine::new(&catalog, &warmed, &config);
    for i in 0..99 {
        engine.resolve(&format!("d{}", i)).unwrap();
    }
    let after_warmup = engine.resolve("d99").unwrap();

    let empty = ResolutionCache::new();
    let cold = ResolutionEngine::new(&catalog, &empty, &config).resolve("d99").unwrap();

    let uncached = ResolverConfig::default().with_cache(false);
    let unused = ResolutionCache::new();
    let recomputed = ResolutionEngine::new(&catalog, &unused, &uncached)
        .resolve("d99")
        .unwrap();

    assert_eq!(after_warmup, cold);
    assert_eq!(cold, recomputed);
}
