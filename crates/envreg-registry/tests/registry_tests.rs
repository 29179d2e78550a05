use envreg_registry::{format_report, AddRequest, FsRegistry, RegistryError, SetRequest};
use envreg_store::{EnvironmentSpec, EnvironmentStore};
use envreg_test_utils::{name, TempApp, EAST_URI, WEST_URI};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;

const SPEC_JSON: &str = r#"{
  "uri": "https://a:6443",
  "namespace": "",
  "apiSpecVersion": "version:v1.7.0"
}
"#;

const KUBECONFIG: &str = r#"current-context: ci
contexts:
  - name: ci
    context:
      cluster: k
      namespace: tests
clusters:
  - name: k
    cluster:
      server: https://ci:6443
"#;

fn keys(app: &TempApp) -> Vec<String> {
    app.snapshot().into_keys().collect()
}

#[test]
fn test_add_writes_spec_and_metadata() {
    let app = TempApp::new();
    app.registry()
        .add(&AddRequest::new("default").with_uri("https://a:6443"))
        .unwrap();

    let snapshot = app.snapshot();
    assert_eq!(
        snapshot.keys().cloned().collect::<Vec<_>>(),
        vec!["default/", "default/.metadata/", "default/spec.json"]
    );
    assert_eq!(
        snapshot["default/spec.json"].as_deref(),
        Some(SPEC_JSON.as_bytes())
    );
}

#[test]
fn test_two_independent_environments() {
    let app = TempApp::new();
    let registry = app.registry();
    registry.add(&AddRequest::new("default")).unwrap();
    registry
        .add(&AddRequest::new("us-west/staging").with_context("east"))
        .unwrap();

    assert_eq!(
        app.read_spec("default"),
        EnvironmentSpec::new(WEST_URI, "staging", "version:v1.7.0")
    );
    assert_eq!(
        app.read_spec("us-west/staging"),
        EnvironmentSpec::new(EAST_URI, "", "version:v1.7.0")
    );

    let names: Vec<String> = registry
        .list()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["default", "us-west/staging"]);
}

#[test]
fn test_duplicates_leave_tree_untouched() {
    let app = TempApp::new();
    let registry = app.registry();
    registry.add(&AddRequest::new("default")).unwrap();
    registry.add(&AddRequest::new("us-west/staging")).unwrap();
    let before = app.snapshot();

    for raw in ["default", "default/child", "us-west", "us-west/staging"] {
        let err = registry
            .add(&AddRequest::new(raw).with_uri("https://other"))
            .unwrap_err();
        assert!(err.is_duplicate(), "{raw}: {err}");
        assert_eq!(app.snapshot(), before);
    }
}

#[test]
fn test_intermediate_conflict_names_descendant() {
    let app = TempApp::new();
    let registry = app.registry();
    registry.add(&AddRequest::new("us-west/staging")).unwrap();

    let err = registry
        .add(&AddRequest::new("us-west").with_uri("https://x"))
        .unwrap_err();
    assert!(err.to_string().contains("us-west/staging"), "{err}");
}

#[test]
fn test_remove_prunes_empty_ancestors() {
    let app = TempApp::new();
    let registry = app.registry();
    registry.add(&AddRequest::new("a/b/c")).unwrap();
    registry.add(&AddRequest::new("a/d")).unwrap();

    registry.remove("a/b/c").unwrap();
    assert_eq!(
        keys(&app),
        vec!["a/", "a/d/", "a/d/.metadata/", "a/d/spec.json"]
    );

    registry.remove("a/d").unwrap();
    assert!(app.snapshot().is_empty());
    assert!(app.path().join("environments").is_dir());
}

#[test]
fn test_remove_missing() {
    let app = TempApp::new();
    let registry = app.registry();
    registry.add(&AddRequest::new("a/b")).unwrap();

    assert!(registry.remove("a").unwrap_err().is_not_found());
    assert!(registry.remove("nope").unwrap_err().is_not_found());
    assert_eq!(registry.list().unwrap().len(), 1);
}

#[test]
fn test_list_skips_stray_entries() {
    let app = TempApp::new();
    let registry = app.registry();
    registry.add(&AddRequest::new("prod")).unwrap();

    let root = app.path().join("environments");
    fs::create_dir_all(root.join(".cache/x")).unwrap();
    fs::create_dir_all(root.join("empty/dir")).unwrap();
    fs::write(root.join("README"), "notes").unwrap();

    let rows = registry.list().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "prod");
}

#[test]
fn test_list_on_fresh_root() {
    let app = TempApp::new();
    assert!(app.registry().list().unwrap().is_empty());
}

#[test]
fn test_rename_moves_and_prunes() {
    let app = TempApp::new();
    let registry = app.registry();
    registry
        .add(&AddRequest::new("a/b").with_uri("https://a:6443"))
        .unwrap();

    registry.set(&SetRequest::new("a/b").with_new_name("c")).unwrap();

    let snapshot = app.snapshot();
    assert_eq!(
        snapshot.keys().cloned().collect::<Vec<_>>(),
        vec!["c/", "c/.metadata/", "c/spec.json"]
    );
    assert_eq!(snapshot["c/spec.json"].as_deref(), Some(SPEC_JSON.as_bytes()));
}

#[test]
fn test_rename_into_new_hierarchy() {
    let app = TempApp::new();
    let registry = app.registry();
    registry.add(&AddRequest::new("us-west/staging")).unwrap();
    registry.add(&AddRequest::new("us-west/prod")).unwrap();

    registry
        .set(&SetRequest::new("us-west/staging").with_new_name("eu/central/staging"))
        .unwrap();

    let names: Vec<String> = registry
        .list()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["eu/central/staging", "us-west/prod"]);
}

#[test]
fn test_rename_conflicts_leave_tree_untouched() {
    let app = TempApp::new();
    let registry = app.registry();
    registry.add(&AddRequest::new("a")).unwrap();
    registry.add(&AddRequest::new("b/c")).unwrap();
    let before = app.snapshot();

    for target in ["b", "b/c", "a/x"] {
        let err = registry
            .set(&SetRequest::new("a").with_new_name(target).with_namespace("n"))
            .unwrap_err();
        assert!(err.is_duplicate(), "{target}: {err}");
        assert_eq!(app.snapshot(), before);
    }
}

#[test]
fn test_conflicting_flags_write_nothing() {
    let app = TempApp::new();
    let registry = app.registry();

    let err = registry
        .add(&AddRequest::new("dev").with_uri("https://x").with_context("west"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::ConflictingFlags));
    assert!(!app.path().join("environments").exists());
    assert!(!app.path().join(".envreg.lock").exists());
}

#[test]
fn test_set_namespace_only() {
    let app = TempApp::new();
    let registry = app.registry();
    registry
        .add(&AddRequest::new("dev").with_uri("https://u").with_api_spec("version:v1.8.0"))
        .unwrap();

    registry.set(&SetRequest::new("dev").with_namespace("prod")).unwrap();

    assert_eq!(
        app.read_spec("dev"),
        EnvironmentSpec::new("https://u", "prod", "version:v1.8.0")
    );
}

#[test]
fn test_set_rename_with_context() {
    let app = TempApp::new();
    let registry = app.registry();
    registry
        .add(&AddRequest::new("old").with_uri("https://u").with_namespace("ns"))
        .unwrap();

    registry
        .set(&SetRequest::new("old").with_new_name("new/one").with_context("east"))
        .unwrap();

    assert!(!app.store().exists(&name("old")));
    assert_eq!(
        app.read_spec("new/one"),
        EnvironmentSpec::new(EAST_URI, "ns", "version:v1.7.0")
    );
}

#[test]
fn test_set_failed_update_keeps_rename() {
    let app = TempApp::new();
    app.registry()
        .add(&AddRequest::new("a/b").with_uri("https://a:6443"))
        .unwrap();

    let err = app
        .failing_update_registry()
        .set(&SetRequest::new("a/b").with_new_name("c").with_namespace("n"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::Store(_)));

    assert!(!app.store().exists(&name("a/b")));
    assert_eq!(
        app.read_spec("c"),
        EnvironmentSpec::new("https://a:6443", "", "version:v1.7.0")
    );
}

#[test]
fn test_set_without_changes_is_noop() {
    let app = TempApp::new();
    let registry = app.registry();
    registry.add(&AddRequest::new("dev")).unwrap();
    let before = app.snapshot();

    registry.set(&SetRequest::new("dev")).unwrap();
    registry.set(&SetRequest::new("dev").with_new_name("dev")).unwrap();
    assert_eq!(app.snapshot(), before);
}

#[test]
fn test_lock_file_lives_at_app_root() {
    let app = TempApp::new();
    app.registry().add(&AddRequest::new("dev")).unwrap();
    assert!(app.path().join(".envreg.lock").is_file());
    assert!(!keys(&app).iter().any(|k| k.contains("lock")));

    let unlocked = TempApp::new();
    unlocked
        .registry()
        .with_locking(false)
        .add(&AddRequest::new("dev"))
        .unwrap();
    assert!(!unlocked.path().join(".envreg.lock").exists());
}

#[test]
fn test_open_with_kubeconfig() {
    let app = TempApp::new();
    let kubeconfig = app.path().join("kubeconfig");
    fs::write(&kubeconfig, KUBECONFIG).unwrap();

    let config = app
        .config()
        .with_kubeconfig(&kubeconfig)
        .with_default_api_spec("version:v1.9.0");
    let registry = FsRegistry::open(&config);
    registry.add(&AddRequest::new("ci")).unwrap();

    assert_eq!(
        app.read_spec("ci"),
        EnvironmentSpec::new("https://ci:6443", "tests", "version:v1.9.0")
    );

    let err = registry
        .add(&AddRequest::new("other").with_context("missing"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::Context(_)));
}

#[test]
fn test_report_of_listing() {
    let app = TempApp::new();
    let registry = app.registry();
    registry.add(&AddRequest::new("default").with_uri("https://a:6443")).unwrap();
    registry.add(&AddRequest::new("us-west/staging")).unwrap();

    let table = format_report(&registry.list().unwrap());
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("NAME"));
    assert!(lines[3].starts_with("us-west/staging"));
    assert!(lines[3].ends_with("staging"));
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![Just("a"), Just("b"), Just("c")], 1..4)
        .prop_map(|segments| segments.join("/"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_add_then_remove_everything_empties_tree(
        names in prop::collection::vec(name_strategy(), 1..8)
    ) {
        let app = TempApp::new();
        let registry = app.registry();

        let mut added = BTreeSet::new();
        for raw in &names {
            match registry.add(&AddRequest::new(raw.as_str()).with_uri("https://x")) {
                Ok(()) => {
                    added.insert(raw.clone());
                }
                Err(e) => prop_assert!(e.is_duplicate(), "{}", e),
            }
        }

        let listed: BTreeSet<String> = registry
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        prop_assert_eq!(&listed, &added);

        for raw in &added {
            registry.remove(raw).unwrap();
        }
        prop_assert!(app.snapshot().is_empty());
    }
}
