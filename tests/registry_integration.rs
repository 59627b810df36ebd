//! Integration tests for the component registry scan

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use component_directive::{
    CompilerConfig, ComponentRegistry, DuplicatePolicy, Extension, FilesystemLoader,
    RegistryError,
};

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

#[test]
fn test_last_root_wins_on_collision() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    touch(&first.path().join("card.twig"));
    touch(&first.path().join("button.twig"));
    touch(&second.path().join("overrides/card.twig"));

    let loader = FilesystemLoader::new()
        .with_path("FrctlTwig", first.path())
        .with_path("FrctlTwig", second.path());
    let registry = ComponentRegistry::new(loader, &CompilerConfig::default());

    let card = registry.resolve("card").unwrap();
    assert_eq!(card.template_id, "@FrctlTwig/overrides/card.twig");
    assert_eq!(
        card.config_id,
        second.path().join("overrides/card.config.yml")
    );
    assert_eq!(registry.names().unwrap(), vec!["button", "card"]);
}

#[test]
fn test_collision_within_root_follows_name_order() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("a/card.twig"));
    touch(&dir.path().join("b/card.twig"));

    let registry = ComponentRegistry::new(vec![dir.path().to_path_buf()], &CompilerConfig::default());
    assert_eq!(
        registry.resolve("card").unwrap().template_id,
        "@FrctlTwig/b/card.twig"
    );
}

#[test]
fn test_reject_policy_across_roots() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    touch(&first.path().join("card.twig"));
    touch(&second.path().join("card.twig"));

    let config = CompilerConfig::new().with_duplicates(DuplicatePolicy::Reject);
    let registry = ComponentRegistry::new(
        vec![first.path().to_path_buf(), second.path().to_path_buf()],
        &config,
    );
    assert!(matches!(
        registry.resolve("card"),
        Err(RegistryError::Duplicate { name, .. }) if name == "card"
    ));
}

#[test]
fn test_two_resolves_one_walk() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("card.twig"));
    touch(&dir.path().join("hero.twig"));

    let registry = ComponentRegistry::new(vec![dir.path().to_path_buf()], &CompilerConfig::default());
    assert_eq!(registry.build_count(), 0);

    registry.resolve("card").unwrap();
    registry.resolve("hero").unwrap();
    assert!(registry.resolve("nope").is_err());
    assert_eq!(registry.build_count(), 1);
}

#[test]
fn test_templates_added_after_build_are_not_seen() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("card.twig"));

    let registry = ComponentRegistry::new(vec![dir.path().to_path_buf()], &CompilerConfig::default());
    registry.resolve("card").unwrap();

    touch(&dir.path().join("late.twig"));
    assert!(matches!(
        registry.resolve("late"),
        Err(RegistryError::UnknownComponent { .. })
    ));
}

#[test]
fn test_failed_build_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("components");

    let registry = ComponentRegistry::new(vec![root.clone()], &CompilerConfig::default());
    assert!(matches!(registry.resolve("card"), Err(RegistryError::Walk { .. })));
    assert!(!registry.is_built());

    touch(&root.join("card.twig"));
    assert!(registry.resolve("card").is_ok());
    assert_eq!(registry.build_count(), 1);
}

#[test]
fn test_concurrent_first_use_walks_once() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..20 {
        touch(&dir.path().join(format!("c{}.twig", i)));
    }

    let registry = Arc::new(ComponentRegistry::new(
        vec![dir.path().to_path_buf()],
        &CompilerConfig::default(),
    ));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.resolve(&format!("c{}", i)).is_ok())
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(registry.build_count(), 1);
}

#[test]
fn test_extension_scans_once_across_directives() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("card.twig"));

    let extension = Extension::from_config(&CompilerConfig::new().with_root(dir.path()));
    let source = r#"{% render "@card" only %}{% render "@card--wide" only %}"#;
    assert_eq!(extension.compile_template(source).unwrap().len(), 2);
    assert_eq!(extension.registry().build_count(), 1);
}

#[test]
fn test_config_file_roots() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("templates/card.twig"));
    let config_path: PathBuf = dir.path().join("compiler.toml");
    fs::write(&config_path, "[registry]\nroots = [\"templates\"]\n").unwrap();

    let config = CompilerConfig::from_file(&config_path).unwrap();
    let extension = Extension::from_config(&config);
    assert_eq!(extension.registry().names().unwrap(), vec!["card"]);
}
