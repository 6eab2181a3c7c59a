//! Classification of real archives read from disk.

use crate::common::archives::{html_war, rest_war, servlet_war, ClassBytes, WarContent};
use harbor_core::classifier::{
    ArchiveClassLoader, ClassLoader, Specification, SpecificationClassifier,
};
use harbor_core::constants::{metadata, sniffers};
use harbor_core::deployment::ContentManifest;
use harbor_core::registry::SnifferRegistry;
use std::path::Path;

fn classify_all(path: &Path) -> harbor_core::classifier::ClassificationResult {
    let manifest = ContentManifest::read(path).unwrap();
    let loader = ArchiveClassLoader::open(path).unwrap();
    let registry = SnifferRegistry::with_builtin();
    let sniffers = [sniffers::SERVLET, sniffers::REST, sniffers::HTML]
        .iter()
        .filter_map(|name| registry.create(name))
        .collect();
    SpecificationClassifier::new().classify(&manifest, &loader, sniffers)
}

#[test]
fn test_war_manifest_lists_classes_libraries_and_descriptors() {
    let dir = tempfile::tempdir().unwrap();
    let path = rest_war()
        .file("META-INF/MANIFEST.MF", "Manifest-Version: 1.0")
        .write_war(dir.path(), "orders.war");

    let manifest = ContentManifest::read(&path).unwrap();
    assert_eq!(
        manifest.classes,
        vec!["com.example.Api", "com.example.Order", "com.example.Orders"]
    );
    assert_eq!(manifest.libraries, vec!["WEB-INF/lib/jackson.jar"]);
    assert!(manifest.descriptor("META-INF/MANIFEST.MF").is_some());
}

#[test]
fn test_archive_and_expanded_forms_classify_the_same() {
    let dir = tempfile::tempdir().unwrap();
    let content = servlet_war();
    let packed = content.write_war(dir.path(), "hello.war");
    let expanded = content.write_expanded(dir.path(), "hello");

    let from_archive = classify_all(&packed);
    let from_directory = classify_all(&expanded);
    assert_eq!(from_archive, from_directory);
    assert_eq!(from_archive.triggered_names(), vec![sniffers::SERVLET]);
    assert_eq!(from_archive.metadata[metadata::SERVLET_VERSION], "6.0");
}

#[test]
fn test_class_loader_reads_annotations_from_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = rest_war().write_war(dir.path(), "orders.war");
    let loader = ArchiveClassLoader::open(&path).unwrap();

    let api = loader.load_class("com.example.Api").unwrap();
    assert!(api.extends("Application"));
    assert_eq!(
        api.annotation("ApplicationPath").and_then(|a| a.value()),
        Some("/api")
    );
    assert!(loader.load_class("com.example.Missing").is_err());
}

#[test]
fn test_mixed_archive_detects_every_specification() {
    let dir = tempfile::tempdir().unwrap();
    let path = WarContent::new()
        .file("index.html", "<h1/>")
        .class(ClassBytes::new("com.example.Api").annotated("jakarta.ws.rs.ApplicationPath", Some("rs")))
        .class(ClassBytes::new("com.example.Filter").annotated("jakarta.servlet.annotation.WebFilter", None))
        .write_war(dir.path(), "mixed.war");

    let result = classify_all(&path);
    assert_eq!(
        result.specifications.iter().cloned().collect::<Vec<_>>(),
        vec![Specification::Servlet, Specification::Rest, Specification::Html]
    );
    assert_eq!(result.metadata[metadata::SERVLET_COMPONENTS], "com.example.Filter");
    assert_eq!(result.metadata[metadata::REST_APPLICATION_PATH], "rs");
}

#[test]
fn test_unreadable_class_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = rest_war()
        .file("WEB-INF/classes/com/example/Broken.class", "not a class file")
        .write_war(dir.path(), "orders.war");

    let result = classify_all(&path);
    assert_eq!(result.skipped_classes, vec!["com.example.Broken".to_string()]);
    assert!(result.specifications.contains(&Specification::Rest));
}

#[test]
fn test_runaway_annotation_nesting_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = rest_war()
        .class(
            ClassBytes::new("com.example.Nested")
                .annotated("jakarta.ws.rs.Path", Some("/nested"))
                .value_nesting(500_000),
        )
        .write_war(dir.path(), "orders.war");

    let result = classify_all(&path);
    assert_eq!(result.skipped_classes, vec!["com.example.Nested".to_string()]);
    assert!(result.specifications.contains(&Specification::Rest));
}

#[test]
fn test_static_site_only_triggers_html() {
    let dir = tempfile::tempdir().unwrap();
    let path = html_war().write_war(dir.path(), "site.war");
    let result = classify_all(&path);
    assert_eq!(result.triggered_names(), vec![sniffers::HTML]);
    assert_eq!(result.metadata[metadata::HTML_WELCOME_FILE], "index.html");
}
