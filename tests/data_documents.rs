//! The shipped data documents load, validate and round-trip

use cms_evaluator::{ArchitectureCatalog, Catalog, Ontology};
use serde_json::Value;
use std::path::PathBuf;

fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

fn read_value(name: &str) -> Value {
    let text = std::fs::read_to_string(data_path(name)).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn ontology_round_trips() {
    let ontology = Ontology::load(&data_path("ontology.json")).unwrap();
    let reserialized: Value = serde_json::from_str(&ontology.to_json().unwrap()).unwrap();
    assert_eq!(reserialized, read_value("ontology.json"));

    // Document order survives
    let keys: Vec<&str> = ontology.capability_keys().collect();
    assert_eq!(keys.first(), Some(&"content_modeling"));
    assert_eq!(keys.len(), 7);
    assert_eq!(ontology.use_cases().len(), 4);
    assert_eq!(ontology.business_outcomes().len(), 5);
}

#[test]
fn ontology_hash_is_stable() {
    let a = Ontology::load(&data_path("ontology.json")).unwrap();
    let b = Ontology::from_json(&a.to_json().unwrap(), "reserialized").unwrap();
    assert_eq!(a.content_hash(), b.content_hash());
    assert_eq!(a.content_hash().len(), 64);
}

#[test]
fn catalog_round_trips() {
    let ontology = Ontology::load(&data_path("ontology.json")).unwrap();
    let catalog = Catalog::load(&data_path("platforms.json"), &ontology).unwrap();
    let reserialized: Value = serde_json::from_str(&catalog.to_json().unwrap()).unwrap();
    assert_eq!(reserialized, read_value("platforms.json"));

    let names: Vec<&str> = catalog.names().collect();
    assert_eq!(names[0], "HubSpot");
    assert!(names.contains(&"Composable (Acquia/Agility)"));
    assert_eq!(catalog.find("contentful").unwrap().name, "Contentful");
}

#[test]
fn architecture_options_load() {
    let options = ArchitectureCatalog::load(&data_path("architectures.json")).unwrap();
    let labels: Vec<&str> = options.options().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, ["Option A", "Option B", "Option C"]);
    assert!(options.options().all(|o| (0.0..=1.0).contains(&o.fit_score)));

    let picked = options.select(&["Option C".to_string()]).unwrap();
    assert_eq!(picked[0].label, "Option C");
    assert!(options.select(&["Option Z".to_string()]).is_err());
}
