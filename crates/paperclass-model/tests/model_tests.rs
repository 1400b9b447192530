//! Real model tests
//!
//! These download `microsoft/deberta-v3-small` and need a trained adapter in
//! `final_deberta_model` (or `PAPERCLASS_ADAPTER_PATH`). Set
//! `PAPERCLASS_RUN_MODEL_TESTS=1` to run them.

use paperclass_core::LabelMap;
use paperclass_model::prelude::*;
use std::sync::OnceLock;

fn enabled() -> bool {
    std::env::var("PAPERCLASS_RUN_MODEL_TESTS").is_ok_and(|v| v == "1")
}

fn spec() -> ModelSpec {
    let spec = ModelSpec::default().with_device(DeviceSpec::Cpu);
    match std::env::var("PAPERCLASS_ADAPTER_PATH") {
        Ok(path) => spec.with_adapter(path),
        Err(_) => spec,
    }
}

fn classifier() -> &'static LoadedClassifier {
    static CLASSIFIER: OnceLock<LoadedClassifier> = OnceLock::new();
    CLASSIFIER.get_or_init(|| LoadedClassifier::load(&spec()).expect("model loads"))
}

const ABSTRACT: &str = "We prove that every finitely generated module over a \
    Noetherian local ring admits a minimal free resolution and study the \
    Betti numbers of its syzygies.";

#[test]
fn test_prediction_is_a_known_label() {
    if !enabled() {
        return;
    }
    let prediction = classifier().classify(ABSTRACT).unwrap();

    assert!(LabelMap::arxiv().contains(&prediction.label));
    assert!((0.0..=1.0).contains(&prediction.confidence));
    assert_eq!(prediction.probabilities.len(), 11);
    let total: f32 = prediction.probabilities.iter().sum();
    assert!((total - 1.0).abs() < 1e-4);
}

#[test]
fn test_prediction_is_deterministic() {
    if !enabled() {
        return;
    }
    let first = classifier().classify(ABSTRACT).unwrap();
    let second = classifier().classify(ABSTRACT).unwrap();
    assert_eq!(first.label, second.label);
    assert!((first.confidence - second.confidence).abs() < 1e-6);
}

#[test]
fn test_long_input_is_truncated() {
    if !enabled() {
        return;
    }
    let long = ABSTRACT.repeat(200);
    let prediction = classifier().classify(&long).unwrap();
    assert!(prediction.token_count <= 512);
}

#[test]
fn test_empty_input_still_classifies() {
    if !enabled() {
        return;
    }
    let prediction = classifier().classify("").unwrap();
    assert!(LabelMap::arxiv().contains(&prediction.label));
}

#[test]
fn test_missing_adapter_is_load_error() {
    if !enabled() {
        return;
    }
    let spec = spec().with_adapter("/nonexistent/adapter");
    let result = LoadedClassifier::load(&spec);
    assert!(result.is_err());
}
