//! Topic classification of extracted questions.

mod common;

use common::sample_report;
use icsara::classify::{Classifier, Taxonomy, CLASSIFIED_DETAIL_JSON, CLASSIFIED_JSON};
use icsara::config::{ClassifierConfig, ExtractionConfig};
use icsara::error::Error;
use icsara::output::QUESTIONS_JSON;
use icsara::{classify, extract_from_source};
use serde_json::Value;
use std::path::Path;

fn load(path: &Path) -> Vec<Value> {
    let raw = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn by_number(records: &[Value], numero: u64) -> &Value {
    records.iter().find(|r| r["numero"] == numero).unwrap()
}

#[test]
fn test_classify_extracted_report() {
    let dir = tempfile::tempdir().unwrap();
    extract_from_source(&sample_report(), dir.path(), false, &ExtractionConfig::default()).unwrap();

    let summary = classify(&dir.path().join(QUESTIONS_JSON), dir.path()).unwrap();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.classified + summary.unclassified, 5);
    assert!(summary.classified >= 3);
    assert_eq!(summary.output_json, dir.path().join(CLASSIFIED_JSON));

    let records = load(&summary.output_json);
    assert_eq!(by_number(&records, 2)["tema_principal_id"], "CALIDAD_AIRE");
    assert_eq!(by_number(&records, 4)["tema_principal_id"], "RUIDO_VIBRACIONES");
    assert_eq!(by_number(&records, 5)["tema_principal_id"], "MEDIO_HUMANO");

    let q4 = by_number(&records, 4);
    assert_eq!(q4["bisagra"], "Ruido");
    assert!(q4["keywords_match"].as_array().unwrap().iter().any(|k| k == "ruido"));
    assert!(q4["temas_secundarios"].as_array().unwrap().len() <= 3);
    assert_eq!(by_number(&records, 3)["tablas_figuras"][0]["tipo"], "table");

    let detail = load(&summary.output_detail_json);
    let q4 = by_number(&detail, 4);
    let ruido = &q4["temas"][0];
    assert_eq!(ruido["id"], "RUIDO_VIBRACIONES");
    assert!(ruido["detalle"]["bisagra"].as_array().unwrap().iter().any(|k| k == "ruido"));
    assert!(ruido["detalle"]["texto"].as_array().unwrap().iter().any(|k| k == "ruido"));
}

#[test]
fn test_custom_taxonomy_file() {
    let dir = tempfile::tempdir().unwrap();
    let questions = dir.path().join(QUESTIONS_JSON);
    std::fs::write(
        &questions,
        r#"[
            {"numero": 1, "capitulo": "I. Descripción", "bisagra": null, "texto": "Detalle el camino de acceso.", "tablas_figuras": []},
            {"numero": 2, "capitulo": "", "bisagra": null, "texto": "Sin relación.", "tablas_figuras": []}
        ]"#,
    )
    .unwrap();
    let taxonomy_path = dir.path().join("taxonomy.json");
    std::fs::write(
        &taxonomy_path,
        r#"{"VIALIDAD": {"nombre": "Vialidad", "keywords": ["camino", "acceso"]}}"#,
    )
    .unwrap();

    let taxonomy = Taxonomy::from_json_file(&taxonomy_path).unwrap();
    let summary = Classifier::new(taxonomy, ClassifierConfig::default())
        .run(&questions, dir.path())
        .unwrap();
    assert_eq!(summary.classified, 1);
    assert_eq!(summary.unclassified, 1);

    let records = load(&dir.path().join(CLASSIFIED_JSON));
    assert_eq!(records[0]["tema_principal"], "Vialidad");
    assert_eq!(records[0]["score"], 2.0);
    assert_eq!(records[1]["tema_principal"], "Sin clasificar");
    assert_eq!(records[1]["tema_principal_id"], "SIN_CLASIFICAR");
    assert_eq!(records[1]["temas_principales"], serde_json::json!([]));
    assert!(dir.path().join(CLASSIFIED_DETAIL_JSON).exists());
}

#[test]
fn test_missing_questions_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let result = classify(&dir.path().join("missing.json"), &out);
    assert!(matches!(result, Err(Error::InputNotFound(_))));
    assert!(!out.exists());
}
