//! End-to-end extraction over an in-memory report.

mod common;

use common::{bold, grid, page, sample_report, text, MemorySource};
use icsara::config::ExtractionConfig;
use icsara::error::Error;
use icsara::geometry::Rect;
use icsara::output::{read_records, QuestionRecord, FULL_TEXT_TXT, HIERARCHY_JSON, QUESTIONS_JSON, QUESTIONS_TXT};
use icsara::regions::RegionKind;
use icsara::{extract, extract_from_source};
use serde_json::Value;
use std::path::Path;

fn run(source: &MemorySource, out: &Path, exports: bool) -> icsara::ExtractionSummary {
    extract_from_source(source, out, exports, &ExtractionConfig::default()).unwrap()
}

fn record(records: &[QuestionRecord], numero: u32) -> &QuestionRecord {
    records.iter().find(|r| r.numero == numero).unwrap()
}

#[test]
fn test_summary_counts() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run(&sample_report(), dir.path(), false);

    assert_eq!(summary.pages, 3);
    assert_eq!(summary.chapters, 2);
    assert_eq!(summary.hinges, 2);
    assert_eq!(summary.questions, 5);
    assert_eq!(summary.tables, 1);
    assert_eq!(summary.figures, 1);
    assert_eq!(summary.total_detections, 2);
    assert_eq!(summary.output_dir, dir.path());

    for name in [QUESTIONS_JSON, QUESTIONS_TXT, FULL_TEXT_TXT, HIERARCHY_JSON] {
        assert!(dir.path().join(name).exists(), "missing {}", name);
    }
    assert!(!dir.path().join("exports").exists());
}

#[test]
fn test_records_carry_context_and_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    run(&sample_report(), dir.path(), false);
    let records = read_records(&dir.path().join(QUESTIONS_JSON)).unwrap();

    let numbers: Vec<u32> = records.iter().map(|r| r.numero).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);

    let q1 = record(&records, 1);
    assert_eq!(q1.capitulo, "I. Medio Ambiente");
    assert_eq!(q1.bisagra, None);
    assert_eq!(q1.texto, "¿Cuál es el alcance? Describa el área de influencia.");

    let q2 = record(&records, 2);
    assert_eq!(q2.bisagra.as_deref(), Some("Calidad del aire"));
    assert_eq!(q2.texto, "Indique las emisiones. de material particulado.");

    let q3 = record(&records, 3);
    assert_eq!(q3.bisagra.as_deref(), Some("Calidad del aire"));
    assert_eq!(q3.texto, "Presente el modelo de dispersión.");
    assert_eq!(q3.tablas_figuras.len(), 1);
    assert_eq!(q3.tablas_figuras[0].tipo, RegionKind::Table);
    assert_eq!(q3.tablas_figuras[0].png, "p003_part001_table.png");

    // Hinge at the bottom of page 2, question at the top of page 3
    let q4 = record(&records, 4);
    assert_eq!(q4.capitulo, "I. Medio Ambiente");
    assert_eq!(q4.bisagra.as_deref(), Some("Ruido"));
    assert!(q4.texto.starts_with("Entregue las mediciones de ruido."));

    let q5 = record(&records, 5);
    assert_eq!(q5.capitulo, "II. Medio Humano");
    assert_eq!(q5.bisagra, None);
    assert_eq!(q5.tablas_figuras[0].png, "p005_part001_figure.png");
}

#[test]
fn test_hierarchy_file() {
    let dir = tempfile::tempdir().unwrap();
    run(&sample_report(), dir.path(), false);
    let raw = std::fs::read_to_string(dir.path().join(HIERARCHY_JSON)).unwrap();
    let hierarchy: Value = serde_json::from_str(&raw).unwrap();

    let chapters = hierarchy["chapters"].as_array().unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0]["text"], "I. Medio Ambiente");
    assert_eq!(chapters[0]["questions"], serde_json::json!([1, 2, 3, 4]));
    assert_eq!(chapters[0]["questions_without_hinge"], serde_json::json!([1]));
    assert_eq!(chapters[0]["hinges"][0]["text"], "Calidad del aire");
    assert_eq!(chapters[0]["hinges"][0]["questions"], serde_json::json!([2, 3]));
    assert_eq!(chapters[0]["hinges"][1]["text"], "Ruido");
    assert_eq!(chapters[0]["hinges"][1]["page"], 2);
    assert_eq!(chapters[0]["hinges"][1]["questions"], serde_json::json!([4]));
    assert_eq!(chapters[1]["questions_without_hinge"], serde_json::json!([5]));
}

#[test]
fn test_questions_txt_format() {
    let dir = tempfile::tempdir().unwrap();
    run(&sample_report(), dir.path(), false);
    let txt = std::fs::read_to_string(dir.path().join(QUESTIONS_TXT)).unwrap();

    assert!(txt.starts_with("------------\nCAPITULO: I. Medio Ambiente\nNUMERO: 1\n"));
    assert!(txt.contains("BISAGRA: Ruido\nNUMERO: 4\n"));
    assert!(txt.contains("  [TABLE] parte 1: p003_part001_table.png\n"));
    assert!(txt.ends_with("------------\n"));
}

#[test]
fn test_exports_written() {
    let dir = tempfile::tempdir().unwrap();
    run(&sample_report(), dir.path(), true);
    let exports = dir.path().join("exports");
    assert!(exports.join("p003_part001_table.png").exists());
    assert!(exports.join("p005_part001_figure.png").exists());
}

#[test]
fn test_scenario_a_chapter_then_question() {
    let source = MemorySource {
        pages: vec![page(1)
            .with_span(bold("I. Medio Ambiente", 60.0))
            .with_span(text("1. ¿Cuál es el alcance?", 90.0))],
    };
    let dir = tempfile::tempdir().unwrap();
    let summary = run(&source, dir.path(), false);
    assert_eq!(summary.chapters, 1);
    assert_eq!(summary.hinges, 0);

    let raw = std::fs::read_to_string(dir.path().join(HIERARCHY_JSON)).unwrap();
    let hierarchy: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(hierarchy["chapters"][0]["text"], "I. Medio Ambiente");
    assert_eq!(hierarchy["chapters"][0]["hinges"], serde_json::json!([]));
    assert_eq!(hierarchy["chapters"][0]["questions_without_hinge"], serde_json::json!([1]));

    let records = read_records(&dir.path().join(QUESTIONS_JSON)).unwrap();
    assert_eq!(records[0].capitulo, "I. Medio Ambiente");
    assert_eq!(records[0].bisagra, None);

    let json = std::fs::read_to_string(dir.path().join(QUESTIONS_JSON)).unwrap();
    assert!(json.contains("\"bisagra\": null"));
}

#[test]
fn test_scenario_b_table_text_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run(&sample_report(), dir.path(), false);
    assert_eq!(summary.tables, 1);

    let full_text = std::fs::read_to_string(dir.path().join(FULL_TEXT_TXT)).unwrap();
    assert!(!full_text.contains("Celda de tabla"));
    assert!(full_text.contains("3. Presente el modelo de dispersión."));
}

#[test]
fn test_sparse_grid_is_not_a_table() {
    let source = MemorySource {
        pages: vec![grid(page(1), Rect::new(50.0, 300.0, 450.0, 370.0), 5, 5)
            .with_span(text("1. Única pregunta.", 60.0))],
    };
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run(&source, dir.path(), false).tables, 0);
}

#[test]
fn test_running_headers_suppressed() {
    let header = |n| {
        page(n)
            .with_span(text("ICSARA N°1 Proyecto Parque Solar", 20.0))
            .with_span(text(&format!("{}. Pregunta de la página {}.", n, n), 100.0))
            .with_span(text(&n.to_string(), 760.0))
    };
    let source = MemorySource {
        pages: vec![header(1), header(2), header(3)],
    };
    let dir = tempfile::tempdir().unwrap();
    run(&source, dir.path(), false);

    let full_text = std::fs::read_to_string(dir.path().join(FULL_TEXT_TXT)).unwrap();
    assert!(!full_text.contains("Parque Solar"));
    assert_eq!(
        full_text,
        "1. Pregunta de la página 1.\n2. Pregunta de la página 2.\n3. Pregunta de la página 3."
    );
}

#[test]
fn test_extraction_is_deterministic() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    run(&sample_report(), first.path(), false);
    run(&sample_report(), second.path(), false);

    for name in [QUESTIONS_JSON, QUESTIONS_TXT, FULL_TEXT_TXT, HIERARCHY_JSON] {
        let a = std::fs::read(first.path().join(name)).unwrap();
        let b = std::fs::read(second.path().join(name)).unwrap();
        assert_eq!(a, b, "{} differs between runs", name);
    }
}

#[test]
fn test_rerun_overwrites_outputs() {
    let dir = tempfile::tempdir().unwrap();
    run(&sample_report(), dir.path(), true);
    let summary = run(&sample_report(), dir.path(), true);
    assert_eq!(summary.questions, 5);
}

#[test]
fn test_missing_input_leaves_output_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let result = extract(Path::new("/nonexistent/icsara.pdf"), &out, true);
    assert!(matches!(result, Err(Error::InputNotFound(_))));
    assert!(!out.exists());
}

#[test]
fn test_empty_document() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run(&MemorySource { pages: vec![] }, dir.path(), true);
    assert_eq!(summary.pages, 0);
    assert_eq!(summary.questions, 0);
    let records = read_records(&dir.path().join(QUESTIONS_JSON)).unwrap();
    assert!(records.is_empty());
}
