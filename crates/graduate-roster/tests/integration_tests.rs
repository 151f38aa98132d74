//! Integration tests for the graduate roster pipeline.
//!
//! These tests drive the library end-to-end from CSV files on disk.

use graduate_roster::{
    Classification, OutputPaths, Pipeline, PipelineConfig, PipelineResult, ReportGenerator,
    RosterError, classify, deduplicate, load_roster,
};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config() -> PipelineConfig {
    PipelineConfig::builder()
        .graduation_year(2024)
        .build()
        .unwrap()
}

fn run(path: &Path) -> Result<PipelineResult, RosterError> {
    let df = load_roster(path)?;
    Pipeline::builder()
        .config(config())
        .build()
        .unwrap()
        .process(df)
}

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::String)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(String::from))
        .collect()
}

fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn ints(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}

fn removed_by(result: &PipelineResult, rule: &str) -> usize {
    result
        .filter_reports
        .iter()
        .find(|r| r.rule == rule)
        .map(|r| r.removed)
        .unwrap()
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_sample_roster_end_to_end() {
    let result = run(&fixtures_path().join("roster_sample.csv")).unwrap();

    assert_eq!(
        strings(&result.cleaned, "id"),
        vec![
            Some("2101".to_string()),
            Some("2103".to_string()),
            Some("2108".to_string()),
            Some("2110".to_string()),
            Some("2112".to_string()),
        ]
    );
    assert_eq!(
        strings(&result.cleaned, "name")[0].as_deref(),
        Some("Budi Santoso")
    );

    assert_eq!(removed_by(&result, "missing_program"), 1);
    assert_eq!(removed_by(&result, "blocked_program"), 1);
    assert_eq!(removed_by(&result, "zero_gpa"), 2);
    assert_eq!(removed_by(&result, "gpa_out_of_range"), 1);
    assert_eq!(removed_by(&result, "short_cycle_too_long"), 1);
    assert_eq!(removed_by(&result, "extended_cycle_too_short"), 1);
    assert_eq!(removed_by(&result, "duplicate_key"), 1);
    assert_eq!(result.summary.rows_before, 13);
    assert_eq!(result.summary.rows_removed, 8);

    // Out-of-range duration is cleared, not dropped.
    assert_eq!(ints(&result.cleaned, "duration_semesters")[3], None);
    assert_eq!(floats(&result.cleaned, "gpa")[3], Some(3.25));

    assert_eq!(
        strings(&result.cleaned, "honors_predicate"),
        vec![
            Some("Cumlaude".to_string()),
            Some("Sangat Memuaskan".to_string()),
            Some("Cumlaude".to_string()),
            Some("Memuaskan".to_string()),
            Some("Cukup".to_string()),
        ]
    );

    let means: Vec<(String, f64)> = result
        .program_means
        .iter()
        .map(|m| (m.program.clone(), m.mean_gpa))
        .collect();
    assert_eq!(
        means,
        vec![
            ("TPPL".to_string(), 3.53),
            ("D4 TRPL".to_string(), 3.76),
            ("D3 Akuntansi".to_string(), 2.4),
        ]
    );

    // TPPL and D4 TRPL tie on one Cumlaude each; TPPL appears first.
    let leader = result.cumlaude_leader.unwrap();
    assert_eq!((leader.program.as_str(), leader.count), ("TPPL", 1));
}

#[test]
fn test_gpa_zero_blocked_token_and_typo_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_csv(
        dir.path(),
        "scenario.csv",
        "NIM,Nama Mahasiswa,Program Studi,IPK,Lama Studi\n\
         1,ani,TPPL,0,8\n\
         2,budi,TRLP-X,3.5,8\n\
         3,citra,TPPLL,3.5,8\n",
    );

    let result = run(&input).unwrap();

    let stages: Vec<(&str, usize)> = result
        .filter_reports
        .iter()
        .map(|r| (r.rule.as_str(), r.removed))
        .collect();
    assert_eq!(stages[1], ("blocked_program", 1));
    assert_eq!(stages[3], ("zero_gpa", 1));
    assert_eq!(result.filter_reports[2].corrected, 1);

    assert_eq!(strings(&result.cleaned, "id"), vec![Some("3".to_string())]);
    assert_eq!(
        strings(&result.cleaned, "program"),
        vec![Some("TPPL".to_string())]
    );
}

#[test]
fn test_output_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixtures_path().join("roster_sample.csv");

    let mut outputs = Vec::new();
    for run_id in ["first", "second"] {
        let paths = OutputPaths::for_output(&dir.path().join(run_id).join("roster.csv"));
        let generator = ReportGenerator::new(paths.clone(), &config());
        generator.write_artifacts(&run(&input).unwrap(), None).unwrap();
        outputs.push((
            fs::read(&paths.cleaned).unwrap(),
            fs::read(&paths.program_summary).unwrap(),
        ));
    }

    assert_eq!(outputs[0], outputs[1]);
}

// ============================================================================
// Fatal errors
// ============================================================================

#[test]
fn test_missing_input_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(&dir.path().join("absent.csv")).unwrap_err();

    assert!(matches!(err, RosterError::InputNotFound(_)));
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_missing_duration_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_csv(
        dir.path(),
        "no_duration.csv",
        "NIM,Nama Mahasiswa,Program Studi,IPK\n1,ani,TPPL,3.5\n",
    );

    let err = run(&input).unwrap_err();
    assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    assert!(!dir.path().join("no_duration_cleaned.csv").exists());
}

#[test]
fn test_malformed_values_are_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_csv(
        dir.path(),
        "malformed.csv",
        "NIM,Nama Mahasiswa,Program Studi,IPK,Lama Studi\n\
         1,ani,TPPL,tiga,8\n\
         2,budi,TPPL,3.1,delapan\n",
    );

    let result = run(&input).unwrap();
    assert_eq!(removed_by(&result, "zero_gpa"), 1);
    assert_eq!(ints(&result.cleaned, "duration_semesters"), vec![None]);
    assert_eq!(
        strings(&result.cleaned, "honors_predicate"),
        vec![Some("Memuaskan".to_string())]
    );
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_csv(
        dir.path(),
        "roster.json",
        r#"{
            "graduation_year": 2023,
            "blocked_program_tokens": ["AKUNTANSI"],
            "include_program_mean": false
        }"#,
    );
    let config = PipelineConfig::from_json_file(&config_path).unwrap();

    let df = load_roster(&fixtures_path().join("roster_sample.csv")).unwrap();
    let result = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .process(df)
        .unwrap();

    assert_eq!(removed_by(&result, "blocked_program"), 3);
    assert!(
        !result
            .cleaned
            .get_column_names_str()
            .contains(&"program_mean_gpa")
    );
    assert!(
        strings(&result.cleaned, "graduation_year")
            .iter()
            .all(|y| y.as_deref() == Some("2023"))
    );
}

// ============================================================================
// Properties
// ============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    const PROGRAMS: [&str; 8] = [
        "TPPL",
        "TPPLL",
        "TRLP-X",
        "d3 trlp",
        "D3 Akuntansi",
        "D4 TRPL",
        "",
        "  Manajemen  ",
    ];

    type RawRow = (u8, u8, usize, Option<f64>, Option<i64>);

    fn row() -> impl Strategy<Value = RawRow> {
        (
            0u8..6,
            0u8..3,
            0usize..PROGRAMS.len(),
            prop_oneof![
                Just(Some(0.0)),
                Just(None),
                (-1.0f64..5.0).prop_map(Some),
            ],
            prop::option::of(0i64..20),
        )
    }

    fn raw_frame(rows: &[RawRow]) -> DataFrame {
        let ids: Vec<String> = rows.iter().map(|r| format!("{}", r.0)).collect();
        let names: Vec<String> = rows.iter().map(|r| format!("name {}", r.1)).collect();
        let programs: Vec<String> = rows.iter().map(|r| PROGRAMS[r.2].to_string()).collect();
        let gpas: Vec<String> = rows
            .iter()
            .map(|r| r.3.map(|g| format!("{:.2}", g)).unwrap_or_default())
            .collect();
        let durations: Vec<String> = rows
            .iter()
            .map(|r| r.4.map(|d| d.to_string()).unwrap_or_default())
            .collect();

        df!(
            "NIM" => ids,
            "Nama Mahasiswa" => names,
            "Program Studi" => programs,
            "IPK" => gpas,
            "Lama Studi (Semester)" => durations
        )
        .unwrap()
    }

    fn process(df: DataFrame) -> PipelineResult {
        Pipeline::builder()
            .config(config())
            .build()
            .unwrap()
            .process(df)
            .unwrap()
    }

    proptest! {
        /// Property: every cleaned record satisfies the post-cleaning invariants.
        #[test]
        fn cleaned_records_satisfy_invariants(rows in prop::collection::vec(row(), 0..40)) {
            let result = process(raw_frame(&rows));
            let cleaned = &result.cleaned;

            let programs = strings(cleaned, "program");
            let gpas = floats(cleaned, "gpa");
            let durations = ints(cleaned, "duration_semesters");

            for ((program, gpa), duration) in programs.iter().zip(&gpas).zip(&durations) {
                let program = program.as_deref().unwrap_or("");
                prop_assert!(!program.trim().is_empty());
                prop_assert!(!program.to_lowercase().contains("trlp"));
                prop_assert_ne!(program, "TPPLL");

                let gpa = gpa.unwrap_or(f64::NAN);
                prop_assert!(gpa > 0.0 && gpa <= 4.0, "gpa {} out of range", gpa);

                if let Some(d) = duration {
                    prop_assert!((4..=14).contains(d));
                    if program.to_lowercase().contains("d3") {
                        prop_assert!(*d <= 8);
                    }
                    if program.to_lowercase().contains("d4") {
                        prop_assert!(*d >= 8);
                    }
                }
            }

            let removed: usize = result.filter_reports.iter().map(|r| r.removed).sum();
            prop_assert_eq!(rows.len() - removed, cleaned.height());
        }

        /// Property: no two cleaned records share an (id, name) key, and
        /// deduplicating again changes nothing.
        #[test]
        fn cleaned_keys_are_unique(rows in prop::collection::vec(row(), 0..40)) {
            let result = process(raw_frame(&rows));
            let cleaned = &result.cleaned;

            let keys: Vec<(Option<String>, Option<String>)> = strings(cleaned, "id")
                .into_iter()
                .zip(strings(cleaned, "name"))
                .collect();
            let unique: std::collections::HashSet<_> = keys.iter().collect();
            prop_assert_eq!(unique.len(), keys.len());

            let (again, report) = deduplicate(cleaned).unwrap();
            prop_assert_eq!(report.removed, 0);
            prop_assert!(again.equals_missing(cleaned));
        }

        /// Property: grade and honors are a pure function of gpa and duration.
        #[test]
        fn classification_matches_classifier(rows in prop::collection::vec(row(), 0..40)) {
            let result = process(raw_frame(&rows));
            let cleaned = &result.cleaned;

            let gpas = floats(cleaned, "gpa");
            let durations = ints(cleaned, "duration_semesters");
            let grades = strings(cleaned, "grade");
            let honors = strings(cleaned, "honors_predicate");

            for i in 0..cleaned.height() {
                let Classification { grade, honors: predicate } =
                    classify(gpas[i].unwrap(), durations[i]);
                prop_assert_eq!(grades[i].as_deref(), Some(grade.as_str()));
                prop_assert_eq!(honors[i].as_deref(), Some(predicate.as_str()));
            }
        }
    }
}
