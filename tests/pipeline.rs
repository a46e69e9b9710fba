//! End-to-end tests: CSV files on disk through to the emitted JSON.
//!
//! Fixtures are written into a fresh temp directory per test, so these run
//! offline and in parallel.
//!
//! Run with:
//!   cargo test --test pipeline -- --nocapture

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use verse2json::{
    convert, convert_files, convert_to_file, read_table, ConversionConfig,
    ConversionProgressCallback, Diagnostic, ParseMode, Table, Verse2JsonError,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

const PRIMARY_CSV: &str = "\
Verse Group,translation,English Commentary,themes,wisdom_points,real_life_reflections,revelation_context,outline_of_commentary,contextual_questions
2.1-10,\"1 Alif Lam Mim 2 This is the Book, no doubt in it\",Guidance for the &quot;mindful&quot; ones.,\"['Guidance', 'Certainty']\",\"[\"\"Reflect daily\"\"]\",,NaN,\"['Intro', 'Body']\",\"['Who are the mindful?']\"
3.1-5,\"1 Alif Lam Mim
2 Allah, there is no deity except Him\",Second commentary,[],[],[],[],[],[]
";

const SECONDARY_CSV: &str = "\
Commentary Group,SectionNumber,ThemeText,ThemeTitle,ThemeSummary,ContextualQuestion,Keywords,Outline,Embedding
2.1-10,1,Opening letters,Letters,Short,\"['What do the letters mean?']\",letters,intro,\"[0.1, 0.2, 0.3]\"
3.1-5,1,Oneness,Tawhid,,[],oneness,,\"[0.5, 0.5]\"
2.1-10,2,The Book,Book,Long,[],book,body,\"[0.4, 0.5, 0.6, 0.7]\"
";

fn write_fixtures(dir: &Path) -> (PathBuf, PathBuf) {
    let primary = dir.join("verses.csv");
    let secondary = dir.join("chunks.csv");
    std::fs::write(&primary, PRIMARY_CSV).unwrap();
    std::fs::write(&secondary, SECONDARY_CSV).unwrap();
    (primary, secondary)
}

/// Route library logs through the test harness; `RUST_LOG=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn dim3() -> ConversionConfig {
    ConversionConfig::builder().embedding_dim(3).build().unwrap()
}

// ── Conversion ───────────────────────────────────────────────────────────────

#[test]
fn converts_fixture_files() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (p, s) = write_fixtures(dir.path());
    let output = convert_files(&p, &s, &dim3()).unwrap();

    assert_eq!(output.documents.len(), 2);
    let first = &output.documents[0];
    assert_eq!(first.verse_group, "2.1-10");
    assert_eq!(first.chapter, Some(2));
    assert_eq!(first.verses.len(), 2);
    assert_eq!(first.verses[0].verse_id, "2:1");
    assert_eq!(first.verses[0].text, "Alif Lam Mim");
    assert_eq!(first.verses[1].text, "This is the Book, no doubt in it");
    assert_eq!(
        first.english_commentary.as_deref(),
        Some("Guidance for the \"mindful\" ones.")
    );
    assert_eq!(first.macro_analysis.themes, vec!["Guidance", "Certainty"]);
    assert_eq!(first.macro_analysis.wisdom_points, vec!["Reflect daily"]);
    assert!(first.macro_analysis.real_life_reflections.is_empty());
    assert!(first.macro_analysis.revelation_context.is_empty());

    let second = &output.documents[1];
    assert_eq!(second.verses[1].verse_id, "3:2");
    assert_eq!(second.verses[1].text, "Allah, there is no deity except Him");
}

#[test]
fn chunks_join_in_secondary_order() {
    let dir = tempfile::tempdir().unwrap();
    let (p, s) = write_fixtures(dir.path());
    let output = convert_files(&p, &s, &dim3()).unwrap();

    let first = &output.documents[0];
    assert_eq!(first.chunks.len(), 2);
    assert_eq!(first.chunks[0].section_number, json!(1));
    assert_eq!(first.chunks[0].theme_title, json!("Letters"));
    assert_eq!(first.chunks[1].theme_title, json!("Book"));
    assert_eq!(
        first.chunks[0].contextual_question,
        vec!["What do the letters mean?"]
    );

    let second = &output.documents[1];
    assert_eq!(second.chunks.len(), 1);
    assert_eq!(second.chunks[0].theme_summary, Value::Null);
    assert_eq!(output.stats.chunks, 3);
    assert_eq!(output.stats.unmatched_chunks, 0);
}

#[test]
fn every_embedding_has_configured_length() {
    let dir = tempfile::tempdir().unwrap();
    let (p, s) = write_fixtures(dir.path());
    let output = convert_files(&p, &s, &dim3()).unwrap();

    for doc in &output.documents {
        for chunk in &doc.chunks {
            assert_eq!(chunk.embedding.len(), 3);
        }
    }
    // [0.4, 0.5, 0.6, 0.7] truncated, [0.5, 0.5] padded.
    assert_eq!(
        output.documents[0].chunks[1].embedding,
        vec![json!(0.4), json!(0.5), json!(0.6)]
    );
    assert_eq!(
        output.documents[1].chunks[0].embedding,
        vec![json!(0.5), json!(0.5), json!(0.0)]
    );

    let resized = output
        .diagnostics()
        .filter(|d| matches!(d, Diagnostic::EmbeddingResized { .. }))
        .count();
    assert_eq!(resized, 2);
}

#[test]
fn default_dimension_is_768() {
    let dir = tempfile::tempdir().unwrap();
    let (p, s) = write_fixtures(dir.path());
    let output = convert_files(&p, &s, &ConversionConfig::default()).unwrap();
    assert!(output
        .documents
        .iter()
        .flat_map(|d| &d.chunks)
        .all(|c| c.embedding.len() == 768));
}

#[test]
fn output_is_byte_identical_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let (p, s) = write_fixtures(dir.path());
    let a = convert_files(&p, &s, &dim3()).unwrap().to_json(true).unwrap();
    let b = convert_files(&p, &s, &dim3()).unwrap().to_json(true).unwrap();
    assert_eq!(a, b);
}

#[test]
fn writes_pretty_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let (p, s) = write_fixtures(dir.path());
    let out = dir.path().join("out").join("nested_verse_data.json");

    let output = convert_to_file(&p, &s, &out, &dim3()).unwrap();
    assert_eq!(output.stats.documents, 2);

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("[\n  {\n"));
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
    assert_eq!(parsed[0]["verses"][1]["verse_id"], json!("2:2"));
    assert_eq!(parsed[0]["chunks"][0]["embedding"], json!([0.1, 0.2, 0.3]));
    assert!(parsed[0].get("diagnostics").is_none());
}

// ── Degraded input ───────────────────────────────────────────────────────────

#[test]
fn malformed_cells_never_abort() {
    init_tracing();
    let primary = Table::new(["Verse Group", "translation", "themes"])
        .with_row(["Intro", "no markers here", "['unterminated"])
        .with_row(["4.1-2", "1 a 2 b", "plain prose theme"]);
    let secondary = Table::new(["Commentary Group", "Embedding"]).with_row(["4.1-2", "not a list"]);

    let output = convert(Some(&primary), Some(&secondary), &dim3()).unwrap();
    assert_eq!(output.documents.len(), 2);

    let intro = &output.documents[0];
    assert_eq!(intro.chapter, None);
    assert!(intro.verses.is_empty());
    assert_eq!(intro.macro_analysis.themes, vec!["['unterminated"]);
    assert!(intro
        .diagnostics
        .contains(&Diagnostic::ChapterNotFound { verse_group: "Intro".into() }));
    assert!(intro
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::NoVerseMarkers { .. })));

    let fourth = &output.documents[1];
    assert_eq!(fourth.macro_analysis.themes, vec!["plain prose theme"]);
    assert_eq!(fourth.chunks[0].embedding[0], json!("not a list"));
    assert_eq!(fourth.chunks[0].embedding.len(), 3);
}

#[test]
fn blank_keys_join_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("verses.csv");
    let s = dir.path().join("chunks.csv");
    std::fs::write(&p, "Verse Group,translation\n,1 a\n1.1-2,1 b\n").unwrap();
    std::fs::write(&s, "Commentary Group,SectionNumber\n,1\n,2\n1.1-2,3\n").unwrap();

    let output = convert_files(&p, &s, &dim3()).unwrap();
    assert_eq!(output.documents[0].verse_group, "");
    assert!(output.documents[0].chunks.is_empty());
    assert_eq!(output.documents[1].chunks.len(), 1);
    assert_eq!(output.stats.unmatched_chunks, 2);
}

#[test]
fn keys_and_scalars_keep_their_csv_text() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("verses.csv");
    let s = dir.path().join("chunks.csv");
    std::fs::write(&p, "Verse Group,translation\n2.10,1 a\n01,1 b\n").unwrap();
    std::fs::write(
        &s,
        "Commentary Group,SectionNumber,ThemeTitle,Keywords\n2.1,1,1e3,007\n1,2,x,y\n2.10,3,1e3,007\n",
    )
    .unwrap();

    let output = convert_files(&p, &s, &dim3()).unwrap();
    let tenth = &output.documents[0];
    assert_eq!(tenth.verse_group, "2.10");
    assert_eq!(tenth.chunks.len(), 1);
    assert_eq!(tenth.chunks[0].section_number, json!(3));
    assert_eq!(tenth.chunks[0].theme_title, json!("1e3"));
    assert_eq!(tenth.chunks[0].keywords, json!("007"));

    assert_eq!(output.documents[1].verse_group, "01");
    assert!(output.documents[1].chunks.is_empty());
    assert_eq!(output.stats.unmatched_chunks, 2);
}

#[test]
fn strict_mode_rejects_single_quotes() {
    let primary = Table::new(["Verse Group", "themes"]).with_row(["1.1-7", "['a', 'b']"]);
    let strict = ConversionConfig::builder()
        .parse_mode(ParseMode::Strict)
        .build()
        .unwrap();
    let lenient = ConversionConfig::builder()
        .parse_mode(ParseMode::LenientJson)
        .build()
        .unwrap();

    let out = convert(Some(&primary), None, &strict).unwrap();
    assert_eq!(out.documents[0].macro_analysis.themes, vec!["['a', 'b']"]);

    let out = convert(Some(&primary), None, &lenient).unwrap();
    assert_eq!(out.documents[0].macro_analysis.themes, vec!["a", "b"]);
}

#[test]
fn missing_primary_table_is_fatal() {
    let secondary = Table::new(["Commentary Group"]);
    let err = convert(None, Some(&secondary), &ConversionConfig::default()).unwrap_err();
    assert!(matches!(err, Verse2JsonError::MissingPrimaryTable));
}

#[test]
fn missing_key_column_is_fatal() {
    let primary = Table::new(["translation"]).with_row(["1 a"]);
    let err = convert(Some(&primary), None, &ConversionConfig::default()).unwrap_err();
    assert!(matches!(err, Verse2JsonError::MissingColumn { .. }));
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_table(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, Verse2JsonError::FileNotFound { .. }));
}

// ── Progress callback ────────────────────────────────────────────────────────

#[derive(Default)]
struct Counting {
    rows: AtomicUsize,
    diagnostics: AtomicUsize,
    finished: AtomicUsize,
}

impl ConversionProgressCallback for Counting {
    fn on_row_complete(&self, _row: usize, _total: usize, _vg: &str, _chunks: usize) {
        self.rows.fetch_add(1, Ordering::SeqCst);
    }
    fn on_row_diagnostic(&self, _row: usize, _d: &Diagnostic) {
        self.diagnostics.fetch_add(1, Ordering::SeqCst);
    }
    fn on_conversion_complete(&self, _total: usize, _diagnostics: usize) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn callback_sees_every_row_and_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let (p, s) = write_fixtures(dir.path());
    let cb = Arc::new(Counting::default());
    let config = ConversionConfig::builder()
        .embedding_dim(3)
        .progress_callback(cb.clone())
        .build()
        .unwrap();

    let output = convert_files(&p, &s, &config).unwrap();
    assert_eq!(cb.rows.load(Ordering::SeqCst), 2);
    assert_eq!(cb.finished.load(Ordering::SeqCst), 1);
    assert_eq!(
        cb.diagnostics.load(Ordering::SeqCst),
        output.stats.diagnostics
    );
}
