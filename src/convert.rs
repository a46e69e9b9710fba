//! Document assembly and file-level entry points.
//!
//! [`assemble_documents`] is the core: it walks the primary rows in order and
//! builds one [`Document`] per row from that row alone plus the chunk rows
//! sharing its group key. Nothing here fails on bad cell contents. Every
//! degradation becomes a [`Diagnostic`] on the affected document instead.
//!
//! The `convert*` functions wrap the core with table decoding, statistics
//! and file I/O; only those can return a [`Verse2JsonError`].

use crate::config::ConversionConfig;
use crate::error::{Diagnostic, Verse2JsonError};
use crate::output::{ChunkRecord, ConversionOutput, ConversionStats, Document, MacroAnalysis};
use crate::pipeline::{chapter, embedding, input, normalize, segment};
use crate::table::{columns, Cell, PrimaryRow, SecondaryRow, Table};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert two in-memory tables into documents.
///
/// # Errors
/// - [`Verse2JsonError::MissingPrimaryTable`] when `primary` is `None`
/// - [`Verse2JsonError::MissingColumn`] when a table lacks its group-key column
///
/// A missing `secondary` table is not an error: documents get no chunks.
pub fn convert(
    primary: Option<&Table>,
    secondary: Option<&Table>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Verse2JsonError> {
    let primary = primary.ok_or(Verse2JsonError::MissingPrimaryTable)?;
    let primary_rows = PrimaryRow::from_table(primary)?;
    let secondary_rows = match secondary {
        Some(t) => SecondaryRow::from_table(t)?,
        None => Vec::new(),
    };
    Ok(convert_rows(&primary_rows, &secondary_rows, config))
}

/// Convert already-typed rows, collecting run statistics.
pub fn convert_rows(
    primary: &[PrimaryRow],
    secondary: &[SecondaryRow],
    config: &ConversionConfig,
) -> ConversionOutput {
    let start = Instant::now();
    info!(
        "Starting conversion: {} verse groups, {} chunk rows",
        primary.len(),
        secondary.len()
    );

    let documents = assemble_documents(primary, secondary, config);

    let known: HashSet<&str> = primary
        .iter()
        .filter_map(|r| join_key(&r.verse_group))
        .collect();
    let unmatched = secondary
        .iter()
        .filter(|c| join_key(&c.commentary_group).map_or(true, |k| !known.contains(k)))
        .count();
    if unmatched > 0 {
        warn!("{} chunk rows matched no verse group", unmatched);
    }

    let stats = ConversionStats {
        primary_rows: primary.len(),
        secondary_rows: secondary.len(),
        documents: documents.len(),
        verses: documents.iter().map(|d| d.verses.len()).sum(),
        chunks: documents.iter().map(|d| d.chunks.len()).sum(),
        unmatched_chunks: unmatched,
        diagnostics: documents.iter().map(|d| d.diagnostics.len()).sum(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} documents, {} verses, {} chunks, {} diagnostics, {}ms",
        stats.documents, stats.verses, stats.chunks, stats.diagnostics, stats.duration_ms
    );

    ConversionOutput { documents, stats }
}

/// Build one document per primary row, in primary order.
///
/// Chunk rows join by exact string equality of `Commentary Group` and
/// `Verse Group`, keeping secondary-table order within each document.
/// A missing (empty) key on either side joins nothing.
pub fn assemble_documents(
    primary: &[PrimaryRow],
    secondary: &[SecondaryRow],
    config: &ConversionConfig,
) -> Vec<Document> {
    let mut by_group: HashMap<&str, Vec<&SecondaryRow>> = HashMap::new();
    for row in secondary {
        if let Some(key) = join_key(&row.commentary_group) {
            by_group.entry(key).or_default().push(row);
        }
    }

    let total = primary.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    let mut documents = Vec::with_capacity(total);
    for (idx, row) in primary.iter().enumerate() {
        let row_num = idx + 1;
        let chunks = join_key(&row.verse_group)
            .and_then(|k| by_group.get(k))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let doc = assemble_document(row, chunks, config);

        for d in &doc.diagnostics {
            warn!("row {}: {}", row_num, d);
        }
        if let Some(ref cb) = config.progress_callback {
            for d in &doc.diagnostics {
                cb.on_row_diagnostic(row_num, d);
            }
            cb.on_row_complete(row_num, total, &doc.verse_group, doc.chunks.len());
        }
        documents.push(doc);
    }

    if let Some(ref cb) = config.progress_callback {
        let diagnostics = documents.iter().map(|d| d.diagnostics.len()).sum();
        cb.on_conversion_complete(total, diagnostics);
    }
    documents
}

fn join_key(key: &str) -> Option<&str> {
    (!key.is_empty()).then_some(key)
}

/// Build the document for one primary row and its already-selected chunks.
pub fn assemble_document(
    row: &PrimaryRow,
    chunks: &[&SecondaryRow],
    config: &ConversionConfig,
) -> Document {
    let vg = row.verse_group.as_str();
    let mut diagnostics = Vec::new();

    let chapter = chapter::extract_chapter(vg);
    if chapter.is_none() {
        diagnostics.push(Diagnostic::ChapterNotFound {
            verse_group: vg.to_string(),
        });
    }

    let translation = row.translation.as_text().unwrap_or_default();
    let segmented = segment::split_translation(&translation, chapter, vg, config);
    diagnostics.extend(segmented.diagnostics);

    let english_commentary = normalize::clean_commentary(&row.english_commentary, config.decode_html);
    let verse_group_summary = if config.include_summary {
        english_commentary
            .as_deref()
            .and_then(|c| normalize::summarize(c, config.summary_words))
    } else {
        None
    };

    let mut list = |cell: &Cell, field: &str| {
        let (values, malformed) = normalize::normalize_string_list(cell, config.parse_mode);
        if malformed {
            diagnostics.push(malformed_cell(vg, field, cell));
        }
        values
    };
    let macro_analysis = MacroAnalysis {
        themes: list(&row.themes, columns::THEMES),
        wisdom_points: list(&row.wisdom_points, columns::WISDOM_POINTS),
        real_life_reflections: list(&row.real_life_reflections, columns::REAL_LIFE_REFLECTIONS),
        revelation_context: list(&row.revelation_context, columns::REVELATION_CONTEXT),
        outline_of_commentary: list(&row.outline_of_commentary, columns::OUTLINE_OF_COMMENTARY),
        contextual_questions: list(&row.contextual_questions, columns::CONTEXTUAL_QUESTIONS),
    };

    let chunks = chunks
        .iter()
        .enumerate()
        .map(|(i, c)| chunk_record(c, i, vg, config, &mut diagnostics))
        .collect();

    debug!(
        "Assembled {:?}: {} verses, {} diagnostics",
        vg,
        segmented.verses.len(),
        diagnostics.len()
    );

    Document {
        verse_group: vg.to_string(),
        verse_group_summary,
        chapter,
        verses: segmented.verses,
        english_commentary,
        macro_analysis,
        chunks,
        diagnostics,
    }
}

fn chunk_record(
    row: &SecondaryRow,
    index: usize,
    vg: &str,
    config: &ConversionConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> ChunkRecord {
    let (contextual_question, malformed) =
        normalize::normalize_string_list(&row.contextual_question, config.parse_mode);
    if malformed {
        diagnostics.push(malformed_cell(vg, columns::CONTEXTUAL_QUESTION, &row.contextual_question));
    }

    let raw = normalize::normalize_list(&row.embedding, config.parse_mode);
    if raw.malformed {
        diagnostics.push(malformed_cell(vg, columns::EMBEDDING, &row.embedding));
    }
    let from = raw.values.len();
    let embedding = embedding::fix_embedding_list(raw.values, config.embedding_dim);
    if from != config.embedding_dim {
        diagnostics.push(Diagnostic::EmbeddingResized {
            verse_group: vg.to_string(),
            chunk: index,
            from,
            to: config.embedding_dim,
        });
    }
    let non_numeric = embedding::count_non_numeric(&embedding);
    if non_numeric > 0 {
        diagnostics.push(Diagnostic::EmbeddingNotNumeric {
            verse_group: vg.to_string(),
            chunk: index,
            count: non_numeric,
        });
    }

    ChunkRecord {
        section_number: row.section_number.to_json(),
        theme_text: row.theme_text.to_json(),
        theme_title: row.theme_title.to_json(),
        theme_summary: row.theme_summary.to_json(),
        contextual_question,
        keywords: row.keywords.to_json(),
        outline: row.outline.to_json(),
        embedding,
    }
}

fn malformed_cell(vg: &str, field: &str, cell: &Cell) -> Diagnostic {
    Diagnostic::MalformedListCell {
        verse_group: vg.to_string(),
        field: field.to_string(),
        preview: cell
            .as_text()
            .map(|t| normalize::preview(&t))
            .unwrap_or_default(),
    }
}

// ── File entry points ────────────────────────────────────────────────────

/// Load both CSV files and convert them.
pub fn convert_files(
    primary_path: impl AsRef<Path>,
    secondary_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Verse2JsonError> {
    convert_files_with(primary_path, secondary_path, true, config)
}

/// [`convert_files`] with control over CSV type inference.
pub fn convert_files_with(
    primary_path: impl AsRef<Path>,
    secondary_path: impl AsRef<Path>,
    infer_types: bool,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Verse2JsonError> {
    let primary = input::read_table_with(primary_path, infer_types)?;
    let secondary = input::read_table_with(secondary_path, infer_types)?;
    convert(Some(&primary), Some(&secondary), config)
}

/// Convert two CSV files and write pretty JSON to `output_path`.
///
/// Uses atomic write (temp file in the target directory + rename) so a
/// failed run never leaves a truncated file behind.
pub fn convert_to_file(
    primary_path: impl AsRef<Path>,
    secondary_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Verse2JsonError> {
    let output = convert_files(primary_path, secondary_path, config)?;
    write_json(output_path.as_ref(), &output.to_json(true)?)?;
    Ok(output)
}

/// Atomically write `json` (plus a trailing newline) to `path`.
pub fn write_json(path: &Path, json: &str) -> Result<(), Verse2JsonError> {
    let write_err = |source: std::io::Error| Verse2JsonError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.write_all(b"\n").map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Wrote {} bytes to {}", json.len() + 1, path.display());
    Ok(())
}
