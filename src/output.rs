//! Output types: the nested per-verse-group documents and run statistics.
//!
//! Field order in these structs is the key order of the emitted JSON.

use crate::error::{Diagnostic, Verse2JsonError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One verse split out of a translation blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub verse_number: u64,
    /// `"{chapter}:{verse_number}"`; the chapter token is `unknown` when the
    /// verse group carried no chapter.
    pub verse_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_uid: Option<String>,
    pub text: String,
}

/// One commentary chunk joined onto its verse group.
///
/// Scalar fields carry the cell unchanged (`null` when missing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub section_number: Value,
    pub theme_text: Value,
    pub theme_title: Value,
    pub theme_summary: Value,
    pub contextual_question: Vec<String>,
    pub keywords: Value,
    pub outline: Value,
    /// Exactly `embedding_dim` elements.
    pub embedding: Vec<Value>,
}

/// Group-level commentary metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MacroAnalysis {
    pub themes: Vec<String>,
    pub wisdom_points: Vec<String>,
    pub real_life_reflections: Vec<String>,
    pub revelation_context: Vec<String>,
    pub outline_of_commentary: Vec<String>,
    pub contextual_questions: Vec<String>,
}

/// One nested document per primary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub verse_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_group_summary: Option<String>,
    pub chapter: Option<u32>,
    pub verses: Vec<VerseRecord>,
    pub english_commentary: Option<String>,
    pub macro_analysis: MacroAnalysis,
    pub chunks: Vec<ChunkRecord>,
    /// Degradations raised while building this document. Not serialised.
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Statistics for a conversion run. Never part of the document JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Rows in the primary table.
    pub primary_rows: usize,
    /// Rows in the secondary (chunk) table.
    pub secondary_rows: usize,
    pub documents: usize,
    pub verses: usize,
    /// Chunk rows joined onto some document.
    pub chunks: usize,
    /// Chunk rows whose group key matched no primary row.
    pub unmatched_chunks: usize,
    pub diagnostics: usize,
    pub duration_ms: u64,
}

/// The result of a conversion: documents in primary-table order plus stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub documents: Vec<Document>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// All diagnostics, in document order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.documents.iter().flat_map(|d| d.diagnostics.iter())
    }

    /// Serialise the documents (not the stats) as a JSON array.
    pub fn to_json(&self, pretty: bool) -> Result<String, Verse2JsonError> {
        documents_to_json(&self.documents, pretty)
    }
}

/// Serialise documents as a JSON array; `pretty` uses two-space indentation.
///
/// Output is a pure function of the documents: the same input always yields
/// byte-identical JSON.
pub fn documents_to_json(documents: &[Document], pretty: bool) -> Result<String, Verse2JsonError> {
    let json = if pretty {
        serde_json::to_string_pretty(documents)?
    } else {
        serde_json::to_string(documents)?
    };
    Ok(json)
}
