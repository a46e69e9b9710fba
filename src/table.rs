//! In-memory tables and the typed rows the assembler consumes.
//!
//! A [`Table`] is what a loader hands over: a header row plus loosely typed
//! [`Cell`]s. [`PrimaryRow::from_table`] and [`SecondaryRow::from_table`]
//! pick the columns the assembler needs by name. Only the group-key columns
//! are required; any other absent column reads as [`Cell::Missing`].

use crate::error::Verse2JsonError;
use serde_json::Value;
use std::borrow::Cow;

/// Column names of the two input tables.
pub mod columns {
    pub const VERSE_GROUP: &str = "Verse Group";
    pub const TRANSLATION: &str = "translation";
    pub const ENGLISH_COMMENTARY: &str = "English Commentary";
    pub const THEMES: &str = "themes";
    pub const WISDOM_POINTS: &str = "wisdom_points";
    pub const REAL_LIFE_REFLECTIONS: &str = "real_life_reflections";
    pub const REVELATION_CONTEXT: &str = "revelation_context";
    pub const OUTLINE_OF_COMMENTARY: &str = "outline_of_commentary";
    pub const CONTEXTUAL_QUESTIONS: &str = "contextual_questions";

    pub const COMMENTARY_GROUP: &str = "Commentary Group";
    pub const SECTION_NUMBER: &str = "SectionNumber";
    pub const THEME_TEXT: &str = "ThemeText";
    pub const THEME_TITLE: &str = "ThemeTitle";
    pub const THEME_SUMMARY: &str = "ThemeSummary";
    pub const CONTEXTUAL_QUESTION: &str = "ContextualQuestion";
    pub const KEYWORDS: &str = "Keywords";
    pub const OUTLINE: &str = "Outline";
    pub const EMBEDDING: &str = "Embedding";

    /// Join-key columns; always read as verbatim text.
    pub const KEYS: &[&str] = &[VERSE_GROUP, COMMENTARY_GROUP];
}

/// One raw table cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Empty cell or a not-a-value marker (`NaN`, `null`, ...).
    #[default]
    Missing,
    /// Text exactly as read.
    Text(String),
    /// An already-typed value (number, bool, array, object). Never `Null`.
    Value(Value),
}

static MISSING: Cell = Cell::Missing;

impl Cell {
    /// Build a cell from a float, mapping `NaN` to [`Cell::Missing`].
    pub fn from_f64(v: f64) -> Self {
        match serde_json::Number::from_f64(v) {
            Some(n) => Cell::Value(Value::Number(n)),
            None => Cell::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// The cell rendered as text, or `None` when missing.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Cell::Missing => None,
            Cell::Text(s) => Some(Cow::Borrowed(s)),
            Cell::Value(Value::String(s)) => Some(Cow::Borrowed(s)),
            Cell::Value(v) => Some(Cow::Owned(v.to_string())),
        }
    }

    /// The cell as a JSON value; missing becomes `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Missing => Value::Null,
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Value(v) => v.clone(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::from_f64(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Value(Value::from(v))
    }
}

impl From<Value> for Cell {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Cell::Missing,
            Value::String(s) => Cell::Text(s),
            other => Cell::Value(other),
        }
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map_or(Cell::Missing, Into::into)
    }
}

/// A header row plus rows of cells, every row as wide as the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding short rows with missing cells and dropping
    /// cells beyond the header width.
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.headers.len(), Cell::Missing);
        self.rows.push(cells);
    }

    /// Chainable [`Table::push_row`].
    pub fn with_row<I, C>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.push_row(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column named `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at `row` in column `col`; a missing column reads as missing.
    pub fn cell(&self, row: usize, col: Option<usize>) -> &Cell {
        col.and_then(|c| self.rows.get(row).and_then(|r| r.get(c)))
            .unwrap_or(&MISSING)
    }

    fn required_column(&self, table: &'static str, name: &str) -> Result<usize, Verse2JsonError> {
        self.column(name).ok_or_else(|| Verse2JsonError::MissingColumn {
            table,
            column: name.to_string(),
        })
    }
}

/// One verse group's record from the primary table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrimaryRow {
    pub verse_group: String,
    pub translation: Cell,
    pub english_commentary: Cell,
    pub themes: Cell,
    pub wisdom_points: Cell,
    pub real_life_reflections: Cell,
    pub revelation_context: Cell,
    pub outline_of_commentary: Cell,
    pub contextual_questions: Cell,
}

impl PrimaryRow {
    /// Read every row of a primary table. Requires a `Verse Group` column.
    pub fn from_table(table: &Table) -> Result<Vec<Self>, Verse2JsonError> {
        use columns::*;
        let key = table.required_column("primary", VERSE_GROUP)?;
        let translation = table.column(TRANSLATION);
        let commentary = table.column(ENGLISH_COMMENTARY);
        let themes = table.column(THEMES);
        let wisdom = table.column(WISDOM_POINTS);
        let reflections = table.column(REAL_LIFE_REFLECTIONS);
        let revelation = table.column(REVELATION_CONTEXT);
        let outline = table.column(OUTLINE_OF_COMMENTARY);
        let questions = table.column(CONTEXTUAL_QUESTIONS);

        Ok((0..table.len())
            .map(|r| PrimaryRow {
                verse_group: group_key(table.cell(r, Some(key))),
                translation: table.cell(r, translation).clone(),
                english_commentary: table.cell(r, commentary).clone(),
                themes: table.cell(r, themes).clone(),
                wisdom_points: table.cell(r, wisdom).clone(),
                real_life_reflections: table.cell(r, reflections).clone(),
                revelation_context: table.cell(r, revelation).clone(),
                outline_of_commentary: table.cell(r, outline).clone(),
                contextual_questions: table.cell(r, questions).clone(),
            })
            .collect())
    }
}

/// One commentary chunk from the secondary table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecondaryRow {
    pub commentary_group: String,
    pub section_number: Cell,
    pub theme_text: Cell,
    pub theme_title: Cell,
    pub theme_summary: Cell,
    pub contextual_question: Cell,
    pub keywords: Cell,
    pub outline: Cell,
    pub embedding: Cell,
}

impl SecondaryRow {
    /// Read every row of a chunk table. Requires a `Commentary Group` column.
    pub fn from_table(table: &Table) -> Result<Vec<Self>, Verse2JsonError> {
        use columns::*;
        let key = table.required_column("secondary", COMMENTARY_GROUP)?;
        let section = table.column(SECTION_NUMBER);
        let text = table.column(THEME_TEXT);
        let title = table.column(THEME_TITLE);
        let summary = table.column(THEME_SUMMARY);
        let question = table.column(CONTEXTUAL_QUESTION);
        let keywords = table.column(KEYWORDS);
        let outline = table.column(OUTLINE);
        let embedding = table.column(EMBEDDING);

        Ok((0..table.len())
            .map(|r| SecondaryRow {
                commentary_group: group_key(table.cell(r, Some(key))),
                section_number: table.cell(r, section).clone(),
                theme_text: table.cell(r, text).clone(),
                theme_title: table.cell(r, title).clone(),
                theme_summary: table.cell(r, summary).clone(),
                contextual_question: table.cell(r, question).clone(),
                keywords: table.cell(r, keywords).clone(),
                outline: table.cell(r, outline).clone(),
                embedding: table.cell(r, embedding).clone(),
            })
            .collect())
    }
}

/// Group keys join by exact string equality. A missing key reads as the
/// empty string, which never joins.
fn group_key(cell: &Cell) -> String {
    cell.as_text().map(Cow::into_owned).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nan_is_missing() {
        assert!(Cell::from_f64(f64::NAN).is_missing());
        assert_eq!(Cell::from(2.5).to_json(), json!(2.5));
    }

    #[test]
    fn value_null_and_string_normalise() {
        assert_eq!(Cell::from(Value::Null), Cell::Missing);
        assert_eq!(Cell::from(json!("x")), Cell::Text("x".into()));
        assert_eq!(Cell::from(None::<&str>), Cell::Missing);
    }

    #[test]
    fn as_text_renders_numbers() {
        assert_eq!(Cell::from(7i64).as_text().as_deref(), Some("7"));
        assert_eq!(Cell::Missing.as_text(), None);
    }

    #[test]
    fn push_row_pads_and_truncates() {
        let t = Table::new(["a", "b"])
            .with_row(["1"])
            .with_row(["1", "2", "3"]);
        assert_eq!(t.cell(0, Some(1)), &Cell::Missing);
        assert_eq!(t.cell(1, Some(1)), &Cell::from("2"));
        assert_eq!(t.cell(1, Some(2)), &Cell::Missing);
        assert_eq!(t.cell(0, None), &Cell::Missing);
    }

    #[test]
    fn primary_requires_verse_group_column() {
        let t = Table::new(["translation"]).with_row(["1 x"]);
        let err = PrimaryRow::from_table(&t).unwrap_err();
        assert!(matches!(
            err,
            Verse2JsonError::MissingColumn { table: "primary", .. }
        ));
    }

    #[test]
    fn secondary_optional_columns_read_missing() {
        let t = Table::new([columns::COMMENTARY_GROUP, columns::THEME_TEXT])
            .with_row(["2.1-10", "Mercy"]);
        let rows = SecondaryRow::from_table(&t).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].commentary_group, "2.1-10");
        assert_eq!(rows[0].theme_text, Cell::from("Mercy"));
        assert!(rows[0].embedding.is_missing());
        assert!(rows[0].keywords.is_missing());
    }
}
