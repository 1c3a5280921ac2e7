//! Column-aligned rendering of simulator keyword tables.

use crate::domain::{CompletionError, ComputeResult};
use crate::modules::serialization::{format_fixed_f64, format_scientific_f64};

pub const DEFAULT_VALUE: &str = "1*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    Float { decimals: usize },
    Scientific { decimals: usize },
    Integer,
    Text,
}

impl ColumnFormat {
    pub const FLOAT: Self = Self::Float { decimals: 3 };
    pub const SCIENTIFIC: Self = Self::Scientific { decimals: 3 };

    fn is_numeric(self) -> bool {
        !matches!(self, Self::Text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub title: String,
    /// Second header row, usually a unit or a one-word hint.
    pub sub_title: Option<String>,
    pub format: ColumnFormat,
}

impl Column {
    pub fn new(title: impl Into<String>, format: ColumnFormat) -> Self {
        Self {
            title: title.into(),
            sub_title: None,
            format,
        }
    }

    pub fn text(title: impl Into<String>) -> Self {
        Self::new(title, ColumnFormat::Text)
    }

    pub fn integer(title: impl Into<String>) -> Self {
        Self::new(title, ColumnFormat::Integer)
    }

    pub fn float(title: impl Into<String>) -> Self {
        Self::new(title, ColumnFormat::FLOAT)
    }

    pub fn scientific(title: impl Into<String>) -> Self {
        Self::new(title, ColumnFormat::SCIENTIFIC)
    }

    pub fn with_sub_title(mut self, sub_title: impl Into<String>) -> Self {
        self.sub_title = Some(sub_title.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Integer(i64),
    Text(String),
    /// Simulator default, written `1*`.
    Default,
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn count(value: usize) -> Self {
        Self::Integer(value as i64)
    }

    pub fn optional_float(value: Option<f64>) -> Self {
        value.map_or(Self::Default, Self::Float)
    }

    fn render(&self, format: ColumnFormat) -> String {
        match (self, format) {
            (Self::Default, _) => DEFAULT_VALUE.to_string(),
            (Self::Text(text), _) => text.clone(),
            (Self::Integer(value), _) => value.to_string(),
            (Self::Float(value), ColumnFormat::Float { decimals }) => {
                format_fixed_f64(*value, decimals)
            }
            (Self::Float(value), ColumnFormat::Scientific { decimals }) => {
                format_scientific_f64(*value, decimals)
            }
            (Self::Float(value), ColumnFormat::Integer) => format!("{}", value.round() as i64),
            (Self::Float(value), ColumnFormat::Text) => format_fixed_f64(*value, 3),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableLine {
    Row(Vec<Value>),
    Comment(String),
}

/// Rows sharing one set of column headers.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSection {
    pub heading: Option<String>,
    columns: Vec<Column>,
    lines: Vec<TableLine>,
}

impl TableSection {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            heading: None,
            columns,
            lines: Vec::new(),
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn lines(&self) -> &[TableLine] {
        &self.lines
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> ComputeResult<()> {
        if row.len() != self.columns.len() {
            return Err(CompletionError::internal(
                "TABLE.ROW_ARITY",
                format!(
                    "table row has {} values but the header has {} columns",
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        self.lines.push(TableLine::Row(row));
        Ok(())
    }

    pub fn push_comment(&mut self, comment: impl Into<String>) {
        self.lines.push(TableLine::Comment(comment.into()));
    }

    pub fn row_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| matches!(line, TableLine::Row(_)))
            .count()
    }

    pub fn comment_count(&self) -> usize {
        self.lines.len() - self.row_count()
    }

    fn has_sub_titles(&self) -> bool {
        self.columns.iter().any(|column| column.sub_title.is_some())
    }

    fn rendered_rows(&self) -> Vec<Option<Vec<String>>> {
        self.lines
            .iter()
            .map(|line| match line {
                TableLine::Row(values) => Some(
                    values
                        .iter()
                        .zip(&self.columns)
                        .map(|(value, column)| value.render(column.format))
                        .collect(),
                ),
                TableLine::Comment(_) => None,
            })
            .collect()
    }
}

/// Table kinds in the order they appear in a completion file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKind {
    Welspecs,
    Compdat,
    Wpimult,
    Welsegs,
    Compsegs,
    Wsegvalv,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordTable {
    pub keyword: String,
    pub kind: TableKind,
    pub sections: Vec<TableSection>,
    pub skip_when_empty: bool,
}

impl KeywordTable {
    pub fn new(keyword: impl Into<String>, kind: TableKind) -> Self {
        Self {
            keyword: keyword.into(),
            kind,
            sections: Vec::new(),
            skip_when_empty: false,
        }
    }

    pub fn skip_when_empty(mut self) -> Self {
        self.skip_when_empty = true;
        self
    }

    pub fn with_section(mut self, section: TableSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn row_count(&self) -> usize {
        self.sections.iter().map(TableSection::row_count).sum()
    }

    /// Records live in the last section; earlier ones are per-table headers.
    pub fn has_records(&self) -> bool {
        self.sections
            .last()
            .is_some_and(|section| section.row_count() > 0)
    }
}

/// Comment preamble followed by keyword tables, kept in kind order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableDocument {
    pub preamble: Vec<TableSection>,
    tables: Vec<KeywordTable>,
}

impl TableDocument {
    pub fn push(&mut self, table: KeywordTable) {
        let position = self
            .tables
            .iter()
            .position(|existing| existing.kind > table.kind)
            .unwrap_or(self.tables.len());
        self.tables.insert(position, table);
    }

    pub fn tables(&self) -> &[KeywordTable] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.preamble.is_empty() && !self.tables.iter().any(KeywordTable::has_records)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFormatter {
    pub comment_marker: String,
    pub column_spacing: usize,
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self {
            comment_marker: "--".to_string(),
            column_spacing: 2,
        }
    }
}

impl TableFormatter {
    pub fn render_document(&self, document: &TableDocument) -> String {
        let mut lines = Vec::new();
        for section in &document.preamble {
            self.render_section(section, true, &mut lines);
            lines.push(String::new());
        }
        for table in document.tables() {
            self.render_table_into(table, &mut lines);
        }
        lines.join("\n")
    }

    pub fn render_table(&self, table: &KeywordTable) -> String {
        let mut lines = Vec::new();
        self.render_table_into(table, &mut lines);
        lines.join("\n")
    }

    fn render_table_into(&self, table: &KeywordTable, lines: &mut Vec<String>) {
        if table.skip_when_empty && !table.has_records() {
            return;
        }
        lines.push(table.keyword.clone());
        for section in &table.sections {
            self.render_section(section, false, lines);
        }
        lines.push("/".to_string());
        lines.push(String::new());
    }

    /// Header rows carry the comment marker; data rows are indented by its
    /// width. With `as_comment` every line is a comment.
    fn render_section(&self, section: &TableSection, as_comment: bool, lines: &mut Vec<String>) {
        let marker = self.comment_marker.as_str();
        let blank = " ".repeat(marker.len());
        let rows = section.rendered_rows();

        let mut widths: Vec<usize> = section
            .columns
            .iter()
            .map(|column| {
                column
                    .title
                    .len()
                    .max(column.sub_title.as_deref().map_or(0, str::len))
            })
            .collect();
        for cells in rows.iter().flatten() {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.len());
            }
        }

        if let Some(heading) = &section.heading {
            lines.push(format!("{marker} {heading}"));
        }
        let titles: Vec<&str> = section.columns.iter().map(|column| column.title.as_str()).collect();
        lines.push(format!("{marker}{}", self.join_cells(&titles, &widths, section)));
        if section.has_sub_titles() {
            let sub_titles: Vec<&str> = section
                .columns
                .iter()
                .map(|column| column.sub_title.as_deref().unwrap_or(""))
                .collect();
            lines.push(format!("{marker}{}", self.join_cells(&sub_titles, &widths, section)));
        }

        for (line, cells) in section.lines.iter().zip(&rows) {
            match (line, cells) {
                (_, Some(cells)) => {
                    let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
                    let body = self.join_cells(&cells, &widths, section);
                    if as_comment {
                        lines.push(format!("{marker}{body}"));
                    } else {
                        lines.push(format!("{blank}{body} /"));
                    }
                }
                (TableLine::Comment(comment), None) => lines.push(format!("{marker} {comment}")),
                (TableLine::Row(_), None) => {}
            }
        }
    }

    fn join_cells(&self, cells: &[&str], widths: &[usize], section: &TableSection) -> String {
        let spacing = " ".repeat(self.column_spacing);
        let mut line = String::new();
        for ((cell, width), column) in cells.iter().zip(widths).zip(&section.columns) {
            line.push_str(&spacing);
            if column.format.is_numeric() {
                line.push_str(&format!("{cell:>width$}"));
            } else {
                line.push_str(&format!("{cell:<width$}"));
            }
        }
        line.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Column, KeywordTable, TableDocument, TableFormatter, TableKind, TableSection, Value,
    };
    use crate::domain::ErrorCategory;

    fn compdat_like() -> KeywordTable {
        let mut section = TableSection::new(vec![
            Column::text("Well"),
            Column::integer("I"),
            Column::scientific("TR"),
            Column::float("DIAM"),
        ]);
        section
            .push_row(vec![
                Value::text("PROD-1"),
                Value::Integer(12),
                Value::Float(12.5),
                Value::Default,
            ])
            .expect("row");
        section.push_comment("PERFORATION");
        section
            .push_row(vec![
                Value::text("W"),
                Value::Integer(3),
                Value::Float(0.5),
                Value::Float(0.216),
            ])
            .expect("row");
        KeywordTable::new("COMPDAT", TableKind::Compdat).with_section(section)
    }

    #[test]
    fn rows_align_to_widest_cell() {
        let rendered = TableFormatter::default().render_table(&compdat_like());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "COMPDAT");
        assert_eq!(lines[1], "--  Well     I         TR   DIAM");
        assert_eq!(lines[2], "    PROD-1  12  1.250E+01     1* /");
        assert_eq!(lines[3], "-- PERFORATION");
        assert_eq!(lines[4], "    W        3  5.000E-01  0.216 /");
        assert_eq!(lines[5], "/");
    }

    #[test]
    fn wrong_arity_is_internal_error() {
        let mut section = TableSection::new(vec![Column::text("Well"), Column::integer("I")]);
        let error = section
            .push_row(vec![Value::text("W")])
            .expect_err("short row");
        assert_eq!(error.category(), ErrorCategory::InternalError);
        assert_eq!(error.placeholder(), "TABLE.ROW_ARITY");
    }

    #[test]
    fn empty_tables_respect_skip_flag() {
        let formatter = TableFormatter::default();
        let empty = KeywordTable::new("WSEGVALV", TableKind::Wsegvalv)
            .with_section(TableSection::new(vec![Column::text("Well")]));
        assert_eq!(formatter.render_table(&empty), "WSEGVALV\n--  Well\n/\n");
        assert!(formatter.render_table(&empty.skip_when_empty()).is_empty());
    }

    #[test]
    fn document_orders_tables_by_kind() {
        let mut document = TableDocument::default();
        document.push(KeywordTable::new("WSEGVALV", TableKind::Wsegvalv));
        document.push(compdat_like());
        document.push(KeywordTable::new("WELSPECS", TableKind::Welspecs));
        document.push(KeywordTable::new("COMPDATL", TableKind::Compdat));

        let keywords: Vec<&str> = document
            .tables()
            .iter()
            .map(|table| table.keyword.as_str())
            .collect();
        assert_eq!(keywords, vec!["WELSPECS", "COMPDAT", "COMPDATL", "WSEGVALV"]);
    }

    #[test]
    fn sub_titles_add_second_header_row() {
        let mut section = TableSection::new(vec![
            Column::float("Dep 1").with_sub_title("m"),
            Column::text("Name"),
        ]);
        section
            .push_row(vec![Value::Float(1000.0), Value::text("W")])
            .expect("row");
        let table = KeywordTable::new("WELSEGS", TableKind::Welsegs).with_section(section);
        let rendered = TableFormatter::default().render_table(&table);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "--     Dep 1  Name");
        assert_eq!(lines[2], "--         m");
        assert_eq!(lines[3], "    1000.000  W /");
    }
}
