//! Fixed-width text tables.

pub const BANNER: &str =
    "**************************************************************************";

const DETAIL_INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq)]
struct Row {
    cells: Vec<String>,
    details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    title: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(title: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, cells: Vec<String>) {
        self.push_row_with_details(cells, Vec::new());
    }

    /// Detail lines render indented under the row.
    pub fn push_row_with_details(&mut self, cells: Vec<String>, details: Vec<String>) {
        self.rows.push(Row { cells, details });
    }

    pub fn render(&self, column_width: usize) -> String {
        let header = justify(&self.columns, column_width);
        let mut out = String::new();
        out.push_str(BANNER);
        out.push('\n');
        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&header);
        out.push('\n');
        out.push_str(&"-".repeat(header.chars().count()));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&justify(&row.cells, column_width));
            out.push('\n');
            for line in &row.details {
                out.push_str(DETAIL_INDENT);
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

/// Left-justifies each cell to `width`; an overlong cell still gets one space before the next.
fn justify(cells: &[String], width: usize) -> String {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        line.push_str(cell);
        if i + 1 < cells.len() {
            let len = cell.chars().count();
            let pad = if len < width { width - len } else { 1 };
            line.push_str(&" ".repeat(pad));
        }
    }
    line
}

pub fn format_average(v: f64) -> String {
    format!("{:.2}", v)
}
