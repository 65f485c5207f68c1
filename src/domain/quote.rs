//! Raw option-chain record set.
//!
//! Providers return loosely typed rows: a contract can be missing its bid, a
//! volume can arrive as text, and columns vary between providers. A
//! [`QuoteTable`] keeps that shape as named columns of [`Cell`]s so feature
//! preparation can select what it needs and ignore the rest.

/// Column holding the call/put category.
pub const CATEGORY_COLUMN: &str = "option_type";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Bool(bool),
    Missing,
}

impl Cell {
    /// Parse a delimited-text field: empty is missing, numbers are numbers,
    /// everything else is text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_nan() => Cell::Missing,
            Ok(v) => Cell::Number(v),
            Err(_) => match trimmed {
                "true" | "True" => Cell::Bool(true),
                "false" | "False" => Cell::Bool(false),
                _ => Cell::Text(trimmed.to_string()),
            },
        }
    }

    /// Numeric view of the cell. `Ok(None)` means missing; text that does not
    /// parse as a number is returned as the error.
    pub fn as_number(&self) -> Result<Option<f64>, &str> {
        match self {
            Cell::Number(v) if v.is_nan() => Ok(None),
            Cell::Number(v) => Ok(Some(*v)),
            Cell::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
            Cell::Missing => Ok(None),
            Cell::Text(s) => s.trim().parse::<f64>().map(Some).map_err(|_| s.as_str()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map(Cell::Number).unwrap_or(Cell::Missing)
    }
}

/// Column-named table of option contracts, one row per contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl QuoteTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with `Missing`, extra cells dropped.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Missing);
        self.rows.push(row);
    }

    /// Append a row given as `(column, cell)` pairs, adding unseen columns.
    pub fn push_named(&mut self, cells: Vec<(String, Cell)>) {
        let mut row = vec![Cell::Missing; self.columns.len()];
        for (name, cell) in cells {
            let idx = match self.column_index(&name) {
                Some(i) => i,
                None => self.add_column(name),
            };
            if idx >= row.len() {
                row.resize(idx + 1, Cell::Missing);
            }
            row[idx] = cell;
        }
        self.rows.push(row);
    }

    fn add_column(&mut self, name: String) -> usize {
        self.columns.push(name);
        for row in &mut self.rows {
            row.push(Cell::Missing);
        }
        self.columns.len() - 1
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of one column in row order.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Set `name` to `value` on every row, adding the column if needed.
    pub fn with_constant(mut self, name: &str, value: Cell) -> Self {
        let idx = match self.column_index(name) {
            Some(i) => i,
            None => self.add_column(name.to_string()),
        };
        for row in &mut self.rows {
            row[idx] = value.clone();
        }
        self
    }

    /// Stack `other` below `self`. Columns are the union, first-seen order;
    /// cells a side does not have are `Missing`.
    pub fn concat(mut self, other: QuoteTable) -> Self {
        let mapping: Vec<usize> = other
            .columns
            .into_iter()
            .map(|name| match self.column_index(&name) {
                Some(i) => i,
                None => self.add_column(name),
            })
            .collect();

        let width = self.columns.len();
        for other_row in other.rows {
            let mut row = vec![Cell::Missing; width];
            for (cell, &idx) in other_row.into_iter().zip(&mapping) {
                row[idx] = cell;
            }
            self.rows.push(row);
        }
        self
    }
}
