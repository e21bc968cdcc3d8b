/// Plain-text table for printing a daily series in the terminal
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<usize>,
}

impl Table {
    /// Create a new table with the given headers
    pub fn new(headers: &[&str]) -> Self {
        Table {
            col_widths: headers.iter().map(|h| h.len()).collect(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Add a row; cells beyond the header count are dropped
    pub fn add_row(&mut self, row: Vec<String>) {
        let row: Vec<String> = row.into_iter().take(self.headers.len()).collect();

        for (i, cell) in row.iter().enumerate() {
            self.col_widths[i] = self.col_widths[i].max(cell.chars().count());
        }

        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(self.render_row(&self.headers));
        lines.push(self.render_separator());
        for row in &self.rows {
            lines.push(self.render_row(row));
        }
        lines.join("\n")
    }

    /// Text columns are left-aligned, numeric ones right-aligned
    fn render_row(&self, row: &[String]) -> String {
        row.iter()
            .enumerate()
            .map(|(i, cell)| {
                let width = self.col_widths[i];
                if cell.parse::<f64>().is_ok() {
                    format!("{:>width$}", cell, width = width)
                } else {
                    format!("{:<width$}", cell, width = width)
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    }

    fn render_separator(&self) -> String {
        self.col_widths
            .iter()
            .map(|&width| "-".repeat(width))
            .collect::<Vec<_>>()
            .join("-+-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_table() {
        let mut table = Table::new(&["Date", "Transactions", "Size (MB)"]);
        table.add_row(vec!["2024-01-01".into(), "350000".into(), "1.50".into()]);
        table.add_row(vec!["2024-01-02".into(), "12".into(), "0.25".into()]);

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Date"));
        assert!(lines[1].contains("-+-"));
        assert!(lines[3].contains("          12"));
    }

    #[test]
    fn test_extra_cells_are_dropped() {
        let mut table = Table::new(&["A"]);
        table.add_row(vec!["x".into(), "y".into()]);
        assert_eq!(table.render(), "A\n-\nx");
    }
}
