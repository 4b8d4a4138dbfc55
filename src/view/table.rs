/// Horizontal placement of a cell's text inside its column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// Column metadata for the desktop grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableColumn {
    pub header: String,
    pub min_width: usize,
    pub max_width: Option<usize>,
    pub alignment: Alignment,
}

impl TableColumn {
    pub fn left(header: &str, min_width: usize, max_width: Option<usize>) -> Self {
        Self {
            header: header.to_string(),
            min_width,
            max_width,
            alignment: Alignment::Left,
        }
    }

    pub fn right(header: &str, min_width: usize) -> Self {
        Self {
            header: header.to_string(),
            min_width,
            max_width: None,
            alignment: Alignment::Right,
        }
    }
}

/// Plain-text grid: header, rule, one line per row.
pub struct Table<'a> {
    pub columns: &'a [TableColumn],
    pub rows: Vec<Vec<String>>,
    pub padding: usize,
}

impl Table<'_> {
    /// Width of each column after applying header, content and constraints.
    pub fn compute_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let content = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                let width = content
                    .max(column.header.chars().count())
                    .max(column.min_width);
                column.max_width.map_or(width, |max| width.min(max))
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let widths = self.compute_widths();
        let header: Vec<String> = self.columns.iter().map(|c| c.header.clone()).collect();
        let mut lines = vec![
            self.render_line(&header, &widths),
            rule(&widths, self.padding),
        ];
        lines.extend(self.rows.iter().map(|row| self.render_line(row, &widths)));
        lines.join("\n")
    }

    fn render_line(&self, cells: &[String], widths: &[usize]) -> String {
        self.columns
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(idx, (column, width))| {
                let text = cells.get(idx).map(String::as_str).unwrap_or("");
                render_cell(text, *width, column.alignment, self.padding)
            })
            .collect::<Vec<_>>()
            .join("|")
            .trim_end()
            .to_string()
    }
}

/// Pads (or truncates with an ellipsis) `text` to `width`.
pub fn render_cell(text: &str, width: usize, alignment: Alignment, padding: usize) -> String {
    let fitted = truncate(text, width);
    let gap = width.saturating_sub(fitted.chars().count());
    let pad = " ".repeat(padding);
    match alignment {
        Alignment::Left => format!("{pad}{fitted}{}{pad}", " ".repeat(gap)),
        Alignment::Right => format!("{pad}{}{fitted}{pad}", " ".repeat(gap)),
    }
}

fn truncate(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut kept: String = text.chars().take(width - 1).collect();
    kept.push('…');
    kept
}

fn rule(widths: &[usize], padding: usize) -> String {
    widths
        .iter()
        .map(|width| "-".repeat(width + padding * 2))
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_respect_min_and_max() {
        let columns = vec![
            TableColumn::left("Item", 4, Some(8)),
            TableColumn::right("Qty", 5),
        ];
        let table = Table {
            columns: &columns,
            rows: vec![vec!["VeryLongItemName".into(), "3".into()]],
            padding: 1,
        };
        assert_eq!(table.compute_widths(), vec![8, 5]);
    }

    #[test]
    fn cells_align_and_truncate() {
        assert_eq!(render_cell("AB", 4, Alignment::Left, 1), " AB   ");
        assert_eq!(render_cell("AB", 4, Alignment::Right, 1), "   AB ");
        assert_eq!(render_cell("ABCDEF", 4, Alignment::Left, 0), "ABC…");
    }

    #[test]
    fn render_emits_header_rule_and_rows() {
        let columns = vec![TableColumn::left("A", 1, None), TableColumn::right("B", 1)];
        let table = Table {
            columns: &columns,
            rows: vec![vec!["x".into(), "10".into()]],
            padding: 0,
        };
        assert_eq!(table.render(), "A| B\n-+--\nx|10");
    }
}
