use serde::Serialize;

/// Which columns are displayed and exported
///
/// Independent of row filtering: hiding a column never changes which rows
/// pass the filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnVisibility {
    columns: Vec<(String, bool)>,
}

impl ColumnVisibility {
    /// Every column visible
    pub fn all(columns: &[String]) -> Self {
        Self {
            columns: columns.iter().map(|c| (c.clone(), true)).collect(),
        }
    }

    /// Only the given columns visible, in table order
    pub fn only(columns: &[String], visible: &[String]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|c| (c.clone(), visible.iter().any(|v| v.trim() == c)))
                .collect(),
        }
    }

    pub fn entries(&self) -> &[(String, bool)] {
        &self.columns
    }

    pub fn is_visible(&self, column: &str) -> bool {
        self.columns.iter().any(|(c, v)| c == column && *v)
    }

    pub fn toggle(&mut self, column: &str) {
        if let Some((_, v)) = self.columns.iter_mut().find(|(c, _)| c == column) {
            *v = !*v;
        }
    }

    pub fn show_all(&mut self) {
        self.columns.iter_mut().for_each(|(_, v)| *v = true);
    }

    pub fn visible_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|(_, v)| *v)
            .map(|(c, _)| c.clone())
            .collect()
    }

    /// Keep hidden columns hidden across a reload; new columns start visible
    pub fn rebase(mut self, previous: &ColumnVisibility) -> Self {
        for (column, visible) in self.columns.iter_mut() {
            if let Some((_, was)) = previous.columns.iter().find(|(c, _)| c == column) {
                *visible = *was;
            }
        }
        self
    }
}
