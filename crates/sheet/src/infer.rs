use crate::cell::ColumnType;

/// Records column types from the first retained data row.
///
/// Types seen while a row is assembled stay pending until the row is
/// accepted; a row that turns out blank discards them. Once committed the
/// types never change.
#[derive(Debug, Clone, Default)]
pub struct ColumnTypeInferencer {
    pending: Vec<Option<ColumnType>>,
    committed: Option<Vec<ColumnType>>,
}

impl ColumnTypeInferencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    /// Note the type of the value emitted at `position` in the current row.
    pub fn observe(&mut self, position: usize, column_type: ColumnType) {
        if self.committed.is_some() {
            return;
        }
        if self.pending.len() <= position {
            self.pending.resize(position + 1, None);
        }
        self.pending[position] = Some(column_type);
    }

    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// Accept the pending row. Positions without a value become `String`.
    pub fn commit(&mut self) {
        if self.committed.is_some() {
            return;
        }
        let types = self
            .pending
            .drain(..)
            .map(|t| t.unwrap_or(ColumnType::String))
            .collect();
        self.committed = Some(types);
    }

    /// Final types, padded with `String` or truncated to `width`.
    pub fn finish(self, width: usize) -> Vec<ColumnType> {
        let mut types = self.committed.unwrap_or_default();
        types.resize(width, ColumnType::String);
        types
    }
}
