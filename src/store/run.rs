/// A block of consecutive rows that all hold the same value.
#[derive(Debug, Clone, PartialEq)]
pub struct Run<V> {
    /// Index of the first row covered by the run.
    pub start_row: u64,
    /// Number of rows covered; never zero.
    pub length: u64,
    /// Value shared by every row in the run.
    pub value: V,
}

impl<V> Run<V> {
    /// Creates a single-row run starting at `start_row`.
    pub fn new(start_row: u64, value: V) -> Self {
        Self {
            start_row,
            length: 1,
            value,
        }
    }

    /// Index one past the last row of the run.
    pub fn end_row(&self) -> u64 {
        self.start_row + self.length
    }

    /// Whether `row` falls inside the run.
    pub fn contains(&self, row: u64) -> bool {
        row >= self.start_row && row < self.end_row()
    }
}
