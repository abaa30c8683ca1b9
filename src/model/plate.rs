use crate::model::well::WellPosition;

/// Physical plate geometry. Standard layouts cover the common 96- and
/// 384-well formats; anything else goes through [`PlateLayout::custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateLayout {
    pub rows: usize,
    pub cols: usize,
}

impl PlateLayout {
    pub const P96: PlateLayout = PlateLayout { rows: 8, cols: 12 };
    pub const P384: PlateLayout = PlateLayout { rows: 16, cols: 24 };
    pub const STANDARD: [PlateLayout; 2] = [Self::P96, Self::P384];

    pub fn custom(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Smallest standard layout containing the given maximum zero-based
    /// position, if any does.
    pub fn infer(max_row: u8, max_col: u8) -> Option<Self> {
        Self::STANDARD
            .into_iter()
            .find(|layout| (max_row as usize) < layout.rows && (max_col as usize) < layout.cols)
    }

    pub fn contains(&self, pos: WellPosition) -> bool {
        (pos.row as usize) < self.rows && (pos.col as usize) < self.cols
    }

    pub fn well_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// Dense row-major rows x cols grid of one metric for one plate.
///
/// Cells with no corresponding well are missing; a NaN written through
/// [`PlateMatrix::set`] is stored as missing so grid arithmetic never
/// has to special-case it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<Option<f64>>,
}

impl PlateMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    /// Builds a grid from (position, value) pairs against a layout.
    /// Positions are expected to be layout-validated upstream.
    pub fn from_wells<I>(layout: PlateLayout, cells: I) -> Self
    where
        I: IntoIterator<Item = (WellPosition, Option<f64>)>,
    {
        let mut matrix = Self::new(layout.rows, layout.cols);
        for (pos, value) in cells {
            matrix.set(pos.row as usize, pos.col as usize, value);
        }
        matrix
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[self.idx(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Option<f64>) {
        let idx = self.idx(row, col);
        self.cells[idx] = value.filter(|v| !v.is_nan());
    }

    /// Flattened row-major view of all cells.
    pub fn values(&self) -> &[Option<f64>] {
        &self.cells
    }

    pub fn valid_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}
