use std::collections::{BTreeMap, BTreeSet};

use crate::error::TableError;
use crate::model::plate::PlateLayout;

/// The two luminescent stress reporters carried by every well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reporter {
    R1,
    R2,
}

impl Reporter {
    pub const ALL: [Reporter; 2] = [Reporter::R1, Reporter::R2];

    pub fn label(self) -> &'static str {
        match self {
            Reporter::R1 => "r1",
            Reporter::R2 => "r2",
        }
    }
}

/// Growth-control strains read out as optical density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strain {
    Wt,
    TolC,
    Sa,
}

impl Strain {
    pub const ALL: [Strain; 3] = [Strain::Wt, Strain::TolC, Strain::Sa];

    pub fn label(self) -> &'static str {
        match self {
            Strain::Wt => "wt",
            Strain::TolC => "tolc",
            Strain::Sa => "sa",
        }
    }
}

/// Zero-based (row, column) position inside a plate layout.
///
/// The external form is a well string like `"C07"`: a row letter
/// (A..Z, then AA..AF for tall layouts) followed by a 1-based column
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WellPosition {
    pub row: u8,
    pub col: u8,
}

impl WellPosition {
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub fn parse(input: &str) -> Result<Self, TableError> {
        let bad = |reason: &'static str| TableError::BadPosition {
            input: input.to_string(),
            reason,
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(bad("empty"));
        }

        let letters: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        let digits = &trimmed[letters.len()..];

        if letters.is_empty() {
            return Err(bad("missing row letter"));
        }
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(bad("column must be decimal digits"));
        }

        let row = row_index(&letters).ok_or_else(|| bad("row letter out of range"))?;
        let col: u32 = digits.parse().map_err(|_| bad("column out of range"))?;
        if col == 0 {
            return Err(bad("column numbering starts at 1"));
        }
        if col > 256 {
            return Err(bad("column out of range"));
        }

        Ok(Self {
            row,
            col: (col - 1) as u8,
        })
    }

    /// Canonical well string, column zero-padded to two digits.
    pub fn label(&self) -> String {
        let mut out = String::new();
        if self.row < 26 {
            out.push((b'A' + self.row) as char);
        } else {
            out.push('A');
            out.push((b'A' + self.row - 26) as char);
        }
        out.push_str(&format!("{:02}", self.col as u32 + 1));
        out
    }
}

fn row_index(letters: &str) -> Option<u8> {
    let upper: Vec<u8> = letters.bytes().map(|b| b.to_ascii_uppercase()).collect();
    match upper.as_slice() {
        [a] if a.is_ascii_uppercase() => Some(a - b'A'),
        [b'A', b @ b'A'..=b'F'] => Some(26 + (b - b'A')),
        _ => None,
    }
}

/// One well's raw measurements plus its identity.
///
/// Every measurement is numeric-or-missing; a NaN raw value counts as
/// missing everywhere downstream. `experimental` separates assay wells
/// from reference rows excluded from vitality plate medians.
#[derive(Debug, Clone)]
pub struct WellRecord {
    pub plate: String,
    pub pos: WellPosition,
    pub r1_signal: Option<f64>,
    pub r1_viability: Option<f64>,
    pub r2_signal: Option<f64>,
    pub r2_viability: Option<f64>,
    pub od_wt: Option<f64>,
    pub od_tolc: Option<f64>,
    pub od_sa: Option<f64>,
    pub experimental: bool,
}

impl WellRecord {
    pub fn new(plate: impl Into<String>, pos: WellPosition) -> Self {
        Self {
            plate: plate.into(),
            pos,
            r1_signal: None,
            r1_viability: None,
            r2_signal: None,
            r2_viability: None,
            od_wt: None,
            od_tolc: None,
            od_sa: None,
            experimental: true,
        }
    }

    pub fn signal(&self, reporter: Reporter) -> Option<f64> {
        match reporter {
            Reporter::R1 => self.r1_signal,
            Reporter::R2 => self.r2_signal,
        }
    }

    pub fn viability(&self, reporter: Reporter) -> Option<f64> {
        match reporter {
            Reporter::R1 => self.r1_viability,
            Reporter::R2 => self.r2_viability,
        }
    }

    pub fn od(&self, strain: Strain) -> Option<f64> {
        match strain {
            Strain::Wt => self.od_wt,
            Strain::TolC => self.od_tolc,
            Strain::Sa => self.od_sa,
        }
    }
}

/// Validated in-memory well table: non-empty, positions unique per
/// plate, every position inside one shared layout.
///
/// Construction is the only place table-shape errors can arise; after
/// it, the engine treats the table as structurally sound and handles
/// only numeric degeneracy.
#[derive(Debug, Clone)]
pub struct WellTable {
    wells: Vec<WellRecord>,
    layout: PlateLayout,
}

impl WellTable {
    /// Builds a table, inferring the smallest standard layout (96-well,
    /// then 384-well) that fits every position.
    pub fn new(wells: Vec<WellRecord>) -> Result<Self, TableError> {
        if wells.is_empty() {
            return Err(TableError::Empty);
        }
        let mut max_row = 0u8;
        let mut max_col = 0u8;
        for well in &wells {
            max_row = max_row.max(well.pos.row);
            max_col = max_col.max(well.pos.col);
        }
        let layout = match PlateLayout::infer(max_row, max_col) {
            Some(layout) => layout,
            None => {
                let largest = PlateLayout::STANDARD[PlateLayout::STANDARD.len() - 1];
                let offender = wells
                    .iter()
                    .find(|w| !largest.contains(w.pos))
                    .map(|w| w.pos.label())
                    .unwrap_or_default();
                return Err(TableError::NoLayoutFits { well: offender });
            }
        };
        Self::with_layout(wells, layout)
    }

    /// Builds a table against an explicit layout (custom geometries
    /// included).
    pub fn with_layout(wells: Vec<WellRecord>, layout: PlateLayout) -> Result<Self, TableError> {
        if wells.is_empty() {
            return Err(TableError::Empty);
        }
        let mut seen: BTreeSet<(&str, u8, u8)> = BTreeSet::new();
        for well in &wells {
            if !layout.contains(well.pos) {
                return Err(TableError::OutsideLayout {
                    plate: well.plate.clone(),
                    well: well.pos.label(),
                    rows: layout.rows,
                    cols: layout.cols,
                });
            }
            if !seen.insert((well.plate.as_str(), well.pos.row, well.pos.col)) {
                return Err(TableError::DuplicateWell {
                    plate: well.plate.clone(),
                    well: well.pos.label(),
                });
            }
        }
        Ok(Self { wells, layout })
    }

    pub fn wells(&self) -> &[WellRecord] {
        &self.wells
    }

    pub fn layout(&self) -> PlateLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.wells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    /// Row indices grouped by plate id, plates in sorted order, rows in
    /// input order. Every per-plate statistic in the engine runs over
    /// these groups.
    pub fn plate_indices(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, well) in self.wells.iter().enumerate() {
            groups.entry(well.plate.as_str()).or_default().push(idx);
        }
        groups
    }

    pub fn plate_ids(&self) -> Vec<String> {
        self.plate_indices()
            .keys()
            .map(|plate| plate.to_string())
            .collect()
    }
}
