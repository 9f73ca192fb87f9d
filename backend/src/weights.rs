use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::models::GeoPoint;

/// Decimal places of the safety grid (about 111 m at the equator).
const CELL_SCALE: f64 = 1_000.0;

/// Grid cell of a coordinate rounded to three decimal places, stored as
/// thousandths of a degree so keys hash exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    lat_milli: i64,
    lng_milli: i64,
}

impl CellKey {
    pub fn from_coords(lat: f64, lng: f64) -> Self {
        Self {
            lat_milli: (lat * CELL_SCALE).round() as i64,
            lng_milli: (lng * CELL_SCALE).round() as i64,
        }
    }

    pub fn containing(point: GeoPoint) -> Self {
        Self::from_coords(point.lat, point.lng)
    }

    pub fn lat(&self) -> f64 {
        self.lat_milli as f64 / CELL_SCALE
    }

    pub fn lng(&self) -> f64 {
        self.lng_milli as f64 / CELL_SCALE
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WeightsError {
    #[error("failed to read weights file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid weights definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("weights file has no cells")]
    Empty,
    #[error("cell ({lat}, {lng}) has invalid weight {weight}")]
    InvalidWeight { lat: f64, lng: f64, weight: f64 },
}

/// On-disk representation of one cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CellWeight {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
}

/// Read-only safety risk per grid cell. Lower is safer.
#[derive(Debug, Clone, Default)]
pub struct SubregionWeights {
    cells: HashMap<CellKey, f64>,
}

impl SubregionWeights {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WeightsError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, WeightsError> {
        let cells: Vec<CellWeight> = serde_json::from_reader(reader)?;
        Self::from_cells(cells)
    }

    pub fn from_cells(cells: impl IntoIterator<Item = CellWeight>) -> Result<Self, WeightsError> {
        let mut map = HashMap::new();
        for cell in cells {
            if !cell.weight.is_finite() || cell.weight < 0.0 {
                return Err(WeightsError::InvalidWeight {
                    lat: cell.lat,
                    lng: cell.lng,
                    weight: cell.weight,
                });
            }
            map.insert(CellKey::from_coords(cell.lat, cell.lng), cell.weight);
        }
        if map.is_empty() {
            return Err(WeightsError::Empty);
        }
        Ok(Self { cells: map })
    }

    pub fn insert(&mut self, key: CellKey, weight: f64) {
        self.cells.insert(key, weight);
    }

    pub fn get(&self, key: CellKey) -> Option<f64> {
        self.cells.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(CellKey, f64)> for SubregionWeights {
    fn from_iter<I: IntoIterator<Item = (CellKey, f64)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}
