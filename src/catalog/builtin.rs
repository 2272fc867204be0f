use std::fmt;
use std::str::FromStr;

use crate::catalog::PathwayCatalog;
use crate::catalog::io::parse_json;
use crate::error::{AnnotationError, Result};

const CELL_MARKERS_JSON: &str = include_str!("../../data/cell_markers.json");
const HALLMARK_JSON: &str = include_str!("../../data/hallmark.json");

/// Catalogs shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInCatalog {
    /// Cell-type marker genes keyed by cell type (human).
    CellMarkers,
    /// Curated hallmark pathway gene sets.
    Hallmark,
}

impl BuiltInCatalog {
    pub const ALL: [BuiltInCatalog; 2] = [BuiltInCatalog::CellMarkers, BuiltInCatalog::Hallmark];

    pub fn id(&self) -> &'static str {
        match self {
            BuiltInCatalog::CellMarkers => "cell_markers",
            BuiltInCatalog::Hallmark => "hallmark",
        }
    }

    fn raw(&self) -> &'static str {
        match self {
            BuiltInCatalog::CellMarkers => CELL_MARKERS_JSON,
            BuiltInCatalog::Hallmark => HALLMARK_JSON,
        }
    }

    pub(crate) fn load(&self) -> Result<PathwayCatalog> {
        parse_json(self.raw())
            .map_err(|e| AnnotationError::catalog_load(format!("<built-in:{}>", self.id()), e))
    }
}

impl fmt::Display for BuiltInCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for BuiltInCatalog {
    type Err = AnnotationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cell_markers" | "markers" => Ok(BuiltInCatalog::CellMarkers),
            "hallmark" | "pathways" => Ok(BuiltInCatalog::Hallmark),
            _ => Err(AnnotationError::UnknownCatalog(s.to_string())),
        }
    }
}
