//! Pathway catalogs: named marker-gene sets tested against each cluster's ranked genes.
//!
//! A catalog is loaded once per run from a [`CatalogSource`], either one of the
//! [`BuiltInCatalog`]s compiled into the crate or a user-supplied file, and is then
//! shared read-only by every cluster.
//!
//! ```rust,no_run
//! use single_annotation::catalog::{self, BuiltInCatalog, CatalogSource};
//!
//! let catalog = catalog::load(&CatalogSource::BuiltIn(BuiltInCatalog::CellMarkers)).unwrap();
//! assert!(catalog.len() > 0);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use log::info;

use crate::error::Result;

mod builtin;
mod io;

pub use builtin::BuiltInCatalog;
pub use io::{parse_gmt, parse_json};

/// Where the active catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    BuiltIn(BuiltInCatalog),
    External(PathBuf),
}

impl CatalogSource {
    /// Resolve a CLI-style selection: an override path wins over the built-in identifier.
    pub fn resolve(builtin: &str, override_path: Option<PathBuf>) -> Result<Self> {
        match override_path {
            Some(path) => Ok(CatalogSource::External(path)),
            None => Ok(CatalogSource::BuiltIn(builtin.parse()?)),
        }
    }
}

/// A named set of gene identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathwaySet {
    pub name: String,
    pub genes: HashSet<String>,
}

impl PathwaySet {
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn contains(&self, gene: &str) -> bool {
        self.genes.contains(gene)
    }
}

/// Immutable mapping from pathway name to [`PathwaySet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathwayCatalog {
    pathways: HashMap<String, PathwaySet>,
}

impl PathwayCatalog {
    /// Build a catalog from name -> genes pairs.
    ///
    /// Gene identifiers are trimmed and blank entries dropped; duplicates collapse.
    /// Fails if a pathway ends up with no genes, a name repeats, or there are no pathways.
    pub fn from_sets<I, S, G>(sets: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (S, G)>,
        S: Into<String>,
        G: IntoIterator,
        G::Item: AsRef<str>,
    {
        let mut pathways = HashMap::new();
        for (name, genes) in sets {
            let name: String = name.into();
            let genes: HashSet<String> = genes
                .into_iter()
                .map(|g| g.as_ref().trim().to_string())
                .filter(|g| !g.is_empty())
                .collect();
            if genes.is_empty() {
                return Err(anyhow::anyhow!("Pathway '{}' has no genes", name));
            }
            if pathways.contains_key(&name) {
                return Err(anyhow::anyhow!("Pathway '{}' is defined more than once", name));
            }
            pathways.insert(name.clone(), PathwaySet { name, genes });
        }

        if pathways.is_empty() {
            return Err(anyhow::anyhow!("Catalog contains no pathways"));
        }
        Ok(PathwayCatalog { pathways })
    }

    pub fn len(&self) -> usize {
        self.pathways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PathwaySet> {
        self.pathways.get(name)
    }

    /// Pathways in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = &PathwaySet> {
        let mut sets: Vec<&PathwaySet> = self.pathways.values().collect();
        sets.sort_by(|a, b| a.name.cmp(&b.name));
        sets.into_iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Load the catalog selected by `source`.
///
/// # Arguments
///
/// * `source` - A built-in catalog, or a `.json`/`.gmt` file
///
/// # Returns
///
/// The loaded catalog, or [`AnnotationError::CatalogLoad`](crate::error::AnnotationError)
/// when the file is unreadable, malformed, repeats a pathway or holds no pathways.
///
/// # Example
///
/// ```rust
/// use single_annotation::catalog::{self, CatalogSource};
///
/// let source = CatalogSource::resolve("hallmark", None).unwrap();
/// let hallmark = catalog::load(&source).unwrap();
/// assert!(!hallmark.is_empty());
/// ```
pub fn load(source: &CatalogSource) -> Result<PathwayCatalog> {
    let catalog = match source {
        CatalogSource::BuiltIn(id) => id.load()?,
        CatalogSource::External(path) => io::read_catalog_file(path)?,
    };
    info!(
        "Loaded pathway catalog {:?} with {} pathways",
        source,
        catalog.len()
    );
    Ok(catalog)
}

/// Parse a built-in identifier and load it.
pub fn load_builtin(id: &str) -> Result<PathwayCatalog> {
    let id: BuiltInCatalog = id.parse()?;
    load(&CatalogSource::BuiltIn(id))
}
