use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use crate::catalog::PathwayCatalog;
use crate::error::{AnnotationError, Result};

/// Pathways of a JSON catalog in file order. Repeated names are kept so that
/// [`PathwayCatalog::from_sets`] can reject them.
struct JsonPathways(Vec<(String, Vec<String>)>);

impl<'de> Deserialize<'de> for JsonPathways {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = JsonPathways;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of pathway name -> array of gene identifiers")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, Vec<String>>()? {
                    entries.push(entry);
                }
                Ok(JsonPathways(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Parse a JSON object mapping pathway name to an array of gene identifiers.
///
/// # Arguments
///
/// * `content` - JSON text, e.g. `{"T cells": ["CD3E", "CD3D"]}`
///
/// # Returns
///
/// The catalog, or an error when the text is not an object of string arrays, a pathway
/// has no genes, or a pathway name appears more than once.
pub fn parse_json(content: &str) -> anyhow::Result<PathwayCatalog> {
    let JsonPathways(entries) =
        serde_json::from_str(content).context("Catalog is not a JSON object of gene lists")?;
    PathwayCatalog::from_sets(entries)
}

/// Parse a GMT file: `name<TAB>description<TAB>gene1<TAB>gene2...` per line.
///
/// Blank lines and lines starting with `#` are skipped. The description column is
/// required but ignored.
pub fn parse_gmt(content: &str) -> anyhow::Result<PathwayCatalog> {
    let mut sets: Vec<(String, Vec<String>)> = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split('\t');
        let name = fields
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| anyhow!("Line {}: missing pathway name", line_no + 1))?;
        if fields.next().is_none() {
            return Err(anyhow!("Line {}: missing description column", line_no + 1));
        }
        sets.push((name.to_string(), fields.map(str::to_string).collect()));
    }

    PathwayCatalog::from_sets(sets)
}

pub(crate) fn read_catalog_file(path: &Path) -> Result<PathwayCatalog> {
    let content =
        fs::read_to_string(path).map_err(|e| AnnotationError::catalog_load(path, e))?;

    let is_gmt = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gmt"));

    let parsed = if is_gmt {
        parse_gmt(&content)
    } else {
        parse_json(&content)
    };
    parsed.map_err(|e| AnnotationError::catalog_load(path, format!("{:#}", e)))
}
