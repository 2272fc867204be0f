//! # single-annotation
//!
//! Cell-type annotation of single-cell clusters by preranked gene set enrichment, part of
//! the single-rust ecosystem.
//!
//! Each cluster's genes are ranked by how strongly they separate the cluster from the
//! remaining cells. Every ranked list is then tested against a catalog of marker-gene sets
//! with a weighted running-sum enrichment statistic and an adaptive permutation null. The
//! most significant positively enriched set names the cluster; clusters without one are
//! reported as `"unidentified"`.
//!
//! ## Core Features
//!
//! - **Pathway Catalogs**: built-in cell marker and hallmark catalogs, or JSON/GMT files
//! - **Enrichment**: ES, NES, permutation p-values and per-cluster multiple testing correction
//! - **Label Selection**: significance filter with a fixed padj-then-NES tie-break
//! - **Rank Builder**: one-vs-rest t-test, Mann-Whitney and fold-change ranking on `CsrMatrix`
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use single_annotation::annotate::{annotate_clusters, AnnotationConfig};
//! use single_annotation::catalog::PathwayCatalog;
//! use single_annotation::ranking::RankedGeneList;
//!
//! let catalog = PathwayCatalog::from_sets(vec![("Alpha", vec!["A", "B", "C"])]).unwrap();
//! let ranks = RankedGeneList::new(vec![
//!     ("A", 5.0), ("B", 4.0), ("C", 3.0), ("D", -2.0), ("E", -3.0),
//! ]).unwrap();
//!
//! let config = AnnotationConfig { min_size: 1, max_size: 10, ..Default::default() };
//! let labels = annotate_clusters(&BTreeMap::from([(0, ranks)]), &catalog, &config).unwrap();
//! assert_eq!(labels[0].label, "Alpha");
//! ```
//!
//! ## Module Organization
//!
//! - **[`catalog`]**: Pathway catalogs and their sources
//! - **[`ranking`]**: Ranked gene lists and the one-vs-rest rank builder
//! - **[`enrichment`]**: Preranked enrichment test
//! - **[`selection`]**: Per-cluster label decision
//! - **[`annotate`]**: Orchestration over clusters and cells
//! - **[`testing`]**: Statistical tests and multiple testing correction

pub mod annotate;
pub mod catalog;
pub mod enrichment;
pub mod error;
pub mod ranking;
pub mod selection;
pub mod testing;

pub use error::{AnnotationError, Result};
