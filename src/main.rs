use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;

use single_annotation::annotate::{AnnotationConfig, SeedStrategy, annotate_clusters};
use single_annotation::catalog::{self, CatalogSource};
use single_annotation::ranking::RankedGeneList;
use single_annotation::selection::ClusterLabel;

/// Label clusters with cell types by preranked gene set enrichment
#[derive(Parser, Debug)]
#[command(version, about, long_about)]
struct Cli {
    /// Ranked genes, one `cluster<TAB>gene<TAB>score` row per line
    #[arg(long)]
    ranks: PathBuf,

    /// Built-in catalog (cell_markers or hallmark)
    #[arg(long, default_value = "cell_markers")]
    catalog: String,

    /// Catalog file (.json or .gmt); overrides --catalog
    #[arg(long)]
    catalog_file: Option<PathBuf>,

    /// JSON annotation config; command-line values take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_size: Option<usize>,

    #[arg(long)]
    max_size: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Seed cluster c with seed + c instead of sharing one seed
    #[arg(long, default_value_t = false)]
    per_cluster_seeds: bool,

    /// Output labels; stdout if omitted
    #[arg(long, short)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let source = CatalogSource::resolve(&cli.catalog, cli.catalog_file.clone())?;
    let catalog = catalog::load(&source)?;

    let mut config = match &cli.config {
        Some(path) => AnnotationConfig::from_json_file(path)?,
        None => AnnotationConfig::default(),
    };
    if let Some(min_size) = cli.min_size {
        config.min_size = min_size;
    }
    if let Some(max_size) = cli.max_size {
        config.max_size = max_size;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if cli.per_cluster_seeds {
        config.seed_strategy = SeedStrategy::PerCluster;
    }

    let ranks = read_ranks(&cli.ranks)?;
    info!(
        "Read ranked genes for {} clusters from {}",
        ranks.len(),
        cli.ranks.display()
    );

    let labels = annotate_clusters(&ranks, &catalog, &config)?;

    match &cli.out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            write_labels(BufWriter::new(file), &labels)?;
            info!("Wrote {} labels to {}", labels.len(), path.display());
        }
        None => write_labels(std::io::stdout().lock(), &labels)?,
    }

    Ok(())
}

fn read_ranks(path: &Path) -> anyhow::Result<BTreeMap<usize, RankedGeneList>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    parse_ranks(BufReader::new(file), &path.display().to_string())
}

/// Parse `cluster<TAB>gene<TAB>score` rows. Blank lines and `#` comments are skipped.
/// The first remaining row is a header when its cluster column is not an integer; any
/// other row that does not parse is an error.
fn parse_ranks<R: BufRead>(
    reader: R,
    origin: &str,
) -> anyhow::Result<BTreeMap<usize, RankedGeneList>> {
    let mut rows: BTreeMap<usize, Vec<(String, f64)>> = BTreeMap::new();
    let mut first_row = true;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let at = format!("{}:{}", origin, line_no + 1);

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let is_first = std::mem::replace(&mut first_row, false);

        let cluster = match fields[0].parse::<usize>() {
            Ok(cluster) => cluster,
            Err(_) if is_first => continue,
            Err(e) => anyhow::bail!("{}: bad cluster id '{}': {}", at, fields[0], e),
        };
        if fields.len() < 3 {
            anyhow::bail!("{}: expected cluster, gene and score columns", at);
        }
        let score: f64 = fields[2]
            .parse()
            .with_context(|| format!("{}: bad score '{}'", at, fields[2]))?;

        rows.entry(cluster)
            .or_default()
            .push((fields[1].to_string(), score));
    }

    rows.into_iter()
        .map(|(cluster, pairs)| {
            let list = RankedGeneList::new(pairs)
                .with_context(|| format!("cluster {}", cluster))?;
            Ok((cluster, list))
        })
        .collect()
}

fn write_labels<W: Write>(mut out: W, labels: &[ClusterLabel]) -> anyhow::Result<()> {
    writeln!(out, "cluster\tlabel\tnes\tpadj")?;
    for label in labels {
        let fmt = |v: Option<f64>| v.map_or_else(|| "NA".to_string(), |v| format!("{}", v));
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            label.cluster,
            label.label,
            fmt(label.nes),
            fmt(label.padj)
        )?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> anyhow::Result<BTreeMap<usize, RankedGeneList>> {
        parse_ranks(Cursor::new(text), "ranks.tsv")
    }

    #[test]
    fn test_parse_ranks_groups_by_cluster() {
        let ranks = parse("0\tA\t1.5\n1\tB\t-2\n0\tC\t3.0\n").unwrap();
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[&0].genes(), &["C".to_string(), "A".to_string()]);
        assert_eq!(ranks[&1].score("B"), Some(-2.0));
    }

    #[test]
    fn test_header_after_comment() {
        let ranks = parse("# exported ranks\n\ncluster\tgene\tscore\n0\tA\t1.0\n").unwrap();
        assert_eq!(ranks[&0].genes(), &["A".to_string()]);
    }

    #[test]
    fn test_bad_score_in_first_row_is_an_error() {
        let err = parse("0\tA\t1.O\n0\tB\t2.0\n").unwrap_err();
        assert!(err.to_string().contains("ranks.tsv:1"));
        assert!(err.to_string().contains("bad score"));
    }

    #[test]
    fn test_only_first_row_may_be_a_header() {
        assert!(parse("cluster\tgene\tscore\nx\tA\t1.0\n").is_err());
        assert!(parse("0\tA\n").is_err());
        assert!(parse("0\tA\t1.0\n0\tA\t2.0\n").is_err());
    }

    #[test]
    fn test_read_ranks_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranks.tsv");
        std::fs::write(&path, "cluster\tgene\tscore\n2\tA\t0.5\n").unwrap();
        let ranks = read_ranks(&path).unwrap();
        assert_eq!(ranks.keys().copied().collect::<Vec<_>>(), vec![2]);
        assert!(read_ranks(&dir.path().join("missing.tsv")).is_err());
    }

    #[test]
    fn test_write_labels_marks_unidentified_as_na() {
        let labels = vec![
            ClusterLabel {
                cluster: 0,
                label: "T cells".to_string(),
                nes: Some(2.5),
                padj: Some(0.001),
            },
            ClusterLabel::unidentified(1),
        ];
        let mut out = Vec::new();
        write_labels(&mut out, &labels).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "cluster\tlabel\tnes\tpadj\n0\tT cells\t2.5\t0.001\n1\tunidentified\tNA\tNA\n"
        );
    }
}
