#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use consistent_rank::{
    rank_with_config, ComparisonSet, DuplicatePolicy, RankingConfig, TolerantConfig, Variant,
};

#[derive(Parser)]
#[command(
    name = "consistent-rank",
    version,
    about = "Consistent rankings from noisy pairwise comparisons"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank items from a comparisons JSON file
    Rank {
        #[arg(long)]
        input: PathBuf,
        /// Write the ranking here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// RankingConfig JSON; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum)]
        variant: Option<CliVariant>,
        /// Tie band width around 0.5 (tolerant variant)
        #[arg(long)]
        equal_width: Option<f64>,
        /// Rank surrogate bound (tolerant variant); defaults to the node count
        #[arg(long)]
        max_rank: Option<usize>,
        #[arg(long, value_enum)]
        duplicates: Option<CliDuplicatePolicy>,
    },
    /// Print the canonical comparisons and node list without solving
    Normalize {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "reject")]
        duplicates: CliDuplicatePolicy,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliVariant {
    Basic,
    Tolerant,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDuplicatePolicy {
    Reject,
    Average,
    LastWins,
}

impl From<CliDuplicatePolicy> for DuplicatePolicy {
    fn from(value: CliDuplicatePolicy) -> Self {
        match value {
            CliDuplicatePolicy::Reject => DuplicatePolicy::Reject,
            CliDuplicatePolicy::Average => DuplicatePolicy::Average,
            CliDuplicatePolicy::LastWins => DuplicatePolicy::LastWins,
        }
    }
}

/// `{"comparisons": [{"a": "x", "b": "y", "strength": 0.8}]}`
#[derive(Debug, Deserialize)]
struct ComparisonsFile {
    comparisons: Vec<ComparisonRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ComparisonRecord {
    a: String,
    b: String,
    /// Probability that `a` dominates `b`.
    strength: f64,
}

#[derive(Debug, Serialize)]
struct NormalizedOutput {
    nodes: Vec<String>,
    comparisons: Vec<ComparisonRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rank {
            input,
            out,
            config,
            variant,
            equal_width,
            max_rank,
            duplicates,
        } => {
            let mut cfg: RankingConfig = match config {
                Some(path) => read_json(&path)?,
                None => RankingConfig::default(),
            };
            apply_overrides(&mut cfg, variant, equal_width, max_rank, duplicates);

            let file: ComparisonsFile = read_json(&input)?;
            warn_on_duplicates(&file.comparisons, cfg.duplicates);
            let ranking = rank_with_config(pairs_of(file.comparisons), &cfg)?;
            emit(out.as_ref(), &ranking)?;
        }
        Commands::Normalize {
            input,
            out,
            duplicates,
        } => {
            let file: ComparisonsFile = read_json(&input)?;
            let policy = duplicates.into();
            warn_on_duplicates(&file.comparisons, policy);
            let set = ComparisonSet::normalize(pairs_of(file.comparisons), policy)?;
            let nodes = set.nodes();
            let normalized = NormalizedOutput {
                nodes: nodes.to_vec(),
                comparisons: set
                    .pairs()
                    .iter()
                    .map(|p| ComparisonRecord {
                        a: nodes[p.i].clone(),
                        b: nodes[p.j].clone(),
                        strength: p.strength,
                    })
                    .collect(),
            };
            emit(out.as_ref(), &normalized)?;
        }
    }

    Ok(())
}

/// Explicit flags win over the config file. A tolerant-only flag implies the tolerant variant.
fn apply_overrides(
    cfg: &mut RankingConfig,
    variant: Option<CliVariant>,
    equal_width: Option<f64>,
    max_rank: Option<usize>,
    duplicates: Option<CliDuplicatePolicy>,
) {
    if let Some(policy) = duplicates {
        cfg.duplicates = policy.into();
    }

    let wants_tolerant = match variant {
        Some(CliVariant::Basic) => false,
        Some(CliVariant::Tolerant) => true,
        None => matches!(cfg.variant, Variant::Tolerant(_)) || equal_width.is_some() || max_rank.is_some(),
    };
    if !wants_tolerant {
        cfg.variant = Variant::Basic;
        return;
    }

    let mut tolerant = match cfg.variant {
        Variant::Tolerant(t) => t,
        Variant::Basic => TolerantConfig::default(),
    };
    if let Some(w) = equal_width {
        tolerant.equal_width = w;
    }
    if max_rank.is_some() {
        tolerant.max_rank = max_rank;
    }
    cfg.variant = Variant::Tolerant(tolerant);
}

fn pairs_of(records: Vec<ComparisonRecord>) -> impl Iterator<Item = ((String, String), f64)> {
    records.into_iter().map(|r| ((r.a, r.b), r.strength))
}

fn warn_on_duplicates(records: &[ComparisonRecord], policy: DuplicatePolicy) {
    if policy == DuplicatePolicy::Reject {
        return;
    }
    let mut seen = std::collections::HashSet::new();
    for r in records {
        let key = if r.a <= r.b {
            (r.a.as_str(), r.b.as_str())
        } else {
            (r.b.as_str(), r.a.as_str())
        };
        if !seen.insert(key) {
            warn!(a = key.0, b = key.1, ?policy, "merging repeated comparison");
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &PathBuf,
) -> Result<T, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn emit<T: Serialize>(out: Option<&PathBuf>, value: &T) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    match out {
        Some(path) => std::fs::write(path, json),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
