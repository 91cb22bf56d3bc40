//! atopix-ranker — Gene-level summaries used for visualization.

pub mod variance;
pub mod stats;

pub use stats::{gene_statistics, GeneStatistics};
pub use variance::{population_variance, top_variant_genes, DEFAULT_TOP_GENES};
