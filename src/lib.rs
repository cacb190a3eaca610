//! Character co-occurrence networks from per-episode appearance records.
//!
//! The pipeline is a strict sequence of pure stages: an episode → characters
//! map becomes binary appearance vectors ([`matrix`]), the vectors become a
//! complete weighted graph ([`graph`]), and the graph is trimmed to the
//! sparsest connected sub-graph above a computed cutoff weight ([`trim`]).
//! The fitted matrix + graph pair can be cached to disk ([`cache`]).

pub mod cache;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod trim;

pub use cache::{fingerprint, Artifact, NetworkCache, NETWORK_FILE};
pub use error::{Error, Result};
pub use graph::{CharacterGraph, GraphBuilder};
pub use matrix::{build_matrix, read_episodes_csv, AppearanceMatrix, DEFAULT_MIN_APPEARANCES};
pub use trim::{trim, TrimResult};
