use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::graph::CharacterGraph;
use crate::matrix::AppearanceMatrix;

/// Default location of the cached network artifact.
pub const NETWORK_FILE: &str = "data/network.json";

/// The fitted matrix + graph pair persisted as one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub matrix: AppearanceMatrix,
    pub graph: CharacterGraph,
}

#[derive(Serialize, Deserialize)]
struct CachedArtifact {
    fingerprint: u64,
    artifact: Artifact,
}

/// Content fingerprint of the inputs that produced an artifact: the
/// serialized matrix plus the build parameters. A changed source or filter
/// yields a different fingerprint, so `load_validated` can reject stale
/// artifacts instead of silently serving them. Not a cryptographic hash;
/// only compared against fingerprints written by the same binary.
pub fn fingerprint(matrix: &AppearanceMatrix, min_appearances: usize) -> Result<u64> {
    let bytes = serde_json::to_vec(matrix)?;
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    min_appearances.hash(&mut hasher);
    Ok(hasher.finish())
}

/// Write-once/read-many cache at a single fixed path. The whole artifact is
/// written atomically (temp file + rename); there is no partially written
/// state to observe.
#[derive(Debug, Clone)]
pub struct NetworkCache {
    path: PathBuf,
}

impl NetworkCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, artifact: &Artifact, fingerprint: u64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let cached = CachedArtifact {
            fingerprint,
            artifact: artifact.clone(),
        };
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&cached)?)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), "saved network artifact");
        Ok(())
    }

    /// Loads the artifact regardless of what produced it.
    pub fn load(&self) -> Result<Artifact> {
        Ok(self.read()?.artifact)
    }

    /// Loads the artifact only if its fingerprint matches the one the
    /// caller computed from the current inputs; a mismatch is reported as a
    /// miss so the caller rebuilds.
    pub fn load_validated(&self, expected_fingerprint: u64) -> Result<Artifact> {
        let cached = self.read()?;
        if cached.fingerprint != expected_fingerprint {
            return Err(Error::NotFound(format!(
                "cached artifact at {} is stale",
                self.path.display()
            )));
        }
        Ok(cached.artifact)
    }

    fn read(&self) -> Result<CachedArtifact> {
        let bytes = fs::read(&self.path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::NotFound(format!("no cached artifact at {}", self.path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Default for NetworkCache {
    fn default() -> Self {
        Self::new(NETWORK_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::matrix::AppearanceMatrix;
    use std::collections::BTreeMap;

    fn sample_artifact() -> Artifact {
        let matrix = AppearanceMatrix::from_vectors(BTreeMap::from([
            ("A".to_string(), vec![1, 1, 0, 0]),
            ("B".to_string(), vec![1, 1, 1, 0]),
            ("C".to_string(), vec![0, 0, 1, 1]),
        ]));
        let graph = GraphBuilder::default().build(&matrix).unwrap();
        Artifact { matrix, graph }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = NetworkCache::new(dir.path().join("network.json"));
        let artifact = sample_artifact();
        let fp = fingerprint(&artifact.matrix, 3).unwrap();

        cache.save(&artifact, fp).unwrap();
        let restored = cache.load_validated(fp).unwrap();

        assert_eq!(restored.matrix, artifact.matrix);
        assert_eq!(restored.graph.node_count(), artifact.graph.node_count());
        assert_eq!(restored.graph.edge_count(), artifact.graph.edge_count());
        assert_eq!(
            restored.graph.relation_weight("A", "B"),
            artifact.graph.relation_weight("A", "B")
        );
    }

    #[test]
    fn missing_artifact_is_a_not_found_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = NetworkCache::new(dir.path().join("network.json"));
        assert!(matches!(cache.load(), Err(Error::NotFound(_))));
    }

    #[test]
    fn stale_fingerprint_is_a_not_found_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = NetworkCache::new(dir.path().join("network.json"));
        let artifact = sample_artifact();
        let fp = fingerprint(&artifact.matrix, 3).unwrap();
        cache.save(&artifact, fp).unwrap();

        let changed = fingerprint(&artifact.matrix, 5).unwrap();
        assert_ne!(fp, changed);
        assert!(matches!(
            cache.load_validated(changed),
            Err(Error::NotFound(_))
        ));
        // Plain load still works for callers that accept staleness.
        assert!(cache.load().is_ok());
    }
}
