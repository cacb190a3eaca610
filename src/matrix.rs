use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Characters appearing in fewer episodes than this are dropped by default.
pub const DEFAULT_MIN_APPEARANCES: usize = 3;

/// Binary appearance vectors, one per retained character. Every vector has
/// the same length: the number of episodes with at least one recorded
/// character, slots ordered by ascending episode number. The sorted map keeps
/// downstream graph construction deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppearanceMatrix(BTreeMap<String, Vec<u8>>);

impl AppearanceMatrix {
    /// Wraps pre-built vectors. Length consistency is validated when the
    /// matrix reaches the graph builder, not here.
    pub fn from_vectors(vectors: BTreeMap<String, Vec<u8>>) -> Self {
        Self(vectors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, character: &str) -> Option<&[u8]> {
        self.0.get(character).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<u8>)> {
        self.0.iter()
    }

    /// Number of episode slots, 0 for an empty matrix.
    pub fn episode_count(&self) -> usize {
        self.0.values().next().map_or(0, Vec::len)
    }

    /// One row per character: name followed by its binary appearances.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for (character, appearances) in &self.0 {
            let mut row = vec![character.clone()];
            row.extend(appearances.iter().map(u8::to_string));
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct EpisodeRow {
    #[serde(rename = "Episode")]
    episode: String,
    #[serde(rename = "Characters")]
    characters: String,
}

/// Reads an `Episode,Characters` CSV into an episode -> character-list map.
/// The characters field is comma-space separated; rows with a blank field
/// are skipped, matching what the preprocessing step would have removed.
pub fn read_episodes_csv(path: impl AsRef<Path>) -> Result<BTreeMap<String, Vec<String>>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut episodes = BTreeMap::new();
    for row in reader.deserialize() {
        let row: EpisodeRow = row?;
        if row.characters.trim().is_empty() {
            continue;
        }
        let characters = row
            .characters
            .split(", ")
            .map(str::to_string)
            .collect::<Vec<_>>();
        episodes.insert(row.episode, characters);
    }
    Ok(episodes)
}

fn parse_episode_number(label: &str) -> Result<u32> {
    label
        .strip_prefix("Episode ")
        .and_then(|n| n.trim().parse().ok())
        .ok_or_else(|| Error::Data(format!("episode label without a number: {label:?}")))
}

/// Builds one binary appearance vector per character from the episode map,
/// then drops every character appearing in fewer than `min_appearances`
/// episodes. Episodes with an empty character list do not allocate a slot.
pub fn build_matrix(
    episodes: &BTreeMap<String, Vec<String>>,
    min_appearances: usize,
) -> Result<AppearanceMatrix> {
    let mut numbered = Vec::with_capacity(episodes.len());
    let mut episode_numbers = BTreeSet::new();
    for (label, characters) in episodes {
        if characters.is_empty() {
            continue;
        }
        let number = parse_episode_number(label)?;
        episode_numbers.insert(number);
        numbered.push((number, characters));
    }

    if episode_numbers.is_empty() {
        return Err(Error::Data(
            "no episodes with characters; cannot build an appearance matrix".to_string(),
        ));
    }

    let slots = episode_numbers.len();
    let slot_of: HashMap<u32, usize> = episode_numbers
        .into_iter()
        .enumerate()
        .map(|(slot, number)| (number, slot))
        .collect();

    let mut vectors: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    for (number, characters) in numbered {
        for character in characters {
            let vector = vectors
                .entry(character.clone())
                .or_insert_with(|| vec![0; slots]);
            vector[slot_of[&number]] = 1;
        }
    }

    let before = vectors.len();
    vectors.retain(|_, v| appearance_count(v) >= min_appearances);
    debug!(
        retained = vectors.len(),
        dropped = before - vectors.len(),
        episodes = slots,
        "built appearance matrix"
    );
    Ok(AppearanceMatrix(vectors))
}

pub(crate) fn appearance_count(vector: &[u8]) -> usize {
    vector.iter().map(|&bit| bit as usize).sum()
}
