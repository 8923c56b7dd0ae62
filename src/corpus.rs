use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static PASSAGE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/passages");

/// Difficulty tier a passage pool is keyed by
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Default,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Next tier, wrapping around after `Hard`
    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// No passages are configured for the requested tier.
    #[error("no passages configured for difficulty '{0}'")]
    EmptyPool(Difficulty),

    /// A custom passage was supplied but contains no characters.
    #[error("custom passage is empty")]
    EmptyPassage,

    /// An embedded passage file is missing from the build.
    #[error("passage file '{0}' not found")]
    MissingFile(String),

    /// An embedded passage file could not be deserialized.
    #[error("passage file '{file}' is malformed: {source}")]
    Malformed {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The fixed text a user is asked to reproduce. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceText {
    text: String,
    chars: Vec<char>,
}

impl ReferenceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chars = text.chars().collect();
        Self { text, chars }
    }

    /// Build from caller-supplied text, refusing an empty passage
    pub fn custom(text: impl Into<String>) -> Result<Self, CorpusError> {
        let reference = Self::new(text);
        if reference.is_empty() {
            return Err(CorpusError::EmptyPassage);
        }
        Ok(reference)
    }

    /// Length in characters, not bytes
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for ReferenceText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[allow(dead_code)]
#[derive(Deserialize, Clone, Debug)]
struct PassageFile {
    name: String,
    size: u32,
    passages: Vec<String>,
}

/// Pools of reference passages keyed by difficulty
#[derive(Debug, Clone, Default)]
pub struct TextCorpus {
    pools: HashMap<Difficulty, Vec<String>>,
}

impl TextCorpus {
    /// Load the passages embedded in the binary
    pub fn builtin() -> Result<Self, CorpusError> {
        let mut pools = HashMap::new();
        for tier in Difficulty::ALL {
            pools.insert(tier, read_passage_file(&format!("{tier}.json"))?);
        }
        Ok(Self { pools })
    }

    pub fn from_pools(pools: impl IntoIterator<Item = (Difficulty, Vec<String>)>) -> Self {
        Self {
            pools: pools.into_iter().collect(),
        }
    }

    pub fn pool(&self, tier: Difficulty) -> &[String] {
        self.pools.get(&tier).map(Vec::as_slice).unwrap_or_default()
    }

    /// Check every tier has at least one non-empty passage. Run once at startup.
    pub fn validate(&self) -> Result<(), CorpusError> {
        for tier in Difficulty::ALL {
            if !self.pool(tier).iter().any(|p| !p.is_empty()) {
                return Err(CorpusError::EmptyPool(tier));
            }
        }
        Ok(())
    }

    pub fn select_passage(&self, tier: Difficulty) -> Result<ReferenceText, CorpusError> {
        self.select_passage_with(tier, &mut rand::thread_rng())
    }

    /// Uniform pick over the tier's pool. Repeats of the previous passage are allowed.
    pub fn select_passage_with<R: Rng + ?Sized>(
        &self,
        tier: Difficulty,
        rng: &mut R,
    ) -> Result<ReferenceText, CorpusError> {
        let passage = self
            .pool(tier)
            .iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .choose(rng)
            .map(|p| ReferenceText::new(p.as_str()))
            .ok_or(CorpusError::EmptyPool(tier))?;

        tracing::debug!(%tier, len = passage.len(), "passage selected");
        Ok(passage)
    }
}

fn read_passage_file(file_name: &str) -> Result<Vec<String>, CorpusError> {
    let file = PASSAGE_DIR
        .get_file(file_name)
        .ok_or_else(|| CorpusError::MissingFile(file_name.to_string()))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| CorpusError::MissingFile(file_name.to_string()))?;

    let parsed: PassageFile =
        serde_json::from_str(contents).map_err(|source| CorpusError::Malformed {
            file: file_name.to_string(),
            source,
        })?;

    Ok(parsed.passages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_builtin_corpus_has_every_tier() {
        let corpus = TextCorpus::builtin().unwrap();

        for tier in Difficulty::ALL {
            assert_eq!(corpus.pool(tier).len(), 5, "tier {tier}");
        }
        assert!(corpus.validate().is_ok());
    }

    #[test]
    fn test_select_passage_comes_from_pool() {
        let corpus = TextCorpus::builtin().unwrap();

        let passage = corpus.select_passage(Difficulty::Hard).unwrap();
        assert!(corpus
            .pool(Difficulty::Hard)
            .iter()
            .any(|p| p == passage.as_str()));
    }

    #[test]
    fn test_select_passage_is_deterministic_with_seeded_rng() {
        let corpus = TextCorpus::builtin().unwrap();

        let a = corpus
            .select_passage_with(Difficulty::Medium, &mut StdRng::seed_from_u64(7))
            .unwrap();
        let b = corpus
            .select_passage_with(Difficulty::Medium, &mut StdRng::seed_from_u64(7))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_select_passage_covers_whole_pool() {
        let corpus = TextCorpus::from_pools([(
            Difficulty::Easy,
            vec!["one".to_string(), "two".to_string()],
        )]);
        let mut rng = StdRng::seed_from_u64(42);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            let p = corpus.select_passage_with(Difficulty::Easy, &mut rng).unwrap();
            seen.insert(p.as_str().to_string());
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_empty_pool_is_a_config_error() {
        let corpus = TextCorpus::from_pools([(Difficulty::Easy, vec!["hi".to_string()])]);

        assert!(matches!(
            corpus.select_passage(Difficulty::Hard),
            Err(CorpusError::EmptyPool(Difficulty::Hard))
        ));
        assert!(matches!(
            corpus.validate(),
            Err(CorpusError::EmptyPool(Difficulty::Medium))
        ));
    }

    #[test]
    fn test_pool_of_empty_strings_counts_as_empty() {
        let corpus = TextCorpus::from_pools([(Difficulty::Easy, vec![String::new()])]);

        assert!(corpus.select_passage(Difficulty::Easy).is_err());
    }

    #[test]
    fn test_reference_text_counts_chars_not_bytes() {
        let text = ReferenceText::new("héllo");

        assert_eq!(text.len(), 5);
        assert_eq!(text.char_at(1), Some('é'));
        assert_eq!(text.char_at(5), None);
        assert_eq!(text.to_string(), "héllo");
    }

    #[test]
    fn test_custom_passage_rejects_empty() {
        assert!(matches!(
            ReferenceText::custom(""),
            Err(CorpusError::EmptyPassage)
        ));
        assert_eq!(ReferenceText::custom("ok").unwrap().len(), 2);
    }

    #[test]
    fn test_difficulty_display_and_cycle() {
        assert_eq!(Difficulty::Easy.to_string(), "easy");
        assert_eq!(Difficulty::Hard.to_string(), "hard");
        assert_eq!(Difficulty::Easy.next(), Difficulty::Medium);
        assert_eq!(Difficulty::Hard.next(), Difficulty::Easy);
    }

    #[test]
    fn test_malformed_passage_file_is_reported() {
        let err = serde_json::from_str::<PassageFile>("{\"name\": 1}").unwrap_err();
        let wrapped = CorpusError::Malformed {
            file: "bad.json".into(),
            source: err,
        };
        assert!(wrapped.to_string().contains("bad.json"));
    }
}
