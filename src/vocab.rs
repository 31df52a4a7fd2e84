use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const VOCABULARY_FILE: &str = "vocabulary.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabEntry {
    pub word: String,
    /// Usage notes and example sentences generated for the word.
    pub synthesis: String,
    /// Pronunciation search link.
    pub youglish: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl VocabEntry {
    pub fn new(word: &str, synthesis: &str, tags: &[String]) -> Result<Self> {
        Ok(Self {
            word: word.trim().to_owned(),
            synthesis: synthesis.trim().to_owned(),
            youglish: youglish_url(word.trim())?,
            tags: tags.to_vec(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabBook {
    pub words: Vec<VocabEntry>,
}

impl VocabBook {
    /// Words compare case-insensitively, so `Casa` and `casa` are one entry.
    pub fn contains(&self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        self.words
            .iter()
            .any(|entry| entry.word.to_lowercase() == word)
    }

    /// Returns false, leaving the book unchanged, when the word is already present.
    pub fn add(&mut self, entry: VocabEntry) -> bool {
        if self.contains(&entry.word) {
            return false;
        }
        self.words.push(entry);
        true
    }

    /// A missing file is an empty book.
    pub async fn load(output_dir: &Path) -> Result<Self> {
        let path = vocabulary_path(output_dir);
        match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data)
                .with_context(|| format!("Failed to parse {}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => {
                Err(error).with_context(|| format!("Failed to read {}", path.display()))
            }
        }
    }

    pub async fn save(&self, output_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .context("Failed to create output directory")?;

        let path = vocabulary_path(output_dir);
        let serialized = serde_json::to_vec_pretty(self).context("Failed to serialize vocabulary")?;
        tokio::fs::write(&path, serialized)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}

pub fn vocabulary_path(output_dir: &Path) -> PathBuf {
    output_dir.join(VOCABULARY_FILE)
}

pub fn synthesis_prompt(word: &str) -> String {
    format!(
        "Is the Spanish word '{word}' commonly used? If so, explain its usual meanings \
         with several example sentences in Spanish (without translation). \
         Then, at the end, write 'sinónimos:' followed by its synonyms and \
         'antónimos:' followed by its antonyms."
    )
}

pub fn youglish_url(word: &str) -> Result<String> {
    let mut url = Url::parse("https://youglish.com/pronounce").context("Invalid YouGlish URL")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("YouGlish URL cannot take path segments"))?
        .push(word)
        .push("spanish");
    Ok(url.to_string())
}
