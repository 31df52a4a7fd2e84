use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::dialogue::{DialogueTurn, ParseMode};

const DIALOGUES_FILE: &str = "dialogues.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueRecord {
    pub dialogue_number: usize,
    pub speaker_a: String,
    pub speaker_b: String,
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueFile {
    pub source: String,
    pub model: String,
    pub mode: ParseMode,
    pub requested: usize,
    pub dialogues: Vec<DialogueRecord>,
}

impl DialogueFile {
    pub fn new(
        source: String,
        model: String,
        mode: ParseMode,
        requested: usize,
        turns: &[DialogueTurn],
    ) -> Self {
        let dialogues = turns
            .iter()
            .enumerate()
            .map(|(index, turn)| DialogueRecord {
                dialogue_number: index + 1,
                speaker_a: turn.speaker_a.clone(),
                speaker_b: turn.speaker_b.clone(),
                placeholder: turn.placeholder,
            })
            .collect();

        Self {
            source,
            model,
            mode,
            requested,
            dialogues,
        }
    }

    pub fn turns(&self) -> Vec<DialogueTurn> {
        self.dialogues
            .iter()
            .map(|record| DialogueTurn {
                speaker_a: record.speaker_a.clone(),
                speaker_b: record.speaker_b.clone(),
                placeholder: record.placeholder,
            })
            .collect()
    }
}

pub fn dialogues_path(output_dir: &Path) -> PathBuf {
    output_dir.join(DIALOGUES_FILE)
}

pub async fn save(output_dir: &Path, file: &DialogueFile) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .context("Failed to create output directory")?;

    let path = dialogues_path(output_dir);
    let serialized = serde_json::to_vec_pretty(file).context("Failed to serialize dialogues")?;
    tokio::fs::write(&path, serialized)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

pub async fn load(output_dir: &Path) -> Result<DialogueFile> {
    let path = dialogues_path(output_dir);
    let data = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_slice(&data).with_context(|| format!("Failed to parse {}", path.display()))
}
