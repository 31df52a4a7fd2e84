use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use strum::Display;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::dialogue::DialogueTurn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn words(self, turn: &DialogueTurn) -> &str {
        match self {
            Side::A => &turn.speaker_a,
            Side::B => &turn.speaker_b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            model_id: "eleven_multilingual_v2".to_string(),
            stability: 0.5,
            similarity_boost: 0.5,
        }
    }
}

/// Voice ids keyed by side, as written in the `[voices]` config table.
pub fn voice_for<'a>(voices: &'a HashMap<String, String>, side: Side) -> Result<&'a str> {
    voices
        .get(&side.to_string())
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("No voice ID found for speaker '{side}' in config file"))
}

/// `03-a.mp3`, padded to the width of `total`.
pub fn utterance_file_name(index: usize, total: usize, side: Side) -> String {
    let padding_width = total.to_string().len();
    format!("{:0width$}-{side}.mp3", index, width = padding_width)
}

pub fn utterance_path(dir: &Path, index: usize, total: usize, side: Side) -> PathBuf {
    dir.join(utterance_file_name(index, total, side))
}

#[derive(Debug, Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

pub struct SpeechClient {
    client: reqwest::Client,
    api_key: String,
    settings: SpeechSettings,
}

impl SpeechClient {
    pub fn new(api_key: impl Into<String>, settings: SpeechSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            settings,
        }
    }

    pub async fn synthesize(&self, text: &str, voice_id: &str, file_path: &Path) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            bail!("Refusing to synthesize empty text");
        }

        let request_body = ElevenLabsRequest {
            text,
            model_id: &self.settings.model_id,
            voice_settings: VoiceSettings {
                stability: self.settings.stability,
                similarity_boost: self.settings.similarity_boost,
            },
        };

        let response = self
            .client
            .post(format!(
                "https://api.elevenlabs.io/v1/text-to-speech/{}",
                voice_id
            ))
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .context("Failed to send request to ElevenLabs API")?
            .error_for_status()
            .context("ElevenLabs API error")?;

        let mut file = File::create(file_path)
            .await
            .context("Failed to create output file")?;

        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Failed to read chunk from response")?;
            file.write_all(&chunk)
                .await
                .context("Failed to write chunk to file")?;
        }

        file.flush().await.context("Failed to flush file")?;

        Ok(())
    }
}
