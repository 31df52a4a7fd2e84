pub(crate) mod positional;
pub(crate) mod tagged;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub const PLACEHOLDER_SPEAKER_A: &str = "Lo siento, hubo un problema al generar este diálogo.";
pub const PLACEHOLDER_SPEAKER_B: &str = "Por favor, inténtalo de nuevo.";

/// How turns are located in generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// `DIALOGUE n:` ... `FIN DIALOGUE n` blocks with two labelled speaker lines.
    Tagged,
    /// Consecutive non-empty lines, paired A then B.
    Positional,
}

/// One exchange between the two speakers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub speaker_a: String,
    pub speaker_b: String,
    /// Set when extraction failed and the fixed fallback text was substituted.
    #[serde(default)]
    pub placeholder: bool,
}

impl DialogueTurn {
    pub fn new(speaker_a: impl Into<String>, speaker_b: impl Into<String>) -> Self {
        Self {
            speaker_a: speaker_a.into(),
            speaker_b: speaker_b.into(),
            placeholder: false,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            speaker_a: PLACEHOLDER_SPEAKER_A.to_owned(),
            speaker_b: PLACEHOLDER_SPEAKER_B.to_owned(),
            placeholder: true,
        }
    }
}

/// Labels introducing each side inside a tagged block, e.g. `Personne A:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerLabels {
    pub speaker_a: String,
    pub speaker_b: String,
}

impl Default for SpeakerLabels {
    fn default() -> Self {
        Self {
            speaker_a: "Personne A".to_owned(),
            speaker_b: "Personne B".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParseRequest<'a> {
    pub raw_text: &'a str,
    pub expected_count: usize,
}

#[derive(Debug, Clone)]
pub struct DialogueParser {
    mode: ParseMode,
    labels: SpeakerLabels,
}

impl DialogueParser {
    pub fn new(mode: ParseMode, labels: SpeakerLabels) -> Self {
        Self { mode, labels }
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Tagged mode always yields `expected_count` turns; positional mode may
    /// yield fewer when the text runs out of lines.
    pub fn parse(&self, request: ParseRequest<'_>) -> Vec<DialogueTurn> {
        match self.mode {
            ParseMode::Tagged => {
                tagged::extract(request.raw_text, request.expected_count, &self.labels)
            }
            ParseMode::Positional => {
                positional::extract(request.raw_text, request.expected_count)
            }
        }
    }
}

/// Parses with the default `Personne A` / `Personne B` labels.
pub fn parse(raw_text: &str, expected_count: usize, mode: ParseMode) -> Vec<DialogueTurn> {
    DialogueParser::new(mode, SpeakerLabels::default()).parse(ParseRequest {
        raw_text,
        expected_count,
    })
}
