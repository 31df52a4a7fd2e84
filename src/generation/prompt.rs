use regex::Regex;
use std::sync::OnceLock;
use strum::{Display, EnumString};

use crate::dialogue::SpeakerLabels;

const MAX_STORY_WORDS: usize = 75;
const STORY_DIALOGUES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    Text,
    Youtube,
    Story,
}

/// What the generated dialogues are drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Text { text: String },
    YouTube { url: String },
    Story { words: Vec<String>, theme: String },
}

impl PromptSource {
    /// The story flow always asks for two dialogues, one per word group.
    pub fn dialogue_count(&self, requested: usize) -> usize {
        match self {
            PromptSource::Story { .. } => STORY_DIALOGUES,
            _ => requested,
        }
    }

    /// Name the stored dialogue file is recorded under.
    pub fn title(&self) -> String {
        match self {
            PromptSource::Text { .. } => "text".to_owned(),
            PromptSource::YouTube { url } => {
                format!("YouTube_{}", youtube_video_id(url).unwrap_or(url.as_str()))
            }
            PromptSource::Story { theme, .. } => format!("Story_{}", theme.trim()),
        }
    }

    pub fn render(&self, count: usize, labels: &SpeakerLabels) -> String {
        let markers = format_instructions(self.dialogue_count(count), labels);

        match self {
            PromptSource::Text { text } => format!(
                r#"From the following Spanish text, write {count} natural and coherent dialogues in Spanish.

TEXT:
{text}

INSTRUCTIONS:
1. Write {count} distinct dialogues based on the text.
2. Each dialogue is between two people ({a} and {b}).
3. Each line is 2 to 3 complete, natural sentences.
4. Reuse the vocabulary and expressions of the source text.
5. Follow this exact format and add nothing else:

{markers}"#,
                a = labels.speaker_a,
                b = labels.speaker_b,
            ),
            PromptSource::YouTube { url } => format!(
                r#"Imagine you watched a Spanish-language YouTube video at this URL: {url}

Write {count} dialogues in Spanish that could come from this video.

INSTRUCTIONS:
1. Write {count} distinct dialogues imagining the video's content.
2. Each dialogue is between two people ({a} and {b}).
3. Each line is 3 to 4 complete, natural sentences.
4. Follow this exact format and add nothing else:

{markers}"#,
                a = labels.speaker_a,
                b = labels.speaker_b,
            ),
            PromptSource::Story { words, theme } => {
                let (first, second) = split_story_words(words);
                format!(
                    r#"Por favor, crea exactamente {STORY_DIALOGUES} diálogos narrativos, naturales y coherentes en español, que simulen una conversación real entre dos personas.

INSTRUCCIONES:
1. Utiliza exclusivamente las etiquetas '{a}:' y '{b}:' (no uses nombres propios).
2. Cada intervención debe tener 4 a 5 frases completas y naturales.
3. No escribas frases incompletas ni uses 'etc.' o '...'.
4. Conjuga los verbos y ajusta el género de las palabras clave según el contexto.
5. El tema es: {theme}

Para el PRIMER diálogo, integra obligatoriamente: {first}
Para el SEGUNDO diálogo, integra obligatoriamente: {second}

FORMATO EXACTO:

{markers}"#,
                    a = labels.speaker_a,
                    b = labels.speaker_b,
                    first = first.join(", "),
                    second = second.join(", "),
                )
            }
        }
    }
}

fn format_instructions(count: usize, labels: &SpeakerLabels) -> String {
    (1..=count)
        .map(|i| {
            format!(
                "DIALOGUE {i}:\n{}: [...]\n{}: [...]\nFIN DIALOGUE {i}",
                labels.speaker_a, labels.speaker_b
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Caps the vocabulary and splits it in two, the first half taking the odd word.
pub fn split_story_words(words: &[String]) -> (&[String], &[String]) {
    let words = &words[..words.len().min(MAX_STORY_WORDS)];
    words.split_at(words.len().div_ceil(2))
}

fn youtube_id_regex() -> &'static Regex {
    static YOUTUBE_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    YOUTUBE_ID_REGEX.get_or_init(|| {
        Regex::new(
            r#"(?i)(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
        )
        .expect("Failed to compile YouTube id regex")
    })
}

pub fn youtube_video_id(url: &str) -> Option<&str> {
    youtube_id_regex()
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str())
}
