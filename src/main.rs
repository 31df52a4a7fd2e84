mod audio;
mod cache;
mod dialogue;
mod generation;
mod store;
mod vocab;

use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use audio::{Side, SpeechClient, SpeechSettings};
use dialogue::{DialogueParser, DialogueTurn, ParseMode, ParseRequest, SpeakerLabels};
use generation::GenerationSettings;
use generation::anthropic::AnthropicClient;
use generation::prompt::{PromptSource, SourceKind};

#[derive(Deserialize, Debug)]
struct Environment {
    anthropic_api_key: Option<String>,
    elevenlabs_api_key: Option<String>,
}

#[derive(StructOpt, Debug)]
#[structopt(
    name = "dialogue-drill",
    about = "Generate two-person practice dialogues and optionally voice them"
)]
struct Args {
    /// Directory receiving dialogues.json and the audio files
    #[structopt(short, long)]
    output: PathBuf,

    /// Path to the TOML configuration file
    #[structopt(short = "c", long)]
    config: PathBuf,

    /// How dialogues are located in the generated text (tagged or positional)
    #[structopt(short = "m", long, default_value = "tagged")]
    mode: ParseMode,

    /// Number of dialogues to request (the story source always uses 2)
    #[structopt(short = "n", long, default_value = "3")]
    count: usize,

    /// What the dialogues are drawn from (text, youtube or story)
    #[structopt(short = "s", long, default_value = "text")]
    source: SourceKind,

    /// Video URL for the youtube source
    #[structopt(long)]
    url: Option<String>,

    /// Theme for the story source
    #[structopt(long)]
    theme: Option<String>,

    /// Synthesize an MP3 for every utterance
    #[structopt(long)]
    speak: bool,

    /// Always call the generation backend, ignoring cached replies
    #[structopt(long)]
    no_cache: bool,

    /// Reuse the dialogues.json already in the output directory instead of generating
    #[structopt(long)]
    resume: bool,

    /// Add the words on standard input to vocabulary.json, each with a generated synthesis
    #[structopt(long)]
    vocab: bool,

    /// Comma-separated tags recorded on newly added vocabulary words
    #[structopt(long)]
    tags: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct Config {
    voices: HashMap<String, String>,
    labels: SpeakerLabels,
    generation: GenerationSettings,
    speech: SpeechSettings,
}

fn read_stdin() -> anyhow::Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read standard input")?;
    Ok(input)
}

/// Vocabulary lists arrive one word per line or comma separated.
fn split_words(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect()
}

fn validate_labels(labels: &SpeakerLabels) -> anyhow::Result<()> {
    if labels.speaker_a.trim().is_empty() || labels.speaker_b.trim().is_empty() {
        bail!("Both [labels] speaker_a and speaker_b must be non-empty");
    }
    if labels.speaker_a.trim().eq_ignore_ascii_case(labels.speaker_b.trim()) {
        bail!("[labels] speaker_a and speaker_b must differ");
    }
    Ok(())
}

fn prompt_source(args: &Args) -> anyhow::Result<PromptSource> {
    if args.count == 0 && args.source != SourceKind::Story {
        bail!("--count must be at least 1");
    }

    Ok(match args.source {
        SourceKind::Text => {
            let text = read_stdin()?;
            if text.trim().is_empty() {
                bail!("No source text provided on standard input");
            }
            PromptSource::Text { text }
        }
        SourceKind::Youtube => PromptSource::YouTube {
            url: args
                .url
                .clone()
                .context("--url is required for the youtube source")?,
        },
        SourceKind::Story => {
            let words = split_words(&read_stdin()?);
            if words.is_empty() {
                bail!("No vocabulary words provided on standard input");
            }
            PromptSource::Story {
                words,
                theme: args
                    .theme
                    .clone()
                    .context("--theme is required for the story source")?,
            }
        }
    })
}

async fn complete_cached(
    generation_cache: &cache::GenerationCache,
    client: &AnthropicClient,
    prompt: &str,
    settings: &GenerationSettings,
    use_cache: bool,
) -> anyhow::Result<cache::CachedGeneration> {
    let cache_key = cache::GenerationCacheKey::new(&settings.model, prompt);

    if use_cache {
        if let Some(cached) = generation_cache.get(&cache_key).await {
            info!("Using cached generation");
            return Ok(cached);
        }
    }

    let text = client.complete(prompt, settings).await?;
    let generated = cache::CachedGeneration {
        model: settings.model.clone(),
        text,
    };
    generation_cache.insert(cache_key, generated.clone()).await;
    Ok(generated)
}

async fn track_vocabulary(
    args: &Args,
    config: &Config,
    environment: &Environment,
) -> anyhow::Result<()> {
    let api_key = environment
        .anthropic_api_key
        .as_deref()
        .context("ANTHROPIC_API_KEY environment variable not set")?;

    let words = split_words(&read_stdin()?);
    if words.is_empty() {
        bail!("No vocabulary words provided on standard input");
    }
    let tags = args.tags.as_deref().map(split_words).unwrap_or_default();

    let mut book = vocab::VocabBook::load(&args.output).await?;
    let generation_cache = cache::GenerationCache::new().await?;
    let client = AnthropicClient::new(api_key);
    let mut added = 0;

    for word in &words {
        if book.contains(word) {
            warn!("'{word}' is already in the vocabulary, skipping.");
            continue;
        }

        info!("Generating synthesis for '{word}'…");
        let generated = complete_cached(
            &generation_cache,
            &client,
            &vocab::synthesis_prompt(word),
            &config.generation,
            !args.no_cache,
        )
        .await?;

        if generated.text.trim().is_empty() {
            warn!("Empty synthesis generated for '{word}'");
        }

        if book.add(vocab::VocabEntry::new(word, &generated.text, &tags)?) {
            added += 1;
        }
    }

    let path = book.save(&args.output).await?;
    info!(
        "Added {added} of {} words to {}",
        words.len(),
        path.display()
    );

    Ok(())
}

async fn generate(
    args: &Args,
    config: &Config,
    environment: &Environment,
) -> anyhow::Result<Vec<DialogueTurn>> {
    let api_key = environment
        .anthropic_api_key
        .as_deref()
        .context("ANTHROPIC_API_KEY environment variable not set")?;
    let source = prompt_source(args)?;
    let count = source.dialogue_count(args.count);
    let prompt = source.render(count, &config.labels);

    let generation_cache = cache::GenerationCache::new().await?;
    let client = AnthropicClient::new(api_key);

    info!(model = %config.generation.model, count, "Generating dialogues…");
    let generated = complete_cached(
        &generation_cache,
        &client,
        &prompt,
        &config.generation,
        !args.no_cache,
    )
    .await?;

    let parser = DialogueParser::new(args.mode, config.labels.clone());
    let turns = parser.parse(ParseRequest {
        raw_text: &generated.text,
        expected_count: count,
    });

    let placeholders = turns.iter().filter(|turn| turn.placeholder).count();
    if placeholders > 0 {
        warn!("{placeholders} of {count} dialogues could not be extracted and were replaced");
    }
    if turns.len() < count {
        warn!(
            "Only {} of {count} dialogues found in {} mode",
            turns.len(),
            parser.mode()
        );
    }

    let dialogue_file = store::DialogueFile::new(
        source.title(),
        generated.model,
        parser.mode(),
        count,
        &turns,
    );
    let path = store::save(&args.output, &dialogue_file).await?;
    info!("Wrote {} dialogues to {}", turns.len(), path.display());

    Ok(turns)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dialogue_drill=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let environment = envy::from_env::<Environment>()?;
    let args = Args::from_args();

    let config: Config = toml::from_str(
        &tokio::fs::read_to_string(&args.config)
            .await
            .context("Failed to read config file")?,
    )
    .context("Failed to parse config TOML")?;
    validate_labels(&config.labels)?;

    if args.vocab {
        return track_vocabulary(&args, &config, &environment).await;
    }

    let turns = if args.resume {
        let stored = store::load(&args.output).await?;
        info!(
            "Loaded {} dialogues from {}",
            stored.dialogues.len(),
            store::dialogues_path(&args.output).display()
        );
        stored.turns()
    } else {
        generate(&args, &config, &environment).await?
    };

    if !args.speak {
        return Ok(());
    }

    let api_key = environment
        .elevenlabs_api_key
        .context("ELEVENLABS_API_KEY environment variable not set")?;
    let speech = SpeechClient::new(api_key, config.speech);
    let total = turns.len();

    info!("Generating audio…");

    for (index, turn) in turns.iter().enumerate() {
        let index = index + 1;

        if turn.placeholder {
            info!("Dialogue {index} is a placeholder, skipping.");
            continue;
        }

        for side in [Side::A, Side::B] {
            let file_path = audio::utterance_path(&args.output, index, total, side);

            if file_path
                .metadata()
                .is_ok_and(|metadata| metadata.len() > 0)
            {
                info!("{} exists, skipping.", file_path.display());
                continue;
            }

            let voice_id = audio::voice_for(&config.voices, side)?;

            info!("Generating audio for dialogue {index}/{total}, speaker {side}…");

            speech
                .synthesize(side.words(turn), voice_id, &file_path)
                .await?;
        }
    }

    info!("Successfully generated audio for {total} dialogues.");

    Ok(())
}
