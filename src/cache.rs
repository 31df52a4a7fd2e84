use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw backend output, kept so the same generation can be re-parsed in another mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedGeneration {
    pub model: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerationCacheKey {
    pub prompt_hash: String,
}

impl GenerationCacheKey {
    pub fn new(model: &str, prompt: &str) -> Self {
        Self {
            prompt_hash: compute_prompt_hash(model, prompt),
        }
    }
}

pub struct GenerationCache {
    cache_dir: PathBuf,
}

impl GenerationCache {
    pub async fn new() -> Result<Self> {
        Self::at(get_cache_directory()?).await
    }

    pub async fn at(cache_dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&cache_dir)
            .await
            .context("Failed to create cache directory")?;

        Ok(Self { cache_dir })
    }

    pub async fn get(&self, key: &GenerationCacheKey) -> Option<CachedGeneration> {
        match cacache::read(&self.cache_dir, &key.prompt_hash).await {
            Ok(data) => serde_json::from_slice(&data).ok(),
            Err(_) => None,
        }
    }

    pub async fn insert(&self, key: GenerationCacheKey, value: CachedGeneration) {
        if let Ok(serialized) = serde_json::to_vec(&value) {
            if let Err(error) = cacache::write(&self.cache_dir, &key.prompt_hash, serialized).await
            {
                tracing::debug!("Failed to write generation cache entry: {error}");
            }
        }
    }
}

fn get_cache_directory() -> Result<PathBuf> {
    let cache_base = dirs::cache_dir().context("Failed to determine cache directory")?;
    Ok(cache_base.join(env!("CARGO_CRATE_NAME")))
}

pub fn compute_prompt_hash(model: &str, prompt: &str) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update(prompt.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_hash_is_stable_and_model_sensitive() {
        let hash = compute_prompt_hash("model-a", "prompt");
        assert_eq!(hash, compute_prompt_hash("model-a", "prompt"));
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, compute_prompt_hash("model-b", "prompt"));
        assert_ne!(
            compute_prompt_hash("ab", "c"),
            compute_prompt_hash("a", "bc")
        );
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = GenerationCache::at(dir.path().join("cache")).await.unwrap();
        let key = GenerationCacheKey::new("model", "prompt");

        assert!(cache.get(&key).await.is_none());

        let value = CachedGeneration {
            model: "model".to_owned(),
            text: "DIALOGUE 1:\nPersonne A: Hola\nPersonne B: Adiós\nFIN DIALOGUE 1".to_owned(),
        };
        cache.insert(key.clone(), value.clone()).await;

        assert_eq!(cache.get(&key).await, Some(value));
        assert!(
            cache
                .get(&GenerationCacheKey::new("other", "prompt"))
                .await
                .is_none()
        );
    }
}
