use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::analysis::AudioAnalysis;
use crate::config::APP_DIR;
use crate::conversation::Media;

/// On-disk cache of audio analyses, keyed by the SHA-256 of the audio.
pub struct TranscriptCache {
    cache_dir: PathBuf,
}

impl TranscriptCache {
    pub async fn new() -> Result<Self> {
        Self::at(get_cache_directory()?).await
    }

    pub async fn at(cache_dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&cache_dir)
            .await
            .context("Failed to create cache directory")?;

        Ok(Self { cache_dir })
    }

    pub async fn get(&self, audio: &Media) -> Option<AudioAnalysis> {
        match cacache::read(&self.cache_dir, cache_key(audio)).await {
            Ok(data) => serde_json::from_slice(&data).ok(),
            Err(_) => None,
        }
    }

    pub async fn insert(&self, audio: &Media, value: &AudioAnalysis) {
        if let Ok(serialized) = serde_json::to_vec(value) {
            let _ = cacache::write(&self.cache_dir, cache_key(audio), serialized).await;
        }
    }
}

fn get_cache_directory() -> Result<PathBuf> {
    let cache_base = dirs::cache_dir().context("Failed to determine cache directory")?;
    Ok(cache_base.join(APP_DIR).join("transcripts"))
}

pub fn cache_key(audio: &Media) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(audio.mime_type.as_bytes());
    hasher.update(audio.bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_depends_on_content() {
        let a = Media::from_bytes("audio/mp3", b"one");
        let b = Media::from_bytes("audio/mp3", b"two");
        assert_eq!(cache_key(&a), cache_key(&a.clone()));
        assert_ne!(cache_key(&a), cache_key(&b));
        assert_eq!(cache_key(&a).len(), 64);
    }

    #[tokio::test]
    async fn stores_and_returns_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TranscriptCache::at(dir.path().join("cache")).await.unwrap();
        let audio = Media::from_bytes("audio/wav", b"RIFF");
        assert!(cache.get(&audio).await.is_none());

        let analysis = AudioAnalysis {
            transcribed_text: "hello".into(),
            ..Default::default()
        };
        cache.insert(&audio, &analysis).await;
        assert_eq!(cache.get(&audio).await, Some(analysis));
    }
}
