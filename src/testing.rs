//! In-process stand-ins for the external services, shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ai::TextModel;
use crate::error::{AppError, Result};
use crate::models::{ImageCandidate, UploadedMedia};
use crate::services::{ImageProvider, MediaHost};

pub struct FakeTextModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeTextModel {
    /// Answers with `replies` in order, then fails.
    pub fn replying(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::replying(Vec::new())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextModel for FakeTextModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::GeminiApi("no scripted reply".to_string()))
    }

    fn model_version(&self) -> &str {
        "fake-model"
    }
}

pub struct FakeImageProvider {
    name: String,
    hits: Option<usize>,
    calls: Arc<AtomicUsize>,
}

impl FakeImageProvider {
    pub fn with_hits(name: &str, hits: usize) -> Self {
        Self {
            name: name.to_string(),
            hits: Some(hits),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn empty(name: &str) -> Self {
        Self::with_hits(name, 0)
    }

    pub fn failing(name: &str) -> Self {
        Self {
            hits: None,
            ..Self::empty(name)
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl ImageProvider for FakeImageProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, keyword: &str, count: usize) -> Result<Vec<ImageCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hits = self
            .hits
            .ok_or_else(|| AppError::ImageSearch(format!("{} is down", self.name)))?;

        Ok((0..hits.min(count))
            .map(|i| ImageCandidate {
                url: format!("https://images.test/{}/{}/{}.jpg", self.name, keyword, i),
                description: keyword.to_string(),
                photographer: "Tester".to_string(),
                source: self.name.clone(),
            })
            .collect())
    }
}

/// Hosts images under `https://media.test/<id>.jpg`.
#[derive(Default)]
pub struct FakeMediaHost {
    fail_uploads: bool,
    fail_destroys: bool,
    uploads: Mutex<Vec<String>>,
    destroyed: Mutex<Vec<String>>,
}

impl FakeMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn failing_destroys() -> Self {
        Self {
            fail_destroys: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    /// Every id `destroy` was called with, failed attempts included.
    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaHost for FakeMediaHost {
    async fn upload(&self, url: &str) -> Result<UploadedMedia> {
        if self.fail_uploads {
            return Err(AppError::MediaHost("upload rejected".to_string()));
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(url.to_string());
        let media_id = format!("m{}", uploads.len());
        Ok(UploadedMedia {
            url: format!("https://media.test/{}.jpg", media_id),
            media_id,
            width: 1200,
            height: 800,
        })
    }

    async fn destroy(&self, media_id: &str) -> Result<()> {
        self.destroyed.lock().unwrap().push(media_id.to_string());
        if self.fail_destroys {
            return Err(AppError::MediaHost(format!("cannot destroy {}", media_id)));
        }
        Ok(())
    }

    fn media_ids_in(&self, markup: &str) -> Vec<String> {
        markup
            .match_indices("https://media.test/")
            .filter_map(|(at, prefix)| {
                let rest = &markup[at + prefix.len()..];
                let id: String = rest
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                    .collect();
                (!id.is_empty()).then_some(id)
            })
            .collect()
    }
}
