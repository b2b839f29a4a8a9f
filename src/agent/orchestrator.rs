use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::ai::ContentGenerator;
use crate::content::{extract_keywords, interleave_images, PlacedImage};
use crate::db::Repository;
use crate::error::Result;
use crate::models::{NewPost, Topic, UploadedImage};
use crate::services::{ImageSearch, MediaHost};

/// Titles shown to the model so it steers away from repeats.
const RECENT_TITLES: usize = 10;
/// Images sourced from plain keywords when the model suggests none.
const MAX_KEYWORD_IMAGES: usize = 3;
const CONCURRENT_IMAGE_JOBS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedPost {
    pub post_id: i64,
    pub title: String,
    pub topic_id: i64,
    pub topic: String,
    pub images: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Created(GeneratedPost),
    /// Every topic has been used.
    NoTopics,
}

/// Turns one topic into one stored post.
pub struct Orchestrator {
    repository: Arc<Repository>,
    generator: ContentGenerator,
    images: ImageSearch,
    media: Option<Arc<dyn MediaHost>>,
    author: String,
}

impl Orchestrator {
    pub fn new(
        repository: Arc<Repository>,
        generator: ContentGenerator,
        images: ImageSearch,
        media: Option<Arc<dyn MediaHost>>,
        author: String,
    ) -> Self {
        Self {
            repository,
            generator,
            images,
            media,
            author,
        }
    }

    pub fn model_version(&self) -> &str {
        self.generator.model_version()
    }

    /// Writes a post for the oldest unused topic.
    pub async fn generate_next(&self) -> Result<GenerationOutcome> {
        let Some(topic) = self.repository.next_unused_topic().await? else {
            tracing::info!("No unused topics left");
            return Ok(GenerationOutcome::NoTopics);
        };
        let post = self.generate_for_topic(&topic).await?;
        Ok(GenerationOutcome::Created(post))
    }

    /// Writes and stores a post for `topic`, claiming the topic in the same transaction.
    /// Images uploaded before a failure stay on the media host.
    pub async fn generate_for_topic(&self, topic: &Topic) -> Result<GeneratedPost> {
        tracing::info!("Generating post for topic {}: {}", topic.id, topic.topic);

        let previous_titles = self.repository.recent_post_titles(RECENT_TITLES).await?;
        let draft = self
            .generator
            .generate(&topic.topic, &previous_titles, topic.keywords.as_deref())
            .await?;

        let placed = match &self.media {
            Some(media) if !self.images.is_empty() => {
                self.source_images(media.as_ref(), topic, &draft.content).await
            }
            Some(_) => {
                tracing::warn!("No image search provider configured, posting without images");
                Vec::new()
            }
            None => {
                tracing::warn!("No media host configured, posting without images");
                Vec::new()
            }
        };

        let content = interleave_images(&draft.content, &placed);
        let thumbnail = placed.first().map(|image| image.url.clone());

        let post = NewPost {
            title: draft.title.clone(),
            content,
            summary: Some(draft.summary),
            thumbnail,
            topic_id: Some(topic.id),
            author: self.author.clone(),
            published: true,
        };
        let post_id = self.repository.insert_generated_post(post, topic.id).await?;

        tracing::info!(
            "Created post {} '{}' with {} images",
            post_id,
            draft.title,
            placed.len()
        );

        Ok(GeneratedPost {
            post_id,
            title: draft.title,
            topic_id: topic.id,
            topic: topic.topic.clone(),
            images: placed.len(),
        })
    }

    /// One image per model suggestion, or per topic keyword when there are no suggestions.
    async fn source_images(
        &self,
        media: &dyn MediaHost,
        topic: &Topic,
        content: &str,
    ) -> Vec<PlacedImage> {
        let suggestions = self.generator.suggest_images(content, &topic.topic).await;

        if suggestions.is_empty() {
            let keywords: Vec<String> = extract_keywords(&topic.topic, topic.keywords.as_deref())
                .into_iter()
                .take(MAX_KEYWORD_IMAGES)
                .collect();
            tracing::info!("No image suggestions, using keywords: {}", keywords.join(", "));

            return self
                .upload_all(media, keywords)
                .await
                .into_iter()
                .flatten()
                .map(|image| PlacedImage::from_upload(&image, None))
                .collect();
        }

        tracing::info!("Model suggested {} images", suggestions.len());
        let uploads = self
            .upload_all(media, suggestions.iter().map(|s| s.keyword.clone()).collect())
            .await;

        suggestions
            .iter()
            .zip(uploads)
            .filter_map(|(suggestion, upload)| {
                upload.map(|image| PlacedImage::from_upload(&image, Some(suggestion)))
            })
            .collect()
    }

    /// Result `i` belongs to keyword `i`.
    async fn upload_all(
        &self,
        media: &dyn MediaHost,
        keywords: Vec<String>,
    ) -> Vec<Option<UploadedImage>> {
        stream::iter(keywords)
            .map(|keyword| async move { self.search_and_upload(media, &keyword).await })
            .buffered(CONCURRENT_IMAGE_JOBS)
            .collect()
            .await
    }

    async fn search_and_upload(&self, media: &dyn MediaHost, keyword: &str) -> Option<UploadedImage> {
        let candidate = self.images.search(keyword, 1).await.into_iter().next();
        let Some(candidate) = candidate else {
            tracing::info!("No image found for '{}'", keyword);
            return None;
        };

        match media.upload(&candidate.url).await {
            Ok(uploaded) => Some(UploadedImage {
                media: uploaded,
                description: candidate.description,
                photographer: candidate.photographer,
                source: candidate.source,
            }),
            Err(e) => {
                tracing::warn!("Upload of '{}' image failed: {}", keyword, e);
                None
            }
        }
    }
}
