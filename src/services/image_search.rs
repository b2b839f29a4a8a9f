use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::ImageCandidate;

const UNSPLASH_API_URL: &str = "https://api.unsplash.com/search/photos";
const PEXELS_API_URL: &str = "https://api.pexels.com/v1/search";

#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, keyword: &str, count: usize) -> Result<Vec<ImageCandidate>>;
}

/// Ordered list of providers; the first one with any hit wins.
pub struct ImageSearch {
    providers: Vec<Box<dyn ImageProvider>>,
}

impl ImageSearch {
    pub fn new(providers: Vec<Box<dyn ImageProvider>>) -> Self {
        Self { providers }
    }

    /// Unsplash first, Pexels as backup, each only when its key is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut providers: Vec<Box<dyn ImageProvider>> = Vec::new();
        if let Some(key) = &config.unsplash_access_key {
            providers.push(Box::new(UnsplashProvider::new(key.clone())?));
        }
        if let Some(key) = &config.pexels_api_key {
            providers.push(Box::new(PexelsProvider::new(key.clone())?));
        }
        Ok(Self::new(providers))
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Never fails: provider errors are logged and count as an empty result.
    pub async fn search(&self, keyword: &str, count: usize) -> Vec<ImageCandidate> {
        for provider in &self.providers {
            match provider.search(keyword, count).await {
                Ok(images) if !images.is_empty() => return images,
                Ok(_) => {
                    tracing::info!("{} returned no images for '{}'", provider.name(), keyword);
                }
                Err(e) => {
                    tracing::warn!("{} search for '{}' failed: {}", provider.name(), keyword, e);
                }
            }
        }
        Vec::new()
    }
}

fn search_client() -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

#[derive(Debug, Deserialize)]
struct UnsplashResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
    alt_description: Option<String>,
    user: UnsplashUser,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: String,
}

pub struct UnsplashProvider {
    client: Client,
    access_key: String,
}

impl UnsplashProvider {
    pub fn new(access_key: String) -> Result<Self> {
        Ok(Self {
            client: search_client()?,
            access_key,
        })
    }
}

#[async_trait]
impl ImageProvider for UnsplashProvider {
    fn name(&self) -> &str {
        "unsplash"
    }

    async fn search(&self, keyword: &str, count: usize) -> Result<Vec<ImageCandidate>> {
        let per_page = count.to_string();
        let response = self
            .client
            .get(UNSPLASH_API_URL)
            .query(&[
                ("query", keyword),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ])
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ImageSearch(format!("unsplash returned {}", status)));
        }

        let body: UnsplashResponse = response.json().await?;
        Ok(body
            .results
            .into_iter()
            .map(|photo| ImageCandidate {
                url: photo.urls.regular,
                description: photo
                    .alt_description
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| keyword.to_string()),
                photographer: photo.user.name,
                source: "unsplash".to_string(),
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct PexelsResponse {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    src: PexelsSource,
    photographer: String,
}

#[derive(Debug, Deserialize)]
struct PexelsSource {
    large: String,
}

pub struct PexelsProvider {
    client: Client,
    api_key: String,
}

impl PexelsProvider {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            client: search_client()?,
            api_key,
        })
    }
}

#[async_trait]
impl ImageProvider for PexelsProvider {
    fn name(&self) -> &str {
        "pexels"
    }

    async fn search(&self, keyword: &str, count: usize) -> Result<Vec<ImageCandidate>> {
        let per_page = count.to_string();
        let response = self
            .client
            .get(PEXELS_API_URL)
            .query(&[
                ("query", keyword),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ])
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ImageSearch(format!("pexels returned {}", status)));
        }

        let body: PexelsResponse = response.json().await?;
        Ok(body
            .photos
            .into_iter()
            .map(|photo| ImageCandidate {
                url: photo.src.large,
                description: keyword.to_string(),
                photographer: photo.photographer,
                source: "pexels".to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeImageProvider;

    #[tokio::test]
    async fn falls_back_only_on_empty_results() {
        let primary = FakeImageProvider::empty("primary");
        let secondary = FakeImageProvider::with_hits("secondary", 2);
        let primary_calls = primary.calls();
        let secondary_calls = secondary.calls();

        let search = ImageSearch::new(vec![Box::new(primary), Box::new(secondary)]);
        let images = search.search("clay house", 1).await;

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].source, "secondary");
        assert_eq!(primary_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(secondary_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_non_empty_provider_wins() {
        let primary = FakeImageProvider::with_hits("primary", 1);
        let secondary = FakeImageProvider::with_hits("secondary", 1);
        let secondary_calls = secondary.calls();

        let search = ImageSearch::new(vec![Box::new(primary), Box::new(secondary)]);
        let images = search.search("roof", 1).await;

        assert_eq!(images[0].source, "primary");
        assert_eq!(secondary_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn errors_count_as_empty() {
        let search = ImageSearch::new(vec![Box::new(FakeImageProvider::failing("broken"))]);
        assert!(search.search("anything", 1).await.is_empty());
        assert!(ImageSearch::new(Vec::new()).is_empty());
    }
}
