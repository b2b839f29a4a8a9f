use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use crate::agent::{Orchestrator, Scheduler};
use crate::ai::{ContentGenerator, GeminiClient, TextModel, UnconfiguredModel};
use crate::config::Config;
use crate::db::{Repository, STARTER_TOPICS};
use crate::error::Result;
use crate::models::{AgentConfig, NewTopic, ScheduleTime};
use crate::services::{BlogService, CatalogService, CloudinaryHost, ImageSearch, MediaHost};

/// Every long-lived service, wired once from the configuration.
pub struct App {
    pub config: Config,
    pub repository: Arc<Repository>,
    pub blog: BlogService,
    pub catalog: CatalogService,
    pub orchestrator: Arc<Orchestrator>,
    pub scheduler: Arc<Scheduler>,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let repository = Arc::new(Repository::new(&config.db_path).await?);

        let model: Arc<dyn TextModel> = match &config.gemini_api_key {
            Some(key) => Arc::new(GeminiClient::new(key.clone())?),
            None => {
                tracing::warn!("GEMINI_API_KEY not set, post generation will fail");
                Arc::new(UnconfiguredModel)
            }
        };

        let media: Option<Arc<dyn MediaHost>> = match &config.cloudinary {
            Some(cloudinary) => Some(Arc::new(CloudinaryHost::new(cloudinary.clone())?)),
            None => None,
        };

        if !config.has_image_search() {
            tracing::warn!("No image search key set, generated posts will have no images");
        }
        let images = ImageSearch::from_config(&config)?;
        Self::from_parts(config, repository, model, images, media)
    }

    /// Wires the services around already-built clients.
    pub fn from_parts(
        config: Config,
        repository: Arc<Repository>,
        model: Arc<dyn TextModel>,
        images: ImageSearch,
        media: Option<Arc<dyn MediaHost>>,
    ) -> Result<Self> {
        let zone = config.time_zone()?;
        let defaults = AgentConfig {
            is_enabled: config.auto_enabled,
            schedule_time: config.schedule_time.parse::<ScheduleTime>()?,
            last_run: None,
        };

        let orchestrator = Arc::new(Orchestrator::new(
            repository.clone(),
            ContentGenerator::new(model),
            images,
            media.clone(),
            config.author.clone(),
        ));
        let scheduler = Scheduler::new(repository.clone(), orchestrator.clone(), zone, defaults);

        Ok(Self {
            blog: BlogService::new(repository.clone(), media.clone()),
            catalog: CatalogService::new(repository.clone(), media),
            config,
            repository,
            orchestrator,
            scheduler,
        })
    }

    /// Imports one topic per line (`topic | keyword, keyword`). Returns `(added, skipped)`.
    pub async fn import_topics_file(&self, path: &Path) -> Result<(usize, usize)> {
        let content = tokio::fs::read_to_string(path).await?;
        let topics: Vec<NewTopic> = content.lines().filter_map(NewTopic::from_line).collect();
        self.repository.import_topics(topics).await
    }

    pub async fn seed_topics(&self) -> Result<(usize, usize)> {
        let topics = STARTER_TOPICS
            .iter()
            .map(|(topic, keywords)| NewTopic::new(*topic, Some(*keywords)))
            .collect();
        self.repository.import_topics(topics).await
    }

    /// Human-readable credential, topic and agent summary.
    pub async fn status_report(&self) -> Result<String> {
        let mut out = String::new();

        writeln!(out, "Config: {}", Config::config_path().display()).ok();
        writeln!(out, "Database: {}", self.config.db_path).ok();
        writeln!(out, "Model: {}", self.orchestrator.model_version()).ok();
        writeln!(out, "\nCredentials:").ok();
        for (name, present) in self.config.credential_report() {
            writeln!(out, "  {:<12} {}", name, if present { "set" } else { "missing" }).ok();
        }

        let stats = self.repository.topic_stats().await?;
        writeln!(
            out,
            "\nTopics: {} total, {} used, {} unused",
            stats.total, stats.used, stats.unused
        )
        .ok();
        if stats.total > 0 && stats.unused == 0 {
            writeln!(out, "  every topic is used; add topics or reset the queue").ok();
        }

        let status = self.scheduler.status().await?;
        writeln!(
            out,
            "\nAgent: {} at {}, last run {}",
            if status.is_enabled { "enabled" } else { "disabled" },
            status.schedule_time,
            status
                .last_run
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string())
        )
        .ok();

        Ok(out)
    }
}
