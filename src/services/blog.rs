use std::sync::Arc;

use serde::Serialize;

use super::media::{destroy_best_effort, MediaHost};
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{NewPost, Post, PostUpdate};

/// What a post deletion did to the media it referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeletedPost {
    pub media_found: usize,
    pub media_deleted: usize,
}

/// Post reads and admin edits on top of the repository.
pub struct BlogService {
    repository: Arc<Repository>,
    media: Option<Arc<dyn MediaHost>>,
}

impl BlogService {
    pub fn new(repository: Arc<Repository>, media: Option<Arc<dyn MediaHost>>) -> Self {
        Self { repository, media }
    }

    pub async fn list_posts(&self, published_only: bool) -> Result<Vec<Post>> {
        self.repository.list_posts(published_only).await
    }

    /// Returns the post after counting the view for `ip`. Repeat views from one address
    /// leave the count unchanged.
    pub async fn view_post(&self, id: i64, ip: &str) -> Result<Post> {
        self.repository
            .record_view(id, ip.to_string())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", id)))
    }

    pub async fn create_post(&self, post: NewPost) -> Result<Post> {
        if post.title.trim().is_empty() || post.content.trim().is_empty() {
            return Err(AppError::BadRequest("title and content are required".to_string()));
        }
        let id = self.repository.insert_post(post).await?;
        tracing::info!("Created post {}", id);
        self.fetch(id).await
    }

    pub async fn update_post(&self, id: i64, update: PostUpdate) -> Result<Post> {
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::BadRequest("title cannot be empty".to_string()));
        }
        if !self.repository.update_post(id, update).await? {
            return Err(AppError::NotFound(format!("post {}", id)));
        }
        self.fetch(id).await
    }

    /// Deletes the post row. Hosted images in its body and thumbnail are removed first,
    /// best effort: a failed media delete never keeps the row alive.
    pub async fn delete_post(&self, id: i64) -> Result<DeletedPost> {
        let post = self.fetch(id).await?;

        let mut report = DeletedPost {
            media_found: 0,
            media_deleted: 0,
        };
        if let Some(media) = &self.media {
            let media_ids = referenced_media(media.as_ref(), &post);
            report.media_found = media_ids.len();
            report.media_deleted = destroy_best_effort(media.as_ref(), &media_ids).await;
        }

        self.repository.delete_post(id).await?;
        tracing::info!(
            "Deleted post {} ({}/{} media removed)",
            id,
            report.media_deleted,
            report.media_found
        );
        Ok(report)
    }

    async fn fetch(&self, id: i64) -> Result<Post> {
        self.repository
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", id)))
    }
}

/// Hosted ids in the body followed by the thumbnail's, without repeats.
fn referenced_media(media: &dyn MediaHost, post: &Post) -> Vec<String> {
    let mut ids = media.media_ids_in(&post.content);
    if let Some(thumbnail) = &post.thumbnail {
        ids.extend(media.media_ids_in(thumbnail));
    }
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMediaHost;
    use tempfile::TempDir;

    async fn setup(media: Option<Arc<dyn MediaHost>>) -> (BlogService, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let repository = Repository::new(path.to_str().unwrap()).await.unwrap();
        (BlogService::new(Arc::new(repository), media), dir)
    }

    fn post_with_body(content: &str, thumbnail: Option<&str>) -> NewPost {
        NewPost {
            title: "황토집 이야기".to_string(),
            content: content.to_string(),
            summary: None,
            thumbnail: thumbnail.map(str::to_string),
            topic_id: None,
            author: "관리자".to_string(),
            published: true,
        }
    }

    #[tokio::test]
    async fn views_count_once_per_address() {
        let (blog, _dir) = setup(None).await;
        let post = blog.create_post(post_with_body("<p>본문</p>", None)).await.unwrap();
        assert_eq!(post.view_count, 0);

        assert_eq!(blog.view_post(post.id, "10.0.0.1").await.unwrap().view_count, 1);
        assert_eq!(blog.view_post(post.id, "10.0.0.1").await.unwrap().view_count, 1);
        assert_eq!(blog.view_post(post.id, "10.0.0.2").await.unwrap().view_count, 2);

        assert!(matches!(
            blog.view_post(999, "10.0.0.1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_survives_failing_media_host() {
        let host = Arc::new(FakeMediaHost::failing_destroys());
        let (blog, _dir) = setup(Some(host.clone())).await;

        let body = r#"<p>a</p><figure><img src="https://media.test/m1.jpg"></figure>
<p>b</p><figure><img src="https://media.test/m2.jpg"></figure>"#;
        let post = blog
            .create_post(post_with_body(body, Some("https://media.test/m1.jpg")))
            .await
            .unwrap();

        let report = blog.delete_post(post.id).await.unwrap();
        assert_eq!(report.media_found, 2);
        assert_eq!(report.media_deleted, 0);
        assert_eq!(host.destroyed(), vec!["m1", "m2"]);
        assert!(matches!(
            blog.delete_post(post.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_hosted_media() {
        let host = Arc::new(FakeMediaHost::new());
        let (blog, _dir) = setup(Some(host.clone())).await;

        let post = blog
            .create_post(post_with_body(
                "<p>x</p>",
                Some("https://media.test/thumb.jpg"),
            ))
            .await
            .unwrap();
        let report = blog.delete_post(post.id).await.unwrap();
        assert_eq!(report.media_deleted, 1);
        assert_eq!(host.destroyed(), vec!["thumb"]);
        assert!(blog.list_posts(false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_blank_posts_and_missing_updates() {
        let (blog, _dir) = setup(None).await;
        assert!(matches!(
            blog.create_post(post_with_body("  ", None)).await,
            Err(AppError::BadRequest(_))
        ));

        let update = PostUpdate {
            title: Some("새 제목".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            blog.update_post(42, update).await,
            Err(AppError::NotFound(_))
        ));

        let post = blog.create_post(post_with_body("<p>본문</p>", None)).await.unwrap();
        let updated = blog
            .update_post(
                post.id,
                PostUpdate {
                    published: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.published);
        assert_eq!(updated.title, "황토집 이야기");
        assert!(blog.list_posts(true).await.unwrap().is_empty());
    }
}
