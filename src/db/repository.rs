use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{
    AgentConfig, GalleryImage, NewGalleryImage, NewPost, NewProduct, NewTopic, Post, PostUpdate,
    Product, ScheduleTime, Topic, TopicStats,
};

use super::schema::SCHEMA;

const TOPIC_COLUMNS: &str = "id, topic, keywords, used, used_at, created_at";
const POST_COLUMNS: &str = "id, title, content, summary, thumbnail, topic_id, author, view_count, published, created_at, updated_at";

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Topic operations

    pub async fn insert_topic(&self, topic: NewTopic) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO blog_topics (topic, keywords) VALUES (?1, ?2)",
                    params![topic.topic, topic.keywords],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Adds topics whose text is not stored yet. Returns `(added, skipped)`.
    pub async fn import_topics(&self, topics: Vec<NewTopic>) -> Result<(usize, usize)> {
        let counts = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut added = 0;
                let mut skipped = 0;
                for topic in topics {
                    let exists: bool = tx.query_row(
                        "SELECT EXISTS(SELECT 1 FROM blog_topics WHERE topic = ?1)",
                        params![topic.topic],
                        |row| row.get(0),
                    )?;
                    if exists {
                        skipped += 1;
                        continue;
                    }
                    tx.execute(
                        "INSERT INTO blog_topics (topic, keywords) VALUES (?1, ?2)",
                        params![topic.topic, topic.keywords],
                    )?;
                    added += 1;
                }
                tx.commit()?;
                Ok((added, skipped))
            })
            .await?;
        Ok(counts)
    }

    pub async fn list_topics(&self) -> Result<Vec<Topic>> {
        let topics = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {TOPIC_COLUMNS} FROM blog_topics ORDER BY created_at ASC, id ASC"
                ))?;
                let topics = stmt
                    .query_map([], topic_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(topics)
            })
            .await?;
        Ok(topics)
    }

    #[cfg(test)]
    pub async fn get_topic(&self, id: i64) -> Result<Option<Topic>> {
        let topic = self
            .conn
            .call(move |conn| {
                let topic = conn
                    .query_row(
                        &format!("SELECT {TOPIC_COLUMNS} FROM blog_topics WHERE id = ?1"),
                        params![id],
                        topic_from_row,
                    )
                    .optional()?;
                Ok(topic)
            })
            .await?;
        Ok(topic)
    }

    /// Oldest topic that has not been consumed yet.
    pub async fn next_unused_topic(&self) -> Result<Option<Topic>> {
        let topic = self
            .conn
            .call(|conn| {
                let topic = conn
                    .query_row(
                        &format!(
                            "SELECT {TOPIC_COLUMNS} FROM blog_topics WHERE used = 0 ORDER BY created_at ASC, id ASC LIMIT 1"
                        ),
                        [],
                        topic_from_row,
                    )
                    .optional()?;
                Ok(topic)
            })
            .await?;
        Ok(topic)
    }

    /// Returns false when the topic is missing or was already used.
    #[cfg(test)]
    pub async fn mark_topic_used(&self, id: i64) -> Result<bool> {
        let claimed = self
            .conn
            .call(move |conn| Ok(claim_topic(conn, id)?))
            .await?;
        Ok(claimed)
    }

    pub async fn reset_all_topics(&self) -> Result<usize> {
        let count = self
            .conn
            .call(|conn| {
                let n = conn.execute(
                    "UPDATE blog_topics SET used = 0, used_at = NULL WHERE used = 1",
                    [],
                )?;
                Ok(n)
            })
            .await?;
        Ok(count)
    }

    pub async fn delete_topic(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "UPDATE blog_posts SET topic_id = NULL WHERE topic_id = ?1",
                    params![id],
                )?;
                let n = tx.execute("DELETE FROM blog_topics WHERE id = ?1", params![id])?;
                tx.commit()?;
                Ok(n)
            })
            .await?;
        Ok(deleted == 1)
    }

    pub async fn topic_stats(&self) -> Result<TopicStats> {
        let stats = self
            .conn
            .call(|conn| {
                let (total, used): (i64, i64) = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(used), 0) FROM blog_topics",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(TopicStats {
                    total,
                    used,
                    unused: total - used,
                })
            })
            .await?;
        Ok(stats)
    }

    // Post operations

    pub async fn insert_post(&self, post: NewPost) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                insert_post_row(conn, &post)?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Stores a generated post and consumes its topic in one transaction.
    ///
    /// Fails without writing anything when the topic was claimed by another run in between.
    pub async fn insert_generated_post(&self, post: NewPost, topic_id: i64) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                if !claim_topic(&tx, topic_id)? {
                    return Ok(None);
                }
                let post = NewPost {
                    topic_id: Some(topic_id),
                    ..post
                };
                insert_post_row(&tx, &post)?;
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(Some(id))
            })
            .await?;

        id.ok_or_else(|| {
            AppError::Other(anyhow::anyhow!(
                "topic {} is missing or was already used",
                topic_id
            ))
        })
    }

    pub async fn recent_post_titles(&self, limit: usize) -> Result<Vec<String>> {
        let titles = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT title FROM blog_posts ORDER BY created_at DESC, id DESC LIMIT ?1",
                )?;
                let titles = stmt
                    .query_map(params![limit as i64], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<String>, _>>()?;
                Ok(titles)
            })
            .await?;
        Ok(titles)
    }

    pub async fn list_posts(&self, published_only: bool) -> Result<Vec<Post>> {
        let posts = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {POST_COLUMNS} FROM blog_posts WHERE (?1 = 0 OR published = 1) ORDER BY created_at DESC, id DESC"
                ))?;
                let posts = stmt
                    .query_map(params![published_only], post_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(posts)
            })
            .await?;
        Ok(posts)
    }

    pub async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let post = self
            .conn
            .call(move |conn| Ok(select_post(conn, id)?))
            .await?;
        Ok(post)
    }

    pub async fn update_post(&self, id: i64, update: PostUpdate) -> Result<bool> {
        let changed = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    r#"UPDATE blog_posts SET
                           title = COALESCE(?1, title),
                           content = COALESCE(?2, content),
                           summary = COALESCE(?3, summary),
                           thumbnail = COALESCE(?4, thumbnail),
                           published = COALESCE(?5, published),
                           updated_at = datetime('now')
                       WHERE id = ?6"#,
                    params![
                        update.title,
                        update.content,
                        update.summary,
                        update.thumbnail,
                        update.published,
                        id
                    ],
                )?;
                Ok(n)
            })
            .await?;
        Ok(changed == 1)
    }

    pub async fn delete_post(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM post_views WHERE post_id = ?1", params![id])?;
                let n = tx.execute("DELETE FROM blog_posts WHERE id = ?1", params![id])?;
                tx.commit()?;
                Ok(n)
            })
            .await?;
        Ok(deleted == 1)
    }

    /// Counts a view once per client address and returns the post as stored afterwards.
    /// Unpublished posts read as missing and are not counted.
    pub async fn record_view(&self, post_id: i64, ip: String) -> Result<Option<Post>> {
        let post = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                if !matches!(select_post(&tx, post_id)?, Some(post) if post.published) {
                    return Ok(None);
                }
                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO post_views (post_id, ip) VALUES (?1, ?2)",
                    params![post_id, ip],
                )?;
                if inserted == 1 {
                    tx.execute(
                        "UPDATE blog_posts SET view_count = view_count + 1 WHERE id = ?1",
                        params![post_id],
                    )?;
                }
                let post = select_post(&tx, post_id)?;
                tx.commit()?;
                Ok(post)
            })
            .await?;
        Ok(post)
    }

    // Gallery operations

    pub async fn insert_gallery_image(&self, image: NewGalleryImage) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO gallery_images (url, media_id, description) VALUES (?1, ?2, ?3)",
                    params![image.url, image.media_id, image.description],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn list_gallery_images(&self) -> Result<Vec<GalleryImage>> {
        let images = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, url, media_id, description, created_at FROM gallery_images ORDER BY id ASC",
                )?;
                let images = stmt
                    .query_map([], gallery_image_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(images)
            })
            .await?;
        Ok(images)
    }

    pub async fn delete_gallery_image(&self, media_id: String) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "DELETE FROM gallery_images WHERE media_id = ?1",
                    params![media_id],
                )?;
                Ok(n)
            })
            .await?;
        Ok(deleted > 0)
    }

    // Product operations

    pub async fn insert_product(&self, product: NewProduct) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO products (name, price, description, image_url, media_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        product.name,
                        product.price,
                        product.description,
                        product.image_url,
                        product.media_id
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let products = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, price, description, image_url, media_id, created_at FROM products ORDER BY id ASC",
                )?;
                let products = stmt
                    .query_map([], product_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(products)
            })
            .await?;
        Ok(products)
    }

    pub async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let product = self
            .conn
            .call(move |conn| {
                let product = conn
                    .query_row(
                        "SELECT id, name, price, description, image_url, media_id, created_at FROM products WHERE id = ?1",
                        params![id],
                        product_from_row,
                    )
                    .optional()?;
                Ok(product)
            })
            .await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let n = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
                Ok(n)
            })
            .await?;
        Ok(deleted == 1)
    }

    // Agent config

    /// Returns the stored agent config, seeding the row from `defaults` on first use.
    pub async fn ensure_agent_config(&self, defaults: AgentConfig) -> Result<AgentConfig> {
        let config = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO agent_config (id, is_enabled, schedule_time) VALUES (1, ?1, ?2)",
                    params![defaults.is_enabled, defaults.schedule_time.to_string()],
                )?;
                Ok(select_agent_config(conn)?)
            })
            .await?;
        config.ok_or_else(|| AppError::Config("agent_config row missing after seeding".to_string()))
    }

    #[cfg(test)]
    pub async fn get_agent_config(&self) -> Result<Option<AgentConfig>> {
        let config = self
            .conn
            .call(|conn| Ok(select_agent_config(conn)?))
            .await?;
        Ok(config)
    }

    pub async fn update_agent_config(&self, is_enabled: bool, schedule_time: ScheduleTime) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO agent_config (id, is_enabled, schedule_time) VALUES (1, ?1, ?2)
                       ON CONFLICT(id) DO UPDATE SET
                           is_enabled = excluded.is_enabled,
                           schedule_time = excluded.schedule_time"#,
                    params![is_enabled, schedule_time.to_string()],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn set_last_run(&self, at: DateTime<Utc>) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE agent_config SET last_run = ?1 WHERE id = 1",
                    params![at.to_rfc3339()],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

/// Flips an unused topic to used. False when it is missing or already taken.
fn claim_topic(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<bool> {
    let n = conn.execute(
        "UPDATE blog_topics SET used = 1, used_at = datetime('now') WHERE id = ?1 AND used = 0",
        params![id],
    )?;
    Ok(n == 1)
}

fn insert_post_row(conn: &rusqlite::Connection, post: &NewPost) -> rusqlite::Result<usize> {
    conn.execute(
        r#"INSERT INTO blog_posts (title, content, summary, thumbnail, topic_id, author, published)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        params![
            post.title,
            post.content,
            post.summary,
            post.thumbnail,
            post.topic_id,
            post.author,
            post.published
        ],
    )
}

fn select_post(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        &format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = ?1"),
        params![id],
        post_from_row,
    )
    .optional()
}

fn select_agent_config(conn: &rusqlite::Connection) -> rusqlite::Result<Option<AgentConfig>> {
    conn.query_row(
        "SELECT is_enabled, schedule_time, last_run FROM agent_config WHERE id = 1",
        [],
        |row| {
            let schedule_time: String = row.get(1)?;
            Ok(AgentConfig {
                is_enabled: row.get::<_, i64>(0)? != 0,
                schedule_time: schedule_time
                    .parse()
                    .unwrap_or(ScheduleTime { hour: 9, minute: 0 }),
                last_run: row
                    .get::<_, Option<String>>(2)?
                    .and_then(|s| parse_datetime(&s)),
            })
        },
    )
    .optional()
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(row
        .get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now))
}

fn topic_from_row(row: &Row) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: row.get(0)?,
        topic: row.get(1)?,
        keywords: row.get(2)?,
        used: row.get::<_, i64>(3)? != 0,
        used_at: row
            .get::<_, Option<String>>(4)?
            .and_then(|s| parse_datetime(&s)),
        created_at: timestamp(row, 5)?,
    })
}

fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        summary: row.get(3)?,
        thumbnail: row.get(4)?,
        topic_id: row.get(5)?,
        author: row.get(6)?,
        view_count: row.get(7)?,
        published: row.get::<_, i64>(8)? != 0,
        created_at: timestamp(row, 9)?,
        updated_at: timestamp(row, 10)?,
    })
}

fn gallery_image_from_row(row: &Row) -> rusqlite::Result<GalleryImage> {
    Ok(GalleryImage {
        id: row.get(0)?,
        url: row.get(1)?,
        media_id: row.get(2)?,
        description: row.get(3)?,
        created_at: timestamp(row, 4)?,
    })
}

fn product_from_row(row: &Row) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        description: row.get(3)?,
        image_url: row.get(4)?,
        media_id: row.get(5)?,
        created_at: timestamp(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn repo() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    fn post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "<p>본문</p>".to_string(),
            summary: None,
            thumbnail: None,
            topic_id: None,
            author: "tester".to_string(),
            published: true,
        }
    }

    #[tokio::test]
    async fn next_unused_follows_creation_order() {
        let (_dir, repo) = repo().await;
        let first = repo.insert_topic(NewTopic::new("첫 주제", None)).await.unwrap();
        let second = repo.insert_topic(NewTopic::new("둘째 주제", Some("a, b"))).await.unwrap();

        assert_eq!(repo.next_unused_topic().await.unwrap().unwrap().id, first);
        assert!(repo.mark_topic_used(first).await.unwrap());
        assert!(!repo.mark_topic_used(first).await.unwrap());
        assert_eq!(repo.next_unused_topic().await.unwrap().unwrap().id, second);

        assert!(repo.mark_topic_used(second).await.unwrap());
        assert!(repo.next_unused_topic().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn used_topics_carry_used_at_not_before_creation() {
        let (_dir, repo) = repo().await;
        for i in 0..3 {
            let id = repo.insert_topic(NewTopic::new(format!("주제 {i}"), None)).await.unwrap();
            repo.mark_topic_used(id).await.unwrap();
        }
        for topic in repo.list_topics().await.unwrap() {
            assert!(topic.used);
            let used_at = topic.used_at.expect("used topic without used_at");
            assert!(used_at >= topic.created_at);
        }
    }

    #[tokio::test]
    async fn reset_returns_earliest_topic_first() {
        let (_dir, repo) = repo().await;
        let first = repo.insert_topic(NewTopic::new("a", None)).await.unwrap();
        let second = repo.insert_topic(NewTopic::new("b", None)).await.unwrap();
        repo.mark_topic_used(second).await.unwrap();
        repo.mark_topic_used(first).await.unwrap();

        assert_eq!(repo.reset_all_topics().await.unwrap(), 2);
        let next = repo.next_unused_topic().await.unwrap().unwrap();
        assert_eq!(next.id, first);
        assert!(next.used_at.is_none());
        assert_eq!(
            repo.topic_stats().await.unwrap(),
            TopicStats { total: 2, used: 0, unused: 2 }
        );
    }

    #[tokio::test]
    async fn import_skips_existing_topics() {
        let (_dir, repo) = repo().await;
        repo.insert_topic(NewTopic::new("황토집 단열", None)).await.unwrap();
        let (added, skipped) = repo
            .import_topics(vec![
                NewTopic::new("황토집 단열", None),
                NewTopic::new("황토방 곰팡이 예방", Some("황토방, 곰팡이")),
            ])
            .await
            .unwrap();
        assert_eq!((added, skipped), (1, 1));
        assert_eq!(repo.topic_stats().await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn generated_post_consumes_topic_once() {
        let (_dir, repo) = repo().await;
        let topic = repo.insert_topic(NewTopic::new("주제", None)).await.unwrap();

        let id = repo.insert_generated_post(post("글"), topic).await.unwrap();
        let stored = repo.get_post(id).await.unwrap().unwrap();
        assert_eq!(stored.topic_id, Some(topic));
        assert!(repo.get_topic(topic).await.unwrap().unwrap().used);

        assert!(repo.insert_generated_post(post("두 번째"), topic).await.is_err());
        assert_eq!(repo.list_posts(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generated_post_is_rejected_for_a_claimed_topic() {
        let (_dir, repo) = repo().await;
        let topic = repo.insert_topic(NewTopic::new("주제", None)).await.unwrap();
        assert!(repo.mark_topic_used(topic).await.unwrap());

        assert!(repo.insert_generated_post(post("늦은 글"), topic).await.is_err());
        assert!(repo.list_posts(false).await.unwrap().is_empty());
        assert!(!repo.mark_topic_used(topic + 1).await.unwrap());
    }

    #[tokio::test]
    async fn views_count_once_per_ip() {
        let (_dir, repo) = repo().await;
        let id = repo.insert_post(post("조회")).await.unwrap();

        let ip = "10.0.0.1".to_string();
        assert_eq!(repo.record_view(id, ip.clone()).await.unwrap().unwrap().view_count, 1);
        assert_eq!(repo.record_view(id, ip).await.unwrap().unwrap().view_count, 1);
        assert_eq!(
            repo.record_view(id, "10.0.0.2".to_string()).await.unwrap().unwrap().view_count,
            2
        );
        assert!(repo.record_view(id + 100, "10.0.0.1".to_string()).await.unwrap().is_none());

        let draft = repo
            .insert_post(NewPost {
                published: false,
                ..post("초안")
            })
            .await
            .unwrap();
        assert!(repo.record_view(draft, "10.0.0.1".to_string()).await.unwrap().is_none());
        assert_eq!(repo.get_post(draft).await.unwrap().unwrap().view_count, 0);
    }

    #[tokio::test]
    async fn recent_titles_newest_first() {
        let (_dir, repo) = repo().await;
        for title in ["하나", "둘", "셋"] {
            repo.insert_post(post(title)).await.unwrap();
        }
        assert_eq!(repo.recent_post_titles(2).await.unwrap(), vec!["셋", "둘"]);
    }

    #[tokio::test]
    async fn update_post_keeps_unset_fields() {
        let (_dir, repo) = repo().await;
        let id = repo.insert_post(post("원래 제목")).await.unwrap();
        let changed = repo
            .update_post(id, PostUpdate { title: Some("새 제목".to_string()), ..Default::default() })
            .await
            .unwrap();
        assert!(changed);
        let stored = repo.get_post(id).await.unwrap().unwrap();
        assert_eq!(stored.title, "새 제목");
        assert_eq!(stored.content, "<p>본문</p>");
    }

    #[tokio::test]
    async fn agent_config_seeds_once_and_updates() {
        let (_dir, repo) = repo().await;
        assert!(repo.get_agent_config().await.unwrap().is_none());

        let defaults = AgentConfig {
            is_enabled: true,
            schedule_time: ScheduleTime { hour: 8, minute: 30 },
            last_run: None,
        };
        let seeded = repo.ensure_agent_config(defaults.clone()).await.unwrap();
        assert!(seeded.is_enabled);
        assert_eq!(seeded.schedule_time.to_string(), "08:30");

        repo.update_agent_config(false, ScheduleTime { hour: 21, minute: 0 }).await.unwrap();
        let now = Utc::now();
        repo.set_last_run(now).await.unwrap();

        let stored = repo.ensure_agent_config(defaults).await.unwrap();
        assert!(!stored.is_enabled);
        assert_eq!(stored.schedule_time.to_string(), "21:00");
        assert_eq!(stored.last_run.map(|t| t.timestamp()), Some(now.timestamp()));
    }

    #[tokio::test]
    async fn catalog_crud() {
        let (_dir, repo) = repo().await;
        repo.insert_gallery_image(NewGalleryImage {
            url: "https://media.test/a.jpg".to_string(),
            media_id: Some("gallery/a".to_string()),
            description: None,
        })
        .await
        .unwrap();
        assert_eq!(repo.list_gallery_images().await.unwrap().len(), 1);
        assert!(repo.delete_gallery_image("gallery/a".to_string()).await.unwrap());
        assert!(repo.list_gallery_images().await.unwrap().is_empty());

        let id = repo
            .insert_product(NewProduct {
                name: "황토 벽돌".to_string(),
                price: 12000,
                description: None,
                image_url: None,
                media_id: None,
            })
            .await
            .unwrap();
        assert_eq!(repo.get_product(id).await.unwrap().unwrap().price, 12000);
        assert!(repo.delete_product(id).await.unwrap());
        assert!(!repo.delete_product(id).await.unwrap());
    }
}
