use std::sync::Arc;

use super::media::{destroy_best_effort, MediaHost};
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{GalleryImage, NewGalleryImage, NewProduct, Product};

/// Gallery images and products. Each row may own one hosted image.
pub struct CatalogService {
    repository: Arc<Repository>,
    media: Option<Arc<dyn MediaHost>>,
}

impl CatalogService {
    pub fn new(repository: Arc<Repository>, media: Option<Arc<dyn MediaHost>>) -> Self {
        Self { repository, media }
    }

    pub async fn list_images(&self) -> Result<Vec<GalleryImage>> {
        self.repository.list_gallery_images().await
    }

    pub async fn add_image(&self, image: NewGalleryImage) -> Result<i64> {
        if image.url.trim().is_empty() {
            return Err(AppError::BadRequest("url is required".to_string()));
        }
        self.repository.insert_gallery_image(image).await
    }

    pub async fn delete_image(&self, media_id: &str) -> Result<()> {
        if !self.repository.delete_gallery_image(media_id.to_string()).await? {
            return Err(AppError::NotFound(format!("image {}", media_id)));
        }
        self.release(media_id).await;
        Ok(())
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.repository.list_products().await
    }

    pub async fn add_product(&self, product: NewProduct) -> Result<Product> {
        if product.name.trim().is_empty() {
            return Err(AppError::BadRequest("name is required".to_string()));
        }
        if product.price < 0 {
            return Err(AppError::BadRequest("price cannot be negative".to_string()));
        }
        let id = self.repository.insert_product(product).await?;
        self.repository
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", id)))
    }

    pub async fn delete_product(&self, id: i64) -> Result<()> {
        let product = self
            .repository
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", id)))?;

        if let Some(media_id) = product.media_id.as_deref().filter(|m| !m.is_empty()) {
            self.release(media_id).await;
        }
        self.repository.delete_product(id).await?;
        Ok(())
    }

    async fn release(&self, media_id: &str) {
        if let Some(media) = &self.media {
            destroy_best_effort(media.as_ref(), &[media_id.to_string()]).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMediaHost;
    use tempfile::TempDir;

    async fn setup(host: Arc<FakeMediaHost>) -> (CatalogService, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let repository = Repository::new(path.to_str().unwrap()).await.unwrap();
        (CatalogService::new(Arc::new(repository), Some(host)), dir)
    }

    #[tokio::test]
    async fn product_delete_releases_its_image() {
        let host = Arc::new(FakeMediaHost::failing_destroys());
        let (catalog, _dir) = setup(host.clone()).await;

        let product = catalog
            .add_product(NewProduct {
                name: "황토 벽돌".to_string(),
                price: 12000,
                description: None,
                image_url: Some("https://media.test/brick.jpg".to_string()),
                media_id: Some("brick".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(product.price, 12000);

        catalog.delete_product(product.id).await.unwrap();
        assert_eq!(host.destroyed(), vec!["brick"]);
        assert!(catalog.list_products().await.unwrap().is_empty());
        assert!(matches!(
            catalog.delete_product(product.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn gallery_images_are_keyed_by_media_id() {
        let host = Arc::new(FakeMediaHost::new());
        let (catalog, _dir) = setup(host.clone()).await;

        catalog
            .add_image(NewGalleryImage {
                url: "https://media.test/house.jpg".to_string(),
                media_id: Some("house".to_string()),
                description: Some("전경".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(catalog.list_images().await.unwrap().len(), 1);

        assert!(matches!(
            catalog.delete_image("missing").await,
            Err(AppError::NotFound(_))
        ));
        catalog.delete_image("house").await.unwrap();
        assert_eq!(host.destroyed(), vec!["house"]);
        assert!(catalog.list_images().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_input() {
        let (catalog, _dir) = setup(Arc::new(FakeMediaHost::new())).await;
        let blank = NewGalleryImage {
            url: " ".to_string(),
            media_id: None,
            description: None,
        };
        assert!(matches!(
            catalog.add_image(blank).await,
            Err(AppError::BadRequest(_))
        ));

        let negative = NewProduct {
            name: "x".to_string(),
            price: -1,
            description: None,
            image_url: None,
            media_id: None,
        };
        assert!(matches!(
            catalog.add_product(negative).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
