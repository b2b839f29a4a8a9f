use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::CloudinaryConfig;
use crate::error::{AppError, Result};
use crate::models::UploadedMedia;

const CLOUDINARY_API_URL: &str = "https://api.cloudinary.com/v1_1";

/// Somewhere images can be copied to and later removed from.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Copies a remote image into the host.
    async fn upload(&self, url: &str) -> Result<UploadedMedia>;

    async fn destroy(&self, media_id: &str) -> Result<()>;

    /// Ids of every hosted image referenced in `markup`, in order of appearance.
    fn media_ids_in(&self, markup: &str) -> Vec<String>;
}

/// Destroys each id in turn, logging failures. Returns how many succeeded.
pub async fn destroy_best_effort(host: &dyn MediaHost, media_ids: &[String]) -> usize {
    let mut destroyed = 0;
    for media_id in media_ids {
        match host.destroy(media_id).await {
            Ok(()) => destroyed += 1,
            Err(e) => tracing::warn!("Could not delete media {}: {}", media_id, e),
        }
    }
    destroyed
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

pub struct CloudinaryHost {
    client: Client,
    config: CloudinaryConfig,
    hosted_url: Regex,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let pattern = format!(
            r#"res\.cloudinary\.com/{}/image/upload/(?:v\d+/)?([^"'\s?#<>]+)\.[A-Za-z0-9]+"#,
            regex::escape(&config.cloud_name)
        );
        let hosted_url = Regex::new(&pattern)
            .map_err(|e| AppError::Config(format!("invalid cloud name: {}", e)))?;

        Ok(Self {
            client,
            config,
            hosted_url,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            CLOUDINARY_API_URL, self.config.cloud_name, action
        )
    }

    /// Signs `params` and adds the credential fields every authenticated call needs.
    fn signed_form(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        params.push(("timestamp", Utc::now().timestamp().to_string()));
        params.push(("signature_algorithm", "sha256".to_string()));
        let signature = sign(&params, &self.config.api_secret);
        params.push(("api_key", self.config.api_key.clone()));
        params.push(("signature", signature));
        params
    }
}

/// Fields Cloudinary leaves out of the signature.
const UNSIGNED_FIELDS: &[&str] = &["file", "api_key", "resource_type", "cloud_name"];

/// Cloudinary request signature: sorted `key=value` pairs joined by `&`, then the secret.
fn sign(params: &[(&str, String)], secret: &str) -> String {
    let mut sorted: Vec<_> = params
        .iter()
        .filter(|(k, v)| !v.is_empty() && !UNSIGNED_FIELDS.contains(k))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let digest = Sha256::digest(format!("{}{}", to_sign, secret).as_bytes());
    format!("{:x}", digest)
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(&self, url: &str) -> Result<UploadedMedia> {
        let form = self.signed_form(vec![
            ("file", url.to_string()),
            ("folder", self.config.folder.clone()),
        ]);
        let response = self
            .client
            .post(self.endpoint("upload"))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(AppError::MediaHost(format!(
                "upload failed {}: {}",
                status, error_text
            )));
        }

        let body: UploadResponse = response.json().await?;
        tracing::debug!("Uploaded {} as {}", url, body.public_id);

        Ok(UploadedMedia {
            url: body.secure_url,
            media_id: body.public_id,
            width: body.width,
            height: body.height,
        })
    }

    async fn destroy(&self, media_id: &str) -> Result<()> {
        let form = self.signed_form(vec![("public_id", media_id.to_string())]);
        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::MediaHost(format!(
                "destroy of {} failed: {}",
                media_id, status
            )));
        }

        let body: DestroyResponse = response.json().await?;
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(AppError::MediaHost(format!(
                "destroy of {} returned '{}'",
                media_id, other
            ))),
        }
    }

    fn media_ids_in(&self, markup: &str) -> Vec<String> {
        self.hosted_url
            .captures_iter(markup)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
