use serde::{Deserialize, Serialize};

/// A search hit from an image provider, before it is re-hosted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageCandidate {
    pub url: String,
    pub description: String,
    pub photographer: String,
    pub source: String,
}

/// What the media host returns for an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedMedia {
    pub url: String,
    pub media_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    pub media: UploadedMedia,
    pub description: String,
    pub photographer: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSuggestion {
    pub keyword: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "relatedText", alias = "related_text")]
    pub related_text: String,
}
