use crate::models::{ImageSuggestion, UploadedImage};

const PARAGRAPH_END: &str = "</p>";
const DEFAULT_ALT: &str = "블로그 이미지";

/// An uploaded image ready to be placed in a post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedImage {
    pub url: String,
    pub alt: String,
    pub caption: String,
    /// Body snippet the image belongs next to, if the model suggested one.
    pub anchor: Option<String>,
}

impl PlacedImage {
    pub fn from_upload(image: &UploadedImage, suggestion: Option<&ImageSuggestion>) -> Self {
        let suggested = suggestion
            .map(|s| s.description.trim())
            .filter(|d| !d.is_empty());

        let alt = suggested
            .or_else(|| Some(image.description.trim()).filter(|d| !d.is_empty()))
            .unwrap_or(DEFAULT_ALT)
            .to_string();

        let caption = match suggested {
            Some(description) => description.to_string(),
            None => format!("사진: {} ({})", image.photographer, image.source),
        };

        let anchor = suggestion
            .map(|s| s.related_text.trim().to_string())
            .filter(|t| !t.is_empty());

        Self {
            url: image.media.url.clone(),
            alt,
            caption,
            anchor,
        }
    }

    pub fn figure_html(&self) -> String {
        format!(
            "\n<figure><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>\n",
            escape(&self.url),
            escape(&self.alt),
            escape(&self.caption)
        )
    }
}

/// Places each anchored image after the paragraph holding its snippet, then spreads
/// the rest evenly over the body.
pub fn interleave_images(content: &str, images: &[PlacedImage]) -> String {
    if images.is_empty() {
        return content.to_string();
    }

    let mut result = content.to_string();
    let mut unplaced = Vec::new();

    for image in images {
        match image.anchor.as_deref().and_then(|a| anchor_insert_point(&result, a)) {
            Some(at) => result.insert_str(at, &image.figure_html()),
            None => unplaced.push(image.clone()),
        }
    }

    if unplaced.is_empty() {
        result
    } else {
        distribute_evenly(&result, &unplaced)
    }
}

/// Byte offset just past the first `</p>` following `anchor`.
fn anchor_insert_point(content: &str, anchor: &str) -> Option<usize> {
    let start = content.find(anchor)?;
    let close = content[start..].find(PARAGRAPH_END)?;
    Some(start + close + PARAGRAPH_END.len())
}

/// Inserts image `i` (1-based) after paragraph `floor(N / (K + 1)) * i`, where N counts
/// the non-empty paragraphs and K the images. Position 0 means before the first paragraph.
pub fn distribute_evenly(content: &str, images: &[PlacedImage]) -> String {
    if images.is_empty() {
        return content.to_string();
    }

    let mut segments: Vec<&str> = content.split(PARAGRAPH_END).collect();
    let tail = segments.pop().unwrap_or_default();
    let paragraphs: Vec<&str> = segments
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect();

    let positions = even_positions(paragraphs.len(), images.len());
    let figures_at = |slot: usize| {
        positions
            .iter()
            .zip(images)
            .filter(move |(pos, _)| **pos == slot)
            .map(|(_, image)| image.figure_html())
    };

    let mut out = String::with_capacity(content.len() + images.len() * 160);
    out.extend(figures_at(0));
    for (idx, paragraph) in paragraphs.iter().enumerate() {
        out.push_str(paragraph);
        out.push_str(PARAGRAPH_END);
        out.extend(figures_at(idx + 1));
    }
    out.push_str(tail);
    out
}

/// Paragraph counts after which each of `images` images goes.
pub fn even_positions(paragraphs: usize, images: usize) -> Vec<usize> {
    let interval = paragraphs / (images + 1);
    (1..=images).map(|i| interval * i).collect()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
