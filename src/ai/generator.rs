use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::TextModel;
use crate::content::sanitize_html;
use crate::error::Result;
use crate::models::ImageSuggestion;

const SUMMARY_CHARS: usize = 100;
const MAX_SUGGESTIONS: usize = 4;

/// Title, body markup and summary for one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
struct DraftEnvelope {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct SuggestionEnvelope {
    #[serde(default)]
    suggestions: Vec<ImageSuggestion>,
}

pub struct ContentGenerator {
    model: Arc<dyn TextModel>,
}

impl ContentGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    pub fn model_version(&self) -> &str {
        self.model.model_version()
    }

    /// Writes a post about `topic`. Model failures propagate; unparseable output does not.
    pub async fn generate(
        &self,
        topic: &str,
        previous_titles: &[String],
        keywords: Option<&str>,
    ) -> Result<Draft> {
        let prompt = post_prompt(topic, previous_titles, keywords);
        let raw = self.model.complete(&prompt).await?;
        Ok(parse_draft(topic, &raw))
    }

    /// Asks which images would suit the post. Best effort: any failure yields no suggestions.
    pub async fn suggest_images(&self, content: &str, topic: &str) -> Vec<ImageSuggestion> {
        // The markup goes out as is so copied phrases match the stored body
        let prompt = suggestion_prompt(topic, content);
        let raw = match self.model.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Image suggestion request failed: {}", e);
                return Vec::new();
            }
        };

        match parse_envelope::<SuggestionEnvelope>(&raw) {
            Some(envelope) => envelope
                .suggestions
                .into_iter()
                .filter(|s| !s.keyword.trim().is_empty())
                .take(MAX_SUGGESTIONS)
                .collect(),
            None => {
                tracing::warn!("Could not parse image suggestions");
                Vec::new()
            }
        }
    }
}

fn post_prompt(topic: &str, previous_titles: &[String], keywords: Option<&str>) -> String {
    let keyword_line = keywords
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| format!("\nRelated keywords: {}", k))
        .unwrap_or_default();

    format!(
        r#"You are a professional blog writer for a Korean real-estate and natural-housing company.
Write a blog post in Korean about the following topic.

Topic: {topic}{keyword_line}

Requirements:
1. An engaging, search-friendly title of at most 40 characters
2. A body of 2000-3000 characters
3. Write the body as simple HTML using only <p>, <h2>, <h3>, <ul>, <li>, <strong>, <em>
4. Never use div, span, style attributes or classes
5. Give readers practical, useful information in a friendly tone
6. Split the text into readable paragraphs
7. Draw on expertise in real estate, clay (황토) houses and construction{duplicates}

Respond with JSON only, in this shape:
{{
  "title": "post title",
  "content": "HTML body",
  "summary": "summary of at most 100 characters"
}}"#,
        duplicates = duplication_clause(previous_titles),
    )
}

/// Numbered list of earlier titles the model should steer away from.
fn duplication_clause(previous_titles: &[String]) -> String {
    if previous_titles.is_empty() {
        return String::new();
    }
    let list = previous_titles
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "\n\nTake a clearly different angle and content from these existing posts:\n{}",
        list
    )
}

fn suggestion_prompt(topic: &str, html: &str) -> String {
    format!(
        r#"Below is a blog post about "{topic}", as HTML.

Post:
{html}

Recommend 3-4 images to place between its paragraphs. Each image must fit a specific
paragraph and come with a concrete, searchable keyword.

Respond with JSON only, in this shape:
{{
  "suggestions": [
    {{
      "keyword": "English search keyword (e.g. modern house architecture)",
      "description": "short Korean caption saying which paragraph it illustrates",
      "relatedText": "10-20 character phrase copied verbatim from the text of that paragraph, without tags"
    }}
  ]
}}

Rules:
- keyword must be English
- every image should complement a different part of the post
- prefer real estate, architecture and housing imagery"#
    )
}

fn parse_draft(topic: &str, raw: &str) -> Draft {
    if let Some(envelope) = parse_envelope::<DraftEnvelope>(raw) {
        let content = sanitize_html(&envelope.content);
        if !content.is_empty() {
            let title = match envelope.title.trim() {
                "" => topic.to_string(),
                t => t.to_string(),
            };
            let summary = match envelope.summary.trim() {
                "" => truncate_chars(&plain_text(&content), SUMMARY_CHARS),
                s => s.to_string(),
            };
            return Draft {
                title,
                content,
                summary,
            };
        }
    }

    tracing::warn!("Generated post was not valid JSON, using raw text");
    let text = raw.trim();
    Draft {
        title: topic.to_string(),
        content: sanitize_html(&format!("<p>{}</p>", text.replace('\n', "</p>\n<p>"))),
        summary: truncate_chars(text, SUMMARY_CHARS),
    }
}

/// Parses a JSON object out of a model reply, tolerating code fences and chatter around it.
fn parse_envelope<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let stripped = strip_fences(raw);
    if let Ok(value) = serde_json::from_str(&stripped) {
        return Some(value);
    }

    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&stripped[start..=end]).ok()
}

fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

fn plain_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), 200).unwrap_or_else(|_| html.to_string());
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTextModel;

    #[test]
    fn duplication_clause_numbers_titles() {
        assert_eq!(duplication_clause(&[]), "");
        let clause = duplication_clause(&["첫 글".to_string(), "둘째 글".to_string()]);
        assert!(clause.ends_with("1. 첫 글\n2. 둘째 글"));
    }

    #[test]
    fn prompt_mentions_topic_keywords_and_history() {
        let prompt = post_prompt("황토집 단열", &["이전 제목".to_string()], Some("단열, 에너지"));
        assert!(prompt.contains("Topic: 황토집 단열"));
        assert!(prompt.contains("Related keywords: 단열, 에너지"));
        assert!(prompt.contains("1. 이전 제목"));

        let bare = post_prompt("황토집 단열", &[], None);
        assert!(!bare.contains("Related keywords"));
        assert!(!bare.contains("existing posts"));
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"title\": \"황토집의 겨울\", \"content\": \"<div class=\\\"x\\\">따뜻함</div>\", \"summary\": \"요약\"}\n```";
        let draft = parse_draft("주제", raw);
        assert_eq!(draft.title, "황토집의 겨울");
        assert_eq!(draft.content, "<p>따뜻함</p>");
        assert_eq!(draft.summary, "요약");
    }

    #[test]
    fn parses_json_surrounded_by_chatter() {
        let raw = "Here you go:\n{\"title\": \"T\", \"content\": \"<p>body</p>\"}\nEnjoy!";
        let draft = parse_draft("주제", raw);
        assert_eq!(draft.title, "T");
        assert_eq!(draft.content, "<p>body</p>");
        assert_eq!(draft.summary, "body");
    }

    #[test]
    fn falls_back_to_wrapped_paragraphs() {
        let raw = "첫 줄\n둘째 줄";
        let draft = parse_draft("황토집 단열", raw);
        assert_eq!(draft.title, "황토집 단열");
        assert_eq!(draft.content, "<p>첫 줄</p> <p>둘째 줄</p>");
        assert_eq!(draft.summary, "첫 줄\n둘째 줄");

        let long = "가".repeat(300);
        assert_eq!(parse_draft("t", &long).summary.chars().count(), 100);
    }

    #[tokio::test]
    async fn generate_propagates_model_failure() {
        let generator = ContentGenerator::new(Arc::new(FakeTextModel::failing()));
        assert!(generator.generate("주제", &[], None).await.is_err());
    }

    #[tokio::test]
    async fn suggestions_are_best_effort() {
        let failing = ContentGenerator::new(Arc::new(FakeTextModel::failing()));
        assert!(failing.suggest_images("<p>x</p>", "주제").await.is_empty());

        let garbage = ContentGenerator::new(Arc::new(FakeTextModel::replying(vec!["not json"])));
        assert!(garbage.suggest_images("<p>x</p>", "주제").await.is_empty());

        let reply = r#"```json
{"suggestions": [
  {"keyword": "clay house", "description": "황토집 외관", "relatedText": "황토집은"},
  {"keyword": "", "description": "빈 키워드"},
  {"keyword": "insulation", "description": "단열재"}
]}
```"#;
        let model = Arc::new(FakeTextModel::replying(vec![reply]));
        let generator = ContentGenerator::new(model.clone());
        let body = "<p><strong>황토집은</strong> 따뜻합니다</p>";
        let suggestions = generator.suggest_images(body, "단열").await;
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].related_text, "황토집은");
        assert_eq!(suggestions[1].keyword, "insulation");
        assert!(model.prompts()[0].contains(body));
    }
}
