use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub topic: String,
    /// Comma-separated search hints, as entered by the admin.
    pub keywords: Option<String>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTopic {
    pub topic: String,
    #[serde(default)]
    pub keywords: Option<String>,
}

impl NewTopic {
    pub fn new(topic: impl Into<String>, keywords: Option<&str>) -> Self {
        Self {
            topic: topic.into(),
            keywords: keywords.map(|k| k.to_string()),
        }
    }

    /// Parses one import line: `topic text | keyword, keyword`.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (topic, keywords) = match line.split_once('|') {
            Some((t, k)) => (t.trim(), Some(k.trim()).filter(|k| !k.is_empty())),
            None => (line, None),
        };
        if topic.is_empty() {
            return None;
        }
        Some(Self::new(topic, keywords))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TopicStats {
    pub total: i64,
    pub used: i64,
    pub unused: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_import_lines() {
        let t = NewTopic::from_line("황토방 시공 과정 | 황토방, 시공").unwrap();
        assert_eq!(t.topic, "황토방 시공 과정");
        assert_eq!(t.keywords.as_deref(), Some("황토방, 시공"));

        let t = NewTopic::from_line("  전원주택 입지  ").unwrap();
        assert_eq!(t.topic, "전원주택 입지");
        assert!(t.keywords.is_none());

        assert!(NewTopic::from_line("").is_none());
        assert!(NewTopic::from_line("# comment").is_none());
        assert!(NewTopic::from_line(" | only keywords").is_none());
    }
}
