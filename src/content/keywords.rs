/// Particles and filler words that make poor image search terms.
const STOP_WORDS: &[&str] = &[
    "의", "를", "에", "은", "는", "이", "가", "와", "과", "로", "으로", "하는", "하기", "방법",
    "어떻게",
];

const MAX_DERIVED_KEYWORDS: usize = 3;

/// Search keywords for a topic: the stored comma list when present, otherwise up to
/// three meaningful words of the topic itself.
pub fn extract_keywords(topic: &str, keywords: Option<&str>) -> Vec<String> {
    if let Some(stored) = keywords.filter(|k| !k.trim().is_empty()) {
        return stored
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
    }

    topic
        .split_whitespace()
        .filter(|word| word.chars().count() > 1 && !STOP_WORDS.contains(word))
        .take(MAX_DERIVED_KEYWORDS)
        .map(str::to_string)
        .collect()
}
