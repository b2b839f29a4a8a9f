//! Tag whitelist pass over generated post markup.
//!
//! The markup is tokenized into tags and text, rewritten by the rules below and
//! serialized back in canonical form, so running the pass twice changes nothing.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([A-Za-z][A-Za-z0-9]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
        .expect("tag pattern")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern")
});

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Block containers rewritten to another tag.
const RENAMED_TAGS: &[(&str, &str)] = &[("div", "p")];

/// Inline containers dropped while their content is kept.
const UNWRAPPED_TAGS: &[&str] = &["span"];

/// Elements removed when they hold nothing but whitespace.
const PRUNED_WHEN_EMPTY: &[&str] = &["p", "strong", "em"];

/// Attributes that survive, per tag. Everything else is dropped.
const ALLOWED_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "title"]),
    ("img", &["src", "alt"]),
];

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Open {
        name: String,
        attrs: Vec<(String, Option<String>)>,
    },
    Close(String),
}

pub fn sanitize_html(content: &str) -> String {
    if content.trim().is_empty() {
        return String::new();
    }

    let content = COMMENT_RE.replace_all(content, "");
    let mut tokens: Vec<Token> = tokenize(&content)
        .into_iter()
        .filter_map(rewrite)
        .collect();

    loop {
        let before = tokens.len();
        tokens = merge_text(tokens);
        tokens = prune_empty(tokens);
        if tokens.len() == before {
            break;
        }
    }

    trim_edges(&mut tokens);
    serialize(&tokens)
}

fn tokenize(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for cap in TAG_RE.captures_iter(content) {
        let Some(whole) = cap.get(0) else {
            continue;
        };
        if whole.start() > last {
            tokens.push(Token::Text(content[last..whole.start()].to_string()));
        }
        last = whole.end();

        let name = cap[2].to_ascii_lowercase();
        if &cap[1] == "/" {
            tokens.push(Token::Close(name));
        } else {
            let attrs = ATTR_RE
                .captures_iter(cap.get(3).map_or("", |m| m.as_str()))
                .map(|a| {
                    let value = a
                        .get(2)
                        .or_else(|| a.get(3))
                        .or_else(|| a.get(4))
                        .map(|v| v.as_str().to_string());
                    (a[1].to_ascii_lowercase(), value)
                })
                .collect();
            tokens.push(Token::Open { name, attrs });
        }
    }

    if last < content.len() {
        tokens.push(Token::Text(content[last..].to_string()));
    }
    tokens
}

fn rewrite(token: Token) -> Option<Token> {
    match token {
        Token::Text(text) => Some(Token::Text(WHITESPACE_RE.replace_all(&text, " ").into_owned())),
        Token::Open { name, attrs } => {
            let name = renamed(name);
            if UNWRAPPED_TAGS.contains(&name.as_str()) {
                return None;
            }
            let allowed = ALLOWED_ATTRIBUTES
                .iter()
                .find(|(tag, _)| *tag == name)
                .map_or(&[][..], |(_, attrs)| *attrs);
            let attrs = attrs
                .into_iter()
                .filter(|(attr, _)| allowed.contains(&attr.as_str()))
                .collect();
            Some(Token::Open { name, attrs })
        }
        Token::Close(name) => {
            let name = renamed(name);
            if UNWRAPPED_TAGS.contains(&name.as_str()) || VOID_TAGS.contains(&name.as_str()) {
                return None;
            }
            Some(Token::Close(name))
        }
    }
}

fn renamed(name: String) -> String {
    RENAMED_TAGS
        .iter()
        .find(|(from, _)| *from == name)
        .map_or(name, |(_, to)| to.to_string())
}

fn merge_text(tokens: Vec<Token>) -> Vec<Token> {
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Token::Text(next) = &token {
            if next.is_empty() {
                continue;
            }
            if let Some(Token::Text(prev)) = merged.last_mut() {
                prev.push_str(next);
                let collapsed = WHITESPACE_RE.replace_all(prev, " ").into_owned();
                *prev = collapsed;
                continue;
            }
        }
        merged.push(token);
    }
    merged
}

fn prune_empty(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let Token::Open { name, .. } = &tokens[i] {
            if PRUNED_WHEN_EMPTY.contains(&name.as_str()) {
                let mut j = i + 1;
                if matches!(tokens.get(j), Some(Token::Text(t)) if t.trim().is_empty()) {
                    j += 1;
                }
                if matches!(tokens.get(j), Some(Token::Close(close)) if close == name) {
                    i = j + 1;
                    continue;
                }
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

fn trim_edges(tokens: &mut Vec<Token>) {
    if let Some(Token::Text(first)) = tokens.first_mut() {
        *first = first.trim_start().to_string();
    }
    if let Some(Token::Text(last)) = tokens.last_mut() {
        *last = last.trim_end().to_string();
    }
    tokens.retain(|t| !matches!(t, Token::Text(text) if text.is_empty()));
}

fn serialize(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            // Angle brackets left in text must not read as tags on the next pass
            Token::Text(text) => out.push_str(&text.replace('<', "&lt;").replace('>', "&gt;")),
            Token::Open { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for (attr, value) in attrs {
                    out.push(' ');
                    out.push_str(attr);
                    if let Some(value) = value {
                        out.push_str("=\"");
                        out.push_str(&value.replace('"', "&quot;"));
                        out.push('"');
                    }
                }
                out.push('>');
            }
            Token::Close(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_presentational_attributes() {
        let html = r#"<p style="color:red" class="lead" id="x">안녕하세요</p><h2 class='t'>제목</h2>"#;
        assert_eq!(sanitize_html(html), "<p>안녕하세요</p><h2>제목</h2>");
    }

    #[test]
    fn rewrites_div_and_unwraps_span() {
        let html = r#"<div class="box"><span style="x">황토</span>집</div>"#;
        assert_eq!(sanitize_html(html), "<p>황토집</p>");
    }

    #[test]
    fn removes_nested_empty_elements() {
        let html = "<p>one</p>\n<p> <strong>  </strong> </p>\n\n<em></em><p>two</p>";
        assert_eq!(sanitize_html(html), "<p>one</p> <p>two</p>");
    }

    #[test]
    fn keeps_whitelisted_attributes() {
        let html = r#"<a href="/x" onclick="evil()">link</a><img src='a.jpg' alt="집" width="10"/>"#;
        assert_eq!(sanitize_html(html), r#"<a href="/x">link</a><img src="a.jpg" alt="집">"#);
    }

    #[test]
    fn collapses_whitespace_and_trims() {
        assert_eq!(sanitize_html("  <p>a \n\t b</p>\n\n  "), "<p>a b</p>");
        assert_eq!(sanitize_html(" \n "), "");
    }

    #[test]
    fn escapes_brackets_left_in_text() {
        assert_eq!(sanitize_html("<<span></span>p> </p>"), "&lt;p&gt; </p>");
        assert_eq!(sanitize_html("3 < 5 > 4"), "3 &lt; 5 &gt; 4");
        assert_eq!(sanitize_html("<!-- hidden --><p>본문</p>"), "<p>본문</p>");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            r#"<div style="a"><span>x</span></div><p>  </p><strong> </strong>tail"#,
            "<P CLASS=\"c\">Upper</P><ul><li>하나</li><li>둘</li></ul>",
            "text < 3 and <br/> line <em>e</em>",
            r#"<a title='say "hi"' href=x>q</a>"#,
            "<p><strong></strong></p><p><em> </em></p>",
            "<!-- note --><h3>제목</h3>   <p>본문</p>",
            "<<span></span>p> </p>",
            "a <<span>x</span>/p> b",
        ];
        for sample in samples {
            let once = sanitize_html(sample);
            assert_eq!(sanitize_html(&once), once, "not idempotent for {sample:?}");
        }
    }
}
