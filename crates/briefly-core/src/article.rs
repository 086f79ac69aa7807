//! Web article fetching and main-content extraction.
//!
//! The extractor scores containers by the paragraphs they hold (a
//! readability-style heuristic) and emits the winning container's text
//! blocks, skipping navigation, footers, cookie banners and similar chrome.

use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::{Config, SummarizeError};

/// Paragraphs shorter than this (in characters) carry no score.
const MIN_PARAGRAPH_CHARS: usize = 25;
/// Blocks whose link text exceeds this share of their text are treated as navigation.
const MAX_LINK_DENSITY: f64 = 0.5;
const COMMA_BONUS: f64 = 10.0;
const ARTICLE_TAG_BONUS: f64 = 200.0;
const MAIN_TAG_BONUS: f64 = 100.0;
const CONTENT_HINT_BONUS: f64 = 100.0;

/// Elements that never hold article text.
const EXCLUDED_TAGS: &[&str] = &[
    "nav", "aside", "footer", "header", "form", "script", "style", "noscript",
];

/// Tags that count as a text block when collecting the winning container.
const BLOCK_TAGS: &[&str] = &["p", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre"];

static BOILERPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(nav|navbar|menu|sidebar|footer|header|banner|cookies?|consent|comments?|share|sharing|social|related|promo|advert\w*|ads?|subscribe|newsletter)\b",
    )
    .unwrap()
});
static CONTENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)article|body|content|entry|main|post|story|text").unwrap());

static PARAGRAPH_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static BLOCK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, h2, h3, h4, h5, h6, li, blockquote, pre").unwrap());
static LINK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static BODY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static OG_TITLE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());

/// Plain-text article pulled out of a web page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: Option<String>,
    /// Text blocks separated by blank lines. May be empty.
    pub text: String,
}

/// Whether `url` starts with an `http://` or `https://` scheme
/// (ASCII case-insensitive).
pub fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Downloads pages and extracts their article text.
pub struct ArticleFetcher {
    client: reqwest::Client,
}

impl ArticleFetcher {
    /// Build the HTTP client. Fails if the configured user agent is not a
    /// valid header value or the TLS backend cannot be initialized.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Fetch `url` and return its article text.
    ///
    /// Surrounding whitespace is ignored. Every network, status or decoding
    /// failure is reported as [`SummarizeError::UrlFetch`].
    pub async fn fetch(&self, url: &str) -> Result<Article, SummarizeError> {
        let url = url.trim();
        if !has_http_scheme(url) {
            return Err(SummarizeError::InvalidUrlFormat);
        }

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SummarizeError::UrlFetch(e.to_string()))?;
        let html = resp
            .text()
            .await
            .map_err(|e| SummarizeError::UrlFetch(e.to_string()))?;

        let article = extract_article(&html);
        if article.text.trim().is_empty() {
            return Err(SummarizeError::EmptyArticleText);
        }

        tracing::debug!(
            url,
            title = article.title.as_deref().unwrap_or(""),
            html_bytes = html.len(),
            chars = article.text.chars().count(),
            "extracted article"
        );
        Ok(article)
    }
}

/// Extract the title and main article text from an HTML document.
pub fn extract_article(html: &str) -> Article {
    let doc = Html::parse_document(html);
    let title = extract_title(&doc);

    // Score each paragraph's parent and grandparent.
    let mut candidates: Vec<(ElementRef, f64)> = Vec::new();
    let mut index = HashMap::new();
    let mut fallback_paragraphs: Vec<String> = Vec::new();

    for p in doc.select(&PARAGRAPH_SEL) {
        if in_boilerplate(&p) {
            continue;
        }
        let text = block_text(&p);
        let chars = text.chars().count();
        if chars < MIN_PARAGRAPH_CHARS || link_density(&p, chars) > MAX_LINK_DENSITY {
            continue;
        }

        let commas = text.matches(',').count() as f64;
        let score = chars as f64 + COMMA_BONUS * commas;
        fallback_paragraphs.push(text);

        let parent = p.parent().and_then(ElementRef::wrap);
        let grandparent = parent.and_then(|e| e.parent()).and_then(ElementRef::wrap);
        for (container, share) in [(parent, 1.0), (grandparent, 0.5)] {
            let Some(container) = container else { continue };
            let slot = *index.entry(container.id()).or_insert_with(|| {
                candidates.push((container, initial_score(&container)));
                candidates.len() - 1
            });
            candidates[slot].1 += score * share;
        }
    }

    let mut best: Option<(ElementRef, f64)> = None;
    for (el, raw) in &candidates {
        let chars = block_text(el).chars().count();
        let score = raw * (1.0 - link_density(el, chars));
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((*el, score));
        }
    }

    let text = match best {
        Some((container, _)) => collect_blocks(&container),
        None if !fallback_paragraphs.is_empty() => fallback_paragraphs.join("\n\n"),
        None => visible_body_text(&doc),
    };

    Article { title, text }
}

fn extract_title(doc: &Html) -> Option<String> {
    doc.select(&OG_TITLE_SEL)
        .filter_map(|m| m.value().attr("content"))
        .map(norm_ws)
        .find(|t| !t.is_empty())
        .or_else(|| {
            doc.select(&TITLE_SEL)
                .map(|t| block_text(&t))
                .find(|t| !t.is_empty())
        })
}

fn initial_score(el: &ElementRef) -> f64 {
    let mut score = match el.value().name() {
        "article" => ARTICLE_TAG_BONUS,
        "main" => MAIN_TAG_BONUS,
        _ => 0.0,
    };
    if CONTENT_RE.is_match(&class_and_id(el)) {
        score += CONTENT_HINT_BONUS;
    }
    score
}

/// Text blocks of the winning container, in document order.
fn collect_blocks(container: &ElementRef) -> String {
    let mut blocks: Vec<String> = Vec::new();

    for el in container.select(&BLOCK_SEL) {
        if el.id() == container.id() || in_boilerplate(&el) || inside_block(&el, container) {
            continue;
        }
        let text = block_text(&el);
        if text.is_empty() {
            continue;
        }
        let is_heading = el.value().name().starts_with('h');
        if !is_heading {
            let chars = text.chars().count();
            if chars < MIN_PARAGRAPH_CHARS || link_density(&el, chars) > MAX_LINK_DENSITY {
                continue;
            }
        }
        blocks.push(text);
    }

    blocks.join("\n\n")
}

/// Whether a block tag sits between `el` and `container`.
fn inside_block(el: &ElementRef, container: &ElementRef) -> bool {
    for node in el.ancestors() {
        if node.id() == container.id() {
            return false;
        }
        if let Some(ancestor) = ElementRef::wrap(node)
            && BLOCK_TAGS.contains(&ancestor.value().name())
        {
            return true;
        }
    }
    false
}

/// All text under `<body>` outside boilerplate regions.
fn visible_body_text(doc: &Html) -> String {
    let Some(body) = doc.select(&BODY_SEL).next() else {
        return String::new();
    };

    let mut pieces: Vec<&str> = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let excluded = node
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|parent| in_boilerplate(&parent));
        if !excluded {
            pieces.push(text);
        }
    }
    norm_ws(&pieces.join(" "))
}

fn is_boilerplate(el: &ElementRef) -> bool {
    let name = el.value().name();
    if EXCLUDED_TAGS.contains(&name) {
        return true;
    }
    if matches!(name, "html" | "body" | "article" | "main") {
        return false;
    }
    let attrs = class_and_id(el);
    // A content hint wins: `site-content has-sidebar` is still the article.
    !attrs.is_empty() && BOILERPLATE_RE.is_match(&attrs) && !CONTENT_RE.is_match(&attrs)
}

fn in_boilerplate(el: &ElementRef) -> bool {
    is_boilerplate(el)
        || el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| is_boilerplate(&a))
}

fn class_and_id(el: &ElementRef) -> String {
    let mut out = String::new();
    if let Some(c) = el.value().attr("class") {
        out.push_str(c);
        out.push(' ');
    }
    if let Some(i) = el.value().attr("id") {
        out.push_str(i);
    }
    out
}

fn link_density(el: &ElementRef, text_chars: usize) -> f64 {
    if text_chars == 0 {
        return 0.0;
    }
    let link_chars: usize = el
        .select(&LINK_SEL)
        .map(|a| block_text(&a).chars().count())
        .sum();
    link_chars as f64 / text_chars as f64
}

fn block_text(el: &ElementRef) -> String {
    norm_ws(&el.text().collect::<String>())
}

fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
