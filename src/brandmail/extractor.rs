// SPDX-License-Identifier: MIT

//! Page download and article extraction
//!
//! Fetches a brand page and pulls out its title and main text. No caching,
//! no retry: every call goes to the network.

use super::error::ExtractionError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Title and main text of a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub text: String,
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<Article, ExtractionError>;
}

/// Containers tried in order for the article body
const BODY_CANDIDATES: &[&str] = &["article", "main", "[role=main]", "body"];

/// Shortest paragraph kept, in characters
const MIN_PARAGRAPH_CHARS: usize = 20;

pub struct HtmlExtractor {
    http: Client,
}

impl HtmlExtractor {
    pub fn new(user_agent: &str) -> Result<Self, ExtractionError> {
        let http = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ContentExtractor for HtmlExtractor {
    async fn extract(&self, url: &str) -> Result<Article, ExtractionError> {
        log::debug!("Fetching page: {}", url);
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ExtractionError::Status(response.status().as_u16()));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_html(content_type) {
                return Err(ExtractionError::NotHtml(content_type.to_string()));
            }
        }

        let html = response.text().await?;
        let article = parse_article(&html)?;

        log::info!(
            "Extracted '{}' from {} ({} chars of text)",
            article.title,
            url,
            article.text.len()
        );

        Ok(article)
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector(e.to_string()))
}

/// Extract title and body text from an HTML document
pub fn parse_article(html: &str) -> Result<Article, ExtractionError> {
    let document = Html::parse_document(html);

    let title = extract_title(&document)?;
    let text = extract_text(&document)?;

    if text.is_empty() {
        return Err(ExtractionError::EmptyBody);
    }

    Ok(Article { title, text })
}

fn extract_title(document: &Html) -> Result<String, ExtractionError> {
    let og_title = selector(r#"meta[property="og:title"]"#)?;
    if let Some(content) = document
        .select(&og_title)
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|t| !t.is_empty())
    {
        return Ok(content);
    }

    for css in ["title", "h1"] {
        let sel = selector(css)?;
        if let Some(text) = document
            .select(&sel)
            .map(|el| collapse_whitespace(&element_text(el)))
            .find(|t| !t.is_empty())
        {
            return Ok(text);
        }
    }

    Ok(String::new())
}

fn extract_text(document: &Html) -> Result<String, ExtractionError> {
    let paragraph = selector("p")?;

    for css in BODY_CANDIDATES {
        let sel = selector(css)?;
        let Some(container) = document.select(&sel).next() else {
            continue;
        };

        let paragraphs: Vec<String> = container
            .select(&paragraph)
            .map(|p| collapse_whitespace(&element_text(p)))
            .filter(|p| p.chars().count() >= MIN_PARAGRAPH_CHARS)
            .collect();

        if !paragraphs.is_empty() {
            return Ok(paragraphs.join("\n\n"));
        }

        let fallback = html_to_text(&container.html());
        if !fallback.is_empty() {
            return Ok(fallback);
        }
    }

    Ok(String::new())
}

/// Text content of an element, skipping script and style children
fn element_text(el: ElementRef<'_>) -> String {
    el.descendants()
        .filter_map(|node| node.value().as_text().map(|t| (node, t)))
        .filter(|(node, _)| {
            !node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript"))
            })
        })
        .map(|(_, t)| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert HTML to clean text
fn html_to_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), 100);

    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
