//! Corpus fetcher for Simplified Chinese Wikipedia entries.
//!
//! Each entry is saved as `<title>.txt` holding a short header, the article
//! paragraphs, and the reference list. Requests run one at a time with a
//! fixed pause between them.

use mingyu_core::{AppError, AppResult};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const WIKI_BASE_URL: &str = "https://zh.wikipedia.org/zh-cn";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const NO_REFERENCES: &str = "（未检测到参考文献列表）";

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Re-download entries that already have a file
    pub force: bool,

    /// Pause between consecutive requests
    pub delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            force: false,
            delay: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchStats {
    pub requested: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// CSS selectors for a MediaWiki article page.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    content: Selector,
    paragraph: Selector,
    reference_item: Selector,
    reference_text: Selector,
    backlink: Selector,
}

fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css)
        .map_err(|e| AppError::Knowledge(format!("Invalid selector '{}': {:?}", css, e)))
}

impl PageExtractor {
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            content: selector("div#mw-content-text")?,
            paragraph: selector("p")?,
            reference_item: selector("ol.references li")?,
            reference_text: selector("span.reference-text")?,
            backlink: selector(r##"a[href*="#cite_ref"]"##)?,
        })
    }

    /// Render an article as corpus text.
    ///
    /// Returns `None` when the page has no content area.
    pub fn extract(&self, html: &str, title: &str, source_url: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let content = document.select(&self.content).next()?;

        let mut out = format!("标题: {}\n来源链接: {}\n", title, source_url);
        out.push_str(&"=".repeat(50));
        out.push_str("\n\n");

        for paragraph in content.select(&self.paragraph) {
            let text = paragraph.text().collect::<String>();
            let text = text.trim();
            if !text.is_empty() {
                out.push_str(text);
                out.push_str("\n\n");
            }
        }

        out.push('\n');
        out.push_str(&"=".repeat(20));
        out.push_str(" 参考文献 ");
        out.push_str(&"=".repeat(20));
        out.push_str("\n\n");

        let references: Vec<String> = document
            .select(&self.reference_item)
            .map(|li| self.reference_text(li))
            .filter(|text| !text.is_empty())
            .collect();

        if references.is_empty() {
            out.push_str(NO_REFERENCES);
            out.push('\n');
        } else {
            for (i, text) in references.iter().enumerate() {
                out.push_str(&format!("[{}] {}\n", i + 1, text));
            }
        }

        Some(out)
    }

    fn reference_text(&self, item: ElementRef<'_>) -> String {
        if let Some(span) = item.select(&self.reference_text).next() {
            return span.text().collect::<String>().trim().to_string();
        }

        // No span: drop the "^" jump links back to the citing paragraph
        let skipped: Vec<_> = item.select(&self.backlink).map(|a| a.id()).collect();
        let mut text = String::new();
        for node in item.descendants() {
            if let Some(fragment) = node.value().as_text() {
                if node.ancestors().any(|a| skipped.contains(&a.id())) {
                    continue;
                }
                text.push_str(fragment);
            }
        }
        text.trim().to_string()
    }
}

/// Turn a title or article URL into an entry title.
///
/// `https://zh.wikipedia.org/wiki/%E6%B5%B7%E7%91%9E` and `海瑞` both give
/// `海瑞`.
pub fn normalize_title(input: &str) -> String {
    let input = input.trim();
    let last = if input.contains("://") {
        input
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(input)
    } else {
        input
    };
    percent_decode(last)
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(byte) = hex {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// File an entry is saved to; `/` in titles is replaced.
pub fn entry_path(out_dir: &Path, title: &str) -> PathBuf {
    out_dir.join(format!("{}.txt", title.replace('/', "_")))
}

pub struct WikiFetcher {
    client: reqwest::Client,
    extractor: PageExtractor,
    base_url: String,
}

impl WikiFetcher {
    pub fn new() -> AppResult<Self> {
        Self::with_base_url(WIKI_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> AppResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            extractor: PageExtractor::new()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Download `titles` into `out_dir`.
    ///
    /// Per-entry failures are logged and counted, never returned.
    pub async fn fetch(
        &self,
        titles: &[String],
        out_dir: &Path,
        options: &FetchOptions,
    ) -> AppResult<FetchStats> {
        std::fs::create_dir_all(out_dir)?;

        let mut stats = FetchStats {
            requested: titles.len(),
            ..Default::default()
        };
        let mut first_request = true;

        for raw in titles {
            let title = normalize_title(raw);
            if title.is_empty() {
                tracing::warn!("Skipping empty title from input '{}'", raw);
                stats.failed += 1;
                continue;
            }

            let path = entry_path(out_dir, &title);
            if !options.force && path.exists() {
                tracing::info!("Skipping '{}' (already downloaded)", title);
                stats.skipped += 1;
                continue;
            }

            if !first_request && !options.delay.is_zero() {
                tokio::time::sleep(options.delay).await;
            }
            first_request = false;

            match self.fetch_one(&title, &path).await {
                Ok(()) => {
                    tracing::info!("Fetched '{}'", title);
                    stats.fetched += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch '{}': {}", title, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }

    async fn fetch_one(&self, title: &str, path: &Path) -> AppResult<()> {
        let url = format!("{}/{}", self.base_url, title);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Other(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Other(format!("HTTP {}", response.status())));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::Other(format!("Failed to read body: {}", e)))?;

        let text = self
            .extractor
            .extract(&html, title, &url)
            .ok_or_else(|| AppError::Knowledge("No content area in page".to_string()))?;

        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = r##"
        <html><body>
          <div id="mw-content-text">
            <p>海瑞，字汝贤，广东琼山人。</p>
            <p>   </p>
            <p>嘉靖四十五年，上<b>治安疏</b>。</p>
          </div>
          <ol class="references">
            <li><a href="#cite_ref-1">^</a> <span class="reference-text">《明史·海瑞传》</span></li>
            <li><a href="#cite_ref-2">^</a> 黄仁宇《万历十五年》</li>
            <li><a href="#cite_ref-3">^</a></li>
          </ol>
        </body></html>
    "##;

    #[test]
    fn test_extract_article() {
        let extractor = PageExtractor::new().unwrap();
        let text = extractor
            .extract(PAGE, "海瑞", "https://zh.wikipedia.org/zh-cn/海瑞")
            .unwrap();

        let expected_head = format!(
            "标题: 海瑞\n来源链接: https://zh.wikipedia.org/zh-cn/海瑞\n{}\n\n\
             海瑞，字汝贤，广东琼山人。\n\n嘉靖四十五年，上治安疏。\n\n\n",
            "=".repeat(50)
        );
        assert!(text.starts_with(&expected_head));
        assert!(text.contains(&format!("{} 参考文献 {}", "=".repeat(20), "=".repeat(20))));
        assert!(text.ends_with("[1] 《明史·海瑞传》\n[2] 黄仁宇《万历十五年》\n"));
        assert!(!text.contains('^'));
    }

    #[test]
    fn test_extract_without_references() {
        let extractor = PageExtractor::new().unwrap();
        let html = r#"<div id="mw-content-text"><p>卫所。</p></div>"#;
        let text = extractor.extract(html, "卫所制度", "u").unwrap();
        assert!(text.ends_with("（未检测到参考文献列表）\n"));
    }

    #[test]
    fn test_extract_requires_content_area() {
        let extractor = PageExtractor::new().unwrap();
        assert!(extractor.extract("<p>nothing</p>", "x", "u").is_none());
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("海瑞"), "海瑞");
        assert_eq!(normalize_title("https://zh.wikipedia.org/wiki/海瑞"), "海瑞");
        assert_eq!(
            normalize_title("https://zh.wikipedia.org/wiki/%E6%B5%B7%E7%91%9E"),
            "海瑞"
        );
        assert_eq!(
            normalize_title("https://zh.wikipedia.org/wiki/刘健_(明朝)"),
            "刘健_(明朝)"
        );
        assert_eq!(normalize_title("100%"), "100%");
    }

    #[test]
    fn test_entry_path_sanitizes_slashes() {
        let path = entry_path(Path::new("/corpus"), "A/B");
        assert_eq!(path, PathBuf::from("/corpus/A_B.txt"));
    }

    #[tokio::test]
    async fn test_existing_entries_are_skipped() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("海瑞.txt"), "cached").unwrap();

        let fetcher = WikiFetcher::with_base_url("http://127.0.0.1:9").unwrap();
        let stats = fetcher
            .fetch(&["海瑞".to_string()], temp.path(), &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.fetched, 0);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("海瑞.txt")).unwrap(),
            "cached"
        );
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_returned() {
        let temp = TempDir::new().unwrap();
        let fetcher = WikiFetcher::with_base_url("http://127.0.0.1:9").unwrap();
        let options = FetchOptions {
            force: true,
            delay: Duration::ZERO,
        };

        let stats = fetcher
            .fetch(&["于谦".to_string(), "".to_string()], temp.path(), &options)
            .await
            .unwrap();

        assert_eq!(stats.requested, 2);
        assert_eq!(stats.failed, 2);
        assert!(!temp.path().join("于谦.txt").exists());
    }
}
