//! WebFetch: fetch a URL and extract readable text.
//!
//! URLs are validated before any request is made and plain `http` is
//! upgraded to `https`. Redirects are followed only while they stay on the
//! same host; a cross-host redirect is reported back so the model can decide
//! whether to fetch the new location. Pages are cached for 15 minutes.

use crate::tools::output::render_capped_prose;
use async_trait::async_trait;
use klaude_domain::{Tool, ToolCall, ToolDefinition, ToolError, ToolParameter};
use reqwest::Url;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tool name constant
pub const WEB_FETCH: &str = "WebFetch";

/// Maximum response body size (5 MB)
const MAX_BODY_SIZE: usize = 5 * 1024 * 1024;

/// How long a fetched page is reused
const CACHE_TTL: Duration = Duration::from_secs(15 * 60);

const USER_AGENT: &str = concat!("klaude/", env!("CARGO_PKG_VERSION"), " (WebFetch tool)");

const FETCH_HINT: &str = "The page was cut short; fetch a more specific URL for the rest.";

/// A fetched page before text extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub content_type: String,
    pub body: String,
    /// Location of a redirect to another host that was not followed
    pub redirect: Option<String>,
}

/// Retrieves pages over the network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, ToolError>;
}

/// [`PageFetcher`] backed by `reqwest`.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let policy = reqwest::redirect::Policy::custom(|attempt| {
            if attempt.previous().len() >= 10 {
                return attempt.error("too many redirects");
            }
            let origin = attempt.previous().first().and_then(|u| u.host_str());
            if origin != attempt.url().host_str() {
                attempt.stop()
            } else {
                attempt.follow()
            }
        });
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(policy)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, ToolError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Error: Failed to fetch URL: {}", e)))?;

        let status = response.status();
        let final_url = response.url().to_string();
        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(reqwest::header::CONTENT_TYPE).unwrap_or_default();

        if status.is_redirection() {
            let location = header(reqwest::header::LOCATION)
                .and_then(|loc| response.url().join(&loc).ok())
                .map(|u| u.to_string());
            return Ok(FetchedPage {
                url: final_url,
                status: status.as_u16(),
                content_type,
                body: String::new(),
                redirect: location,
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > MAX_BODY_SIZE as u64)
        {
            return Err(ToolError::execution_failed(format!(
                "Error: Response too large (max {} bytes)",
                MAX_BODY_SIZE
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            ToolError::execution_failed(format!("Error: Failed to read response body: {}", e))
        })?;
        if body.len() > MAX_BODY_SIZE {
            return Err(ToolError::execution_failed(format!(
                "Error: Response too large: {} bytes",
                body.len()
            )));
        }

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body: String::from_utf8_lossy(&body).into_owned(),
            redirect: None,
        })
    }
}

/// Check `raw` and return the URL to request.
pub fn validate_url(raw: &str) -> Result<Url, ToolError> {
    let invalid = |why: &str| ToolError::invalid_argument(format!("Error: Invalid URL - {}", why));

    let Some((scheme, rest)) = raw.split_once("://") else {
        return Err(invalid("missing scheme (http:// or https://)"));
    };
    let scheme = scheme.to_ascii_lowercase();
    if scheme.is_empty() {
        return Err(invalid("missing scheme (http:// or https://)"));
    }
    if scheme != "http" && scheme != "https" {
        return Err(invalid(&format!("unsupported scheme '{}'", scheme)));
    }

    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    let (host, port) = if let Some(v6) = host_port.strip_prefix('[') {
        match v6.split_once(']') {
            Some((host, tail)) => (host, tail.strip_prefix(':')),
            None => return Err(invalid("malformed domain")),
        }
    } else {
        match host_port.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        }
    };

    if host.is_empty() {
        return Err(invalid("missing domain"));
    }
    if host.contains("..") || host.starts_with('.') {
        return Err(invalid("malformed domain"));
    }
    if let Some(port) = port
        && !port.is_empty()
        && !port.parse::<u16>().is_ok_and(|p| p >= 1)
    {
        return Err(invalid("invalid port number"));
    }

    let upgraded = format!("https://{}", rest);
    Url::parse(&upgraded).map_err(|e| invalid(&e.to_string()))
}

/// True when `host` is `domain` or one of its subdomains.
pub fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = domain.trim().trim_start_matches("*.").to_ascii_lowercase();
    !domain.is_empty() && (host == domain || host.ends_with(&format!(".{}", domain)))
}

const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "svg", "head", "template"];

/// Elements that start and end on their own line.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Extract readable text from HTML, skipping scripts and styles.
///
/// Block elements end up on their own lines; `<pre>` keeps its line breaks.
pub fn html_to_text(html: &str) -> String {
    use scraper::{ElementRef, Html};

    let document = Html::parse_document(html);
    let body = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "body");
    let root = body.unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    collect_element_text(root, false, &mut text);
    clean_whitespace(&text)
}

/// Append the text under `element` to `out`, depth first.
fn collect_element_text(element: scraper::ElementRef, in_pre: bool, out: &mut String) {
    let name = element.value().name();
    if SKIP_TAGS.contains(&name) {
        return;
    }
    let block = BLOCK_TAGS.contains(&name);
    let in_pre = in_pre || name == "pre";

    if block {
        push_line_break(out);
    }
    for child in element.children() {
        match child.value() {
            scraper::Node::Text(text) if in_pre => out.push_str(text),
            scraper::Node::Text(text) => {
                out.extend(text.chars().map(|c| if c == '\n' { ' ' } else { c }));
            }
            scraper::Node::Element(_) => {
                if let Some(child_el) = scraper::ElementRef::wrap(child) {
                    collect_element_text(child_el, in_pre, out);
                }
            }
            _ => {}
        }
    }
    if block {
        push_line_break(out);
    } else if matches!(name, "td" | "th") {
        out.push(' ');
    }
}

fn push_line_break(out: &mut String) {
    if !out.trim_end_matches([' ', '\t']).ends_with('\n') {
        out.push('\n');
    }
}

/// Collapse runs of spaces, drop spaces around line breaks and keep at most
/// one blank line.
fn clean_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_space = false;
    let mut newlines = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            pending_space = false;
        } else if ch.is_whitespace() {
            pending_space = newlines == 0;
        } else {
            if !result.is_empty() {
                if newlines > 0 {
                    result.push_str(if newlines > 1 { "\n\n" } else { "\n" });
                } else if pending_space {
                    result.push(' ');
                }
            }
            result.push(ch);
            newlines = 0;
            pending_space = false;
        }
    }

    result
}

fn looks_like_html(page: &FetchedPage) -> bool {
    if page.content_type.contains("html") {
        return true;
    }
    let head: String = page.body.trim_start().chars().take(15).collect();
    let head = head.to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Fetches a page and returns its text alongside the caller's prompt.
pub struct WebFetchTool {
    definition: ToolDefinition,
    fetcher: Arc<dyn PageFetcher>,
    blocked_domains: Vec<String>,
    cache: Mutex<HashMap<String, (Instant, FetchedPage)>>,
}

impl WebFetchTool {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        let definition = ToolDefinition::new(
            WEB_FETCH,
            "Fetches content from a specified URL and returns the page text together with the \
             prompt describing what to extract from it. HTTP URLs are upgraded to HTTPS. When a \
             URL redirects to a different host the redirect URL is returned instead; fetch it \
             with a new request. Responses are cached for 15 minutes.",
        )
        .with_parameter(
            ToolParameter::new("url", "The URL to fetch content from", true)
                .with_constraint("format", "uri"),
        )
        .with_parameter(ToolParameter::new(
            "prompt",
            "The prompt to run on the fetched content",
            true,
        ));
        Self {
            definition,
            fetcher,
            blocked_domains: Vec::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_blocked_domains(mut self, domains: Vec<String>) -> Self {
        self.blocked_domains = domains;
        self
    }

    fn cached(&self, key: &str) -> Option<FetchedPage> {
        let mut cache = self.cache.lock().ok()?;
        cache.retain(|_, (at, _)| at.elapsed() < CACHE_TTL);
        cache.get(key).map(|(_, page)| page.clone())
    }

    fn remember(&self, key: String, page: FetchedPage) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, (Instant::now(), page));
        }
    }
}

#[async_trait]
impl Tool for WebFetchTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let raw_url = call.require_string("url")?;
        let prompt = call.require_string("prompt")?;
        let url = validate_url(raw_url)?;

        let host = url.host_str().unwrap_or_default().to_string();
        if self.blocked_domains.iter().any(|d| host_matches(&host, d)) {
            warn!(host = %host, "Refusing to fetch from blocked domain");
            return Err(ToolError::permission_denied(format!(
                "Klaude is unable to fetch from {}",
                host
            )));
        }

        let key = url.to_string();
        let page = match self.cached(&key) {
            Some(page) => {
                debug!(url = %key, "WebFetch cache hit");
                page
            }
            None => {
                let page = self.fetcher.fetch(&url).await?;
                if page.redirect.is_none() && (200..300).contains(&page.status) {
                    self.remember(key.clone(), page.clone());
                }
                page
            }
        };

        if let Some(redirect) = &page.redirect {
            return Ok(format!(
                "REDIRECT DETECTED: The URL redirects to a different host.\n\n\
                 Original URL: {}\nRedirect URL: {}\nStatus: {}\n\n\
                 To complete your request, fetch the redirect URL with a new WebFetch call using:\n\
                 - url: \"{}\"\n- prompt: \"{}\"",
                key, redirect, page.status, redirect, prompt
            ));
        }

        if !(200..300).contains(&page.status) {
            return Err(ToolError::execution_failed(format!(
                "Error: HTTP {} fetching {}",
                page.status, key
            )));
        }

        let text = if looks_like_html(&page) {
            html_to_text(&page.body)
        } else {
            page.body.clone()
        };
        debug!(url = %key, status = page.status, chars = text.len(), "Fetched page");

        let mut lines = vec![
            format!("Fetched content from {}", page.url),
            format!("Prompt: {}", prompt),
            String::new(),
        ];
        lines.extend(text.lines().map(str::to_string));
        Ok(render_capped_prose(&lines, "lines", FETCH_HINT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFetcher {
        page: FetchedPage,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn html(body: &str) -> Arc<Self> {
            Arc::new(Self {
                page: FetchedPage {
                    url: "https://example.com/".to_string(),
                    status: 200,
                    content_type: "text/html; charset=utf-8".to_string(),
                    body: body.to_string(),
                    redirect: None,
                },
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &Url) -> Result<FetchedPage, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.page.clone())
        }
    }

    fn fetch_call(url: &str) -> ToolCall {
        ToolCall::new(WEB_FETCH)
            .with_arg("url", url)
            .with_arg("prompt", "Summarize")
    }

    #[test]
    fn test_validate_url_messages() {
        let msg = |u: &str| validate_url(u).unwrap_err().message;
        assert_eq!(
            msg("example.com"),
            "Error: Invalid URL - missing scheme (http:// or https://)"
        );
        assert_eq!(msg("ftp://example.com"), "Error: Invalid URL - unsupported scheme 'ftp'");
        assert_eq!(msg("https:///path"), "Error: Invalid URL - missing domain");
        assert_eq!(msg("https://exa..mple.com"), "Error: Invalid URL - malformed domain");
        assert_eq!(msg("https://example.com:70000/"), "Error: Invalid URL - invalid port number");
        assert_eq!(msg("https://example.com:0/"), "Error: Invalid URL - invalid port number");
    }

    #[test]
    fn test_http_upgraded_to_https() {
        let url = validate_url("http://example.com:8080/a?b=1").unwrap();
        assert_eq!(url.as_str(), "https://example.com:8080/a?b=1");
    }

    #[test]
    fn test_host_matches_subdomains() {
        assert!(host_matches("docs.python.org", "python.org"));
        assert!(host_matches("python.org", "python.org"));
        assert!(!host_matches("notpython.org", "python.org"));
    }

    #[test]
    fn test_html_to_text_strips_script_and_style() {
        let html = r#"
        <html><head><title>T</title></head><body>
            <script>var x = 1;</script>
            <style>.foo { color: red; }</style>
            <h1>Hello</h1><p>Visible text</p>
            <noscript>No JS</noscript>
        </body></html>
        "#;
        let text = html_to_text(html);
        assert_eq!(text, "Hello\nVisible text");
    }

    #[test]
    fn test_html_to_text_keeps_block_structure() {
        let html = "<body><p>First\n  paragraph with <b>bold</b> words.</p>\
                    <ul><li>one</li><li>two</li></ul>\
                    <pre>fn main() {\n    run();\n}</pre></body>";
        assert_eq!(
            html_to_text(html),
            "First paragraph with bold words.\none\ntwo\nfn main() {\nrun();\n}"
        );
    }

    #[test]
    fn test_clean_whitespace() {
        assert_eq!(clean_whitespace("  hello   world  "), "hello world");
        assert_eq!(clean_whitespace("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_whitespace("a  \n \n  b"), "a\n\nb");
    }

    #[tokio::test]
    async fn test_large_page_keeps_content_within_cap() {
        let paragraph = (0..200).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let html = format!(
            "<html><body>{}</body></html>",
            (0..40).map(|_| format!("<p>{paragraph}</p>")).collect::<String>()
        );
        let tool = WebFetchTool::new(StaticFetcher::html(&html));

        let output = tool.execute(&fetch_call("https://example.com/")).await.unwrap();
        assert!(output.chars().count() <= crate::tools::output::MAX_OUTPUT_CHARS);
        assert!(output.contains("\nword0 word1 word2"));
        assert!(output.matches("word199").count() > 10);
        assert!(output.contains("[Output truncated: showing "));
    }

    #[tokio::test]
    async fn test_single_huge_line_is_cut_not_dropped() {
        let html = format!("<html><body><p>{}</p></body></html>", "abc ".repeat(20_000));
        let tool = WebFetchTool::new(StaticFetcher::html(&html));

        let output = tool.execute(&fetch_call("https://example.com/")).await.unwrap();
        assert!(output.chars().count() <= crate::tools::output::MAX_OUTPUT_CHARS);
        assert!(output.contains("\n\nabc abc abc"));
        assert!(output.contains("the last one cut short]"));
    }

    #[tokio::test]
    async fn test_fetch_extracts_text_and_caches() {
        let fetcher = StaticFetcher::html("<html><body><p>Rust is fast</p></body></html>");
        let tool = WebFetchTool::new(fetcher.clone());

        let output = tool.execute(&fetch_call("http://example.com/")).await.unwrap();
        assert_eq!(
            output,
            "Fetched content from https://example.com/\nPrompt: Summarize\n\nRust is fast"
        );

        tool.execute(&fetch_call("https://example.com/")).await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blocked_domain() {
        let fetcher = StaticFetcher::html("<p>x</p>");
        let tool = WebFetchTool::new(fetcher.clone())
            .with_blocked_domains(vec!["python.org".to_string()]);

        let err = tool
            .execute(&fetch_call("https://docs.python.org/3/"))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Klaude is unable to fetch from docs.python.org");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cross_host_redirect_is_reported() {
        let fetcher = Arc::new(StaticFetcher {
            page: FetchedPage {
                url: "https://example.com/old".to_string(),
                status: 301,
                content_type: String::new(),
                body: String::new(),
                redirect: Some("https://other.org/new".to_string()),
            },
            calls: AtomicUsize::new(0),
        });
        let tool = WebFetchTool::new(fetcher);
        let output = tool
            .execute(&fetch_call("https://example.com/old"))
            .await
            .unwrap();
        assert!(output.starts_with("REDIRECT DETECTED"));
        assert!(output.contains("Redirect URL: https://other.org/new"));
    }
}
