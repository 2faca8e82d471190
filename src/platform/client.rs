//! HTTP client for the scraped download front-ends

use crate::error::SnapError;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Browser profiles used for header emulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ClientType {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Android,
    Ios,
}

impl ClientType {
    /// Get all available client types
    pub fn all() -> Vec<ClientType> {
        vec![
            ClientType::Chrome,
            ClientType::Firefox,
            ClientType::Safari,
            ClientType::Edge,
            ClientType::Android,
            ClientType::Ios,
        ]
    }

    /// Check if this is a mobile client
    pub fn is_mobile(&self) -> bool {
        matches!(self, ClientType::Android | ClientType::Ios)
    }

    /// User agent sent by this profile
    pub fn user_agent(&self) -> &'static str {
        match self {
            ClientType::Chrome => "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36",
            ClientType::Firefox => "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:135.0) Gecko/20100101 Firefox/135.0",
            ClientType::Safari => "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.3 Safari/605.1.15",
            ClientType::Edge => "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36 Edg/133.0.0.0",
            ClientType::Android => "Mozilla/5.0 (Linux; Android 14; SM-S918B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Mobile Safari/537.36",
            ClientType::Ios => "Mozilla/5.0 (iPhone; CPU iPhone OS 18_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.3 Mobile/15E148 Safari/604.1",
        }
    }

    /// Client hint headers sent alongside the user agent
    pub fn client_hints(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            ClientType::Chrome => vec![
                ("Sec-Ch-Ua", r#""Not(A:Brand";v="99", "Google Chrome";v="133", "Chromium";v="133""#),
                ("Sec-Ch-Ua-Mobile", "?0"),
                ("Sec-Ch-Ua-Platform", r#""Windows""#),
            ],
            ClientType::Edge => vec![
                ("Sec-Ch-Ua", r#""Not(A:Brand";v="99", "Microsoft Edge";v="133", "Chromium";v="133""#),
                ("Sec-Ch-Ua-Mobile", "?0"),
                ("Sec-Ch-Ua-Platform", r#""Windows""#),
            ],
            ClientType::Android => vec![
                ("Sec-Ch-Ua-Mobile", "?1"),
                ("Sec-Ch-Ua-Platform", r#""Android""#),
            ],
            ClientType::Ios => vec![
                ("Sec-Ch-Ua-Mobile", "?1"),
                ("Sec-Ch-Ua-Platform", r#""iOS""#),
            ],
            ClientType::Firefox | ClientType::Safari => Vec::new(),
        }
    }
}

impl Default for ClientType {
    fn default() -> Self {
        ClientType::Chrome
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientType::Chrome => "chrome",
            ClientType::Firefox => "firefox",
            ClientType::Safari => "safari",
            ClientType::Edge => "edge",
            ClientType::Android => "android",
            ClientType::Ios => "ios",
        };
        f.write_str(name)
    }
}

impl FromStr for ClientType {
    type Err = SnapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClientType::all()
            .into_iter()
            .find(|client| client.to_string() == s.to_lowercase())
            .ok_or_else(|| SnapError::Generic(format!("Unknown client type: {}", s)))
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent override
    pub user_agent: Option<String>,
    /// Proxy URL
    pub proxy_url: Option<String>,
    /// Browser profile to emulate
    pub client_type: ClientType,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            proxy_url: None,
            client_type: ClientType::Chrome,
        }
    }
}

/// Browser-like HTTP client shared by every extractor
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self, SnapError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, SnapError> {
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .cookie_store(true);

        if let Some(proxy_url) = &config.proxy_url {
            match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => warn!("Ignoring invalid proxy {}: {}", proxy_url, e),
            }
        }

        let client = builder.build()?;
        Ok(Self { client, config })
    }

    /// User agent sent with every request
    pub fn user_agent(&self) -> &str {
        self.config
            .user_agent
            .as_deref()
            .unwrap_or_else(|| self.config.client_type.user_agent())
    }

    /// Create a request carrying the configured browser profile headers
    pub fn browser_request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header("User-Agent", self.user_agent())
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("Cache-Control", "no-cache");

        for (name, value) in self.config.client_type.client_hints() {
            request = request.header(name, value);
        }

        request
    }

    /// GET a page as text
    pub async fn get_html(&self, url: &str, referer: Option<&str>) -> Result<String, SnapError> {
        debug!("GET {}", url);
        let mut request = self
            .browser_request(Method::GET, url)
            .header("Accept", ACCEPT_HTML);
        if let Some(referer) = referer {
            request = request.header("Referer", referer);
        }

        Self::read_text(request.send().await?).await
    }

    /// POST a urlencoded form the way the front-end's own script does
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        origin: &str,
    ) -> Result<String, SnapError> {
        debug!("POST {} ({} fields)", url, form.len());
        let response = self.form_request(url, form, origin).send().await?;
        Self::read_text(response).await
    }

    /// POST a urlencoded form and decode a JSON reply
    pub async fn post_form_json<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
        origin: &str,
    ) -> Result<T, SnapError> {
        let body = self.post_form(url, form, origin).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn form_request(&self, url: &str, form: &[(&str, &str)], origin: &str) -> RequestBuilder {
        let origin = origin.trim_end_matches('/');
        self.browser_request(Method::POST, url)
            .header("Accept", "*/*")
            .header("Origin", origin)
            .header("Referer", format!("{}/", origin))
            .header("X-Requested-With", "XMLHttpRequest")
            .form(form)
    }

    async fn read_text(response: Response) -> Result<String, SnapError> {
        let status = response.status();
        if !status.is_success() {
            warn!("HTTP request failed with status: {}", status);
            return Err(SnapError::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response.text().await?)
    }
}
