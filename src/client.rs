use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const UA: &str = concat!("prvd/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: u16,
    pub body: String,
    pub json: Option<Value>,
}

impl ResponseData {
    pub fn is_created(&self) -> bool {
        self.status == 201
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let parsed = Url::parse(base_url).context("parsing base URL")?;
        let http = Client::builder()
            .user_agent(HeaderValue::from_static(UA))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            base_url: parsed,
            http,
            token: token.map(str::to_string),
        })
    }

    /// Sends `body` as JSON to the path made of `segments`. Non-success
    /// statuses are returned, not raised; only transport and body-read
    /// failures are errors.
    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &T,
    ) -> Result<ResponseData> {
        self.request(Method::POST, segments, Some(body))
    }

    /// Appends `segments` to the base URL. Each segment is percent-encoded
    /// on its own, so `/`, `?` and `#` inside an id stay part of that id.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("base URL `{}` cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&T>,
    ) -> Result<ResponseData> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "sending request");

        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(USER_AGENT, HeaderValue::from_static(UA));

        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().context("sending request")?;

        let status = response.status().as_u16();
        let text = response.text().context("reading response body")?;
        let json = serde_json::from_str(&text).ok();
        debug!(status, "received response");

        Ok(ResponseData {
            status,
            body: text,
            json,
        })
    }
}
