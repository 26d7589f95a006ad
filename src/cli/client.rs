use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

/// Thin JSON client for the pages API
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

/// Status plus decoded body of one API call
#[derive(Debug)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiReply {
    /// `message` field of the body, if any
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("invalid server URL '{}': {}", base_url, e))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    pub fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<ApiReply> {
        let response = self.http.get(self.endpoint(path)?).send().await?;
        Self::reply(response).await
    }

    pub async fn post_json(&self, path: &str, body: &Value, token: Option<&str>) -> anyhow::Result<ApiReply> {
        let mut request = self.http.post(self.endpoint(path)?).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Self::reply(request.send().await?).await
    }

    async fn reply(response: reqwest::Response) -> anyhow::Result<ApiReply> {
        let status = response.status();
        let text = response.text().await?;
        // Non-JSON bodies (proxies, load balancers) are kept as a plain string
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(ApiReply { status, body })
    }
}
