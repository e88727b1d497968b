use crate::error::AppError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub retry_after: Option<Duration>,
    pub body: String,
}

/// One GET against the upstream. Non-2xx statuses are returned as responses;
/// only connection-level failures are errors.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, query: &[(&str, String)], api_key: &str) -> Result<HttpResponse, AppError>;
}

/// `Retry-After` as delay-seconds. HTTP-date values are not sent by the
/// upstream and read as absent.
pub fn parse_retry_after(header: Option<&str>) -> Option<Duration> {
    header
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Short connect timeout; longer read timeout because match bodies are large.
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(15))
            .user_agent(concat!("league_insight/", env!("CARGO_PKG_VERSION")))
            .build();
        UreqTransport { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, query: &[(&str, String)], api_key: &str) -> Result<HttpResponse, AppError> {
        let mut request = self.agent.get(url).set("X-Riot-Token", api_key);
        for (name, value) in query {
            request = request.query(name, value);
        }

        match request.call() {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.into_string().map_err(|e| AppError::HttpError(e.to_string()))?;
                Ok(HttpResponse { status, retry_after: None, body })
            }
            Err(ureq::Error::Status(status, resp)) => {
                let retry_after = parse_retry_after(resp.header("Retry-After"));
                let body = resp.into_string().unwrap_or_default();
                Ok(HttpResponse { status, retry_after, body })
            }
            Err(ureq::Error::Transport(t)) => Err(AppError::HttpError(t.to_string())),
        }
    }
}
