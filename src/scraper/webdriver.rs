//! Minimal W3C WebDriver client (chromedriver, geckodriver, ...) over HTTP/JSON.

use super::session::{BrowserLauncher, BrowserSession, ElementRef};
use super::ScrapeError;
use reqwest::blocking::Client;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Key under which W3C WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    pub webdriver_url: String,
    pub window_width: u32,
    pub window_height: u32,
    pub request_timeout_sec: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            window_width: 1920,
            window_height: 1080,
            request_timeout_sec: 60,
        }
    }
}

pub struct WebDriverLauncher {
    config: WebDriverConfig,
}

impl WebDriverLauncher {
    pub fn new(config: WebDriverConfig) -> Self {
        Self { config }
    }
}

impl BrowserLauncher for WebDriverLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        Ok(Box::new(WebDriverSession::start(&self.config)?))
    }
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
}

#[derive(Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
    closed: bool,
}

impl WebDriverSession {
    /// Start a headless Chrome session with the configured viewport.
    ///
    /// Builds a blocking HTTP client, so it must not be called from within
    /// an async context.
    pub fn start(config: &WebDriverConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_sec))
            .build()?;
        let base_url = config.webdriver_url.trim_end_matches('/').to_string();

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            "--headless",
                            format!("--window-size={},{}", config.window_width, config.window_height),
                        ]
                    }
                }
            }
        });

        let response = client
            .post(format!("{}/session", base_url))
            .json(&capabilities)
            .send()
            .map_err(|e| ScrapeError::Session(format!("WebDriver unreachable: {}", e)))?;
        let value = Self::unwrap_response(response)?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ScrapeError::Protocol("New session response has no sessionId".into()))?
            .to_string();

        debug!("Started WebDriver session {}", session_id);
        Ok(Self {
            client,
            base_url,
            session_id,
            closed: false,
        })
    }

    fn unwrap_response(response: reqwest::blocking::Response) -> Result<Value, ScrapeError> {
        let status = response.status();
        let body: WireResponse = response
            .json()
            .map_err(|e| ScrapeError::Protocol(format!("Invalid response body: {}", e)))?;

        if status.is_success() {
            return Ok(body.value);
        }

        match serde_json::from_value::<WireError>(body.value) {
            Ok(err) if err.error == "no such element" => {
                Err(ScrapeError::ElementNotFound(err.message))
            }
            Ok(err) if err.error == "session not created" || err.error == "invalid session id" => {
                Err(ScrapeError::Session(format!("{}: {}", err.error, err.message)))
            }
            Ok(err) => Err(ScrapeError::Protocol(format!(
                "{} ({}): {}",
                err.error, status, err.message
            ))),
            Err(_) => Err(ScrapeError::Protocol(format!(
                "Request failed with status {}",
                status
            ))),
        }
    }

    fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ScrapeError> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        Self::unwrap_response(request.send()?)
    }

    fn element_path(element: &ElementRef, suffix: &str) -> String {
        format!("/element/{}/{}", element.0, suffix)
    }

    fn bool_value(value: Value, what: &str) -> Result<bool, ScrapeError> {
        value
            .as_bool()
            .ok_or_else(|| ScrapeError::Protocol(format!("Expected boolean for {}", what)))
    }
}

impl BrowserSession for WebDriverSession {
    fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn find_elements(&self, xpath: &str) -> Result<Vec<ElementRef>, ScrapeError> {
        let value = self.command(
            Method::POST,
            "/elements",
            Some(json!({ "using": "xpath", "value": xpath })),
        )?;
        let Value::Array(items) = value else {
            return Err(ScrapeError::Protocol("Expected element array".into()));
        };
        items
            .iter()
            .map(|item| {
                item.get(ELEMENT_KEY)
                    .and_then(Value::as_str)
                    .map(|id| ElementRef(id.to_string()))
                    .ok_or_else(|| ScrapeError::Protocol("Malformed element reference".into()))
            })
            .collect()
    }

    fn text(&self, element: &ElementRef) -> Result<String, ScrapeError> {
        let value = self.command(Method::GET, &Self::element_path(element, "text"), None)?;
        match value {
            Value::String(s) => Ok(s),
            _ => Err(ScrapeError::Protocol("Expected string element text".into())),
        }
    }

    fn is_displayed(&self, element: &ElementRef) -> Result<bool, ScrapeError> {
        let value = self.command(Method::GET, &Self::element_path(element, "displayed"), None)?;
        Self::bool_value(value, "displayed")
    }

    fn is_enabled(&self, element: &ElementRef) -> Result<bool, ScrapeError> {
        let value = self.command(Method::GET, &Self::element_path(element, "enabled"), None)?;
        Self::bool_value(value, "enabled")
    }

    fn click(&self, element: &ElementRef) -> Result<(), ScrapeError> {
        self.command(
            Method::POST,
            &Self::element_path(element, "click"),
            Some(json!({})),
        )?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ScrapeError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.command(Method::DELETE, "", None)?;
        debug!("Closed WebDriver session {}", self.session_id);
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                warn!("Failed to close WebDriver session {}: {}", self.session_id, e);
            }
        }
    }
}
