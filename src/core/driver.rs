use crate::core::Locator;
use crate::dom::ElementRef;
use crate::errors::{ProbeError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Argument handed to [`DriverHandle::run_script`]; scripts see them as
/// `arguments[0]`, `arguments[1]`, ...
#[derive(Debug, Clone)]
pub enum ScriptArg {
    Element(ElementRef),
    Value(Value),
}

impl From<&ElementRef> for ScriptArg {
    fn from(element: &ElementRef) -> Self {
        ScriptArg::Element(element.clone())
    }
}

impl From<&str> for ScriptArg {
    fn from(value: &str) -> Self {
        ScriptArg::Value(Value::String(value.to_string()))
    }
}

/// Page states a flow can block on.
#[derive(Debug, Clone)]
pub enum WaitCondition {
    TitleContains(String),
    Present(Locator),
    Visible(ElementRef),
    Clickable(ElementRef),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::TitleContains(text) => write!(f, "title to contain '{}'", text),
            WaitCondition::Present(locator) => write!(f, "presence of {}", locator),
            WaitCondition::Visible(element) => write!(f, "visibility of {}", element.describe()),
            WaitCondition::Clickable(element) => {
                write!(f, "clickability of {}", element.describe())
            }
        }
    }
}

/// Live connection to one browser page.
///
/// A handle is driven by a single flow at a time. Element handles it returns
/// are only valid on the page they were found on.
#[async_trait]
pub trait DriverHandle: Send + Sync {
    /// Load `url`; invalidates every previously issued [`ElementRef`].
    async fn navigate(&self, url: &str) -> Result<()>;

    /// All nodes matching `locator`, in document order.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>>;

    async fn find_one(&self, locator: &Locator) -> Result<ElementRef> {
        self.find_all(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::ElementNotFound(locator.to_string()))
    }

    async fn get_attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>>;

    async fn get_text(&self, element: &ElementRef) -> Result<String>;

    /// Fails with [`ProbeError::ClickIntercepted`] when another node would
    /// receive the click.
    async fn click(&self, element: &ElementRef) -> Result<()>;

    async fn send_text(&self, element: &ElementRef, text: &str) -> Result<()>;

    /// Sends the return key to the element.
    async fn submit(&self, element: &ElementRef) -> Result<()>;

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<()>;

    async fn run_script(&self, code: &str, args: &[ScriptArg]) -> Result<Value>;

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool>;

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool>;

    async fn current_title(&self) -> Result<String>;

    async fn close(&mut self) -> Result<()>;

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
    }

    async fn condition_met(&self, condition: &WaitCondition) -> Result<bool> {
        match condition {
            WaitCondition::TitleContains(text) => Ok(self.current_title().await?.contains(text)),
            WaitCondition::Present(locator) => match self.find_one(locator).await {
                Ok(_) => Ok(true),
                Err(ProbeError::ElementNotFound(_)) => Ok(false),
                Err(e) => Err(e),
            },
            WaitCondition::Visible(element) => self.is_displayed(element).await,
            WaitCondition::Clickable(element) => {
                Ok(self.is_displayed(element).await? && self.is_enabled(element).await?)
            }
        }
    }

    /// Poll until `condition` holds or `timeout` elapses.
    async fn wait_until(&self, condition: &WaitCondition, timeout: Duration) -> Result<()> {
        let start_time = Instant::now();

        loop {
            if self.condition_met(condition).await? {
                return Ok(());
            }
            if start_time.elapsed() >= timeout {
                return Err(ProbeError::Timeout {
                    condition: condition.to_string(),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.poll_interval()).await;
        }
    }
}
