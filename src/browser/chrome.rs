use crate::browser::navigation::NavigationManager;
use crate::core::{BrowserConfig, Config, DriverHandle, Locator, ScriptArg};
use crate::dom::{ElementRef, ElementSnapshot, PageScope};
use crate::errors::{ProbeError, Result};
use crate::utils::javascript::{
    JavaScriptRunner, HIT_TEST, IS_DISPLAYED, IS_ENABLED, SCROLL_INTO_VIEW,
};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const GET_ATTRIBUTE: &str = r#"
    const el = arguments[0];
    if (arguments[1] === 'value' && 'value' in el) { return el.value; }
    return el.getAttribute(arguments[1]);
"#;

const GET_TEXT: &str =
    "return (arguments[0].innerText || arguments[0].textContent || '').replace(/\\s+/g, ' ').trim();";

const TITLE: &str = "return document.title;";

/// Headless Chrome page driven over the DevTools protocol.
pub struct ChromeDriver {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    session: Uuid,
    epoch: AtomicU64,
    navigation_timeout: Duration,
    poll_interval: Duration,
}

impl ChromeDriver {
    pub async fn launch(config: &Config) -> Result<Self> {
        let browser = Self::launch_browser(&config.browser)?;
        let tab = browser
            .new_tab()
            .map_err(|e| ProbeError::LaunchFailed(e.to_string()))?;

        let navigation_timeout = Duration::from_millis(config.browser.navigation_timeout_ms);
        tab.set_default_timeout(navigation_timeout);

        let session = Uuid::new_v4();
        info!(%session, headless = config.browser.headless, "chrome launched");

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
            session,
            epoch: AtomicU64::new(0),
            navigation_timeout,
            poll_interval: config.waits.poll_interval(),
        })
    }

    fn launch_browser(config: &BrowserConfig) -> Result<Browser> {
        let extra = chrome_args(config);
        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .idle_browser_timeout(idle_timeout(config))
            .args(extra.iter().map(OsStr::new).collect())
            .build()
            .map_err(|e| ProbeError::LaunchFailed(e.to_string()))?;

        Browser::new(launch_options).map_err(|e| ProbeError::LaunchFailed(e.to_string()))
    }

    fn tab(&self) -> Result<&Arc<Tab>> {
        self.tab.as_ref().ok_or(ProbeError::SessionClosed)
    }

    fn scope(&self) -> PageScope {
        PageScope {
            session: self.session,
            epoch: self.epoch.load(Ordering::SeqCst),
        }
    }

    fn check(&self, element: &ElementRef) -> Result<()> {
        self.tab()?;
        if element.scope() != self.scope() {
            return Err(ProbeError::StaleElement(element.describe()));
        }
        Ok(())
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self
            .tab()?
            .evaluate(script, false)
            .map_err(|e| ProbeError::JavaScriptFailed(e.to_string()))?;
        JavaScriptRunner::unwrap_result(result.value)
    }

    fn call(&self, code: &str, args: &[ScriptArg]) -> Result<Value> {
        for arg in args {
            if let ScriptArg::Element(element) = arg {
                self.check(element)?;
            }
        }
        self.evaluate(&JavaScriptRunner::invoke(code, args)?)
    }

    fn call_on(&self, code: &str, element: &ElementRef) -> Result<Value> {
        self.call(code, &[ScriptArg::from(element)])
    }
}

/// Chrome flags beyond what `LaunchOptions` covers, user-supplied ones last.
fn chrome_args(config: &BrowserConfig) -> Vec<String> {
    let mut args = vec!["--disable-dev-shm-usage".to_string()];
    if let Some(ua) = &config.user_agent {
        args.push(format!("--user-agent={}", ua));
    }
    if config.disable_images {
        args.push("--blink-settings=imagesEnabled=false".to_string());
    }
    args.extend(config.args.iter().cloned());
    args
}

/// Chrome must stay alive through the slowest page load a check can wait on.
fn idle_timeout(config: &BrowserConfig) -> Duration {
    Duration::from_millis(config.navigation_timeout_ms).max(Duration::from_secs(30)) * 2
}

#[async_trait]
impl DriverHandle for ChromeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .map_err(|e| ProbeError::NavigationFailed(e.to_string()))?;
        tab.wait_until_navigated()
            .map_err(|e| ProbeError::NavigationFailed(e.to_string()))?;
        self.epoch.fetch_add(1, Ordering::SeqCst);

        let loaded = NavigationManager::wait_for_ready_state(self, self.navigation_timeout).await?;
        debug!(%url, duration_ms = loaded.duration_ms, "page loaded");
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        self.tab()?;
        let scope = self.scope();
        let found = self.evaluate(&JavaScriptRunner::collect(locator))?;
        let snapshots: Vec<ElementSnapshot> = serde_json::from_value(found)?;
        Ok(snapshots.into_iter().map(|s| s.into_ref(scope)).collect())
    }

    async fn get_attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        let value = self.call(GET_ATTRIBUTE, &[ScriptArg::from(element), ScriptArg::from(name)])?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn get_text(&self, element: &ElementRef) -> Result<String> {
        let value = self.call_on(GET_TEXT, element)?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.call_on(SCROLL_INTO_VIEW, element)?;
        if let Value::String(obscured_by) = self.call_on(HIT_TEST, element)? {
            return Err(ProbeError::ClickIntercepted {
                element: element.describe(),
                obscured_by,
            });
        }

        let selector = JavaScriptRunner::element_selector(element.handle());
        self.tab()?
            .find_element(&selector)
            .map_err(|_| ProbeError::StaleElement(element.describe()))?
            .click()
            .map_err(ProbeError::from_any_error)?;
        Ok(())
    }

    async fn send_text(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.check(element)?;
        let selector = JavaScriptRunner::element_selector(element.handle());
        self.tab()?
            .find_element(&selector)
            .map_err(|_| ProbeError::StaleElement(element.describe()))?
            .type_into(text)
            .map_err(ProbeError::from_any_error)?;
        Ok(())
    }

    async fn submit(&self, element: &ElementRef) -> Result<()> {
        self.check(element)?;
        let tab = self.tab()?;
        let selector = JavaScriptRunner::element_selector(element.handle());
        tab.find_element(&selector)
            .map_err(|_| ProbeError::StaleElement(element.describe()))?
            .focus()
            .map_err(ProbeError::from_any_error)?;
        tab.press_key("Enter").map_err(ProbeError::from_any_error)?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<()> {
        self.call_on(SCROLL_INTO_VIEW, element)?;
        Ok(())
    }

    async fn run_script(&self, code: &str, args: &[ScriptArg]) -> Result<Value> {
        self.call(code, args)
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        Ok(self.call_on(IS_DISPLAYED, element)?.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        Ok(self.call_on(IS_ENABLED, element)?.as_bool().unwrap_or(false))
    }

    async fn current_title(&self) -> Result<String> {
        let title = self.call(TITLE, &[])?;
        Ok(title.as_str().unwrap_or_default().to_string())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close(false) {
                debug!(error = %e, "tab did not close cleanly");
            }
        }
        // dropping the browser terminates the chrome process
        if self.browser.take().is_some() {
            info!(session = %self.session, "chrome closed");
        }
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_the_browser_config() {
        let mut config = BrowserConfig::default();
        config.user_agent = Some("probe/1.0".to_string());
        config.disable_images = true;
        config.args = vec!["--lang=en".to_string()];

        let args = chrome_args(&config);
        assert_eq!(args.first().map(String::as_str), Some("--disable-dev-shm-usage"));
        assert!(args.contains(&"--user-agent=probe/1.0".to_string()));
        assert!(args.contains(&"--blink-settings=imagesEnabled=false".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--lang=en"));
    }

    #[test]
    fn idle_timeout_outlasts_navigation() {
        let mut config = BrowserConfig::default();
        config.navigation_timeout_ms = 90_000;
        assert_eq!(idle_timeout(&config), Duration::from_secs(180));

        config.navigation_timeout_ms = 1_000;
        assert_eq!(idle_timeout(&config), Duration::from_secs(60));
    }
}
