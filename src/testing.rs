//! In-process driver over a static HTML document.
//!
//! `SnapshotPage` answers queries by parsing its document with `scraper`, so
//! synthetic pages can exercise resolution and the action scripts without a
//! browser. It cannot run JavaScript; it only understands the snippets the action
//! scripts and page-load wait send (set a field value, script-driven click,
//! ready state).

use crate::actions::{ActionContext, ActionScript, Outcome};
use crate::core::{Config, DriverHandle, Locator, LocatorKind, ScriptArg, SiteProfile, WaitConfig};
use crate::dom::{ElementRef, ElementSnapshot, PageScope};
use crate::errors::{ProbeError, Result};
use crate::locator::{ElementResolver, ResolverState};
use crate::types::Credentials;
use crate::utils::javascript::{READY_STATE, SCRIPT_CLICK, SET_VALUE};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Something the page was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    Navigated(String),
    Clicked(String),
    ScriptClicked(String),
    Typed { target: String, text: String },
    ValueSet { target: String, value: String },
    Submitted(String),
    Scrolled(String),
    Closed,
}

/// Read side of a page's journal; stays usable after the page itself was
/// moved into (and dropped by) a session.
#[derive(Debug, Clone, Default)]
pub struct PageProbe {
    events: Arc<Mutex<Vec<DriverEvent>>>,
}

impl PageProbe {
    pub fn events(&self) -> Vec<DriverEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn is_closed(&self) -> bool {
        self.events().contains(&DriverEvent::Closed)
    }

    pub fn clicked(&self, target: &str) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, DriverEvent::Clicked(t) | DriverEvent::ScriptClicked(t) if t == target))
    }

    fn record(&self, event: DriverEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

struct PageState {
    html: String,
    scope: PageScope,
    values: HashMap<String, String>,
    closed: bool,
}

pub struct SnapshotPage {
    state: RwLock<PageState>,
    pages: HashMap<String, String>,
    title: Option<String>,
    intercepted: Vec<String>,
    hidden: Vec<String>,
    scripts_broken: bool,
    probe: PageProbe,
}

impl SnapshotPage {
    /// Page serving `html` for whatever URL it is navigated to.
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(PageState {
                html: html.into(),
                scope: PageScope::new(Uuid::new_v4()),
                values: HashMap::new(),
                closed: false,
            }),
            pages: HashMap::new(),
            title: None,
            intercepted: vec![],
            hidden: vec![],
            scripts_broken: false,
            probe: PageProbe::default(),
        }
    }

    /// Serve `html` at `url`; once any page is registered, unknown URLs fail
    /// to load.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Clicks landing on nodes matched by `css` (or inside them) are
    /// swallowed by an overlay.
    pub fn intercept_clicks(mut self, css: impl Into<String>) -> Self {
        self.intercepted.push(css.into());
        self
    }

    /// Nodes matched by `css` (and their descendants) are not displayed.
    pub fn hide(mut self, css: impl Into<String>) -> Self {
        self.hidden.push(css.into());
        self
    }

    /// Every `run_script` call fails.
    pub fn break_scripts(mut self) -> Self {
        self.scripts_broken = true;
        self
    }

    pub fn probe(&self) -> PageProbe {
        self.probe.clone()
    }

    async fn with_node<T>(
        &self,
        element: &ElementRef,
        f: impl FnOnce(scraper::ElementRef<'_>, &PageState) -> Result<T>,
    ) -> Result<T> {
        let state = self.state.read().await;
        ensure_usable(&state, element)?;

        let document = Html::parse_document(&state.html);
        let all = all_elements(&document);
        let index: usize = element
            .handle()
            .parse()
            .map_err(|_| ProbeError::StaleElement(element.describe()))?;
        let node = all
            .get(index)
            .copied()
            .ok_or_else(|| ProbeError::StaleElement(element.describe()))?;
        f(node, &state)
    }
}

fn ensure_usable(state: &PageState, element: &ElementRef) -> Result<()> {
    if state.closed {
        return Err(ProbeError::SessionClosed);
    }
    if element.scope() != state.scope {
        return Err(ProbeError::StaleElement(element.describe()));
    }
    Ok(())
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ProbeError::InvalidSelector(format!("{}: {:?}", css, e)))
}

fn all_elements(document: &Html) -> Vec<scraper::ElementRef<'_>> {
    match Selector::parse("*") {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => vec![],
    }
}

fn normalised_text(node: scraper::ElementRef<'_>) -> String {
    node.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn snapshot(index: usize, node: scraper::ElementRef<'_>) -> ElementSnapshot {
    let element = node.value();
    ElementSnapshot {
        handle: index.to_string(),
        tag: element.name().to_string(),
        id: element.id().map(str::to_string),
        classes: element
            .attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
        text: normalised_text(node),
    }
}

/// The node and every element above it.
fn self_and_ancestors(node: scraper::ElementRef<'_>) -> impl Iterator<Item = scraper::ElementRef<'_>> {
    std::iter::once(node).chain(node.ancestors().filter_map(scraper::ElementRef::wrap))
}

fn matches_any(node: scraper::ElementRef<'_>, selectors: &[String]) -> Result<Option<String>> {
    for css in selectors {
        let selector = parse_selector(css)?;
        if self_and_ancestors(node).any(|n| selector.matches(&n)) {
            return Ok(Some(css.clone()));
        }
    }
    Ok(None)
}

fn hidden_by_markup(node: scraper::ElementRef<'_>) -> bool {
    self_and_ancestors(node).any(|n| {
        let element = n.value();
        let style = element
            .attr("style")
            .map(|s| s.replace(' ', "").to_lowercase())
            .unwrap_or_default();
        element.attr("hidden").is_some()
            || style.contains("display:none")
            || style.contains("visibility:hidden")
            || (element.name() == "input" && element.attr("type") == Some("hidden"))
    })
}

fn query(html: &str, locator: &Locator) -> Result<Vec<ElementSnapshot>> {
    let document = Html::parse_document(html);
    let all = all_elements(&document);

    let matched: Vec<usize> = match locator.kind {
        LocatorKind::Css => {
            let selector = parse_selector(&locator.value)?;
            document
                .select(&selector)
                .filter_map(|m| all.iter().position(|e| e.id() == m.id()))
                .collect()
        }
        LocatorKind::Id => (0..all.len())
            .filter(|&i| all[i].value().id() == Some(locator.value.as_str()))
            .take(1)
            .collect(),
        LocatorKind::ClassName => (0..all.len())
            .filter(|&i| {
                all[i]
                    .value()
                    .attr("class")
                    .map(|c| c.split_whitespace().any(|class| class == locator.value))
                    .unwrap_or(false)
            })
            .collect(),
        LocatorKind::TagName => (0..all.len())
            .filter(|&i| all[i].value().name().eq_ignore_ascii_case(&locator.value))
            .collect(),
        LocatorKind::XPath => {
            return Err(ProbeError::InvalidSelector(format!(
                "snapshot pages do not evaluate xpath: {}",
                locator.value
            )))
        }
    };

    Ok(matched.into_iter().map(|i| snapshot(i, all[i])).collect())
}

#[async_trait]
impl DriverHandle for SnapshotPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(ProbeError::SessionClosed);
        }
        if !self.pages.is_empty() {
            let html = self
                .pages
                .get(url)
                .ok_or_else(|| ProbeError::NavigationFailed(format!("no page served at {}", url)))?;
            state.html = html.clone();
        }
        state.scope = state.scope.next_page();
        state.values.clear();
        self.probe.record(DriverEvent::Navigated(url.to_string()));
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        let state = self.state.read().await;
        if state.closed {
            return Err(ProbeError::SessionClosed);
        }
        let scope = state.scope;
        Ok(query(&state.html, locator)?
            .into_iter()
            .map(|s| s.into_ref(scope))
            .collect())
    }

    async fn get_attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        self.with_node(element, |node, state| {
            if name == "value" {
                if let Some(value) = state.values.get(element.handle()) {
                    return Ok(Some(value.clone()));
                }
            }
            Ok(node.value().attr(name).map(str::to_string))
        })
        .await
    }

    async fn get_text(&self, element: &ElementRef) -> Result<String> {
        self.with_node(element, |node, _| Ok(normalised_text(node))).await
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        let intercepted = self
            .with_node(element, |node, _| matches_any(node, &self.intercepted))
            .await?;
        if let Some(overlay) = intercepted {
            return Err(ProbeError::ClickIntercepted {
                element: element.describe(),
                obscured_by: overlay,
            });
        }
        self.probe.record(DriverEvent::Clicked(element.describe()));
        Ok(())
    }

    async fn send_text(&self, element: &ElementRef, text: &str) -> Result<()> {
        let mut state = self.state.write().await;
        ensure_usable(&state, element)?;
        state
            .values
            .entry(element.handle().to_string())
            .or_default()
            .push_str(text);
        self.probe.record(DriverEvent::Typed {
            target: element.describe(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn submit(&self, element: &ElementRef) -> Result<()> {
        self.with_node(element, |_, _| Ok(())).await?;
        self.probe.record(DriverEvent::Submitted(element.describe()));
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<()> {
        self.with_node(element, |_, _| Ok(())).await?;
        self.probe.record(DriverEvent::Scrolled(element.describe()));
        Ok(())
    }

    async fn run_script(&self, code: &str, args: &[ScriptArg]) -> Result<Value> {
        if self.scripts_broken {
            return Err(ProbeError::JavaScriptFailed(
                "script evaluation is disabled on this page".to_string(),
            ));
        }

        match (code, args) {
            (SET_VALUE, [ScriptArg::Element(element), ScriptArg::Value(Value::String(value))]) => {
                let mut state = self.state.write().await;
                ensure_usable(&state, element)?;
                state
                    .values
                    .insert(element.handle().to_string(), value.clone());
                self.probe.record(DriverEvent::ValueSet {
                    target: element.describe(),
                    value: value.clone(),
                });
                Ok(Value::Null)
            }
            (READY_STATE, []) => {
                if self.state.read().await.closed {
                    return Err(ProbeError::SessionClosed);
                }
                Ok(Value::String("complete".to_string()))
            }
            (SCRIPT_CLICK, [ScriptArg::Element(element)]) => {
                self.with_node(element, |_, _| Ok(())).await?;
                self.probe
                    .record(DriverEvent::ScriptClicked(element.describe()));
                Ok(Value::Null)
            }
            _ => Err(ProbeError::JavaScriptFailed(format!(
                "snapshot pages cannot evaluate: {}",
                code
            ))),
        }
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        self.with_node(element, |node, _| {
            Ok(!hidden_by_markup(node) && matches_any(node, &self.hidden)?.is_none())
        })
        .await
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        self.with_node(element, |node, _| Ok(node.value().attr("disabled").is_none()))
            .await
    }

    async fn current_title(&self) -> Result<String> {
        let state = self.state.read().await;
        if state.closed {
            return Err(ProbeError::SessionClosed);
        }
        if let Some(title) = &self.title {
            return Ok(title.clone());
        }
        let document = Html::parse_document(&state.html);
        let selector = parse_selector("title")?;
        Ok(document
            .select(&selector)
            .next()
            .map(normalised_text)
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.closed {
            state.closed = true;
            self.probe.record(DriverEvent::Closed);
        }
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(5)
    }
}

pub struct TestHelper;

impl TestHelper {
    /// Wait bounds short enough for timeout paths to finish quickly.
    pub fn fast_waits() -> WaitConfig {
        WaitConfig {
            element_timeout_ms: 60,
            post_action_timeout_ms: 60,
            page_timeout_ms: 60,
            poll_interval_ms: 5,
        }
    }

    pub fn fast_config() -> Config {
        Config {
            waits: Self::fast_waits(),
            ..Default::default()
        }
    }

    /// Run one script against `page` with fresh session state.
    pub async fn execute(
        script: &dyn ActionScript,
        page: &SnapshotPage,
        site: &SiteProfile,
        credentials: Option<&Credentials>,
    ) -> Outcome {
        let resolver = ElementResolver::new(site.roles.clone());
        let mut state = ResolverState::new();
        let waits = Self::fast_waits();
        let mut ctx = ActionContext {
            driver: page,
            resolver: &resolver,
            state: &mut state,
            waits: &waits,
            site,
            credentials,
        };
        script.execute(&mut ctx).await
    }
}
