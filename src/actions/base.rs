use crate::core::{DriverHandle, Locator, ScriptArg, SiteProfile, WaitCondition, WaitConfig};
use crate::dom::ElementRef;
use crate::errors::{FaultKind, ProbeError, Result};
use crate::intent::{Intent, Role};
use crate::locator::{ElementResolver, Resolution, ResolverState};
use crate::types::Credentials;
use crate::utils::javascript::{SCRIPT_CLICK, SET_VALUE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutcomeStatus::Passed => "PASSED",
            OutcomeStatus::Failed => "FAILED",
            OutcomeStatus::Skipped => "SKIPPED",
        };
        f.write_str(name)
    }
}

/// Result of running one action script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    status: OutcomeStatus,
    message: String,
    role: Option<Role>,
    duration_ms: u64,
    finished_at: DateTime<Utc>,
}

impl Outcome {
    fn new(status: OutcomeStatus, message: String) -> Self {
        Self {
            status,
            message,
            role: None,
            duration_ms: 0,
            finished_at: Utc::now(),
        }
    }

    pub fn passed(message: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::Passed, message.into())
    }

    /// A failure always carries a diagnostic.
    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "Failed without a diagnostic message".to_string()
        } else {
            message
        };
        Self::new(OutcomeStatus::Failed, message)
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::Skipped, message.into())
    }

    pub fn with_role(mut self, role: Option<Role>) -> Self {
        self.role = role;
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status, self.message)
    }
}

/// Turns a fault raised inside an already-resolved flow into a failure.
pub fn failure(prefix: &str, err: &ProbeError) -> Outcome {
    match err.fault_kind() {
        FaultKind::Timeout => warn!(error = %err, "wait expired"),
        FaultKind::Rejected => warn!(error = %err, "interaction rejected"),
        FaultKind::Driver => warn!(error = %err, "driver fault"),
    }
    Outcome::failed(format!("{}: {}", prefix, err))
}

/// Everything a script may touch while it runs.
pub struct ActionContext<'a> {
    pub driver: &'a dyn DriverHandle,
    pub resolver: &'a ElementResolver,
    pub state: &'a mut ResolverState,
    pub waits: &'a WaitConfig,
    pub site: &'a SiteProfile,
    pub credentials: Option<&'a Credentials>,
}

impl<'a> ActionContext<'a> {
    /// Resolve `role` against the live page and record the result in the
    /// session state.
    pub async fn resolve(&mut self, role: Role) -> Result<Resolution> {
        let resolution = self.resolver.resolve(self.driver, role).await?;
        match &resolution {
            Resolution::Resolved(resolved) => self.state.remember(role, resolved),
            Resolution::Unresolved => self.state.forget(role),
        }
        Ok(resolution)
    }

    /// Wait for `locator` to be present and displayed, then return it.
    pub async fn wait_for_visible(&self, locator: &Locator, timeout: Duration) -> Result<ElementRef> {
        self.driver
            .wait_until(&WaitCondition::Present(locator.clone()), timeout)
            .await?;
        let element = self.driver.find_one(locator).await?;
        self.driver
            .wait_until(&WaitCondition::Visible(element.clone()), timeout)
            .await?;
        Ok(element)
    }

    /// Set a field's value directly instead of typing into it.
    pub async fn set_value(&self, element: &ElementRef, value: &str) -> Result<()> {
        self.driver
            .run_script(SET_VALUE, &[ScriptArg::from(element), ScriptArg::from(value)])
            .await?;
        Ok(())
    }

    /// Click from script so overlays cannot swallow it.
    pub async fn script_click(&self, element: &ElementRef) -> Result<()> {
        self.driver
            .run_script(SCRIPT_CLICK, &[ScriptArg::from(element)])
            .await?;
        Ok(())
    }

    /// First element of `tags` whose visible text contains one of
    /// `keywords`, compared case-insensitively.
    pub async fn find_by_text(&self, tags: &[String], keywords: &[String]) -> Result<ElementRef> {
        let locator = Locator::css(tags.join(", "));
        let candidates = self.driver.find_all(&locator).await?;
        candidates
            .into_iter()
            .find(|element| {
                let text = element.text().to_lowercase();
                keywords.iter().any(|k| text.contains(&k.to_lowercase()))
            })
            .ok_or_else(|| {
                ProbeError::ElementNotFound(format!("{} with text {:?}", locator, keywords))
            })
    }
}

/// One scripted check, selected by intent.
#[async_trait]
pub trait ActionScript: Send + Sync {
    fn name(&self) -> &str;

    fn intent(&self) -> Intent;

    /// Run the check. Never fails: every fault becomes an outcome.
    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Outcome;
}
