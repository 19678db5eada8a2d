use crate::actions::{failure, ActionContext, Outcome, OutcomeStatus, ScriptRegistry};
use crate::core::{Config, DriverHandle};
use crate::errors::{ProbeError, Result};
use crate::intent::{interpret, Intent};
use crate::locator::{ElementResolver, ResolverState};
use crate::types::Credentials;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use tracing::{info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

/// What a run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunReport {
    /// The instruction named none of the supported checks.
    Unsupported { instruction: String },
    Completed { intent: Intent, outcome: Outcome },
}

impl RunReport {
    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            RunReport::Completed { outcome, .. } => Some(outcome),
            RunReport::Unsupported { .. } => None,
        }
    }

    /// 0 passed, 1 failed, 2 skipped or unsupported.
    pub fn exit_code(&self) -> i32 {
        match self.outcome().map(Outcome::status) {
            Some(OutcomeStatus::Passed) => 0,
            Some(OutcomeStatus::Failed) => 1,
            Some(OutcomeStatus::Skipped) | None => 2,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunReport::Unsupported { instruction } => {
                write!(f, "Unsupported instruction: {}", instruction)
            }
            RunReport::Completed { intent, outcome } => write!(f, "{}: {}", intent, outcome),
        }
    }
}

/// One browser page, one instruction, one outcome.
///
/// The session owns the driver and closes it on every path out of `run`,
/// including unsupported instructions and scripts that panic.
pub struct Session<D: DriverHandle> {
    driver: D,
    config: Config,
    resolver: ElementResolver,
    state: ResolverState,
    registry: ScriptRegistry,
    session_id: Uuid,
}

impl<D: DriverHandle> Session<D> {
    pub fn new(driver: D, config: Config) -> Self {
        let resolver = ElementResolver::new(config.site.roles.clone());
        Self {
            driver,
            config,
            resolver,
            state: ResolverState::new(),
            registry: ScriptRegistry::with_defaults(),
            session_id: Uuid::new_v4(),
        }
    }

    pub fn with_registry(mut self, registry: ScriptRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub async fn run(
        mut self,
        url: &str,
        instruction: &str,
        credentials: Option<&Credentials>,
    ) -> RunReport {
        let span = info_span!("session", id = %self.session_id);

        async move {
            let report = match interpret(instruction) {
                None => {
                    warn!(%instruction, "unsupported instruction");
                    RunReport::Unsupported {
                        instruction: instruction.to_string(),
                    }
                }
                Some(intent) => {
                    info!(%intent, %url, site = %self.config.site.name, "running");
                    let outcome = self.execute(url, intent, credentials).await;
                    RunReport::Completed { intent, outcome }
                }
            };

            if let Err(e) = self.driver.close().await {
                warn!(error = %e, "closing the driver failed");
            }
            info!(%report, "finished");
            report
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &mut self,
        url: &str,
        intent: Intent,
        credentials: Option<&Credentials>,
    ) -> Outcome {
        if let Err(e) = self.driver.navigate(url).await {
            return failure(&format!("Could not open {}", url), &e).with_role(intent.role());
        }

        let mut ctx = ActionContext {
            driver: &self.driver,
            resolver: &self.resolver,
            state: &mut self.state,
            waits: &self.config.waits,
            site: &self.config.site,
            credentials,
        };

        match AssertUnwindSafe(self.registry.execute(intent, &mut ctx))
            .catch_unwind()
            .await
        {
            Ok(Some(outcome)) => outcome,
            Ok(None) => Outcome::failed(format!("No script registered for {}", intent))
                .with_role(intent.role()),
            Err(panic) => {
                warn!(%intent, "script panicked");
                Outcome::failed(format!(
                    "Script for {} panicked: {}",
                    intent,
                    panic_message(panic.as_ref())
                ))
                .with_role(intent.role())
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Absolute URL the browser can be pointed at.
pub fn parse_target(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| ProbeError::InvalidUrl(format!("{}: {}", url, e)))
}

/// Launch Chrome, run `instruction` against `url`, and shut Chrome down.
///
/// Unsupported instructions are reported without launching a browser. Only a
/// malformed URL or a browser that will not start is an error; everything
/// after launch ends up in the report.
#[cfg(feature = "chrome")]
pub async fn run(
    config: Config,
    url: &str,
    instruction: &str,
    credentials: Option<&Credentials>,
) -> Result<RunReport> {
    if interpret(instruction).is_none() {
        warn!(%instruction, "unsupported instruction");
        return Ok(RunReport::Unsupported {
            instruction: instruction.to_string(),
        });
    }

    let target = parse_target(url)?;
    let driver = crate::browser::ChromeDriver::launch(&config).await?;
    Ok(Session::new(driver, config)
        .run(target.as_str(), instruction, credentials)
        .await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionScript;
    use crate::core::SiteProfile;
    use crate::testing::{SnapshotPage, TestHelper};
    use async_trait::async_trait;

    const URL: &str = "https://shop.example/";

    fn config_for(site: SiteProfile) -> Config {
        Config {
            site,
            ..TestHelper::fast_config()
        }
    }

    #[tokio::test]
    async fn intercepted_login_fails_and_still_closes() {
        let page = SnapshotPage::new(r#"<div class="banner"><button id="login">Login</button></div>"#)
            .intercept_clicks(".banner");
        let probe = page.probe();

        let report = Session::new(page, TestHelper::fast_config())
            .run(URL, "Run tests on login button", None)
            .await;

        let outcome = report.outcome().unwrap();
        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.message().contains("not clickable"));
        assert!(probe.is_closed());
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn unsupported_instruction_is_reported_and_closes() {
        let page = SnapshotPage::new("<p>hello</p>");
        let probe = page.probe();

        let report = Session::new(page, TestHelper::fast_config())
            .run(URL, "Run tests on the footer", None)
            .await;

        assert!(matches!(report, RunReport::Unsupported { .. }));
        assert_eq!(report.exit_code(), 2);
        assert!(probe.is_closed());
    }

    #[tokio::test]
    async fn navigation_failure_is_an_outcome() {
        let page = SnapshotPage::new("").with_page("https://other.example/", "<p>x</p>");
        let probe = page.probe();

        let report = Session::new(page, TestHelper::fast_config())
            .run(URL, "Run tests on search bar", None)
            .await;

        let outcome = report.outcome().unwrap();
        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.message().contains("Could not open"));
        assert!(probe.is_closed());
    }

    struct Exploding;

    #[async_trait]
    impl ActionScript for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }

        fn intent(&self) -> Intent {
            Intent::Login
        }

        async fn execute(&self, _ctx: &mut ActionContext<'_>) -> Outcome {
            panic!("boom")
        }
    }

    #[tokio::test]
    async fn panicking_script_still_tears_down() {
        let page = SnapshotPage::new("<button>Login</button>");
        let probe = page.probe();
        let mut registry = ScriptRegistry::new();
        registry.register(Exploding);

        let report = Session::new(page, TestHelper::fast_config())
            .with_registry(registry)
            .run(URL, "Run tests on login button", None)
            .await;

        let outcome = report.outcome().unwrap();
        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.message().contains("boom"));
        assert!(probe.is_closed());
    }

    #[tokio::test]
    async fn independent_sessions_do_not_share_state() {
        let search = SnapshotPage::new(r#"<input type="search" id="q">"#);
        let bare = SnapshotPage::new("<p>nothing to search</p>");

        let (found, missing) = tokio::join!(
            Session::new(search, TestHelper::fast_config()).run(URL, "Run tests on search bar", None),
            Session::new(bare, TestHelper::fast_config()).run(URL, "Run tests on search bar", None),
        );

        assert_eq!(found.outcome().unwrap().status(), OutcomeStatus::Passed);
        assert_eq!(missing.outcome().unwrap().status(), OutcomeStatus::Skipped);
    }

    #[tokio::test]
    async fn title_check_uses_the_site_expectation() {
        let page = SnapshotPage::new("<title>Expected</title>");
        let site = SiteProfile {
            expected_title: Some("Expected".to_string()),
            ..Default::default()
        };

        let report = Session::new(page, config_for(site))
            .run(URL, "Please Run tests on check title now", None)
            .await;

        match report {
            RunReport::Completed { intent, outcome } => {
                assert_eq!(intent, Intent::CheckTitle);
                assert_eq!(outcome.status(), OutcomeStatus::Passed);
                assert_eq!(outcome.role(), None);
            }
            other => panic!("unexpected report: {}", other),
        }
    }

    #[test]
    fn targets_must_be_absolute() {
        assert!(parse_target("https://www.edureka.co").is_ok());
        assert!(matches!(
            parse_target("www.edureka.co"),
            Err(ProbeError::InvalidUrl(_))
        ));
    }

    #[test]
    fn reports_serialise_with_a_result_tag() {
        let report = RunReport::Unsupported {
            instruction: "do it".to_string(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["result"], "unsupported");
        assert_eq!(json["instruction"], "do it");
    }
}
