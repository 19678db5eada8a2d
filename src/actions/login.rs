use crate::actions::base::{failure, ActionContext, ActionScript, Outcome};
use crate::core::LoginForm;
use crate::errors::{ProbeError, Result};
use crate::intent::{Intent, Role};
use crate::locator::Resolution;
use crate::types::Credentials;
use async_trait::async_trait;
use tracing::{debug, info};

const FAILED: &str = "Login Test Failed";

/// Clicks the login control; with credentials and a configured login form it
/// also fills and submits the form.
pub struct LoginScript;

impl LoginScript {
    async fn submit_form(
        ctx: &ActionContext<'_>,
        credentials: &Credentials,
        form: &LoginForm,
    ) -> Result<()> {
        let password = credentials.password().ok_or_else(|| {
            ProbeError::ConfigurationError(
                "login needs a password, but a mobile number was given".to_string(),
            )
        })?;
        let timeout = ctx.waits.post_action_timeout();

        ctx.wait_for_visible(&form.container, timeout).await?;
        debug!(container = %form.container, "login form visible");

        let email = ctx.wait_for_visible(&form.email_field, timeout).await?;
        ctx.set_value(&email, &credentials.email).await?;

        let secret = ctx.wait_for_visible(&form.password_field, timeout).await?;
        ctx.set_value(&secret, password).await?;

        let submit = ctx.driver.find_one(&form.submit).await?;
        ctx.script_click(&submit).await
    }
}

#[async_trait]
impl ActionScript for LoginScript {
    fn name(&self) -> &str {
        "login"
    }

    fn intent(&self) -> Intent {
        Intent::Login
    }

    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Outcome {
        let resolved = match ctx.resolve(Role::LoginControl).await {
            Ok(Resolution::Resolved(resolved)) => resolved,
            Ok(Resolution::Unresolved) => {
                return Outcome::skipped("Login Test Skipped: no login control found on the page")
            }
            Err(err) => return failure(FAILED, &err),
        };

        if let Err(err) = ctx.driver.click(&resolved.element).await {
            return failure(FAILED, &err);
        }
        info!(element = %resolved.element.describe(), "login control clicked");

        match (ctx.credentials, ctx.site.fixtures.login_form.as_ref()) {
            (Some(credentials), Some(form)) => {
                match Self::submit_form(ctx, credentials, form).await {
                    Ok(()) => Outcome::passed(format!(
                        "Login Test Passed: submitted credentials for {}",
                        credentials.email
                    )),
                    Err(err) => failure(FAILED, &err),
                }
            }
            _ => Outcome::passed("Login Test Passed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::OutcomeStatus;
    use crate::core::{Locator, SiteProfile};
    use crate::testing::{DriverEvent, SnapshotPage, TestHelper};

    const LOGIN_PAGE: &str = r#"<html><body>
        <nav><a href="/">Home</a><button id="login-btn" class="nav-btn">Log In</button>
        <button class="cta">Login</button></nav>
        <div id="login-modal">
            <input id="email" type="email"><input id="password" type="password">
            <button id="submit">Continue</button>
        </div>
    </body></html>"#;

    fn site_with_form() -> SiteProfile {
        let mut site = SiteProfile::default();
        site.fixtures.login_form = Some(LoginForm {
            container: Locator::id("login-modal"),
            email_field: Locator::id("email"),
            password_field: Locator::id("password"),
            submit: Locator::id("submit"),
        });
        site
    }

    #[tokio::test]
    async fn clicks_the_keyword_match() {
        let page = SnapshotPage::new(LOGIN_PAGE);
        let probe = page.probe();
        let outcome = TestHelper::execute(&LoginScript, &page, &SiteProfile::default(), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Passed);
        assert_eq!(outcome.message(), "Login Test Passed");
        assert!(probe.clicked("button.cta"));
    }

    #[tokio::test]
    async fn intercepted_click_fails_as_not_clickable() {
        let page = SnapshotPage::new(LOGIN_PAGE).intercept_clicks("nav");
        let outcome = TestHelper::execute(&LoginScript, &page, &SiteProfile::default(), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.message().contains("not clickable"));
    }

    #[tokio::test]
    async fn missing_control_is_skipped() {
        let page = SnapshotPage::new("<p>No account needed</p>");
        let outcome = TestHelper::execute(&LoginScript, &page, &SiteProfile::default(), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Skipped);
    }

    #[tokio::test]
    async fn credentials_are_filled_and_submitted() {
        let page = SnapshotPage::new(LOGIN_PAGE);
        let probe = page.probe();
        let credentials = Credentials::with_password("qa@example.com", "hunter2");
        let outcome =
            TestHelper::execute(&LoginScript, &page, &site_with_form(), Some(&credentials)).await;

        assert_eq!(outcome.status(), OutcomeStatus::Passed);
        assert!(outcome.message().contains("qa@example.com"));
        assert!(!outcome.message().contains("hunter2"));

        let events = probe.events();
        assert!(events.contains(&DriverEvent::ValueSet {
            target: "input#email".to_string(),
            value: "qa@example.com".to_string(),
        }));
        assert!(events.contains(&DriverEvent::ScriptClicked("button#submit".to_string())));
    }

    #[tokio::test]
    async fn hidden_form_times_out() {
        let page = SnapshotPage::new(LOGIN_PAGE).hide("#login-modal");
        let credentials = Credentials::with_password("qa@example.com", "hunter2");
        let outcome =
            TestHelper::execute(&LoginScript, &page, &site_with_form(), Some(&credentials)).await;

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.message().contains("Timed out"));
    }

    #[tokio::test]
    async fn mobile_number_cannot_log_in() {
        let page = SnapshotPage::new(LOGIN_PAGE);
        let credentials = Credentials::with_mobile_number("qa@example.com", "5550100");
        let outcome =
            TestHelper::execute(&LoginScript, &page, &site_with_form(), Some(&credentials)).await;

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.message().contains("password"));
    }
}
