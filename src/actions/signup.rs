use crate::actions::base::{failure, ActionContext, ActionScript, Outcome};
use crate::core::{Locator, SignupForm, WaitCondition};
use crate::dom::ElementRef;
use crate::errors::{ProbeError, Result};
use crate::intent::{Intent, Role};
use crate::locator::Resolution;
use crate::types::Credentials;
use async_trait::async_trait;
use tracing::{debug, info};

const FAILED: &str = "Sign Up Test Failed";

/// Clicks the sign-up control once the page has settled; with credentials and
/// a configured sign-up form it also fills and submits the form.
pub struct SignUpScript;

impl SignUpScript {
    /// Look the control up again through each of its class names; the first
    /// class that still matches a live node wins.
    async fn relocate(ctx: &ActionContext<'_>, fallback: &ElementRef) -> Result<Option<ElementRef>> {
        let classes = ctx.state.known_classes(Role::SignupControl).to_vec();
        if classes.is_empty() {
            return Ok(Some(fallback.clone()));
        }

        for class in &classes {
            match ctx.driver.find_one(&Locator::class_name(class)).await {
                Ok(element) => {
                    debug!(%class, "sign-up control relocated");
                    return Ok(Some(element));
                }
                Err(ProbeError::ElementNotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    async fn submit_form(
        ctx: &ActionContext<'_>,
        credentials: &Credentials,
        form: &SignupForm,
    ) -> Result<()> {
        let mobile = credentials.mobile_number().ok_or_else(|| {
            ProbeError::ConfigurationError(
                "sign-up needs a mobile number, but a password was given".to_string(),
            )
        })?;
        let timeout = ctx.waits.post_action_timeout();

        let email = ctx.wait_for_visible(&form.email_field, timeout).await?;
        ctx.set_value(&email, &credentials.email).await?;

        let phone = ctx.wait_for_visible(&form.mobile_field, timeout).await?;
        ctx.set_value(&phone, mobile).await?;

        let submit = ctx
            .find_by_text(&form.submit_tags, &form.submit_keywords)
            .await?;
        ctx.script_click(&submit).await
    }
}

#[async_trait]
impl ActionScript for SignUpScript {
    fn name(&self) -> &str {
        "sign_up"
    }

    fn intent(&self) -> Intent {
        Intent::SignUp
    }

    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Outcome {
        let resolved = match ctx.resolve(Role::SignupControl).await {
            Ok(Resolution::Resolved(resolved)) => resolved,
            Ok(Resolution::Unresolved) => {
                return Outcome::skipped("Sign Up Test Skipped: no sign-up control found on the page")
            }
            Err(err) => return failure(FAILED, &err),
        };

        if let Some(marker) = &ctx.site.fixtures.signup_overlay {
            let condition = WaitCondition::Present(marker.clone());
            match ctx
                .driver
                .wait_until(&condition, ctx.waits.page_timeout())
                .await
            {
                Ok(()) => {}
                Err(err @ ProbeError::Timeout { .. }) => {
                    return Outcome::failed(format!(
                        "{}: Unable to wait for obscuring element ({})",
                        FAILED, err
                    ))
                }
                Err(err) => return failure(FAILED, &err),
            }
        }

        let target = match Self::relocate(ctx, &resolved.element).await {
            Ok(Some(element)) => element,
            Ok(None) => {
                return Outcome::failed(format!(
                    "{}: Element not found with any of the given classes",
                    FAILED
                ))
            }
            Err(err) => return failure(FAILED, &err),
        };

        if let Err(err) = ctx.driver.scroll_into_view(&target).await {
            return failure(FAILED, &err);
        }
        if let Err(err) = ctx.driver.click(&target).await {
            return failure(FAILED, &err);
        }
        info!(element = %target.describe(), "sign-up control clicked");

        match (ctx.credentials, ctx.site.fixtures.signup_form.as_ref()) {
            (Some(credentials), Some(form)) => {
                match Self::submit_form(ctx, credentials, form).await {
                    Ok(()) => Outcome::passed(format!(
                        "Sign Up Test Passed: submitted details for {}",
                        credentials.email
                    )),
                    Err(err) => failure(FAILED, &err),
                }
            }
            _ => Outcome::passed("Sign Up Test Passed"),
        }
    }
}
