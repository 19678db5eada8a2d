use crate::actions::base::{failure, ActionContext, ActionScript, Outcome};
use crate::core::WaitCondition;
use crate::errors::ProbeError;
use crate::intent::Intent;
use async_trait::async_trait;
use tracing::info;

/// Waits for the page title to mention the expected title, then compares
/// the two exactly.
pub struct CheckTitleScript;

#[async_trait]
impl ActionScript for CheckTitleScript {
    fn name(&self) -> &str {
        "check_title"
    }

    fn intent(&self) -> Intent {
        Intent::CheckTitle
    }

    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Outcome {
        let Some(expected) = ctx.site.expected_title.clone() else {
            return Outcome::failed("Title Check Failed: no expected title configured");
        };

        let condition = WaitCondition::TitleContains(expected.clone());
        match ctx
            .driver
            .wait_until(&condition, ctx.waits.page_timeout())
            .await
        {
            Ok(()) => {}
            Err(err @ ProbeError::Timeout { .. }) => {
                let actual = ctx.driver.current_title().await.unwrap_or_default();
                info!(%expected, %actual, "title never matched");
                return Outcome::failed(format!(
                    "Title Check Failed. Expected: {}, Actual: {} ({})",
                    expected, actual, err
                ));
            }
            Err(err) => return failure("Title Check Failed", &err),
        }

        let actual = match ctx.driver.current_title().await {
            Ok(title) => title,
            Err(err) => return failure("Title Check Failed", &err),
        };

        if actual == expected {
            Outcome::passed(format!("Title Check Passed: {}", actual))
        } else {
            Outcome::failed(format!(
                "Title Check Failed. Expected: {}, Actual: {}",
                expected, actual
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::OutcomeStatus;
    use crate::core::SiteProfile;
    use crate::testing::{SnapshotPage, TestHelper};

    fn site(expected: Option<&str>) -> SiteProfile {
        SiteProfile {
            expected_title: expected.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn exact_title_passes() {
        let page = SnapshotPage::new("<html><head><title>Expected</title></head></html>");
        let outcome = TestHelper::execute(&CheckTitleScript, &page, &site(Some("Expected")), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Passed);
        assert!(outcome.message().contains("Expected"));
    }

    #[tokio::test]
    async fn other_title_fails_naming_both() {
        let page = SnapshotPage::new("<html><head><title>Other</title></head></html>");
        let outcome = TestHelper::execute(&CheckTitleScript, &page, &site(Some("Expected")), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.message().contains("Expected"));
        assert!(outcome.message().contains("Other"));
    }

    #[tokio::test]
    async fn containing_title_is_not_equal() {
        let page = SnapshotPage::new("<p>x</p>").with_title("Expected | Courses");
        let outcome = TestHelper::execute(&CheckTitleScript, &page, &site(Some("Expected")), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome
            .message()
            .contains("Expected: Expected, Actual: Expected | Courses"));
    }

    #[tokio::test]
    async fn missing_expectation_fails() {
        let page = SnapshotPage::new("<title>Anything</title>");
        let outcome = TestHelper::execute(&CheckTitleScript, &page, &site(None), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.message().contains("no expected title"));
    }
}
