use crate::actions::base::{failure, ActionContext, ActionScript, Outcome};
use crate::core::{Locator, WaitCondition};
use crate::errors::Result;
use crate::intent::{Intent, Role};
use crate::locator::{Resolution, ResolvedElement};
use async_trait::async_trait;
use tracing::info;

/// Types the site's search query into the search input and submits it.
///
/// The check passes once the query is submitted. When the site profile names
/// a results marker, that marker must also show up.
pub struct SearchBarScript;

impl SearchBarScript {
    async fn search(ctx: &ActionContext<'_>, resolved: &ResolvedElement, query: &str) -> Result<()> {
        // Re-read the field right before using it; search widgets re-render.
        let field = match &resolved.identifier {
            Some(id) => ctx.driver.find_one(&Locator::id(id)).await?,
            None => resolved.element.clone(),
        };

        let timeout = ctx.waits.element_timeout();
        ctx.driver
            .wait_until(&WaitCondition::Visible(field.clone()), timeout)
            .await?;
        ctx.driver
            .wait_until(&WaitCondition::Clickable(field.clone()), timeout)
            .await?;

        ctx.set_value(&field, query).await?;
        ctx.driver.submit(&field).await?;

        if let Some(marker) = &ctx.site.fixtures.search_results {
            ctx.driver
                .wait_until(
                    &WaitCondition::Present(marker.clone()),
                    ctx.waits.post_action_timeout(),
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ActionScript for SearchBarScript {
    fn name(&self) -> &str {
        "search_bar"
    }

    fn intent(&self) -> Intent {
        Intent::SearchBar
    }

    async fn execute(&self, ctx: &mut ActionContext<'_>) -> Outcome {
        let resolved = match ctx.resolve(Role::SearchInput).await {
            Ok(Resolution::Resolved(resolved)) => resolved,
            Ok(Resolution::Unresolved) => {
                return Outcome::skipped("Search Bar Test Skipped: Element ID not found")
            }
            Err(err) => return failure("Search Bar Test Failed", &err),
        };

        let query = ctx.site.search_query.clone();
        if let Err(err) = Self::search(ctx, &resolved, &query).await {
            return failure("Search Bar Test Failed", &err);
        }

        let label = resolved
            .identifier
            .clone()
            .unwrap_or_else(|| resolved.element.describe());
        info!(field = %label, %query, "search submitted");
        Outcome::passed(format!(
            "Performed search using ID: {} with query: {}",
            label, query
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::OutcomeStatus;
    use crate::core::SiteProfile;
    use crate::testing::{DriverEvent, SnapshotPage, TestHelper};

    const SEARCH_PAGE: &str = r#"<html><body>
        <form action="/search"><input type="search" id="q" name="query"></form>
        <ul id="results"></ul>
    </body></html>"#;

    #[tokio::test]
    async fn search_input_receives_the_query() {
        let page = SnapshotPage::new(SEARCH_PAGE);
        let probe = page.probe();
        let outcome = TestHelper::execute(&SearchBarScript, &page, &SiteProfile::default(), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Passed);
        assert!(outcome.message().contains("q"));
        assert!(outcome.message().contains("DevOps"));

        let events = probe.events();
        assert!(events.contains(&DriverEvent::ValueSet {
            target: "input#q".to_string(),
            value: "DevOps".to_string(),
        }));
        assert!(events.contains(&DriverEvent::Submitted("input#q".to_string())));
    }

    #[tokio::test]
    async fn page_without_search_input_is_skipped() {
        let page = SnapshotPage::new(r#"<form><input type="text" id="name"></form>"#);
        let outcome = TestHelper::execute(&SearchBarScript, &page, &SiteProfile::default(), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Skipped);
        assert!(outcome.message().contains("Element ID not found"));
    }

    #[tokio::test]
    async fn search_named_container_is_not_a_search_input() {
        let page = SnapshotPage::new(
            r#"<div class="search-wrapper"><input type="text" id="q"></div>
               <form class="search-form" id="site-search"></form>"#,
        );
        let probe = page.probe();
        let outcome = TestHelper::execute(&SearchBarScript, &page, &SiteProfile::default(), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Skipped);
        assert!(probe
            .events()
            .iter()
            .all(|e| !matches!(e, DriverEvent::ValueSet { .. } | DriverEvent::Submitted(_))));
    }

    #[tokio::test]
    async fn hidden_input_times_out() {
        let page = SnapshotPage::new(SEARCH_PAGE).hide("form");
        let outcome = TestHelper::execute(&SearchBarScript, &page, &SiteProfile::default(), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.message().contains("visibility of input#q"));
    }

    #[tokio::test]
    async fn results_marker_decides_when_configured() {
        let mut site = SiteProfile::default();
        site.fixtures.search_results = Some(Locator::css("#results li"));
        let page = SnapshotPage::new(SEARCH_PAGE);
        let outcome = TestHelper::execute(&SearchBarScript, &page, &site, None).await;
        assert_eq!(outcome.status(), OutcomeStatus::Failed);

        site.fixtures.search_results = Some(Locator::id("results"));
        let page = SnapshotPage::new(SEARCH_PAGE);
        let outcome = TestHelper::execute(&SearchBarScript, &page, &site, None).await;
        assert_eq!(outcome.status(), OutcomeStatus::Passed);
    }

    #[tokio::test]
    async fn driver_faults_become_failures() {
        let page = SnapshotPage::new(SEARCH_PAGE).break_scripts();
        let outcome = TestHelper::execute(&SearchBarScript, &page, &SiteProfile::default(), None).await;

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.message().contains("JavaScript execution failed"));
    }
}
