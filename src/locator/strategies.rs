use crate::core::locator::escape_css_string;
use crate::core::{
    AttributePredicate, DriverHandle, Locator, LocatorStrategy, RoleProfile, StrategyKind,
};
use crate::dom::ElementRef;
use crate::errors::Result;
use crate::intent::Role;
use async_trait::async_trait;
use tracing::debug;

/// First button-like element whose visible text contains a keyword.
pub struct KeywordTextStrategy {
    tags: Vec<String>,
    keywords: Vec<String>,
}

/// Elements matching an attribute predicate, tried predicate by predicate.
pub struct AttributePredicateStrategy {
    predicates: Vec<AttributePredicate>,
    return_identifier: bool,
}

/// First element whose `id` or `class` contains a fragment.
pub struct IdentifierSubstringStrategy {
    fragments: Vec<String>,
}

/// First element of a tag, whatever its attributes.
pub struct TagOnlyStrategy {
    tag: Option<String>,
}

impl KeywordTextStrategy {
    pub fn new(tags: Vec<String>, keywords: Vec<String>) -> Self {
        Self {
            tags,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

impl AttributePredicateStrategy {
    pub fn new(predicates: Vec<AttributePredicate>, return_identifier: bool) -> Self {
        Self {
            predicates,
            return_identifier,
        }
    }
}

impl IdentifierSubstringStrategy {
    pub fn new(fragments: Vec<String>) -> Self {
        Self { fragments }
    }

    fn query(&self) -> Locator {
        let selector = self
            .fragments
            .iter()
            .map(|fragment| {
                let fragment = escape_css_string(fragment);
                format!("[id*=\"{0}\"], [class*=\"{0}\"]", fragment)
            })
            .collect::<Vec<_>>()
            .join(", ");
        Locator::css(selector)
    }
}

impl TagOnlyStrategy {
    pub fn new(tag: Option<String>) -> Self {
        Self { tag }
    }
}

#[async_trait]
impl LocatorStrategy for KeywordTextStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::KeywordText
    }

    async fn locate(&self, driver: &dyn DriverHandle, role: Role) -> Result<Vec<ElementRef>> {
        if self.tags.is_empty() || self.keywords.is_empty() {
            return Ok(vec![]);
        }

        let candidates = driver.find_all(&Locator::css(self.tags.join(", "))).await?;
        debug!(%role, scanned = candidates.len(), "keyword scan");

        Ok(candidates
            .into_iter()
            .find(|element| {
                let text = element.text().to_lowercase();
                self.keywords.iter().any(|keyword| text.contains(keyword.as_str()))
            })
            .into_iter()
            .collect())
    }
}

#[async_trait]
impl LocatorStrategy for AttributePredicateStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AttributePredicate
    }

    async fn locate(&self, driver: &dyn DriverHandle, role: Role) -> Result<Vec<ElementRef>> {
        for predicate in &self.predicates {
            let locator = predicate.to_locator();
            let mut found = driver.find_all(&locator).await?;
            if self.return_identifier {
                // a match is only usable if it can be found again by id
                found.retain(|element| element.element_id().is_some());
            }
            debug!(%role, %locator, matched = found.len(), "attribute predicate");
            if !found.is_empty() {
                return Ok(found);
            }
        }
        Ok(vec![])
    }

    fn identifies_by_id(&self) -> bool {
        self.return_identifier
    }
}

#[async_trait]
impl LocatorStrategy for IdentifierSubstringStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::IdentifierSubstring
    }

    async fn locate(&self, driver: &dyn DriverHandle, role: Role) -> Result<Vec<ElementRef>> {
        if self.fragments.is_empty() {
            return Ok(vec![]);
        }
        let found = driver.find_all(&self.query()).await?;
        debug!(%role, matched = found.len(), "identifier substring");
        Ok(found.into_iter().take(1).collect())
    }
}

#[async_trait]
impl LocatorStrategy for TagOnlyStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TagOnly
    }

    async fn locate(&self, driver: &dyn DriverHandle, _role: Role) -> Result<Vec<ElementRef>> {
        match &self.tag {
            Some(tag) => Ok(driver
                .find_all(&Locator::tag(tag.as_str()))
                .await?
                .into_iter()
                .take(1)
                .collect()),
            None => Ok(vec![]),
        }
    }
}

/// The strategies configured for one role, in the order they are consulted.
pub struct StrategySet {
    role: Role,
    strategies: Vec<Box<dyn LocatorStrategy>>,
}

impl StrategySet {
    pub fn from_profile(role: Role, profile: &RoleProfile) -> Self {
        let strategies = profile
            .strategy_order
            .iter()
            .map(|kind| -> Box<dyn LocatorStrategy> {
                match kind {
                    StrategyKind::KeywordText => Box::new(KeywordTextStrategy::new(
                        profile.text_tags.clone(),
                        profile.keywords.clone(),
                    )),
                    StrategyKind::AttributePredicate => Box::new(AttributePredicateStrategy::new(
                        profile.attribute_predicates.clone(),
                        profile.return_identifier,
                    )),
                    StrategyKind::IdentifierSubstring => Box::new(
                        IdentifierSubstringStrategy::new(profile.identifier_fragments.clone()),
                    ),
                    StrategyKind::TagOnly => {
                        Box::new(TagOnlyStrategy::new(profile.fallback_tag.clone()))
                    }
                }
            })
            .collect();

        Self { role, strategies }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn LocatorStrategy> {
        self.strategies.iter().map(|s| s.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SnapshotPage;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn keyword_match_ignores_case_and_takes_first_in_document_order() {
        let page = SnapshotPage::new(
            r#"<body>
                <button id="cart">Cart</button>
                <a id="top-login" href="/login">LOG IN or Sign In</a>
                <button id="bottom-login">Sign in</button>
            </body>"#,
        );
        let strategy = KeywordTextStrategy::new(strings(&["button", "a"]), strings(&["Sign In"]));

        let found = strategy.locate(&page, Role::LoginControl).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].element_id(), Some("top-login"));
    }

    #[tokio::test]
    async fn keyword_strategy_only_scans_configured_tags() {
        let page = SnapshotPage::new(r#"<div class="x">Register now</div>"#);
        let strategy = KeywordTextStrategy::new(strings(&["button"]), strings(&["register"]));

        assert!(strategy.locate(&page, Role::SignupControl).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn predicate_with_identifier_skips_anonymous_matches() {
        let page = SnapshotPage::new(
            r#"<input type="search" class="no-id"><input type="search" id="q">"#,
        );
        let predicates = vec![AttributePredicate::new("input").with("type", "search")];

        let by_id = AttributePredicateStrategy::new(predicates.clone(), true);
        let found = by_id.locate(&page, Role::SearchInput).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].element_id(), Some("q"));

        let any = AttributePredicateStrategy::new(predicates, false);
        assert_eq!(any.locate(&page, Role::SearchInput).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn predicates_are_tried_in_order() {
        let page = SnapshotPage::new(
            r#"<input type="search" id="generic">
               <input id="search" name="search_query">"#,
        );
        let strategy = AttributePredicateStrategy::new(
            vec![
                AttributePredicate::new("input")
                    .with("id", "search")
                    .with("name", "search_query"),
                AttributePredicate::new("input").with("type", "search"),
            ],
            true,
        );

        let found = strategy.locate(&page, Role::SearchInput).await.unwrap();
        assert_eq!(found[0].element_id(), Some("search"));
    }

    #[tokio::test]
    async fn substring_matches_id_or_class() {
        let page = SnapshotPage::new(
            r#"<div class="header"><span class="btn-signup-top">Join</span></div>
               <div id="signup-footer"></div>"#,
        );
        let strategy = IdentifierSubstringStrategy::new(strings(&["signup"]));

        let found = strategy.locate(&page, Role::SignupControl).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].class_list(), &["btn-signup-top".to_string()]);
    }

    #[tokio::test]
    async fn tag_fallback_needs_a_tag() {
        let page = SnapshotPage::new(r#"<input id="a"><input id="b">"#);

        let none = TagOnlyStrategy::new(None);
        assert!(none.locate(&page, Role::SearchInput).await.unwrap().is_empty());

        let input = TagOnlyStrategy::new(Some("input".to_string()));
        let found = input.locate(&page, Role::SearchInput).await.unwrap();
        assert_eq!(found[0].element_id(), Some("a"));
    }

    #[test]
    fn set_follows_profile_order() {
        let profile = RoleProfile {
            strategy_order: vec![StrategyKind::TagOnly, StrategyKind::KeywordText],
            ..RoleProfile::empty()
        };
        let set = StrategySet::from_profile(Role::LoginControl, &profile);
        assert_eq!(set.kinds(), vec![StrategyKind::TagOnly, StrategyKind::KeywordText]);
        assert_eq!(set.role(), Role::LoginControl);
    }
}
