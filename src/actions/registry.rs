use crate::actions::base::{ActionContext, ActionScript, Outcome};
use crate::actions::{CheckTitleScript, LoginScript, SearchBarScript, SignUpScript};
use crate::intent::Intent;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Intent → script lookup.
pub struct ScriptRegistry {
    scripts: HashMap<Intent, Arc<dyn ActionScript>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
        }
    }

    /// Registry holding the built-in script for every intent.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(CheckTitleScript);
        registry.register(LoginScript);
        registry.register(SignUpScript);
        registry.register(SearchBarScript);
        registry
    }

    /// Register a script, replacing any script already bound to its intent.
    pub fn register<S: ActionScript + 'static>(&mut self, script: S) {
        self.scripts.insert(script.intent(), Arc::new(script));
    }

    pub fn get(&self, intent: Intent) -> Option<Arc<dyn ActionScript>> {
        self.scripts.get(&intent).cloned()
    }

    /// Run the script bound to `intent`, stamping the outcome with its role
    /// and how long it took.
    pub async fn execute(&self, intent: Intent, ctx: &mut ActionContext<'_>) -> Option<Outcome> {
        let script = self.get(intent)?;
        debug!(script = script.name(), "executing");

        let start_time = Instant::now();
        let outcome = script.execute(ctx).await;
        let execution_time = start_time.elapsed().as_millis() as u64;

        Some(
            outcome
                .with_role(intent.role())
                .with_duration(execution_time),
        )
    }
}

impl Default for ScriptRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::OutcomeStatus;
    use crate::core::SiteProfile;
    use crate::intent::{Role, TRIGGERS};
    use crate::locator::{ElementResolver, ResolverState};
    use crate::testing::{SnapshotPage, TestHelper};

    #[test]
    fn defaults_cover_every_intent() {
        let registry = ScriptRegistry::with_defaults();
        for (intent, _) in TRIGGERS {
            let script = registry.get(intent).unwrap();
            assert_eq!(script.intent(), intent);
        }
        assert!(ScriptRegistry::new().get(Intent::Login).is_none());
    }

    #[tokio::test]
    async fn outcomes_carry_the_role() {
        let registry = ScriptRegistry::with_defaults();
        let page = SnapshotPage::new("<p>plain</p>");
        let site = SiteProfile::default();
        let resolver = ElementResolver::new(site.roles.clone());
        let mut state = ResolverState::new();
        let waits = TestHelper::fast_waits();
        let mut ctx = ActionContext {
            driver: &page,
            resolver: &resolver,
            state: &mut state,
            waits: &waits,
            site: &site,
            credentials: None,
        };

        let outcome = registry.execute(Intent::SearchBar, &mut ctx).await.unwrap();
        assert_eq!(outcome.status(), OutcomeStatus::Skipped);
        assert_eq!(outcome.role(), Some(Role::SearchInput));
    }
}
