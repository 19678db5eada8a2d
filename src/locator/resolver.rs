use crate::core::{DriverHandle, RoleTable, StrategyKind};
use crate::dom::ElementRef;
use crate::errors::Result;
use crate::intent::Role;
use crate::locator::strategies::StrategySet;
use std::collections::HashMap;
use tracing::{debug, info};

/// What resolution produced for a role.
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(ResolvedElement),
    Unresolved,
}

#[derive(Debug, Clone)]
pub struct ResolvedElement {
    pub element: ElementRef,
    pub strategy: StrategyKind,
    /// Set when the winning strategy addresses its match by `id`.
    pub identifier: Option<String>,
}

/// Runs the configured strategies for a role against the live page.
///
/// Strategies are consulted strictly in order and the first one producing
/// any candidate wins outright; its first candidate is the resolved element.
/// Nothing is cached here: every call re-queries the page.
pub struct ElementResolver {
    roles: RoleTable,
}

impl ElementResolver {
    pub fn new(roles: RoleTable) -> Self {
        Self { roles }
    }

    pub fn strategy_set(&self, role: Role) -> StrategySet {
        StrategySet::from_profile(role, self.roles.get(role))
    }

    pub async fn resolve(&self, driver: &dyn DriverHandle, role: Role) -> Result<Resolution> {
        let set = self.strategy_set(role);

        for strategy in set.iter() {
            let candidates = strategy.locate(driver, role).await?;
            let Some(element) = candidates.into_iter().next() else {
                debug!(%role, strategy = %strategy.kind(), "no candidates");
                continue;
            };

            let identifier = if strategy.identifies_by_id() {
                element.element_id().map(str::to_string)
            } else {
                None
            };
            info!(
                %role,
                strategy = %strategy.kind(),
                element = %element.describe(),
                "resolved"
            );
            return Ok(Resolution::Resolved(ResolvedElement {
                element,
                strategy: strategy.kind(),
                identifier,
            }));
        }

        info!(%role, "unresolved");
        Ok(Resolution::Unresolved)
    }
}

/// Per-session memory of what each role last resolved to.
///
/// Owned by one session and lent to each script; sessions never share it.
#[derive(Debug, Default)]
pub struct ResolverState {
    resolved: HashMap<Role, ResolvedElement>,
}

impl ResolverState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&mut self, role: Role, resolved: &ResolvedElement) {
        self.resolved.insert(role, resolved.clone());
    }

    /// Class names captured the last time `role` resolved.
    pub fn known_classes(&self, role: Role) -> &[String] {
        self.resolved
            .get(&role)
            .map(|r| r.element.class_list())
            .unwrap_or(&[])
    }

    pub fn forget(&mut self, role: Role) {
        self.resolved.remove(&role);
    }

}
