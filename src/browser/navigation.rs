use crate::core::DriverHandle;
use crate::errors::{ProbeError, Result};
use crate::utils::javascript::READY_STATE;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct NavigationManager;

impl NavigationManager {
    /// Poll `document.readyState` until the page reports `complete`.
    ///
    /// Script failures while the old document is being torn down are
    /// retried; anything else ends the wait.
    pub async fn wait_for_ready_state(
        driver: &dyn DriverHandle,
        timeout: Duration,
    ) -> Result<NavigationResult> {
        let start_time = Instant::now();
        let mut ready_state = String::new();

        loop {
            match driver.run_script(READY_STATE, &[]).await {
                Ok(value) => {
                    ready_state = value.as_str().unwrap_or_default().to_string();
                    if ready_state == "complete" {
                        return Ok(NavigationResult {
                            ready_state,
                            duration_ms: start_time.elapsed().as_millis() as u64,
                        });
                    }
                }
                Err(ProbeError::JavaScriptFailed(reason)) => {
                    debug!(%reason, "page not scriptable yet");
                }
                Err(e) => return Err(e),
            }

            if start_time.elapsed() >= timeout {
                return Err(ProbeError::Timeout {
                    condition: format!(
                        "document.readyState to be 'complete' (last seen '{}')",
                        ready_state
                    ),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(driver.poll_interval()).await;
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub ready_state: String,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SnapshotPage;

    #[tokio::test]
    async fn static_pages_are_complete_at_once() {
        let page = SnapshotPage::new("<p>done</p>");
        let loaded = NavigationManager::wait_for_ready_state(&page, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(loaded.ready_state, "complete");
    }

    #[tokio::test]
    async fn unscriptable_pages_time_out() {
        let page = SnapshotPage::new("<p>stuck</p>").break_scripts();
        let waited = NavigationManager::wait_for_ready_state(&page, Duration::from_millis(20)).await;
        assert!(matches!(waited, Err(ProbeError::Timeout { .. })));
    }
}
