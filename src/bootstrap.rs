//! Background agent bootstrap.
//!
//! Registers the agent script with the host container once per page load.
//! Failures are returned to the caller instead of being dropped, so an
//! unsupported host or a broken script shows up in the logs.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::RegistrationError;
use crate::platform::{AgentContainer, RegistrationHandle};

/// Register `script_url` with `container`.
pub async fn register(
    container: &dyn AgentContainer,
    script_url: &str,
) -> Result<RegistrationHandle, RegistrationError> {
    if !container.is_supported() {
        return Err(RegistrationError::Unsupported);
    }

    let handle = container.register(script_url).await?;
    log::info!(
        "[Agent] Registered {} (scope {})",
        handle.script_url,
        handle.scope
    );
    Ok(handle)
}

/// One-shot registration for a page load.
///
/// The first successful [`Bootstrap::register`] is cached; later calls return
/// the same handle without registering again. A failed attempt is not
/// cached and may be retried.
pub struct Bootstrap {
    container: Arc<dyn AgentContainer>,
    script_url: String,
    registration: OnceCell<RegistrationHandle>,
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("script_url", &self.script_url)
            .field("registration", &self.registration.get())
            .finish_non_exhaustive()
    }
}

impl Bootstrap {
    /// Bootstrap registering `script_url` with `container`.
    pub fn new(container: Arc<dyn AgentContainer>, script_url: impl Into<String>) -> Self {
        Self {
            container,
            script_url: script_url.into(),
            registration: OnceCell::new(),
        }
    }

    /// Register the agent, or return the existing registration.
    pub async fn register(&self) -> Result<&RegistrationHandle, RegistrationError> {
        self.registration
            .get_or_try_init(|| register(self.container.as_ref(), &self.script_url))
            .await
    }
}
