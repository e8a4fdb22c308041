//! Capability negotiation for the embedding store.
//!
//! Each capability is attempted as install then activate, with one retry after
//! a fixed delay. Losing a required capability aborts startup; losing an
//! optional one degrades the store and is reported once at warn level.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::errors::{CapabilityError, StorageInitializationError};
use crate::domain::models::{Capability, CapabilityState, Requirement};
use crate::domain::ports::ExtensionHost;

/// Attempts per capability, including the first.
pub const MAX_ATTEMPTS: u32 = 2;

pub struct CapabilityNegotiator<'a> {
    host: &'a dyn ExtensionHost,
    retry_delay: Duration,
}

impl<'a> CapabilityNegotiator<'a> {
    pub fn new(host: &'a dyn ExtensionHost, retry_delay: Duration) -> Self {
        Self { host, retry_delay }
    }

    /// Probe every capability and compute the resulting state.
    ///
    /// The host's probe resources are released on every path.
    pub async fn probe_and_configure(
        &self,
        spatial_requested: bool,
    ) -> Result<CapabilityState, StorageInitializationError> {
        let result = self.negotiate(spatial_requested).await;
        self.host.release().await;
        result
    }

    async fn negotiate(
        &self,
        spatial_requested: bool,
    ) -> Result<CapabilityState, StorageInitializationError> {
        self.require(Capability::StructuredData).await?;

        if !spatial_requested {
            info!("spatial extension disabled by configuration, using fallback schema");
            return Ok(CapabilityState::new(false));
        }

        let spatial_enabled = self.optional(Capability::SpatialIndex).await;
        Ok(CapabilityState::new(spatial_enabled))
    }

    async fn require(&self, capability: Capability) -> Result<(), StorageInitializationError> {
        debug_assert_eq!(capability.requirement(), Requirement::Required);
        self.attempt(capability)
            .await
            .map_err(StorageInitializationError::RequiredCapability)
    }

    async fn optional(&self, capability: Capability) -> bool {
        debug_assert_eq!(capability.requirement(), Requirement::Optional);
        match self.attempt(capability).await {
            Ok(()) => {
                info!(%capability, "capability enabled");
                true
            }
            Err(e) => {
                warn!(
                    %capability,
                    error = %e,
                    "optional capability unavailable, continuing without it"
                );
                false
            }
        }
    }

    /// Install then activate, retrying once on failure of either phase.
    async fn attempt(&self, capability: Capability) -> Result<(), CapabilityError> {
        let mut attempt = 1;
        loop {
            match self.install_and_activate(capability).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < MAX_ATTEMPTS => {
                    debug!(
                        %capability,
                        attempt,
                        error = %e,
                        delay_ms = self.retry_delay.as_millis() as u64,
                        "capability attempt failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn install_and_activate(&self, capability: Capability) -> Result<(), CapabilityError> {
        self.host.install(capability).await?;
        self.host.activate(capability).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::CapabilityPhase;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Host whose install/activate calls fail a scripted number of times.
    #[derive(Default)]
    struct ScriptedHost {
        install_failures: Mutex<HashMap<Capability, u32>>,
        activate_failures: Mutex<HashMap<Capability, u32>>,
        calls: Mutex<Vec<(Capability, CapabilityPhase)>>,
        released: AtomicBool,
    }

    impl ScriptedHost {
        fn failing_install(self, capability: Capability, times: u32) -> Self {
            self.install_failures.lock().unwrap().insert(capability, times);
            self
        }

        fn failing_activate(self, capability: Capability, times: u32) -> Self {
            self.activate_failures.lock().unwrap().insert(capability, times);
            self
        }

        fn step(
            &self,
            failures: &Mutex<HashMap<Capability, u32>>,
            capability: Capability,
            phase: CapabilityPhase,
        ) -> Result<(), CapabilityError> {
            self.calls.lock().unwrap().push((capability, phase));
            let mut failures = failures.lock().unwrap();
            match failures.get_mut(&capability) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    Err(CapabilityError::new(capability, phase, "scripted failure"))
                }
                _ => Ok(()),
            }
        }

        fn calls_for(&self, capability: Capability) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _)| *c == capability)
                .count()
        }
    }

    #[async_trait]
    impl ExtensionHost for ScriptedHost {
        async fn install(&self, capability: Capability) -> Result<(), CapabilityError> {
            self.step(&self.install_failures, capability, CapabilityPhase::Install)
        }

        async fn activate(&self, capability: Capability) -> Result<(), CapabilityError> {
            self.step(&self.activate_failures, capability, CapabilityPhase::Activate)
        }

        async fn release(&self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    fn negotiator(host: &ScriptedHost) -> CapabilityNegotiator<'_> {
        CapabilityNegotiator::new(host, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_all_capabilities_available() {
        let host = ScriptedHost::default();
        let state = negotiator(&host).probe_and_configure(true).await.unwrap();
        assert_eq!(state, CapabilityState::new(true));
        assert!(host.released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_optional_failure_degrades() {
        let host = ScriptedHost::default().failing_install(Capability::SpatialIndex, 5);
        let state = negotiator(&host).probe_and_configure(true).await.unwrap();
        assert!(!state.spatial_enabled);
        assert!(state.structured_data);
        // two install attempts, no activate
        assert_eq!(host.calls_for(Capability::SpatialIndex), 2);
    }

    #[tokio::test]
    async fn test_single_failure_recovers_on_retry() {
        let host = ScriptedHost::default().failing_activate(Capability::SpatialIndex, 1);
        let state = negotiator(&host).probe_and_configure(true).await.unwrap();
        assert!(state.spatial_enabled);
        assert_eq!(host.calls_for(Capability::SpatialIndex), 4);
    }

    #[tokio::test]
    async fn test_required_failure_is_fatal() {
        let host = ScriptedHost::default().failing_activate(Capability::StructuredData, 2);
        let err = negotiator(&host).probe_and_configure(true).await.unwrap_err();
        match err {
            StorageInitializationError::RequiredCapability(cause) => {
                assert_eq!(cause.capability, Capability::StructuredData);
                assert_eq!(cause.phase, CapabilityPhase::Activate);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(host.calls_for(Capability::SpatialIndex), 0);
        assert!(host.released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_spatial_not_requested_skips_probe() {
        let host = ScriptedHost::default();
        let state = negotiator(&host).probe_and_configure(false).await.unwrap();
        assert!(!state.spatial_enabled);
        assert_eq!(host.calls_for(Capability::SpatialIndex), 0);
    }
}
