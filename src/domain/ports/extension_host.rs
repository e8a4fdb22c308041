//! Engine extension host port.
//!
//! The capability negotiator drives an [`ExtensionHost`] through an install
//! then activate sequence for each capability it needs.

use async_trait::async_trait;

use crate::domain::errors::CapabilityError;
use crate::domain::models::Capability;

#[async_trait]
pub trait ExtensionHost: Send + Sync {
    /// Make the capability available to the engine.
    async fn install(&self, capability: Capability) -> Result<(), CapabilityError>;

    /// Turn an installed capability on and verify it responds.
    async fn activate(&self, capability: Capability) -> Result<(), CapabilityError>;

    /// Drop any resources held for probing. Called once negotiation ends.
    async fn release(&self);
}
