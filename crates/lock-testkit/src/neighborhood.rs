//! Simulated neighborhood fixtures

use lock_authorization::CredentialStore;
use lock_core::effects::{IdentityEffects, PhysicalTimeEffects};
use lock_effects::{
    LocalPrincipal, MemoryClaimRecord, MemoryNetwork, MemoryTransport, SimulatedHardware,
    SimulatedTimeHandler,
};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Name of the identity provider every user is blessed by
pub const PROVIDER: &str = "provider";

/// One network, one clock, one identity provider
pub struct TestNeighborhood {
    /// Registry every node talks through
    pub network: MemoryNetwork,
    /// Clock shared by every node
    pub time: SimulatedTimeHandler,
    /// Identity provider blessing users
    pub provider: LocalPrincipal,
    next_seed: AtomicU8,
}

impl Default for TestNeighborhood {
    fn default() -> Self {
        Self::new()
    }
}

impl TestNeighborhood {
    /// Empty neighborhood
    pub fn new() -> Self {
        Self {
            network: MemoryNetwork::new(),
            time: SimulatedTimeHandler::default(),
            provider: LocalPrincipal::from_seed([200; 32], PROVIDER).unwrap(),
            next_seed: AtomicU8::new(1),
        }
    }

    /// Provider prefix stripped from user names
    pub fn provider_prefix(&self) -> Option<String> {
        Some(PROVIDER.to_string())
    }

    /// Shared clock as an effect handle
    pub fn clock(&self) -> Arc<dyn PhysicalTimeEffects> {
        Arc::new(self.time.clone())
    }

    fn seed(&self) -> [u8; 32] {
        [self.next_seed.fetch_add(1, Ordering::Relaxed); 32]
    }

    /// User blessed by the provider as `provider/<name>`
    pub fn user(&self, name: &str) -> TestUser {
        let principal = Arc::new(LocalPrincipal::from_seed(self.seed(), name).unwrap());
        let blessing = self
            .provider
            .bless(
                principal.public_key(),
                &self.provider.default_credential(),
                name,
                vec![],
            )
            .unwrap();
        principal.add_to_roots(&blessing).unwrap();
        principal.set_default(blessing).unwrap();
        let transport = Arc::new(self.network.node(principal.clone(), self.clock()));
        TestUser {
            store: CredentialStore::new(principal.clone(), self.clock()),
            principal,
            transport,
        }
    }

    /// Factory-fresh device on reliable simulated hardware
    pub fn device(&self) -> TestDevice {
        self.device_with(MemoryClaimRecord::new(), Arc::new(SimulatedHardware::reliable()))
    }

    /// Device with the given claim record and hardware
    pub fn device_with(&self, record: MemoryClaimRecord, hardware: Arc<SimulatedHardware>) -> TestDevice {
        let principal = Arc::new(LocalPrincipal::from_seed(self.seed(), "lockd").unwrap());
        self.device_from(principal, record, hardware)
    }

    /// Device around an existing principal, as after a restart
    pub fn device_from(
        &self,
        principal: Arc<LocalPrincipal>,
        record: MemoryClaimRecord,
        hardware: Arc<SimulatedHardware>,
    ) -> TestDevice {
        let transport = Arc::new(self.network.node(principal.clone(), self.clock()));
        TestDevice {
            principal,
            transport,
            record: Arc::new(record),
            hardware,
        }
    }

    /// Yield until `object_name` is mounted
    pub async fn mounted(&self, object_name: &str) {
        while !self.network.mounted().iter().any(|n| n == object_name) {
            tokio::task::yield_now().await;
        }
    }
}

/// A person with a provider-issued identity and a key store
pub struct TestUser {
    /// Blessed `provider/<name>`
    pub principal: Arc<LocalPrincipal>,
    /// Transport and discovery
    pub transport: Arc<MemoryTransport>,
    /// Keys held by the user
    pub store: CredentialStore,
}

/// The parts a lock daemon runs on
pub struct TestDevice {
    /// Device principal, `lockd` until claimed
    pub principal: Arc<LocalPrincipal>,
    /// Transport and discovery
    pub transport: Arc<MemoryTransport>,
    /// Claim marker; clones share state
    pub record: Arc<MemoryClaimRecord>,
    /// Simulated bolt
    pub hardware: Arc<SimulatedHardware>,
}
