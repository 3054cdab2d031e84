//! In-memory network for testing and simulation
//!
//! A [`MemoryNetwork`] is a shared registry of mounted servers and
//! neighborhood advertisements. Each node gets its own [`MemoryTransport`]
//! bound to the node's identity and clock. Calls run the same credential
//! exchange a networked transport would: the client validates the server,
//! picks the credential to present, the server validates it and applies its
//! authorization policy, then the client's granter runs and the request is
//! dispatched.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use lock_core::effects::{
    Advertisement, AuthorizationPolicy, DiscoveryEffects, Dispatcher, GlobEntry, GrantCall,
    Granter, IdentityEffects, PhysicalTimeEffects, Request, Response, ServerCall, ServerHandle,
    TransportEffects,
};
use lock_core::types::{names_related, CHAIN_SEPARATOR};
use lock_core::{LockError, LockResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct MountedServer {
    id: u64,
    service: Arc<dyn Dispatcher>,
    policy: AuthorizationPolicy,
    identity: Arc<dyn IdentityEffects>,
    /// Calls hold a read guard; stopping takes the write guard to drain them
    gate: Arc<tokio::sync::RwLock<bool>>,
}

struct Advertised {
    id: u64,
    identities: Vec<String>,
}

#[derive(Default)]
struct Registry {
    servers: HashMap<String, Arc<MountedServer>>,
    advertisements: BTreeMap<String, Advertised>,
}

/// Shared registry every node of a simulated neighborhood talks through
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    registry: Arc<RwLock<Registry>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryNetwork {
    /// Empty network
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport for a node with the given identity and clock
    pub fn node(
        &self,
        identity: Arc<dyn IdentityEffects>,
        time: Arc<dyn PhysicalTimeEffects>,
    ) -> MemoryTransport {
        MemoryTransport {
            network: self.clone(),
            identity,
            time,
        }
    }

    /// Object names currently mounted
    pub fn mounted(&self) -> Vec<String> {
        let mut names: Vec<_> = self.registry.read().servers.keys().cloned().collect();
        names.sort();
        names
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn lookup(&self, object_name: &str) -> Option<Arc<MountedServer>> {
        self.registry.read().servers.get(object_name).cloned()
    }
}

/// One node's view of a [`MemoryNetwork`]
#[derive(Clone)]
pub struct MemoryTransport {
    network: MemoryNetwork,
    identity: Arc<dyn IdentityEffects>,
    time: Arc<dyn PhysicalTimeEffects>,
}

impl MemoryTransport {
    /// Network this transport is attached to
    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }
}

fn authorize(
    policy: AuthorizationPolicy,
    local_names: &[String],
    remote_names: &[String],
) -> LockResult<()> {
    match policy {
        AuthorizationPolicy::AllowEveryone => Ok(()),
        AuthorizationPolicy::Default if names_related(local_names, remote_names) => Ok(()),
        AuthorizationPolicy::Default => Err(LockError::permission_denied(format!(
            "caller {remote_names:?} is not authorized by server {local_names:?}"
        ))),
    }
}

#[async_trait]
impl TransportEffects for MemoryTransport {
    async fn serve(
        &self,
        object_name: &str,
        service: Arc<dyn Dispatcher>,
        policy: AuthorizationPolicy,
    ) -> LockResult<Box<dyn ServerHandle>> {
        let server = Arc::new(MountedServer {
            id: self.network.allocate_id(),
            service,
            policy,
            identity: self.identity.clone(),
            gate: Arc::new(tokio::sync::RwLock::new(true)),
        });
        {
            let mut registry = self.network.registry.write();
            if registry.servers.contains_key(object_name) {
                return Err(LockError::internal(format!(
                    "object name {object_name} is already in use"
                )));
            }
            registry
                .servers
                .insert(object_name.to_string(), server.clone());
        }
        info!(object_name, %policy, "serving");
        Ok(Box::new(MemoryServerHandle {
            network: self.network.clone(),
            object_name: object_name.to_string(),
            id: server.id,
            gate: server.gate.clone(),
        }))
    }

    async fn call(
        &self,
        object_name: &str,
        request: Request,
        granter: Option<Arc<dyn Granter>>,
    ) -> LockResult<Response> {
        let not_mounted = || LockError::not_found(format!("no server mounted at {object_name}"));
        let server = self.network.lookup(object_name).ok_or_else(not_mounted)?;
        let open = server.gate.read().await;
        if !*open {
            return Err(not_mounted());
        }

        let now = self.time.physical_time().await?;
        let client_default = self.identity.default_credential();
        let client_names = self.identity.displayed_names(&client_default);

        let server_credential = server.identity.default_credential();
        let server_names = self
            .identity
            .remote_names(&server_credential, &client_names, now);
        let presented = self
            .identity
            .for_peer(&server_names)
            .unwrap_or(client_default);

        let local_names = server.identity.displayed_names(&server_credential);
        let remote_names = server.identity.remote_names(&presented, &local_names, now);
        debug!(
            object_name,
            method = request.method(),
            ?server_names,
            ?remote_names,
            "call"
        );
        if let Err(e) = authorize(server.policy, &local_names, &remote_names) {
            warn!(object_name, method = request.method(), error = %e, "call rejected");
            return Err(e);
        }

        let granted = match granter {
            Some(granter) => {
                let grant_call = GrantCall {
                    remote_names: server_names,
                    remote_public_key: server_credential.public_key(),
                };
                Some(granter.grant(&grant_call).await?)
            }
            None => None,
        };

        let call = ServerCall {
            local_names,
            remote_names,
            remote_public_key: presented.public_key(),
            granted,
        };
        server.service.dispatch(call, request).await
    }
}

struct MemoryServerHandle {
    network: MemoryNetwork,
    object_name: String,
    id: u64,
    gate: Arc<tokio::sync::RwLock<bool>>,
}

#[async_trait]
impl ServerHandle for MemoryServerHandle {
    fn object_name(&self) -> &str {
        &self.object_name
    }

    async fn stop(self: Box<Self>) {
        {
            let mut registry = self.network.registry.write();
            if registry
                .servers
                .get(&self.object_name)
                .is_some_and(|server| server.id == self.id)
            {
                registry.servers.remove(&self.object_name);
            }
        }
        // Waits for in-flight calls to release their read guards.
        *self.gate.write().await = false;
        info!(object_name = %self.object_name, "stopped serving");
    }
}

struct MemoryAdvertisement {
    network: MemoryNetwork,
    name: String,
    id: u64,
}

#[async_trait]
impl Advertisement for MemoryAdvertisement {
    fn name(&self) -> &str {
        &self.name
    }

    async fn withdraw(self: Box<Self>) {
        let mut registry = self.network.registry.write();
        if registry
            .advertisements
            .get(&self.name)
            .is_some_and(|ad| ad.id == self.id)
        {
            registry.advertisements.remove(&self.name);
            debug!(name = %self.name, "advertisement withdrawn");
        }
    }
}

#[async_trait]
impl DiscoveryEffects for MemoryTransport {
    async fn advertise(&self, nh_name: &str) -> LockResult<Box<dyn Advertisement>> {
        let id = self.network.allocate_id();
        let identities = self.identity.default_credential().names();
        {
            let mut registry = self.network.registry.write();
            if registry.advertisements.contains_key(nh_name) {
                return Err(LockError::internal(format!(
                    "neighborhood name {nh_name} is already advertised"
                )));
            }
            registry
                .advertisements
                .insert(nh_name.to_string(), Advertised { id, identities });
        }
        info!(nh_name, "advertising");
        Ok(Box::new(MemoryAdvertisement {
            network: self.network.clone(),
            name: nh_name.to_string(),
            id,
        }))
    }

    fn glob(&self, pattern: &str) -> LockResult<BoxStream<'static, GlobEntry>> {
        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| LockError::config(format!("invalid glob {pattern:?}: {e}")))?;
        let registry = self.network.registry.read();
        let entries: Vec<GlobEntry> = registry
            .advertisements
            .iter()
            .filter(|(name, _)| matcher.matches(name))
            .map(|(name, ad)| {
                let prefix = format!("{name}{CHAIN_SEPARATOR}");
                let mut endpoints: Vec<String> = registry
                    .servers
                    .keys()
                    .filter(|object| object.starts_with(&prefix))
                    .cloned()
                    .collect();
                endpoints.sort();
                GlobEntry {
                    name: name.clone(),
                    endpoints,
                    identities: ad.identities.clone(),
                }
            })
            .collect();
        Ok(stream::iter(entries).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::LocalPrincipal;
    use crate::time::SimulatedTimeHandler;
    use lock_core::{LockStatus, Restriction};
    use std::time::Duration;

    struct Echo;

    #[async_trait]
    impl Dispatcher for Echo {
        async fn dispatch(&self, call: ServerCall, _request: Request) -> LockResult<Response> {
            assert!(!call.local_names.is_empty());
            Ok(Response::Status(LockStatus::Locked))
        }
    }

    struct SlowEcho(Arc<SimulatedTimeHandler>);

    #[async_trait]
    impl Dispatcher for SlowEcho {
        async fn dispatch(&self, _call: ServerCall, _request: Request) -> LockResult<Response> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.0.advance(Duration::from_millis(1));
            Ok(Response::Ack)
        }
    }

    fn node(network: &MemoryNetwork, seed: u8, name: &str) -> (MemoryTransport, Arc<LocalPrincipal>) {
        let principal = Arc::new(LocalPrincipal::from_seed([seed; 32], name).unwrap());
        let transport = network.node(principal.clone(), Arc::new(SimulatedTimeHandler::default()));
        (transport, principal)
    }

    #[tokio::test]
    async fn test_default_policy_rejects_strangers() {
        let network = MemoryNetwork::new();
        let (server, _) = node(&network, 1, "front_door");
        let (client, _) = node(&network, 2, "mallory");
        let _handle = server
            .serve("lock-front_door/lock", Arc::new(Echo), AuthorizationPolicy::Default)
            .await
            .unwrap();
        let result = client.call("lock-front_door/lock", Request::Status, None).await;
        assert!(matches!(result, Err(LockError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn test_key_holder_is_admitted_and_peer_credential_selected() {
        let network = MemoryNetwork::new();
        let (server, lock) = node(&network, 1, "front_door");
        let (client, owner) = node(&network, 2, "alice");
        let key = lock
            .bless(
                owner.public_key(),
                &lock.default_credential(),
                "key",
                vec![Restriction::only_lock("front_door")],
            )
            .unwrap();
        owner.add_to_roots(&key).unwrap();
        owner
            .set_for_peer(key, lock_core::IdentityPattern::new("front_door"))
            .unwrap();

        let _handle = server
            .serve("lock-front_door/lock", Arc::new(Echo), AuthorizationPolicy::Default)
            .await
            .unwrap();
        let response = client
            .call("lock-front_door/lock", Request::Status, None)
            .await
            .unwrap();
        assert_eq!(response, Response::Status(LockStatus::Locked));
    }

    #[tokio::test]
    async fn test_stop_drains_in_flight_calls_and_unmounts() {
        let network = MemoryNetwork::new();
        let (server, _) = node(&network, 1, "front_door");
        let (client, _) = node(&network, 2, "alice");
        let time = Arc::new(SimulatedTimeHandler::default());
        let handle = server
            .serve("open/lock", Arc::new(SlowEcho(time)), AuthorizationPolicy::AllowEveryone)
            .await
            .unwrap();

        let in_flight = tokio::spawn(async move { client.call("open/lock", Request::Lock, None).await });
        tokio::task::yield_now().await;
        handle.stop().await;
        assert_eq!(in_flight.await.unwrap().unwrap(), Response::Ack);
        assert!(network.mounted().is_empty());
    }

    #[tokio::test]
    async fn test_glob_sees_advertisements_until_withdrawn() {
        let network = MemoryNetwork::new();
        let (lock, _) = node(&network, 1, "front_door");
        let (user, _) = node(&network, 2, "alice");
        let ad = lock.advertise("lock-front_door").await.unwrap();
        let _handle = lock
            .serve("lock-front_door/lock", Arc::new(Echo), AuthorizationPolicy::Default)
            .await
            .unwrap();
        let _user_ad = user.advertise("user-alice").await.unwrap();

        let found: Vec<GlobEntry> = user.glob("lock-*").unwrap().collect().await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "lock-front_door");
        assert_eq!(found[0].endpoints, vec!["lock-front_door/lock".to_string()]);
        assert_eq!(found[0].identities, vec!["front_door".to_string()]);

        ad.withdraw().await;
        assert_eq!(user.glob("lock-*").unwrap().count().await, 0);
    }

    #[tokio::test]
    async fn test_call_to_missing_server_is_not_found() {
        let network = MemoryNetwork::new();
        let (client, _) = node(&network, 2, "alice");
        let result = client.call("lock-nowhere/lock", Request::Status, None).await;
        assert!(matches!(result, Err(LockError::NotFound { .. })));
    }
}
