//! Owners, guests and scanning in a neighborhood with live daemons

use lock_agent::{
    claim_lock, scan_neighborhood, start_daemon, update_status, DaemonContext, DaemonHandle,
    DaemonPhase,
};
use lock_authorization::{recv_key, send_key, RecvKeyContext, SendKeyRequest};
use lock_core::effects::{HardwareController, IdentityEffects};
use lock_core::naming::{LOCK_NH_PREFIX, USER_NH_PREFIX};
use lock_core::{LockError, LockStatus};
use lock_testkit::{ScriptedConfirmation, TestDevice, TestNeighborhood, TestUser};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

async fn claimed(nh: &TestNeighborhood, owner: &TestUser, name: &str) -> (TestDevice, DaemonHandle) {
    let device = nh.device();
    let daemon = start_daemon(DaemonContext {
        identity: device.principal.clone(),
        transport: device.transport.clone(),
        discovery: device.transport.clone(),
        record: device.record.clone(),
        hardware: device.hardware.clone(),
    })
    .await
    .unwrap();
    let unclaimed = daemon.phase().nh_name().unwrap().to_string();
    let unclaimed = unclaimed.strip_prefix(LOCK_NH_PREFIX).unwrap();
    claim_lock(owner.transport.as_ref(), &owner.store, unclaimed, name)
        .await
        .unwrap();
    daemon
        .wait_for(|phase| matches!(phase, DaemonPhase::Claimed { .. }))
        .await
        .unwrap();
    (device, daemon)
}

#[tokio::test]
async fn test_key_for_one_lock_does_not_open_another() {
    let nh = TestNeighborhood::new();
    let alice = nh.user("alice");
    let bob = nh.user("bob");
    let (_front, front_daemon) = claimed(&nh, &alice, "front_door").await;
    let (back, back_daemon) = claimed(&nh, &bob, "back_door").await;

    let result = update_status(alice.transport.as_ref(), "back_door", LockStatus::Locked).await;
    assert!(matches!(result, Err(LockError::PermissionDenied { .. })));
    assert_eq!(back.hardware.status(), LockStatus::Unlocked);

    update_status(alice.transport.as_ref(), "front_door", LockStatus::Locked)
        .await
        .unwrap();

    front_daemon.shutdown().await.unwrap();
    back_daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_delegated_key_opens_the_lock() {
    let nh = TestNeighborhood::new();
    let alice = nh.user("alice");
    let bob = nh.user("bob");
    let (front, daemon) = claimed(&nh, &alice, "front_door").await;

    // Bob has no key yet.
    let denied = update_status(bob.transport.as_ref(), "front_door", LockStatus::Locked).await;
    assert!(matches!(denied, Err(LockError::PermissionDenied { .. })));

    let confirmation = Arc::new(ScriptedConfirmation::new([true]));
    let (_cancel, cancel_rx) = oneshot::channel::<()>();
    let transport = bob.transport.clone();
    let store = bob.store.clone();
    let prefix = nh.provider_prefix();
    let answers = confirmation.clone();
    let receiver = tokio::spawn(async move {
        let ctx = RecvKeyContext {
            transport: transport.as_ref(),
            discovery: transport.as_ref(),
            store,
            confirmation: answers,
            provider_prefix: prefix,
        };
        recv_key(ctx, async move {
            let _ = cancel_rx.await;
        })
        .await
    });
    nh.mounted("user-bob/recvkey").await;

    send_key(
        alice.transport.as_ref(),
        &alice.store,
        nh.clock(),
        nh.provider_prefix(),
        SendKeyRequest {
            lock_name: "front_door".to_string(),
            recipient: "bob".to_string(),
            category: "guest".to_string(),
            expiry: Some(Duration::from_secs(3600)),
        },
    )
    .await
    .unwrap();
    let offer = receiver.await.unwrap().unwrap().unwrap();
    assert_eq!(offer.sender, "alice");
    assert_eq!(confirmation.offers().len(), 1);

    update_status(bob.transport.as_ref(), "front_door", LockStatus::Locked)
        .await
        .unwrap();
    assert_eq!(front.hardware.status(), LockStatus::Locked);

    // The delegated key stops working once it expires.
    nh.time.advance(Duration::from_secs(3601));
    let expired = update_status(bob.transport.as_ref(), "front_door", LockStatus::Unlocked).await;
    assert!(matches!(expired, Err(LockError::PermissionDenied { .. })));
    update_status(alice.transport.as_ref(), "front_door", LockStatus::Unlocked)
        .await
        .unwrap();

    daemon.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_scan_lists_locks_and_listening_users() {
    let nh = TestNeighborhood::new();
    let alice = nh.user("alice");
    let bob = nh.user("bob");
    let (_front, front_daemon) = claimed(&nh, &alice, "front_door").await;
    let fresh = nh.device();
    let fresh_daemon = start_daemon(DaemonContext {
        identity: fresh.principal.clone(),
        transport: fresh.transport.clone(),
        discovery: fresh.transport.clone(),
        record: fresh.record.clone(),
        hardware: fresh.hardware.clone(),
    })
    .await
    .unwrap();
    let unclaimed = fresh_daemon.phase().nh_name().unwrap().to_string();

    let (cancel, cancel_rx) = oneshot::channel::<()>();
    let transport = bob.transport.clone();
    let store = bob.store.clone();
    let prefix = nh.provider_prefix();
    let receiver = tokio::spawn(async move {
        let ctx = RecvKeyContext {
            transport: transport.as_ref(),
            discovery: transport.as_ref(),
            store,
            confirmation: Arc::new(ScriptedConfirmation::default()),
            provider_prefix: prefix,
        };
        recv_key(ctx, async move {
            let _ = cancel_rx.await;
        })
        .await
    });
    nh.mounted("user-bob/recvkey").await;

    let locks = scan_neighborhood(alice.transport.as_ref(), LOCK_NH_PREFIX)
        .await
        .unwrap();
    let mut names: Vec<_> = locks.iter().map(|entry| entry.name.clone()).collect();
    names.sort();
    let mut expected = vec![
        "front_door".to_string(),
        unclaimed.strip_prefix(LOCK_NH_PREFIX).unwrap().to_string(),
    ];
    expected.sort();
    assert_eq!(names, expected);
    let front = locks.iter().find(|entry| entry.name == "front_door").unwrap();
    assert_eq!(front.owners, vec!["front_door".to_string()]);

    let users = scan_neighborhood(alice.transport.as_ref(), USER_NH_PREFIX)
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "bob");
    assert_eq!(users[0].owners, bob.principal.default_credential().names());

    cancel.send(()).unwrap();
    assert_eq!(receiver.await.unwrap().unwrap(), None);
    let users = scan_neighborhood(alice.transport.as_ref(), USER_NH_PREFIX)
        .await
        .unwrap();
    assert!(users.is_empty());

    front_daemon.shutdown().await.unwrap();
    fresh_daemon.shutdown().await.unwrap();
}
