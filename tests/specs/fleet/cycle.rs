//! Full fleet lock cycles with live ack responders

use crate::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn three_instances_agree_on_lock_and_unlock() {
    let cluster = Cluster::new();
    let i1 = cluster.join_live("i1").await;
    let _i2 = cluster.join_live("i2").await;
    let _i3 = cluster.join_live("i3").await;

    assert!(i1.fleet.try_lock("r1", Duration::from_millis(100)).await);
    for id in ["i1", "i2", "i3"] {
        assert_eq!(cluster.ack(id, "r1").as_deref(), Some("locked"), "{id}");
    }
    assert_eq!(cluster.holder("r1"), Some(i1.session.id()));

    assert!(i1.fleet.release_lock("r1").await);
    assert_eq!(cluster.holder("r1"), None);
    // The releaser clears its own record; peers keep their last-known state
    assert_eq!(cluster.ack("i1", "r1"), None);
    for id in ["i2", "i3"] {
        assert_eq!(cluster.ack(id, "r1").as_deref(), Some("unlocked"), "{id}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_lock_name_is_an_ordinary_lock() {
    let cluster = Cluster::new();
    let i1 = cluster.join_live("i1").await;
    let _i2 = cluster.join_live("i2").await;

    assert!(i1.fleet.try_lock("", Duration::from_millis(200)).await);
    assert_eq!(cluster.ack("i2", "").as_deref(), Some("locked"));
    assert_eq!(cluster.holder(""), Some(i1.session.id()));
    assert!(i1.fleet.release_lock("").await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_exclusive_serialises_work_across_instances() {
    let cluster = Cluster::new();
    let i1 = cluster.join_live("i1").await;
    let i2 = cluster.join_live("i2").await;
    let inside = Arc::new(AtomicUsize::new(0));
    let overlap = Arc::new(AtomicUsize::new(0));

    let work = |inside: Arc<AtomicUsize>, overlap: Arc<AtomicUsize>| async move {
        if inside.fetch_add(1, Ordering::SeqCst) > 0 {
            overlap.fetch_add(1, Ordering::SeqCst);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        inside.fetch_sub(1, Ordering::SeqCst);
    };

    let (a, b) = tokio::join!(
        i1.fleet.run_exclusive(
            "r1",
            Duration::from_secs(2),
            work(inside.clone(), overlap.clone())
        ),
        i2.fleet.run_exclusive(
            "r1",
            Duration::from_secs(2),
            work(inside.clone(), overlap.clone())
        ),
    );

    assert!(a.is_some() || b.is_some());
    assert_eq!(overlap.load(Ordering::SeqCst), 0);
    assert_eq!(cluster.holder("r1"), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn crashed_peer_drops_out_of_the_barrier() {
    let cluster = Cluster::new();
    let i1 = cluster.join_live("i1").await;
    let i2 = cluster.join_live("i2").await;

    i2.crash();

    assert!(i1.fleet.try_lock("r1", Duration::from_millis(100)).await);
    assert_eq!(cluster.ack("i2", "r1"), None);
    assert!(i1.fleet.release_lock("r1").await);
}

#[tokio::test]
async fn silent_peer_blocks_the_fleet_lock() {
    let cluster = Cluster::new();
    let i1 = cluster.join_live("i1").await;
    // Registered, but never runs a responder
    let _silent = cluster.join("i2").await;

    assert!(!i1.fleet.try_lock("r1", Duration::from_millis(100)).await);
    assert_eq!(cluster.holder("r1"), None);
    assert!(
        i1.fleet
            .run_exclusive("r1", Duration::ZERO, async { unreachable!() })
            .await
            .is_none()
    );
}

#[tokio::test]
async fn standalone_proxy_needs_no_store() {
    let registry = LockRegistry::new(
        NoOpRepository::new(),
        InstanceId::for_process("localhost"),
        LockConfig::default(),
        FakeClock::new(),
    )
    .await
    .unwrap();
    let fleet = FleetLock::new(registry);

    assert_eq!(fleet.run_exclusive("r1", Duration::ZERO, async { 7 }).await, Some(7));
}
