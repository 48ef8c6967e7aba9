//! Lock ack barrier across several instances

use crate::prelude::*;
use gov_core::coordination::node;
use gov_core::{CancelSignal, LockAck, RegistryRepository};

#[tokio::test]
async fn one_silent_instance_fails_the_barrier_and_rolls_back() {
    let cluster = Cluster::new();
    let i1 = cluster.join("i1").await;
    let _i2 = cluster.join("i2").await;

    assert!(i1.registry.try_lock("r1", Duration::ZERO).await);
    i1.registry.ack_lock("r1").await.unwrap();

    assert!(!i1.registry.check_lock_ack("r1").await);
    assert_eq!(cluster.clock.sleeps(), vec![Duration::from_secs(1); 4]);
    assert_eq!(i1.releases("r1"), 1);
    assert_eq!(cluster.holder("r1"), None);
}

#[tokio::test]
async fn barrier_passes_on_first_attempt_when_everyone_acked() {
    let cluster = Cluster::new();
    let i1 = cluster.join("i1").await;
    let i2 = cluster.join("i2").await;

    assert!(i1.registry.try_lock("r1", Duration::ZERO).await);
    i1.registry.ack_lock("r1").await.unwrap();
    i2.registry.ack_lock("r1").await.unwrap();

    assert!(i1.registry.check_lock_ack("r1").await);
    assert!(cluster.clock.sleeps().is_empty());
    assert_eq!(i1.releases("r1"), 0);
    assert_eq!(cluster.holder("r1"), Some(i1.session.id()));
}

#[tokio::test]
async fn empty_directory_is_vacuously_acked() {
    let cluster = Cluster::new();
    let lone = cluster.unregistered("i1", LockConfig::default()).await;

    assert!(lone.registry.check_lock_ack("r1").await);
    assert!(lone.registry.check_unlock_ack("r1").await);
    assert!(cluster.clock.sleeps().is_empty());
}

#[tokio::test]
async fn instance_that_crashes_after_acking_reads_as_not_acked() {
    let cluster = Cluster::new();
    let i1 = cluster.join("i1").await;
    let i2 = cluster.join("i2").await;
    // i3 stays registered through one session while its ack session dies
    let _i3 = cluster.join("i3").await;
    let i3_acks = cluster.unregistered("i3", LockConfig::default()).await;

    assert!(i1.registry.try_lock("r1", Duration::ZERO).await);
    for instance in [&i1, &i2] {
        instance.registry.ack_lock("r1").await.unwrap();
    }
    i3_acks.registry.ack_lock("r1").await.unwrap();
    assert_eq!(cluster.ack("i3", "r1").as_deref(), Some("locked"));

    i3_acks.crash();
    assert_eq!(cluster.ack("i3", "r1"), None);

    assert!(!i1.registry.check_lock_ack("r1").await);
    assert_eq!(cluster.holder("r1"), None);
}

#[tokio::test]
async fn crashed_instance_leaves_the_next_snapshot() {
    let cluster = Cluster::new();
    let i1 = cluster.join("i1").await;
    let i2 = cluster.join("i2").await;

    i2.crash();

    assert!(i1.registry.try_lock("r1", Duration::ZERO).await);
    i1.registry.ack_lock("r1").await.unwrap();
    assert!(i1.registry.check_lock_ack("r1").await);
}

#[tokio::test]
async fn acks_are_compared_without_case() {
    let cluster = Cluster::new();
    let i1 = cluster.join("i1").await;
    let i2 = cluster.join("i2").await;

    assert!(i1.registry.try_lock("r1", Duration::ZERO).await);
    i1.registry.ack_lock("r1").await.unwrap();
    i2.session
        .persist_ephemeral(&ack_node("i2", "r1"), "LOCKED")
        .await
        .unwrap();

    assert!(i1.registry.check_lock_ack("r1").await);
}

#[tokio::test]
async fn hyphenated_names_do_not_borrow_each_others_acks() {
    let cluster = Cluster::new();
    let a = cluster.join("a").await;
    let other = cluster.unregistered("a-b", LockConfig::default()).await;

    // "a-b" acking lock "c" must not satisfy "a" on lock "b-c"
    assert!(a.registry.try_lock("b-c", Duration::ZERO).await);
    other
        .session
        .persist_ephemeral(&ack_node("a-b", "c"), LockAck::Locked.as_str())
        .await
        .unwrap();

    assert!(!a.registry.check_lock_ack("b-c").await);
}

#[tokio::test]
async fn cancelled_barrier_still_releases_the_lock() {
    let cluster = Cluster::new();
    let i1 = cluster.join("i1").await;
    let _i2 = cluster.join("i2").await;
    let signal = CancelSignal::new();

    assert!(i1.registry.try_lock("r1", Duration::ZERO).await);
    signal.cancel();

    assert!(
        !i1.registry
            .check_lock_ack_until("r1", &signal.token())
            .await
    );
    assert!(cluster.clock.sleeps().is_empty());
    assert_eq!(cluster.holder("r1"), None);
}

#[tokio::test]
async fn membership_outage_fails_without_waiting() {
    let cluster = Cluster::new();
    let i1 = cluster.join("i1").await;

    assert!(i1.registry.try_lock("r1", Duration::ZERO).await);
    i1.registry.ack_lock("r1").await.unwrap();
    cluster.store.set_available(false);

    assert!(!i1.registry.check_lock_ack("r1").await);
    assert!(cluster.clock.sleeps().is_empty());
    assert_eq!(i1.releases("r1"), 1);
}

fn ack_node(instance: &str, lock_name: &str) -> String {
    node::ack_path(&node::ack_key(instance, lock_name))
}
