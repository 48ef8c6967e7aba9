//! Unlock ack barrier and ack record cleanup

use crate::prelude::*;

#[tokio::test]
async fn unlock_barrier_waits_for_every_instance() {
    let cluster = Cluster::new();
    let i1 = cluster.join("i1").await;
    let i2 = cluster.join("i2").await;

    i1.registry.ack_unlock("r1").await.unwrap();
    i2.registry.ack_lock("r1").await.unwrap();

    assert!(!i1.registry.check_unlock_ack("r1").await);
    assert_eq!(cluster.clock.slept(), Duration::from_secs(4));
    assert_eq!(i1.releases("r1"), 0);

    i2.registry.ack_unlock("r1").await.unwrap();
    assert!(i1.registry.check_unlock_ack("r1").await);
}

#[tokio::test]
async fn failed_unlock_barrier_never_touches_the_lock() {
    let cluster = Cluster::new();
    let i1 = cluster.join("i1").await;
    let _i2 = cluster.join("i2").await;

    assert!(i1.registry.try_lock("r1", Duration::ZERO).await);
    assert!(!i1.registry.check_unlock_ack("r1").await);

    assert_eq!(i1.releases("r1"), 0);
    assert_eq!(cluster.holder("r1"), Some(i1.session.id()));
}

#[tokio::test]
async fn deleted_ack_reads_as_empty() {
    let cluster = Cluster::new();
    let i1 = cluster.join("i1").await;

    i1.registry.ack_unlock("r1").await.unwrap();
    assert_eq!(cluster.ack("i1", "r1").as_deref(), Some("unlocked"));

    i1.registry.delete_lock_ack("r1").await.unwrap();
    assert_eq!(cluster.ack("i1", "r1"), None);
    assert_eq!(
        i1.registry
            .load_lock_ack(&InstanceId::new("i1"), "r1")
            .await
            .unwrap(),
        ""
    );
    assert!(!i1.registry.check_unlock_ack("r1").await);
}

#[tokio::test]
async fn acks_for_other_locks_are_ignored() {
    let cluster = Cluster::new();
    let i1 = cluster.join("i1").await;
    let i2 = cluster.join("i2").await;

    i1.registry.ack_unlock("r1").await.unwrap();
    i2.registry.ack_unlock("r2").await.unwrap();

    assert!(!i1.registry.check_unlock_ack("r1").await);
}
