//! The process-wide pool keeps the configuration of its first caller.
//! Lives in its own test binary so no other test touches the static.

use gallery_sim_http::{ConnectionPool, ConnectionPoolConfig, HttpTransport};
use std::sync::Arc;

#[test]
fn test_shared_pool_first_configuration_wins() {
    let first = ConnectionPool::shared(ConnectionPoolConfig {
        capacity: 12,
        max_retries: 1,
        backoff_factor: 0.1,
        ..ConnectionPoolConfig::default()
    })
    .unwrap();

    let second = ConnectionPool::shared(ConnectionPoolConfig {
        capacity: 99,
        max_retries: 7,
        backoff_factor: 2.0,
        ..ConnectionPoolConfig::default()
    })
    .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.config().capacity, 12);
    assert_eq!(second.config().max_retries, 1);

    let stats = second.pool_stats().unwrap();
    assert_eq!(stats.capacity, 12);
    assert_eq!(stats.backoff_factor, 0.1);

    assert!(first.close());
    assert!(!second.close());
}
