use super::*;
use crate::Error;

fn valid_pool() -> PoolConfig {
    PoolConfig {
        max_workers: 10,
        min_workers: 2,
        initial_workers: 4,
        step: 2,
        resize_interval_in_ms: 100,
        growth_factor: 10,
    }
}

#[test]
fn test_valid_pool_config_passes() {
    assert!(valid_pool().validate().is_ok());
}

#[test]
fn test_equal_bounds_are_accepted() {
    let config = PoolConfig {
        max_workers: 3,
        min_workers: 3,
        initial_workers: 3,
        ..valid_pool()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_initial_outside_bounds_is_rejected() {
    let config = PoolConfig {
        initial_workers: 11,
        ..valid_pool()
    };
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

    let config = PoolConfig {
        initial_workers: 1,
        ..valid_pool()
    };
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_zero_step_is_rejected() {
    let config = PoolConfig { step: 0, ..valid_pool() };
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_zero_max_is_rejected() {
    let config = PoolConfig {
        max_workers: 0,
        min_workers: 0,
        initial_workers: 0,
        ..valid_pool()
    };
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_resize_interval_conversion() {
    assert_eq!(valid_pool().resize_interval(), std::time::Duration::from_millis(100));
}
