//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads from any thread, including the
//! stdin bridge in watch mode.

use crate::config::DashboardConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<DashboardConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(DashboardConfig::default()));

#[inline]
pub fn cfg() -> Arc<DashboardConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: DashboardConfig) -> Arc<DashboardConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
