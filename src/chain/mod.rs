//! Chain module - RPC provider management with failover

pub mod provider;

pub use provider::ChainProvider;
