//! Transaction submission module - fee gating and mint submission

pub mod gas;
pub mod sender;

pub use gas::{FeeGate, FeeSource};
pub use sender::{MintOutcome, MintSubmit, MintSubmitter};
