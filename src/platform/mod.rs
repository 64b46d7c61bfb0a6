//! Host platform abstraction for testable OS queries

mod mock;
mod real;
mod r#trait;

pub use mock::MockPlatform;
pub use r#trait::{OwnerIds, Platform};
pub use real::RealPlatform;
