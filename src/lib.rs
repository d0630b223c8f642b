pub mod outcome;
pub mod contract;
pub mod interrupt;

pub mod pending;
pub mod worker;
pub mod future;
pub mod aggregator;

pub use outcome::Outcome;
pub use pending::PendingResult;
pub use future::BlockingFuture;
pub use aggregator::Aggregator;
