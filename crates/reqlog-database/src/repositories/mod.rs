//! Concrete log record stores.

pub mod log;
pub mod memory;

pub use log::MongoLogRepository;
pub use memory::MemoryLogRepository;
