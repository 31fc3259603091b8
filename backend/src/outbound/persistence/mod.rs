//! Persistence adapters for the repository ports.

pub mod memory;

pub use memory::MemoryDirectory;
