//! Utility types for table I/O

pub mod data_loader;

pub use data_loader::{DataLoader, DataSaver};
