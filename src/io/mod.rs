pub mod blob_store;
pub mod config_io;
pub mod file_store;
pub mod identity;
pub mod lock;
pub mod memory_store;
pub mod state;
pub mod store;
pub mod workspace;
