pub mod cache;
pub mod memory;
pub mod remote;
pub mod sync;

pub use cache::LocalCache;
pub use memory::MemoryStore;
pub use remote::{LotUpsert, RemoteStore, SessionUser, StoreError};
