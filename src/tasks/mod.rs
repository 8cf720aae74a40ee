mod eviction;

pub use eviction::EvictionTask;
