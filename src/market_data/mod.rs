pub mod adapters;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod mock;
