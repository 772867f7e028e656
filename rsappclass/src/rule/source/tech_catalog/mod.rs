pub mod adapter;
pub mod original;
