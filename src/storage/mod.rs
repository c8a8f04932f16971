pub mod baseline;
pub mod persistence;
