pub mod display;
pub mod fetch;
