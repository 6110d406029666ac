pub mod firms;
pub mod synthetic;
