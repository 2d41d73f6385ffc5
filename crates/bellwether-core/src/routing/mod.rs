pub mod audit;
pub mod selector;
