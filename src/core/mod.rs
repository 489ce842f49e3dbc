pub mod domain;
pub mod elements;
