// file: src/utils/mod.rs
// description: shared helpers

pub mod logging;
pub mod validation;

pub use validation::Validator;
