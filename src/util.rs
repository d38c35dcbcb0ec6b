pub mod file;
pub mod genome;
