pub mod engine;
pub mod scanner;
pub mod types;
pub mod word_set;
