pub mod core;
pub mod dictionary;
pub mod engine;
pub mod estimation;
pub mod persistence;
pub mod search;
pub mod segmentation;
pub mod srs;

pub use engine::QuizEngine;
