pub mod scheduler;

pub use scheduler::{
    Scheduler,
    SrsAnalysis,
};
