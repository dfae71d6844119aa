pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod utils;

pub use config::EngineConfig;
pub use errors::TankyuError;
pub use models::{
    ContigTokenization,
    DayStats,
    EngineSettings,
    Feedback,
    Known,
    NextQuiz,
    Quiz,
    QuizKind,
    QuizTarget,
    Token,
    TrackedWord,
    WordState,
    WordStatus,
};
pub use utils::Moment;
