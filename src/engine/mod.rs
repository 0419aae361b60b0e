// src/engine/mod.rs

//! Quiz session engine: the attempt state machine, its view model, and the
//! tokio driver that runs its timers.

pub mod driver;
pub mod machine;
pub mod registry;
pub mod view;

pub use driver::{LiveSession, SessionTiming};
pub use machine::{AnswerRecord, Choice, EngineError, Phase, QuizEngine};
pub use registry::SessionRegistry;
pub use view::{ReviewSheet, SessionView};
