//! ReadFit backend: teacher-published reading assignments and a four-step student
//! flow (quiz, mission choice, mission activity, report) with AI helpers that fall
//! back to built-in content.

pub mod assist;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod images;
pub mod logic;
pub mod missions;
pub mod openai;
pub mod protocol;
pub mod quiz;
pub mod report;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;

pub use routes::build_router;
pub use state::AppState;
