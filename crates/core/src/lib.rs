pub mod axis;
pub mod config;
pub mod controller;
pub mod error;
pub mod evaluator;
pub mod highlight;
pub mod history;
pub mod index;
pub mod lock;
pub mod query;
pub mod record;
pub mod renderer;
pub mod scale;
pub mod scene;
pub mod summary;

pub use config::ServiceConfig;
pub use controller::{Controller, SubmitOutcome, Submission, Ticket, ViewMode};
pub use error::*;
pub use evaluator::{Evaluation, Evaluator, HttpEvaluator, Rejection};
pub use query::{Field, FieldError, Query};
pub use record::CellRecord;
pub use renderer::{DrawReport, Renderer};
