//! Road accident summary views for 2021-2022.
//!
//! Records are loaded once into an immutable [`RecordStore`]; every change of
//! [`FilterState`] calls [`Engine::recompute`], which filters the store and
//! rebuilds all ten views as one [`Bundle`].
pub mod engine;
pub mod error;
pub mod filter;
pub mod loader;
pub mod output;
pub mod reports;
pub mod session;
pub mod types;
pub mod util;

pub use engine::Engine;
pub use error::{LoadError, OutputError, PipelineError};
pub use types::{AggregateResult, Bundle, FilterState, RecordStore, ResultData, Statistic, View};
