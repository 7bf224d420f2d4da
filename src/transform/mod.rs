//! Check-result transformation.
//!
//! # Data Flow
//! ```text
//! CheckResult
//!     → flatten.rs (value tree → dotted key → number)
//!     → tags.rs (series id + tag set per key, actuator rules)
//!         → sanitize.rs (backend-safe tag values)
//!     → translate.rs (GenericMetric per result)
//! ```
//!
//! # Design Decisions
//! - Everything here is pure; counters are the only side effect
//! - Lists, booleans and nulls never become series
//! - A bad result is skipped, the rest of the batch continues

pub mod flatten;
pub mod sanitize;
pub mod tags;
pub mod translate;

pub use flatten::{flatten, FlatValues};
pub use sanitize::sanitize;
pub use tags::{DerivedSeries, TagRules};
pub use translate::{TransformError, Translator};
