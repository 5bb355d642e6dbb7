//! Pure data transforms.
//!
//! The two core routines of the toolkit: recursive JSON flattening and
//! daily created-vs-resolved aggregation. Both are synchronous, allocate
//! fresh structures per call, and touch no external state.

pub mod activity;
pub mod flatten;

pub use activity::{aggregate, ActivitySeries, AggregateError, SkippedRecord};
pub use flatten::{
    flatten, flatten_with, FlatRecord, FlattenError, FlattenOptions, NestedKeys, Scalar,
};
