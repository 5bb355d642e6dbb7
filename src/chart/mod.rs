//! Chart data generation.
//!
//! This module turns flat records and activity series into serializable
//! figure payloads for the dashboard renderer.

pub mod figures;

pub use figures::{
    activity_figure, figure_json, scatter_by_title, scatter_figure, write_figure_file, Figure,
    TitleGroup,
};
