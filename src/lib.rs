//! Integration of metabolite identity records from several chemical databases
//! into one table keyed by InChIKey.
//!
//! Parsed [`domain::Record`]s are bucketed by [`group::group_records`], folded
//! into [`domain::Entity`]s by [`merge::integrate`] and optionally annotated
//! with synonyms by [`synonyms::annotate`]. File handling lives in [`table`]
//! and the two end-to-end pipelines in [`app`].

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod group;
pub mod merge;
pub mod output;
pub mod synonyms;
pub mod table;
