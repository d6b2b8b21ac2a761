//! shinsa-core — Rank ordering, roster import, exam scoring and queries.
//!
//! This crate holds the data model and the pure decision logic of a dojo's
//! promotion exams. Persistence sits behind the [`traits::DataGateway`]
//! trait, implemented in `shinsa-store`.

pub mod enrollment;
pub mod error;
pub mod importer;
pub mod model;
pub mod normalize;
pub mod query;
pub mod rank;
pub mod scoring;
pub mod service;
pub mod traits;

pub use error::{EnrollError, ExamError, GatewayError, ScoreError, ServiceError};
pub use rank::{Rank, RankOrdering};
