//! Core types and services for the survey system.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend plugs in through [`store::SurveyStore`]; the HTTP layer
//! drives everything through [`service::SurveyService`], gating reads with
//! [`access::AccessPolicy`] and rendering reports via
//! [`report::ReportRegistry`].

pub mod access;
pub mod codec;
pub mod error;
pub mod question;
pub mod report;
pub mod response;
pub mod service;
pub mod store;
pub mod summary;
pub mod survey;
pub mod text_group;

pub use error::{Error, Result};
