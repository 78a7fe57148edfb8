//! # API Layer
//!
//! HTTP surface of the aggregator.

pub mod rest;
