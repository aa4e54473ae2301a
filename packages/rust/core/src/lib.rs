//! Core pipeline orchestration and domain logic for SummaryBook.
//!
//! This crate ties together discovery, summarization, document aggregation
//! and e-book packaging into end-to-end workflows (e.g., [`pipeline::run`]).

pub mod aggregator;
pub mod assembler;
pub mod packager;
pub mod pipeline;
pub mod toc;
