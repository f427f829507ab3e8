//! Core infrastructure for portwright.
//!
//! This crate provides the language-agnostic pieces of the converter:
//! - Span and edit IR for representing text transformations
//! - Error taxonomy and diagnostics
//! - Report types returned to callers (the caller contract)
//! - Text position utilities

pub mod error;
pub mod patch;
pub mod report;
pub mod text;
