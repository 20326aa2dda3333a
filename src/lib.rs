//! # Tech Digest
//!
//! A news digest pipeline that pulls the latest technology and business
//! headlines, has an LLM write a four-part analysis of each one, and
//! publishes the result as a single static HTML page.
//!
//! ## Features
//!
//! - Fetches the 20 newest English stories from a fixed set of trusted outlets
//! - Analyses each story through an OpenAI-compatible chat-completion API
//! - Falls back to a machine translation of the description when the LLM fails
//! - Splits the analysis into highlights, background, impact and insight
//! - Writes a self-contained `index.html`, optionally e-mailing a copy
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetching**: [`source`] queries the news API and filters the results
//! 2. **Summarizing**: [`summarizer`] asks the LLM ([`api`]), or translates
//!    ([`translate`]) on failure, one article at a time under a [`throttle`]
//! 3. **Parsing**: [`parser`] turns each analysis into four sections
//! 4. **Output**: [`outputs`] renders and writes the HTML digest
//!
//! [`pipeline`] sequences the stages and stops early when there is nothing to
//! publish.

pub mod api;
pub mod cli;
pub mod config;
pub mod models;
pub mod outputs;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod source;
pub mod summarizer;
pub mod throttle;
pub mod translate;
pub mod utils;

#[cfg(test)]
mod test_support;
