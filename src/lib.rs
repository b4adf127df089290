//! rare-earths: a rare-earth market statistics dashboard with a grounded
//! question panel backed by Google Gemini.
//!
//! - [`dataset`] — the embedded USGS tables and the context summary
//! - [`llm`] — the text-generation seam and the Gemini client
//! - [`chat`] — the single-flight question panel
//! - [`render`] — chart/table views, SVG and the dashboard page
//! - [`web`] — the `tiny_http` dashboard server
//! - [`config`], [`analytics`], [`cli`] — settings, question log, commands

pub mod analytics;
pub mod chat;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod llm;
pub mod render;
pub mod web;
