//! folio: a content-managed landing page server.
//!
//! A page document fetched from a headless CMS drives the landing page: its
//! ordered block layout maps to renderers (hero, content, newsletter form),
//! and the newsletter form's submission client posts signup payloads back to
//! the CMS while driving a small idle/loading/error/success state machine.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
