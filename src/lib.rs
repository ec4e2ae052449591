//! Famulus: a self-hosted agent server.
//!
//! Each agent turns a free-form user instruction into a structured plan,
//! executes it step by step against an isolated sandbox (shell, files,
//! browser, optional web search), and streams typed progress events back to
//! the caller over SSE.
//!
//! Layout:
//! - [`ai`]: LLM provider abstraction and the OpenAI-compatible client
//! - [`agent`]: memory, reasoning loop, planner, executor, plan/act flow
//! - [`tools`]: function registry and the tool groups bound to the executor
//! - [`sandbox`] / [`browser`] / [`search`]: external collaborators
//! - [`runtime`]: per-agent worker tasks, queues, lifecycle
//! - [`gateway`]: HTTP surface, SSE projection, VNC relay
//! - [`events`]: the domain event model tying it all together

pub mod agent;
pub mod ai;
pub mod browser;
pub mod config;
pub mod events;
pub mod gateway;
pub mod logging;
pub mod runtime;
pub mod sandbox;
pub mod search;
pub mod tools;
