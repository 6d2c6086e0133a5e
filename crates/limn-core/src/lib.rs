//! Limn Core Types and Definitions
//!
//! This crate provides the foundational, behavior-free types shared by the
//! Limn build pipeline and automation host. It includes:
//!
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Style**: Fill, stroke and line pattern of shapes and connectors ([`style`] module)
//! - **Model**: Nodes, edges and the diagram model ([`model`] module)
//! - **Layout**: Layout results and options ([`layout`] module)
//! - **Commands**: Drawing commands emitted by rendering ([`command`] module)
//! - **Templates**: Template keys and template specifications ([`template`] module)

pub mod color;
pub mod command;
pub mod geometry;
pub mod layout;
pub mod metadata;
pub mod model;
pub mod style;
pub mod template;
