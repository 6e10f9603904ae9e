//! Kanban task board API library.
//!
//! Users sign up, log in with a JWT session and manage their own tasks on a
//! three-column board. A second document collection holds car listings.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
