//! Client for the ArgoCD REST API.
//!
//! The [`ArgoClient`] trait is the seam the gateway orchestrates against;
//! [`HttpArgoClient`] is the production implementation.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ArgoClient, ClientSettings, HttpArgoClient};
pub use error::{ArgoError, ArgoErrorKind};
pub use types::{AppData, ApplicationRef, ApplicationSpec, Destination, ProjectSpec};
