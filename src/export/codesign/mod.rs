//! Code signing resolution.
//!
//! Reads installed signing material ([`CertificateStore`], [`ProfileStore`])
//! and picks a coherent certificate and per-target profile mapping with
//! [`CodeSignGroupResolver`].
//!
//! # Module Organization
//!
//! - [`certificate`] - certificates and the keychain store
//! - [`profile`] - provisioning profile decoding and classification
//! - [`profile_store`] - installed profile enumeration
//! - [`group`] - selectable and resolved signing groups
//! - [`filter`] - the group filter pipeline stages
//! - [`resolver`] - the resolution pipeline
//! - [`report`] - the structured resolution trace

pub mod certificate;
mod default_profile;
pub mod filter;
pub mod group;
pub mod profile;
pub mod profile_store;
pub mod report;
pub mod resolver;

pub use certificate::{Certificate, CertificateStore, KeychainCertificateStore};
pub use default_profile::fetch_default_profile;
pub use group::{ResolvedGroup, SelectableGroup, SigningStyle};
pub use profile::{ProfileKind, ProvisioningProfile};
pub use profile_store::{InstalledProfileStore, ProfileStore};
pub use report::{Diagnostic, DiagnosticKind, ResolutionReport, ResolutionStep, StepOutcome};
pub use resolver::{CodeSignGroupResolver, Resolution, ResolutionRequest};
