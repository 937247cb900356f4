//! Dimension Catalog — read-only reference data for the scoring pipeline.
//!
//! The catalog holds the candidate insulin pump systems and the 23
//! comparison dimensions along which they are described. It is loaded once
//! per process, validated at load time, and shared read-only across
//! concurrent scoring requests.
//!
//! ## Invariants
//!
//! - Dimension numbers are unique.
//! - Every active device has exactly one detail entry per active dimension.
//!   A gap in the device × dimension matrix is a load-time fatal error,
//!   never a runtime surprise.
//! - `Catalog::devices()` returns devices in a fixed, deterministic order.
//!   This order is the canonical tie-break for equal final scores.

pub mod builtin;
pub mod catalog;
pub mod ids;
pub mod shared;
pub mod types;

pub use builtin::BuiltinSource;
pub use catalog::{Catalog, CatalogError, CatalogSource, JsonSource};
pub use ids::{DeviceId, FeatureId};
pub use shared::SharedCatalog;
pub use types::{CatalogData, Device, Dimension};
