//! Storage backend implementations.
//!
//! Each backend is gated behind a feature flag.
//!
//! # Available Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | In-memory | `memory` | Reference backend for development and tests |
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "memory")]
//! # {
//! use sensorthings_persistence::backends::memory::InMemoryBackend;
//!
//! let backend = InMemoryBackend::new();
//! assert_eq!(backend.write_count(), 0);
//! # }
//! ```

#[cfg(feature = "memory")]
pub mod memory;
