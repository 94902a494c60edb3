//! Feature extraction: biosignal, behavioral, and contextual.
//!
//! Each submodule exposes pure `compute_*` functions that collapse raw,
//! possibly-partial input into a neutral default when data is absent,
//! mirroring the teacher's `core/features.rs` shape.

pub mod behavioral;
pub mod biosignal;
pub mod contextual;
