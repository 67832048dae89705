//! Mesh processing algorithms.
//!
//! - **Simplification**: edge collapse driven by pluggable cost, placement
//!   and stop policies ([`simplify`])
//! - **Subdivision**: Loop and Catmull-Clark ([`subdivide`])
//! - **Remeshing**: isotropic split/collapse/flip/smooth ([`remesh`])
//!
//! Long-running entry points have a `*_with_progress` variant taking a
//! [`Progress`] callback.

pub mod progress;
pub mod remesh;
pub mod simplify;
pub mod subdivide;

pub use progress::Progress;
