//! Tessellation of B-Rep solids into watertight triangle meshes.
//!
//! The pipeline discretizes every model edge once (so adjoining faces share the
//! exact same boundary points), normalizes loops on periodic surfaces, refines
//! boundary segments to tolerance, samples face interiors adaptively, and runs a
//! constrained Delaunay triangulation per face with 3D back-mapping and pole
//! correction.

pub mod mesh;
pub mod pipeline;
pub mod proximity;
pub mod refine;
pub mod sampler;
pub mod seam;
pub mod singularity;
pub mod triangulate;
pub mod work;

pub use mesh::TriangleMesh;
pub use pipeline::{tessellate_solid, FaceMesh, Tessellated, TessellationStatus};
