pub mod primitives;
pub mod solid;
pub mod types;
pub mod validate;

pub use solid::Solid;
pub use types::{Edge, Face, FaceId, Loop, LoopId, Trim, TrimId, Vertex, VertexId, EdgeId};
