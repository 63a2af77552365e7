pub mod aabb;
pub mod plane;
pub mod polygon;

pub use glam::{DMat3, DVec2, DVec3, DVec4};

pub use aabb::{Aabb2, Aabb3};
pub use plane::Plane;
pub use polygon::{
    point_in_polygon, point_segment_distance, polygon_is_simple, polygon_signed_area,
    segments_properly_intersect, signed_area2,
};

pub type Point2 = DVec2;
pub type Point3 = DVec3;
pub type Vector2 = DVec2;
pub type Vector3 = DVec3;
