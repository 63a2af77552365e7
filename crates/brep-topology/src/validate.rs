//! Structural validation of a solid before tessellation.
//!
//! Tessellation does not classify topology; this check only rejects models that
//! are structurally unusable (the `non-solid` status), not ones that are merely
//! geometrically poor.

use brep_core::error::{BrepError, Result};
use brep_core::traits::Validate;

use crate::solid::Solid;

impl Validate for Solid {
    fn validate(&self) -> Result<()> {
        if self.faces.is_empty() {
            return Err(BrepError::Topology("solid has no faces".into()));
        }

        for (face_id, face) in &self.faces {
            let outer = face
                .outer_loop
                .ok_or_else(|| BrepError::Topology(format!("face {face_id:?} has no outer loop")))?;
            for loop_id in std::iter::once(outer).chain(face.inner_loops.iter().copied()) {
                let lp = self
                    .loops
                    .get(loop_id)
                    .ok_or_else(|| BrepError::NotFound(format!("loop {loop_id:?}")))?;
                if lp.face != face_id {
                    return Err(BrepError::Topology(format!(
                        "loop {loop_id:?} does not belong to face {face_id:?}"
                    )));
                }
                for &trim_id in &lp.trims {
                    let trim = self
                        .trims
                        .get(trim_id)
                        .ok_or_else(|| BrepError::NotFound(format!("trim {trim_id:?}")))?;
                    if trim.face != face_id {
                        return Err(BrepError::Topology(format!(
                            "trim {trim_id:?} does not belong to face {face_id:?}"
                        )));
                    }
                }
            }
        }

        for (edge_id, edge) in &self.edges {
            let (ta, tb) = edge.trims.ok_or_else(|| {
                BrepError::Topology(format!("edge {edge_id:?} has unresolved trims"))
            })?;
            for t in [ta, tb] {
                let trim = self
                    .trims
                    .get(t)
                    .ok_or_else(|| BrepError::NotFound(format!("trim {t:?}")))?;
                if trim.edge != Some(edge_id) {
                    return Err(BrepError::Topology(format!(
                        "trim {t:?} does not reference edge {edge_id:?}"
                    )));
                }
            }
            if !self.vertices.contains_key(edge.start) || !self.vertices.contains_key(edge.end) {
                return Err(BrepError::Topology(format!(
                    "edge {edge_id:?} references a missing vertex"
                )));
            }
        }

        for (trim_id, trim) in &self.trims {
            if trim.loop_id.is_none() {
                return Err(BrepError::Topology(format!(
                    "trim {trim_id:?} belongs to no loop"
                )));
            }
            if trim.is_singular() && trim.start != trim.end {
                return Err(BrepError::Topology(format!(
                    "singular trim {trim_id:?} must collapse to one vertex"
                )));
            }
        }

        Ok(())
    }
}
