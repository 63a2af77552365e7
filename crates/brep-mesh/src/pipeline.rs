//! The end-to-end tessellation pipeline.
//!
//! Boundary work (edge splitting, seam normalization, proximity refinement)
//! runs sequentially because it mutates state shared between faces; once the
//! boundaries are frozen, faces are sampled, triangulated, and pole-corrected
//! in parallel, each face touching only its own data.

use brep_core::error::{BrepError, Result};
use brep_core::traits::Validate;
use brep_core::{Diagnostics, MeshTolerance};
use brep_topology::{FaceId, Solid};
use rayon::prelude::*;

use crate::mesh::TriangleMesh;
use crate::proximity::{self, EdgeSegIndex};
use crate::work::{FaceWork, MeshWorkspace};
use crate::{refine, sampler, seam, singularity, triangulate};

/// Outcome classification of a tessellation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TessellationStatus {
    /// No run has happened yet
    #[default]
    Untessellated,
    /// Every face produced triangles
    Success,
    /// The input failed structural validation; nothing was meshed
    NonSolid,
    /// A fatal error aborted the run
    Failed,
}

/// Triangles of one face, in that face's own vertex numbering.
#[derive(Debug, Clone)]
pub struct FaceMesh {
    pub face: FaceId,
    pub mesh: TriangleMesh,
}

/// The result of one tessellation run.
#[derive(Debug, Default)]
pub struct Tessellated {
    pub status: TessellationStatus,
    pub faces: Vec<FaceMesh>,
    /// All face meshes merged; shared boundary points appear once per face but
    /// with bit-identical positions, so the merged mesh closes watertight.
    pub mesh: TriangleMesh,
    pub diagnostics: Diagnostics,
    pub error: Option<BrepError>,
}

/// Tessellate a solid into triangle meshes, one per face plus a merged whole.
///
/// Fatal conditions surface as [`TessellationStatus::Failed`] with the error
/// attached; recoverable conditions are accumulated in the diagnostics while
/// the remaining faces complete normally.
pub fn tessellate_solid(solid: &Solid, tol: MeshTolerance) -> Tessellated {
    if let Err(err) = solid.validate() {
        return Tessellated {
            status: TessellationStatus::NonSolid,
            error: Some(err),
            ..Tessellated::default()
        };
    }
    match run(solid, tol) {
        Ok(result) => result,
        Err(err) => Tessellated {
            status: TessellationStatus::Failed,
            error: Some(err),
            ..Tessellated::default()
        },
    }
}

fn run(solid: &Solid, tol: MeshTolerance) -> Result<Tessellated> {
    let mut ws = MeshWorkspace::build(solid, tol)?;
    refine::mandatory_presplits(&mut ws)?;
    seam::normalize_seams(&mut ws);
    refine::refine(&mut ws)?;
    proximity::refine_proximity(&mut ws)?;

    let index = EdgeSegIndex::build(&ws);
    let trim_segs = &ws.trim_segs;
    let faces = std::mem::take(&mut ws.faces);

    let per_face: Vec<Result<(FaceWork, Diagnostics)>> = faces
        .into_par_iter()
        .map(|mut fw| {
            let surface = &solid.faces[fw.face].surface;
            let mut diagnostics = Diagnostics::new();

            sampler::sample_interior(&mut fw, trim_segs, surface, tol, &index);
            diagnostics.degenerate_triangles +=
                triangulate::triangulate_face(&mut fw, trim_segs, surface)?;
            singularity::correct_singularities(&mut fw, surface, &mut diagnostics);

            Ok((fw, diagnostics))
        })
        .collect();

    let mut diagnostics = ws.diagnostics;
    let mut face_meshes = Vec::new();
    let mut whole = TriangleMesh::default();
    for item in per_face {
        let (fw, face_diags) = item?;
        diagnostics.merge(face_diags);

        let mesh = face_mesh(&fw);
        whole.merge(&mesh);
        face_meshes.push(FaceMesh {
            face: fw.face,
            mesh,
        });
    }

    Ok(Tessellated {
        status: TessellationStatus::Success,
        faces: face_meshes,
        mesh: whole,
        diagnostics,
        error: None,
    })
}

fn face_mesh(fw: &FaceWork) -> TriangleMesh {
    let flip = if fw.reversed { -1.0 } else { 1.0 };
    let mut indices = Vec::with_capacity(fw.triangles.len() * 3);
    for tri in &fw.triangles {
        indices.push(tri.a as u32);
        indices.push(tri.b as u32);
        indices.push(tri.c as u32);
    }
    TriangleMesh {
        positions: fw.space.clone(),
        normals: fw.normals.iter().map(|&n| flip * n).collect(),
        indices,
        uvs: fw.points.clone(),
    }
}
