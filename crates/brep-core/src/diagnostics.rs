//! Accumulated diagnostics for recoverable (non-fatal) tessellation conditions.
//!
//! Fatal conditions abort the run through [`crate::BrepError`]; everything in the
//! recoverable tier is recorded here and surfaced once on the final result, so one
//! degraded face never interrupts its siblings.

use std::fmt;

/// One recoverable condition encountered during tessellation.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A loop straddling a periodic seam could not be closed by splicing or bridging.
    SeamBridgeUnresolved { face: u64 },
    /// The near-overlap refinement loop hit its round cap with segments still marked.
    ProximityRoundsExhausted { face: u64, remaining: usize },
    /// Re-projection around a surface pole would have inverted triangles; the
    /// neighborhood was left untouched.
    SingularProjectionUnsafe { face: u64 },
    /// The bisection search for a trim-curve point did not converge within its
    /// depth bound; the best candidate was used.
    BisectionNotConverged { face: u64, parameter: f64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SeamBridgeUnresolved { face } => {
                write!(f, "face {face}: seam-straddling loop left unclosed")
            }
            Diagnostic::ProximityRoundsExhausted { face, remaining } => {
                write!(
                    f,
                    "face {face}: proximity refinement round cap hit, {remaining} segments still marked"
                )
            }
            Diagnostic::SingularProjectionUnsafe { face } => {
                write!(f, "face {face}: pole re-projection skipped (would invert triangles)")
            }
            Diagnostic::BisectionNotConverged { face, parameter } => {
                write!(f, "face {face}: trim bisection not converged near t={parameter}")
            }
        }
    }
}

/// Per-run diagnostic accumulator.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    /// Degenerate or zero-area triangles dropped from the output (counted, not reported).
    pub degenerate_triangles: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
        self.degenerate_triangles += other.degenerate_triangles;
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }
}
