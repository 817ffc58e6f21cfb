//! Classical Gram-Schmidt orthogonalization of an ordered set of vectors.

use crate::error::OrthogonalizationError;
use crate::vector::Vector3;

/// Orthogonalizes `vectors` in order, optionally normalising the result.
///
/// Output `i` is input `i` minus its projections onto outputs `0..i`, so the
/// span of every prefix is preserved. Projections are taken onto the
/// un-normalised outputs and normalisation happens once the orthogonal set is
/// complete; `gram_schmidt(v, true)[i]` is therefore exactly
/// `gram_schmidt(v, false)[i].normalise()`.
///
/// A linearly dependent input produces a zero output, which fails with
/// [`OrthogonalizationError::DivideByZero`] as soon as anything is projected
/// onto it or it is normalised.
pub fn gram_schmidt(
    vectors: &[Vector3],
    normalise: bool,
) -> Result<Vec<Vector3>, OrthogonalizationError> {
    let mut orthogonal: Vec<Vector3> = Vec::with_capacity(vectors.len());
    for &v in vectors {
        let mut proj_sum = Vector3::ZERO;
        for (j, &u) in orthogonal.iter().enumerate() {
            let p = v
                .project(u)
                .map_err(|_| OrthogonalizationError::DivideByZero { index: j })?;
            proj_sum = proj_sum + p;
        }
        orthogonal.push(v - proj_sum);
    }

    if !normalise {
        return Ok(orthogonal);
    }
    orthogonal
        .iter()
        .enumerate()
        .map(|(i, u)| {
            u.normalise()
                .map_err(|_| OrthogonalizationError::DivideByZero { index: i })
        })
        .collect()
}

/// The orthogonal and orthonormal bases derived from one set of tangent vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthogonalPair {
    pub orthogonal: [Vector3; 3],
    pub orthonormal: [Vector3; 3],
}

/// Runs Gram-Schmidt once on a three vector basis and returns both the raw
/// orthogonal vectors (whose lengths feed the exponent sums) and their
/// normalised counterparts.
pub fn orthogonalize3(basis: &[Vector3; 3]) -> Result<OrthogonalPair, OrthogonalizationError> {
    let orthogonal = gram_schmidt(basis, false)?;
    let orthogonal = [orthogonal[0], orthogonal[1], orthogonal[2]];
    let mut orthonormal = [Vector3::ZERO; 3];
    for (i, u) in orthogonal.iter().enumerate() {
        orthonormal[i] = u
            .normalise()
            .map_err(|_| OrthogonalizationError::DivideByZero { index: i })?;
    }
    Ok(OrthogonalPair {
        orthogonal,
        orthonormal,
    })
}
