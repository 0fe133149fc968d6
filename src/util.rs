use crate::Vec3;
#[cfg(test)]
use crate::Scalar;

pub trait VecExt {
    fn is_finite(&self) -> bool;
}

impl VecExt for Vec3 {
    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Returns the index of the first vector with a non-finite component.
pub fn first_non_finite(values: &[Vec3]) -> Option<usize> {
    values.iter().position(|v| !v.is_finite())
}

/// Checks that `a` and `b` agree to within `rel_tol`, measured against `scale`. `scale` should be
/// a magnitude representative of the terms that were summed to produce `a` and `b`, so that
/// cancellation in a near-zero sum doesn't blow up the relative error.
#[cfg(test)]
pub fn assert_vec_close(a: Vec3, b: Vec3, scale: Scalar, rel_tol: Scalar) {
    let err = (a - b).magnitude();
    let scale = Scalar::max(scale, Scalar::max(a.magnitude(), b.magnitude()));

    assert!(
        err <= rel_tol * scale || err == 0.,
        "Vectors differ: {:?} vs {:?} (err = {:?}, scale = {:?})",
        a,
        b,
        err,
        scale
    );
}
