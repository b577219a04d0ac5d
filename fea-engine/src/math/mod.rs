//! Mathematical utilities for frame analysis

use std::ops::{Add, Mul};

use nalgebra::{DMatrix, DVector, Dyn, Matrix3, SMatrix, SVector, Vector3, LU};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Vec3 = Vector3<f64>;

/// 12x12 matrix for member stiffness
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for member forces/displacements
pub type Vec12 = SVector<f64, 12>;

/// Compute the transformation matrix for a 3D frame element
///
/// Local 1 runs from the i-node to the j-node. Local 2 lies in the vertical
/// plane containing local 1 and points up; for vertical members it is global
/// +X. Local 3 completes the right-handed system. `rotation` turns the 2-3
/// axes about local 1.
///
/// Returns `None` for a zero-length member.
pub fn member_transformation_matrix(
    i_node: &[f64; 3],
    j_node: &[f64; 3],
    rotation: f64,
) -> Option<Mat12> {
    let d = Vec3::new(j_node[0] - i_node[0], j_node[1] - i_node[1], j_node[2] - i_node[2]);
    let length = d.norm();
    if length < 1e-10 {
        return None;
    }

    let x = d / length;
    let y = if x.x.hypot(x.y) < 1e-10 {
        Vec3::x()
    } else {
        // Global Z with its component along the member removed
        (Vec3::z() - x * x.z).normalize()
    };
    let z = x.cross(&y);

    let (y, z) = if rotation.abs() > 1e-10 {
        let (sin_r, cos_r) = rotation.sin_cos();
        (y * cos_r + z * sin_r, z * cos_r - y * sin_r)
    } else {
        (y, z)
    };

    let r = Mat3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]);

    let mut t = Mat12::zeros();
    for block in 0..4 {
        t.fixed_view_mut::<3, 3>(block * 3, block * 3).copy_from(&r);
    }
    Some(t)
}

/// Extract the 3x3 rotation matrix from a 12x12 transformation matrix
///
/// The transformation matrix has 4 identical 3x3 rotation blocks on the diagonal.
/// This extracts the first one.
pub fn extract_rotation_matrix(t: &Mat12) -> Mat3 {
    t.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Compute the local stiffness matrix for a 3D frame element
///
/// # Arguments
/// * `e` - Modulus of elasticity
/// * `g` - Shear modulus
/// * `a` - Cross-sectional area
/// * `i22` - Moment of inertia about local 2
/// * `i33` - Moment of inertia about local 3
/// * `j` - Torsional constant
/// * `length` - Element length
pub fn member_local_stiffness(
    e: f64,
    g: f64,
    a: f64,
    i22: f64,
    i33: f64,
    j: f64,
    length: f64,
) -> Mat12 {
    let l = length;
    let l2 = l * l;
    let l3 = l2 * l;

    let ea_l = e * a / l;
    let gj_l = g * j / l;

    // 1-3 plane bending
    let b2_l3 = e * i22 / l3;
    let b2_l2 = e * i22 / l2;
    let b2_l = e * i22 / l;

    // 1-2 plane bending
    let b3_l3 = e * i33 / l3;
    let b3_l2 = e * i33 / l2;
    let b3_l = e * i33 / l;

    #[rustfmt::skip]
    let data = [
        ea_l,  0.0,          0.0,          0.0,   0.0,         0.0,         -ea_l, 0.0,          0.0,          0.0,   0.0,         0.0,
        0.0,   12.0*b3_l3,   0.0,          0.0,   0.0,         6.0*b3_l2,   0.0,   -12.0*b3_l3,  0.0,          0.0,   0.0,         6.0*b3_l2,
        0.0,   0.0,          12.0*b2_l3,   0.0,   -6.0*b2_l2,  0.0,         0.0,   0.0,          -12.0*b2_l3,  0.0,   -6.0*b2_l2,  0.0,
        0.0,   0.0,          0.0,          gj_l,  0.0,         0.0,         0.0,   0.0,          0.0,          -gj_l, 0.0,         0.0,
        0.0,   0.0,          -6.0*b2_l2,   0.0,   4.0*b2_l,    0.0,         0.0,   0.0,          6.0*b2_l2,    0.0,   2.0*b2_l,    0.0,
        0.0,   6.0*b3_l2,    0.0,          0.0,   0.0,         4.0*b3_l,    0.0,   -6.0*b3_l2,   0.0,          0.0,   0.0,         2.0*b3_l,
        -ea_l, 0.0,          0.0,          0.0,   0.0,         0.0,         ea_l,  0.0,          0.0,          0.0,   0.0,         0.0,
        0.0,   -12.0*b3_l3,  0.0,          0.0,   0.0,         -6.0*b3_l2,  0.0,   12.0*b3_l3,   0.0,          0.0,   0.0,         -6.0*b3_l2,
        0.0,   0.0,          -12.0*b2_l3,  0.0,   6.0*b2_l2,   0.0,         0.0,   0.0,          12.0*b2_l3,   0.0,   6.0*b2_l2,   0.0,
        0.0,   0.0,          0.0,          -gj_l, 0.0,         0.0,         0.0,   0.0,          0.0,          gj_l,  0.0,         0.0,
        0.0,   0.0,          -6.0*b2_l2,   0.0,   2.0*b2_l,    0.0,         0.0,   0.0,          6.0*b2_l2,    0.0,   4.0*b2_l,    0.0,
        0.0,   6.0*b3_l2,    0.0,          0.0,   0.0,         2.0*b3_l,    0.0,   -6.0*b3_l2,   0.0,          0.0,   0.0,         4.0*b3_l,
    ];

    Mat12::from_row_slice(&data)
}

/// Compute fixed end reactions for a point load
///
/// # Arguments
/// * `p` - Load magnitude
/// * `a` - Distance from i-node to load
/// * `length` - Element length
/// * `direction` - Local axis index (0, 1, 2)
pub fn fer_point_load(p: f64, a: f64, length: f64, direction: usize) -> Vec12 {
    let l = length;
    let b = l - a;
    let l2 = l * l;
    let l3 = l2 * l;

    let mut fer = Vec12::zeros();

    match direction {
        0 => {
            fer[0] = -p * b / l;
            fer[6] = -p * a / l;
        }
        1 => {
            fer[1] = -p * b * b * (3.0 * a + b) / l3;
            fer[5] = -p * a * b * b / l2;
            fer[7] = -p * a * a * (a + 3.0 * b) / l3;
            fer[11] = p * a * a * b / l2;
        }
        2 => {
            fer[2] = -p * b * b * (3.0 * a + b) / l3;
            fer[4] = p * a * b * b / l2;
            fer[8] = -p * a * a * (a + 3.0 * b) / l3;
            fer[10] = -p * a * a * b / l2;
        }
        _ => {}
    }

    fer
}

/// Compute fixed end reactions for a linearly varying line load from
/// `w1` at `x1` to `w2` at `x2`
///
/// The point-load reactions are cubic in the load position, so three-point
/// Gauss integration of them against a linear intensity is exact.
pub fn fer_linear_load(w1: f64, w2: f64, x1: f64, x2: f64, length: f64, direction: usize) -> Vec12 {
    let span = x2 - x1;
    if span <= 1e-12 {
        return Vec12::zeros();
    }
    gauss_legendre_3(x1, x2, |x| {
        let w = w1 + (w2 - w1) * (x - x1) / span;
        fer_point_load(w, x, length, direction)
    })
}

/// Three-point Gauss-Legendre quadrature of `f` over `[a, b]`,
/// exact for polynomials up to degree five
pub fn gauss_legendre_3<T, F>(a: f64, b: f64, f: F) -> T
where
    F: Fn(f64) -> T,
    T: Mul<f64, Output = T> + Add<Output = T>,
{
    let half = 0.5 * (b - a);
    let mid = 0.5 * (a + b);
    let offset = half * 0.6_f64.sqrt();
    f(mid - offset) * (5.0 / 9.0 * half) + f(mid) * (8.0 / 9.0 * half) + f(mid + offset) * (5.0 / 9.0 * half)
}

/// LU factorization of a dense matrix
pub type Factorization = LU<f64, Dyn, Dyn>;

/// Factorize a stiffness matrix using LU decomposition
///
/// Fails with the column of the first pivot smaller than `tolerance` times
/// the largest pivot, i.e. an equation with no independent stiffness.
pub fn factorize(a: &Mat, tolerance: f64) -> Result<Factorization, usize> {
    let lu = a.clone().lu();
    let pivots = lu.u().diagonal();
    let largest = pivots.iter().fold(0.0_f64, |m, p| m.max(p.abs()));
    match pivots.iter().position(|p| p.abs() <= tolerance * largest) {
        Some(column) => Err(column),
        None if largest > 0.0 => Ok(lu),
        None => Err(0),
    }
}
