//! Fixtures and an ndarray reference shared by the unit tests.

use candle_core::{Device, Tensor};
use ndarray::Array2;

use crate::incidence::Incidence;

/// Two triangles sharing edge 2: faces {0,1,2} and {2,3,4} over 5 edges.
pub(crate) fn bowtie() -> Incidence {
    Incidence::from_pairs(5, 2, [(0, 0), (1, 0), (2, 0), (2, 1), (3, 1), (4, 1)]).unwrap()
}

/// Boundary of a tetrahedron: 6 edges, 4 triangular faces.
pub(crate) fn tetrahedron_b2() -> Incidence {
    // edges: 01 02 03 12 13 23; faces: 012 013 023 123
    #[rustfmt::skip]
    let pairs = [
        (0, 0), (3, 0), (1, 0),
        (0, 1), (4, 1), (2, 1),
        (1, 2), (5, 2), (2, 2),
        (3, 3), (5, 3), (4, 3),
    ];
    Incidence::from_pairs(6, 4, pairs).unwrap()
}

pub(crate) fn to_array(t: &Tensor) -> Array2<f32> {
    let (r, c) = t.dims2().unwrap();
    Array2::from_shape_vec((r, c), t.to_vec2::<f32>().unwrap().concat()).unwrap()
}

pub(crate) fn from_array(a: &Array2<f32>, device: &Device) -> Tensor {
    Tensor::from_vec(a.iter().copied().collect::<Vec<_>>(), a.dim(), device).unwrap()
}

/// Dense `N · (X · W)`, optionally divided by the row sums of `N`.
pub(crate) fn dense_reference(
    inc: &Incidence,
    x: &Array2<f32>,
    w: &Array2<f32>,
    aggr_norm: bool,
) -> Array2<f32> {
    let mut n = Array2::<f32>::zeros(inc.shape());
    for (r, c, v) in inc.iter() {
        n[[r, c]] = v;
    }
    let mut y = n.dot(&x.dot(w));
    if aggr_norm {
        for (mut row, deg) in y.rows_mut().into_iter().zip(n.sum_axis(ndarray::Axis(1))) {
            if deg != 0.0 {
                row.mapv_inplace(|v| v / deg);
            }
        }
    }
    y
}
