//! Dense linear algebra kernels shared by the model families.
//!
//! Matrices are flat row-major slices: a `rows × cols` matrix stores row `r`
//! at `m[r * cols..(r + 1) * cols]`.

const BCE_EPSILON: f32 = 1e-7;

pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Returns `bias + m · x`, where `m` has `bias.len()` rows.
pub(crate) fn affine(m: &[f32], bias: &[f32], x: &[f32]) -> Vec<f32> {
    let mut out = bias.to_vec();
    accumulate_mul(m, x, &mut out);
    out
}

/// Adds `m · x` to `out`, where `m` has `out.len()` rows.
pub(crate) fn accumulate_mul(m: &[f32], x: &[f32], out: &mut [f32]) {
    let cols = x.len();
    for (r, o) in out.iter_mut().enumerate() {
        *o += dot(&m[r * cols..(r + 1) * cols], x);
    }
}

/// Returns `mᵀ · delta`, where `m` has `delta.len()` rows.
pub(crate) fn transpose_mul(m: &[f32], delta: &[f32]) -> Vec<f32> {
    let cols = m.len() / delta.len().max(1);
    let mut out = vec![0.0; cols];
    for (r, &d) in delta.iter().enumerate() {
        for (o, &w) in out.iter_mut().zip(&m[r * cols..(r + 1) * cols]) {
            *o += w * d;
        }
    }
    out
}

/// Adds the outer product `delta ⊗ x` to the gradient matrix `grad`.
pub(crate) fn add_outer(grad: &mut [f32], delta: &[f32], x: &[f32]) {
    let cols = x.len();
    for (r, &d) in delta.iter().enumerate() {
        for (g, &v) in grad[r * cols..(r + 1) * cols].iter_mut().zip(x) {
            *g += d * v;
        }
    }
}

/// Mean binary cross-entropy between predictions `p` and targets `y`.
pub(crate) fn binary_cross_entropy(p: &[f32], y: &[f32]) -> f32 {
    #[expect(clippy::cast_precision_loss)]
    let n = p.len().max(1) as f32;
    let sum = p
        .iter()
        .zip(y)
        .map(|(&p, &y)| {
            let p = p.clamp(BCE_EPSILON, 1.0 - BCE_EPSILON);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum::<f32>();
    sum / n
}

/// Gradient of the mean binary cross-entropy w.r.t. the sigmoid pre-activation.
pub(crate) fn bce_sigmoid_delta(p: &[f32], y: &[f32]) -> Vec<f32> {
    #[expect(clippy::cast_precision_loss)]
    let n = p.len().max(1) as f32;
    p.iter().zip(y).map(|(p, y)| (p - y) / n).collect()
}
