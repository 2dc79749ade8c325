use crate::KernelError;

// Sums are carried in f64 and narrowed once at the end so long vectors do not
// drift; scores are reported as f32 to match stored embeddings.

fn check_shape(a: &[f32], b: &[f32]) -> Result<(), KernelError> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(KernelError::ShapeMismatch {
            left: a.len(),
            right: b.len(),
        })
    }
}

fn pairs<'a>(a: &'a [f32], b: &'a [f32]) -> impl Iterator<Item = (f64, f64)> + 'a {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (f64::from(x), f64::from(y)))
}

#[allow(clippy::cast_possible_truncation)]
fn narrow(v: f64) -> f32 {
    v as f32
}

/// `dot(a, b) / (|a| * |b|)`.
///
/// A zero-norm input has no direction, so the kernel returns the sentinel
/// `0.0` ("unrelated") instead of NaN. The result is clamped to `[-1, 1]` to
/// absorb rounding on parallel vectors.
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f32, KernelError> {
    check_shape(a, b)?;
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in pairs(a, b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    Ok(narrow(sim.clamp(-1.0, 1.0)))
}

/// `1 / (1 + |a - b|_2)`, in `(0, 1]`.
pub fn euclidean(a: &[f32], b: &[f32]) -> Result<f32, KernelError> {
    check_shape(a, b)?;
    let dist = pairs(a, b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt();
    Ok(narrow(1.0 / (1.0 + dist)))
}

/// `1 / (1 + sum |a_i - b_i|)`, in `(0, 1]`.
pub fn manhattan(a: &[f32], b: &[f32]) -> Result<f32, KernelError> {
    check_shape(a, b)?;
    let dist = pairs(a, b).map(|(x, y)| (x - y).abs()).sum::<f64>();
    Ok(narrow(1.0 / (1.0 + dist)))
}

/// Raw inner product. Unbounded: larger vectors score higher.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32, KernelError> {
    check_shape(a, b)?;
    Ok(narrow(pairs(a, b).map(|(x, y)| x * y).sum::<f64>()))
}

/// Jaccard overlap of the index sets where each vector is strictly positive.
///
/// Both sets empty means an empty union, which scores `0.0`.
pub fn jaccard(a: &[f32], b: &[f32]) -> Result<f32, KernelError> {
    check_shape(a, b)?;
    let (mut intersection, mut union) = (0_u32, 0_u32);
    for (&x, &y) in a.iter().zip(b) {
        let (in_a, in_b) = (x > 0.0, y > 0.0);
        intersection += u32::from(in_a && in_b);
        union += u32::from(in_a || in_b);
    }
    if union == 0 {
        return Ok(0.0);
    }
    Ok(narrow(f64::from(intersection) / f64::from(union)))
}
