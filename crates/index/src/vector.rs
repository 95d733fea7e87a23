//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity and a stable top-k ranking shared by the
//! chunk index and the zone tool index.

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length, empty, or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank `candidates` against `query` and keep the best `limit`.
///
/// Returns `(position, score)` pairs, highest score first. The sort is stable,
/// so equal scores keep their original order. Non-finite scores (from NaN or
/// overflowing embeddings) rank last as `f32::NEG_INFINITY`.
pub fn top_k<'a, I>(candidates: I, query: &[f32], limit: usize) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scored: Vec<(usize, f32)> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, emb)| {
            let score = cosine_similarity(emb, query);
            (i, if score.is_finite() { score } else { f32::NEG_INFINITY })
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}
