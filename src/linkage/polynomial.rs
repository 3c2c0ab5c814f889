/// Least-squares polynomial fit of `y` against `x`.
///
/// Returns the coefficients lowest order first, or `None` when the normal
/// equations are singular (for example when there are fewer distinct `x`
/// values than coefficients).
pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = degree + 1;
    let points = x.len().min(y.len());
    if points == 0 {
        return None;
    }

    // Fitting against x / span keeps the normal equations well conditioned.
    let span = x[..points].iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let span = if span > 0.0 { span } else { 1.0 };

    // Augmented normal equations [AᵀA | Aᵀy].
    let mut m = vec![vec![0.0; n + 1]; n];
    for k in 0..points {
        let t = x[k] / span;
        let mut powers = vec![1.0; 2 * n - 1];
        for p in 1..powers.len() {
            powers[p] = powers[p - 1] * t;
        }
        for row in 0..n {
            for col in 0..n {
                m[row][col] += powers[row + col];
            }
            m[row][n] += powers[row] * y[k];
        }
    }

    let scale = m
        .iter()
        .flat_map(|row| row[..n].iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = scale * 1e-12;

    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot][col].abs() <= tolerance {
            return None;
        }
        m.swap(col, pivot);
        let pivot_row = m[col].clone();
        for (row, values) in m.iter_mut().enumerate() {
            if row != col {
                let factor = values[col] / pivot_row[col];
                for c in col..=n {
                    values[c] -= factor * pivot_row[c];
                }
            }
        }
    }

    Some(
        (0..n)
            .map(|i| m[i][n] / m[i][i] / span.powi(i as i32))
            .collect(),
    )
}

/// Evaluates a polynomial given lowest-order-first coefficients.
pub fn evaluate(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}
