//! Spatial operators for the MAP model
//!
//! Both operators use half-sample symmetric boundaries (`d c b a | a b c d |
//! d c b a`), which keeps their matrices symmetric so re-applying an
//! operator stands in for its adjoint.

use ndarray::{Array2, ArrayView2};

/// Kernel support in standard deviations.
const TRUNCATE: f64 = 4.0;

/// Maps an out-of-range index back into `0..len` by mirroring.
fn reflect(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let folded = index.rem_euclid(period);
    if folded < len as isize {
        folded as usize
    } else {
        (period - 1 - folded) as usize
    }
}

/// Normalised 1-D Gaussian taps, radius `floor(4σ + 0.5)`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma.max(0.0) + 0.5) as usize;
    if radius == 0 {
        return vec![1.0];
    }
    let taps: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-0.5 * (x / sigma).powi(2)).exp()
        })
        .collect();
    let sum: f64 = taps.iter().sum();
    taps.into_iter().map(|t| t / sum).collect()
}

fn correlate_rows(input: ArrayView2<'_, f64>, kernel: &[f64]) -> Array2<f64> {
    let (rows, cols) = input.dim();
    let radius = (kernel.len() / 2) as isize;
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &tap)| tap * input[[r, reflect(c as isize + k as isize - radius, cols)]])
            .sum()
    })
}

fn correlate_cols(input: ArrayView2<'_, f64>, kernel: &[f64]) -> Array2<f64> {
    let (rows, cols) = input.dim();
    let radius = (kernel.len() / 2) as isize;
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &tap)| tap * input[[reflect(r as isize + k as isize - radius, rows), c]])
            .sum()
    })
}

/// Isotropic Gaussian smoothing, the stand-in for the sensor's spatial response.
///
/// A sigma small enough that the kernel collapses to one tap returns a copy.
pub fn gaussian_blur(input: ArrayView2<'_, f64>, sigma: f64) -> Array2<f64> {
    let kernel = gaussian_kernel(sigma);
    if kernel.len() == 1 {
        return input.to_owned();
    }
    let horizontal = correlate_rows(input, &kernel);
    correlate_cols(horizontal.view(), &kernel)
}

/// Mean over a `size x size` window (odd `size`), as used by SSIM.
pub(crate) fn box_filter(input: ArrayView2<'_, f64>, size: usize) -> Array2<f64> {
    let kernel = vec![1.0 / size as f64; size];
    let horizontal = correlate_rows(input, &kernel);
    correlate_cols(horizontal.view(), &kernel)
}

/// Discrete Laplacian: `[1, -2, 1]` along each axis, summed.
pub fn laplacian(input: ArrayView2<'_, f64>) -> Array2<f64> {
    const STENCIL: [f64; 3] = [1.0, -2.0, 1.0];
    let mut out = correlate_rows(input, &STENCIL);
    out += &correlate_cols(input, &STENCIL);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_reflect_indices() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(9, 4), 1);
        assert_eq!(reflect(-1, 1), 0);
    }

    #[test]
    fn test_kernel_is_normalised_and_symmetric() {
        let kernel = gaussian_kernel(1.2);
        // floor(4 * 1.2 + 0.5) = 5
        assert_eq!(kernel.len(), 11);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        for i in 0..kernel.len() / 2 {
            assert_eq!(kernel[i], kernel[kernel.len() - 1 - i]);
        }
        assert_eq!(gaussian_kernel(0.0), vec![1.0]);
        assert_eq!(gaussian_kernel(1e-9), vec![1.0]);
    }

    #[test]
    fn test_blur_preserves_constant_and_sum() {
        let flat = Array2::from_elem((5, 7), 3.5);
        let blurred = gaussian_blur(flat.view(), 1.2);
        assert!(blurred.iter().all(|&v| (v - 3.5).abs() < 1e-12));

        let mut impulse = Array2::zeros((9, 9));
        impulse[[4, 4]] = 1.0;
        let blurred = gaussian_blur(impulse.view(), 1.0);
        assert!((blurred.sum() - 1.0).abs() < 1e-12);
        assert!(blurred[[4, 4]] > blurred[[4, 5]]);
        assert_eq!(blurred[[3, 4]], blurred[[5, 4]]);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let img = array![[1.0, 2.0], [3.0, 4.0]];
        assert_eq!(gaussian_blur(img.view(), 0.0), img);
    }

    #[test]
    fn test_box_filter_mean() {
        let img = Array2::from_shape_fn((5, 5), |(r, c)| (r * 5 + c) as f64);
        let filtered = box_filter(img.view(), 3);
        // interior pixel: mean of its 3x3 neighbourhood equals the centre for a linear ramp
        assert!((filtered[[2, 2]] - 12.0).abs() < 1e-12);
        // corner reflects onto itself: rows {0,0,1}, cols {0,0,1}
        let expected = (0.0 * 4.0 + 1.0 * 2.0 + 5.0 * 2.0 + 6.0) / 9.0;
        assert!((filtered[[0, 0]] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_laplacian() {
        let flat = Array2::from_elem((4, 4), 2.0);
        assert!(laplacian(flat.view()).iter().all(|&v| v == 0.0));

        let img = array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let lap = laplacian(img.view());
        assert_eq!(lap[[1, 1]], -4.0);
        assert_eq!(lap[[0, 1]], 1.0);
        assert_eq!(lap[[0, 0]], 0.0);
    }

    #[test]
    fn test_blur_operator_is_symmetric() {
        // <B u, v> == <u, B v> under reflect boundaries
        let u = Array2::from_shape_fn((6, 5), |(r, c)| ((r * 7 + c * 3) % 11) as f64);
        let v = Array2::from_shape_fn((6, 5), |(r, c)| ((r * 2 + c * 5) % 13) as f64 - 4.0);
        let lhs = (&gaussian_blur(u.view(), 0.8) * &v).sum();
        let rhs = (&u * &gaussian_blur(v.view(), 0.8)).sum();
        assert!((lhs - rhs).abs() < 1e-9);
    }
}
