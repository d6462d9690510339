use ndarray::{Array2, Array3, ArrayView3, Axis};
use rayon::prelude::*;

use crate::pansharpen::bands::{weighted_sum, BandStack, PanImage, WeightVector};
use crate::pansharpen::common::error::Result;
use crate::pansharpen::filters::{gaussian_blur, laplacian};

/// Energy split into its three weighted contributions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyTerms {
    /// `beta * Σ_b ||blur(Z_b) - Y_b||²`
    pub fidelity: f64,
    /// `alpha * Σ_b ||Laplacian(Z_b)||²`
    pub prior: f64,
    /// `beta * ||synth_pan(Z) - x||²`
    pub pan_consistency: f64,
}

impl EnergyTerms {
    pub fn total(&self) -> f64 {
        self.fidelity + self.prior + self.pan_consistency
    }
}

/// MAP energy over candidate stacks `Z` for fixed observations.
///
/// The gradient re-applies the blur and the Laplacian in place of their
/// adjoints and omits the factor 2 of the squared norms, so it is half the
/// analytic gradient when both operators are symmetric.
pub struct MapEnergyModel<'a> {
    observed: &'a BandStack,
    pan: &'a PanImage,
    weights: &'a WeightVector,
    alpha: f64,
    beta: f64,
    blur_sigma: f64,
}

impl<'a> MapEnergyModel<'a> {
    pub fn new(
        observed: &'a BandStack,
        pan: &'a PanImage,
        weights: &'a WeightVector,
        alpha: f64,
        beta: f64,
        blur_sigma: f64,
    ) -> Result<Self> {
        observed.ensure_matches_pan(pan, "MAP energy")?;
        weights.ensure_matches(observed.band_count())?;
        Ok(Self {
            observed,
            pan,
            weights,
            alpha,
            beta,
            blur_sigma,
        })
    }

    pub fn energy(&self, candidate: &BandStack) -> Result<f64> {
        Ok(self.energy_terms(candidate)?.total())
    }

    pub fn energy_terms(&self, candidate: &BandStack) -> Result<EnergyTerms> {
        self.observed.ensure_same_shape(candidate, "MAP energy")?;
        Ok(self.terms_of(candidate.view()))
    }

    pub fn gradient(&self, candidate: &BandStack) -> Result<BandStack> {
        self.observed.ensure_same_shape(candidate, "MAP gradient")?;
        Ok(BandStack::from_array_unchecked(self.gradient_of(candidate.view())))
    }

    fn pan_residual(&self, z: ArrayView3<'_, f64>) -> Array2<f64> {
        weighted_sum(z, self.weights.as_slice()) - self.pan.as_array()
    }

    pub(crate) fn terms_of(&self, z: ArrayView3<'_, f64>) -> EnergyTerms {
        let per_band: Vec<(f64, f64)> = (0..z.len_of(Axis(0)))
            .into_par_iter()
            .map(|b| {
                let zb = z.index_axis(Axis(0), b);
                let diff = gaussian_blur(zb, self.blur_sigma) - &self.observed.band(b);
                let smooth = laplacian(zb);
                (diff.mapv(|v| v * v).sum(), smooth.mapv(|v| v * v).sum())
            })
            .collect();

        let (fidelity, prior) = per_band
            .iter()
            .fold((0.0, 0.0), |(f, p), &(bf, bp)| (f + bf, p + bp));
        let pan_consistency = self.pan_residual(z).mapv(|v| v * v).sum();

        EnergyTerms {
            fidelity: self.beta * fidelity,
            prior: self.alpha * prior,
            pan_consistency: self.beta * pan_consistency,
        }
    }

    /// Caller guarantees `z` has the observed stack's shape.
    pub(crate) fn gradient_of(&self, z: ArrayView3<'_, f64>) -> Array3<f64> {
        let pan_residual = self.pan_residual(z);
        let weights = self.weights.as_slice();

        let per_band: Vec<Array2<f64>> = (0..z.len_of(Axis(0)))
            .into_par_iter()
            .map(|b| {
                let zb = z.index_axis(Axis(0), b);
                let diff = gaussian_blur(zb, self.blur_sigma) - &self.observed.band(b);
                let mut grad = gaussian_blur(diff.view(), self.blur_sigma) * self.beta;
                if self.alpha != 0.0 {
                    grad.scaled_add(self.alpha, &laplacian(laplacian(zb).view()));
                }
                grad.scaled_add(self.beta * weights[b], &pan_residual);
                grad
            })
            .collect();

        let mut gradient = Array3::zeros(z.raw_dim());
        for (mut slot, band) in gradient.axis_iter_mut(Axis(0)).zip(per_band) {
            slot.assign(&band);
        }
        gradient
    }
}

impl std::fmt::Debug for MapEnergyModel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapEnergyModel")
            .field("bands", &self.observed.band_count())
            .field("alpha", &self.alpha)
            .field("beta", &self.beta)
            .field("blur_sigma", &self.blur_sigma)
            .finish()
    }
}
