use std::f64::consts::PI;

use ndarray::{Array2, ArrayView1, ArrayView2};
use tandem_core::{SpectralConfig, SpectralMethod};

use super::{Error, linalg};

/// A discrete periodic time-derivative operator over `n` time instances.
///
/// Row `i` gives the weights that combine the instance signals into the time
/// derivative at instance `i`. The operator is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralOperator {
    method: SpectralMethod,
    period: f64,
    matrix: Array2<f64>,
}

impl SpectralOperator {
    /// Builds the operator described by `config` for `n_instances` instances.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid for `n_instances`, or
    /// if a harmonic-balance basis is singular.
    pub fn from_config(config: &SpectralConfig, n_instances: usize) -> Result<Self, Error> {
        match config.method {
            SpectralMethod::TimeSpectral => Self::time_spectral(config.period, n_instances),
            SpectralMethod::HarmonicBalance => Self::harmonic_balance(
                &config.omega,
                config.n_harmonics,
                config.period,
                n_instances,
                config.pivot_tolerance,
            ),
        }
    }

    /// Builds the uniform time-spectral operator.
    ///
    /// For `k ≠ j` the entries are `(π/T)(-1)^(k-j) cot(π(k-j)/n)` when `n` is
    /// even and `(π/T)(-1)^(k-j) csc(π(k-j)/n)` when `n` is odd. The diagonal
    /// is exactly zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the period is not finite and positive or
    /// if `n_instances` is zero.
    pub fn time_spectral(period: f64, n_instances: usize) -> Result<Self, Error> {
        SpectralConfig::time_spectral(period).validate(n_instances)?;

        let n = n_instances;
        let even = n % 2 == 0;
        let scale = PI / period;

        let matrix = Array2::from_shape_fn((n, n), |(k, j)| {
            if k == j {
                return 0.0;
            }
            let diff = k as f64 - j as f64;
            let sign = if (k + j) % 2 == 0 { 1.0 } else { -1.0 };
            let angle = PI * diff / n as f64;
            let weight = if even {
                1.0 / angle.tan()
            } else {
                1.0 / angle.sin()
            };
            scale * sign * weight
        });

        tracing::info!(n_instances = n, period, "built time-spectral operator");

        Ok(Self {
            method: SpectralMethod::TimeSpectral,
            period,
            matrix,
        })
    }

    /// Builds a harmonic-balance operator for an arbitrary set of frequencies.
    ///
    /// The instances sit at `t_i = i·T/n`. The basis `(1, cos ω_k t, sin ω_k t)`
    /// evaluated there is inverted to move from instance values to Fourier
    /// coefficients, differentiated in coefficient space, and mapped back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the frequency count does not match
    /// `n_harmonics`, if `n_instances ≠ 2·n_harmonics + 1`, or if a frequency
    /// or the period is not finite and positive. Returns
    /// [`Error::SingularOperator`] if the frequencies alias each other at
    /// the chosen instances.
    pub fn harmonic_balance(
        omega: &[f64],
        n_harmonics: usize,
        period: f64,
        n_instances: usize,
        pivot_tolerance: f64,
    ) -> Result<Self, Error> {
        let config = SpectralConfig {
            n_harmonics,
            pivot_tolerance,
            ..SpectralConfig::harmonic_balance(period, omega.to_vec())
        };
        config.validate(n_instances)?;

        let n = n_instances;
        let h = n_harmonics;
        let dt = period / n as f64;

        let synthesis = Array2::from_shape_fn((n, n), |(i, col)| {
            let t = i as f64 * dt;
            match col {
                0 => 1.0,
                c if c <= h => (omega[c - 1] * t).cos(),
                c => (omega[c - h - 1] * t).sin(),
            }
        });

        let analysis = linalg::inverse_block(synthesis.view(), pivot_tolerance)?;

        let mut derivative = Array2::<f64>::zeros((n, n));
        for (k, &w) in omega.iter().enumerate() {
            derivative[[k + 1, h + k + 1]] = w;
            derivative[[h + k + 1, k + 1]] = -w;
        }

        let coefficients = linalg::matrix_product(derivative.view(), analysis.view())?;
        let matrix = linalg::matrix_product(synthesis.view(), coefficients.view())?;

        tracing::info!(
            n_instances = n,
            n_harmonics = h,
            period,
            "built harmonic-balance operator"
        );

        Ok(Self {
            method: SpectralMethod::HarmonicBalance,
            period,
            matrix,
        })
    }

    #[must_use]
    pub fn method(&self) -> SpectralMethod {
        self.method
    }

    #[must_use]
    pub fn period(&self) -> f64 {
        self.period
    }

    #[must_use]
    pub fn n_instances(&self) -> usize {
        self.matrix.nrows()
    }

    /// Returns the full `n × n` matrix.
    #[must_use]
    pub fn matrix(&self) -> ArrayView2<'_, f64> {
        self.matrix.view()
    }

    /// Returns the weights for instance `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is not below [`n_instances`](Self::n_instances).
    #[must_use]
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.matrix.row(i)
    }

    /// Computes `Σ_j D[row][j] · signals[j]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `row` is out of range, if there is not one signal
    /// per instance, or if the signals differ in shape.
    pub fn apply(&self, row: usize, signals: &[Array2<f64>]) -> Result<Array2<f64>, Error> {
        self.combine(row, signals, |j| self.matrix[[row, j]])
    }

    /// Computes `Σ_j -D[j][row] · signals[j]`, the transposed operator used by
    /// adjoint problems.
    ///
    /// # Errors
    ///
    /// Same as [`apply`](Self::apply).
    pub fn apply_adjoint(&self, row: usize, signals: &[Array2<f64>]) -> Result<Array2<f64>, Error> {
        self.combine(row, signals, |j| -self.matrix[[j, row]])
    }

    fn combine(
        &self,
        row: usize,
        signals: &[Array2<f64>],
        weight: impl Fn(usize) -> f64,
    ) -> Result<Array2<f64>, Error> {
        let n = self.n_instances();
        if row >= n {
            return Err(Error::Row {
                row,
                n_instances: n,
            });
        }
        if signals.len() != n {
            return Err(Error::InstanceCount {
                expected: n,
                found: signals.len(),
            });
        }

        let expected = signals[0].dim();
        let mut out = Array2::<f64>::zeros(expected);
        for (j, signal) in signals.iter().enumerate() {
            if signal.dim() != expected {
                return Err(Error::ShapeMismatch {
                    instance: j,
                    expected,
                    found: signal.dim(),
                });
            }
            let w = weight(j);
            if w != 0.0 {
                out.scaled_add(w, signal);
            }
        }
        Ok(out)
    }
}
