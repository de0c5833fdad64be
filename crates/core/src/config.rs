//! Simulation configuration and its validation.
//!
//! A [`SimulationConfig`] selects a driver, lists one [`ZoneConfig`] per zone,
//! and carries the optional spectral and FSI sections. With the `serde`
//! feature (on by default) it can be read from TOML:
//!
//! ```toml
//! driver = "fsi"
//!
//! [[zones]]
//! equations = ["flow"]
//!
//! [[zones]]
//! equations = ["structural"]
//!
//! [fsi]
//! tolerance = 1e-6
//! max-iters = 20
//! relaxation = { kind = "aitken", initial = 0.5 }
//! ```
//!
//! [`SimulationConfig::validate`] rejects unsupported combinations before any
//! zone is assembled.

use std::f64::consts::PI;
use std::path::PathBuf;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which driver advances the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DriverKind {
    /// One zone, no coupling.
    #[cfg_attr(feature = "serde", serde(rename = "single-zone", alias = "single"))]
    Single,
    /// Several independent zones.
    #[cfg_attr(feature = "serde", serde(rename = "multi-zone", alias = "multi"))]
    Multi,
    /// Periodic time instances coupled through a spectral operator.
    Spectral,
    /// A flow zone and a structural zone coupled by Block Gauss-Seidel.
    Fsi,
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Single => "single-zone",
            Self::Multi => "multi-zone",
            Self::Spectral => "spectral",
            Self::Fsi => "fsi",
        };
        f.write_str(name)
    }
}

/// A governing equation carried by a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Equation {
    Flow,
    Turbulence,
    Structural,
}

impl Equation {
    /// Returns `true` if spectral pseudo-source terms apply to this equation.
    #[must_use]
    pub fn is_spectral(self) -> bool {
        matches!(self, Self::Flow | Self::Turbulence)
    }
}

/// Per-zone configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct ZoneConfig {
    /// Optional label used in logs.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,

    /// Active governing equations.
    pub equations: Vec<Equation>,

    /// Whether the zone's mesh moves.
    #[cfg_attr(feature = "serde", serde(default))]
    pub grid_movement: bool,
}

impl ZoneConfig {
    /// Creates an unnamed, static zone config with the given equations.
    #[must_use]
    pub fn new(equations: Vec<Equation>) -> Self {
        Self {
            name: None,
            equations,
            grid_movement: false,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_grid_movement(mut self) -> Self {
        self.grid_movement = true;
        self
    }

    #[must_use]
    pub fn has(&self, equation: Equation) -> bool {
        self.equations.contains(&equation)
    }

    /// Returns the active equations that receive spectral source terms.
    pub fn spectral_equations(&self) -> impl Iterator<Item = Equation> + '_ {
        self.equations.iter().copied().filter(|eq| eq.is_spectral())
    }
}

/// How the spectral derivative operator is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SpectralMethod {
    /// Uniform harmonics implied by the period and the number of instances.
    TimeSpectral,
    /// An arbitrary set of frequencies.
    HarmonicBalance,
}

/// Spectral-method settings shared by all time instances.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct SpectralConfig {
    pub method: SpectralMethod,

    /// Period of the unsteady motion.
    pub period: f64,

    /// Number of harmonic-balance frequencies.
    #[cfg_attr(feature = "serde", serde(default))]
    pub n_harmonics: usize,

    /// Harmonic-balance angular frequencies.
    #[cfg_attr(feature = "serde", serde(default))]
    pub omega: Vec<f64>,

    /// Apply the transposed operator for adjoint problems.
    #[cfg_attr(feature = "serde", serde(default))]
    pub adjoint: bool,

    /// Relative pivot threshold for the Gauss-Jordan inversion.
    #[cfg_attr(
        feature = "serde",
        serde(default = "SpectralConfig::default_pivot_tolerance")
    )]
    pub pivot_tolerance: f64,
}

impl SpectralConfig {
    /// Creates a time-spectral config for the given period.
    #[must_use]
    pub fn time_spectral(period: f64) -> Self {
        Self {
            method: SpectralMethod::TimeSpectral,
            period,
            n_harmonics: 0,
            omega: Vec::new(),
            adjoint: false,
            pivot_tolerance: Self::default_pivot_tolerance(),
        }
    }

    /// Creates a harmonic-balance config for the given period and frequencies.
    #[must_use]
    pub fn harmonic_balance(period: f64, omega: Vec<f64>) -> Self {
        Self {
            method: SpectralMethod::HarmonicBalance,
            period,
            n_harmonics: omega.len(),
            omega,
            adjoint: false,
            pivot_tolerance: Self::default_pivot_tolerance(),
        }
    }

    /// Returns the uniform frequencies `2πk/T`, `k = 1..=n_harmonics`.
    #[must_use]
    pub fn uniform_frequencies(period: f64, n_harmonics: usize) -> Vec<f64> {
        (1..=n_harmonics)
            .map(|k| 2.0 * PI * k as f64 / period)
            .collect()
    }

    #[must_use]
    pub fn with_adjoint(mut self) -> Self {
        self.adjoint = true;
        self
    }

    fn default_pivot_tolerance() -> f64 {
        1e-12
    }

    /// Validates the section for `n_instances` time instances.
    ///
    /// # Errors
    ///
    /// Returns an error if the period, frequencies, or pivot tolerance are
    /// invalid, or if the number of instances does not fit the method.
    pub fn validate(&self, n_instances: usize) -> Result<(), ConfigError> {
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(ConfigError::Period(self.period));
        }
        if !self.pivot_tolerance.is_finite() || self.pivot_tolerance < 0.0 {
            return Err(ConfigError::PivotTolerance(self.pivot_tolerance));
        }
        if n_instances == 0 {
            return Err(ConfigError::NoInstances);
        }

        match self.method {
            SpectralMethod::TimeSpectral => {
                if !self.omega.is_empty() || self.n_harmonics != 0 {
                    return Err(ConfigError::UnexpectedFrequencies);
                }
            }
            SpectralMethod::HarmonicBalance => {
                if self.n_harmonics == 0 {
                    return Err(ConfigError::NoHarmonics);
                }
                if self.omega.len() != self.n_harmonics {
                    return Err(ConfigError::HarmonicCountMismatch {
                        n_harmonics: self.n_harmonics,
                        given: self.omega.len(),
                    });
                }
                if n_instances != 2 * self.n_harmonics + 1 {
                    return Err(ConfigError::HarmonicInstanceMismatch {
                        n_harmonics: self.n_harmonics,
                        n_instances,
                    });
                }
                if let Some((index, &value)) = self
                    .omega
                    .iter()
                    .enumerate()
                    .find(|(_, w)| !w.is_finite() || **w <= 0.0)
                {
                    return Err(ConfigError::Frequency { index, value });
                }
            }
        }

        Ok(())
    }
}

/// Displacement predictor used at the start of each FSI step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Predictor {
    /// Start from the structure's current displacement.
    #[default]
    Off,
    /// Extrapolate linearly from the last two committed steps.
    Linear,
    /// Extrapolate quadratically from the last three committed steps.
    Quadratic,
}

/// Interface displacement relaxation between structural solve and mesh
/// deformation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "kebab-case"))]
pub enum Relaxation {
    /// Impose the structural displacement as computed.
    #[default]
    Off,
    /// Blend with a constant factor.
    Fixed { factor: f64 },
    /// Aitken's dynamic factor, seeded with `initial`.
    Aitken { initial: f64 },
}

/// Block Gauss-Seidel coupling settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct FsiConfig {
    /// Convergence tolerance on the interface displacement delta norm.
    pub tolerance: f64,

    /// Maximum number of coupling iterations per outer step.
    pub max_iters: usize,

    #[cfg_attr(feature = "serde", serde(default))]
    pub relaxation: Relaxation,

    #[cfg_attr(feature = "serde", serde(default))]
    pub predictor: Predictor,
}

impl Default for FsiConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iters: 20,
            relaxation: Relaxation::Off,
            predictor: Predictor::Off,
        }
    }
}

impl FsiConfig {
    /// Creates a config with validated tolerance and iteration cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerance is negative or non-finite, or if
    /// `max_iters` is zero.
    pub fn new(tolerance: f64, max_iters: usize) -> Result<Self, ConfigError> {
        let config = Self {
            tolerance,
            max_iters,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_relaxation(mut self, relaxation: Relaxation) -> Self {
        self.relaxation = relaxation;
        self
    }

    #[must_use]
    pub fn with_predictor(mut self, predictor: Predictor) -> Self {
        self.predictor = predictor;
        self
    }

    /// Validates tolerance, iteration cap, and relaxation factors.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Tolerance(self.tolerance));
        }
        if self.max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        match self.relaxation {
            Relaxation::Off => {}
            Relaxation::Fixed { factor: value } | Relaxation::Aitken { initial: value } => {
                if !value.is_finite() || value <= 0.0 {
                    return Err(ConfigError::RelaxationFactor(value));
                }
            }
        }
        Ok(())
    }
}

/// The whole simulation: driver choice, zones, and driver sections.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct SimulationConfig {
    pub driver: DriverKind,

    pub zones: Vec<ZoneConfig>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub spectral: Option<SpectralConfig>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub fsi: Option<FsiConfig>,
}

/// Errors that can occur when validating or loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{driver} driver needs {expected} zone(s), found {found}")]
    ZoneCount {
        driver: DriverKind,
        expected: &'static str,
        found: usize,
    },

    #[error("{driver} driver needs a [{section}] section")]
    MissingSection {
        driver: DriverKind,
        section: &'static str,
    },

    #[error("zone {zone} has no governing equations")]
    NoEquations { zone: usize },

    #[error("zone {zone} enables turbulence without flow")]
    TurbulenceWithoutFlow { zone: usize },

    #[error("{driver} driver does not support {equation:?} in zone {zone}")]
    UnsupportedEquation {
        driver: DriverKind,
        zone: usize,
        equation: Equation,
    },

    #[error("fsi zone {zone} must carry {equation:?}")]
    MissingEquation { zone: usize, equation: Equation },

    #[error("spectral zone {zone} differs from zone 0 in equations or grid movement")]
    InconsistentInstances { zone: usize },

    #[error("spectral period must be finite and positive, got {0}")]
    Period(f64),

    #[error("pivot tolerance must be finite and non-negative, got {0}")]
    PivotTolerance(f64),

    #[error("spectral operator needs at least one time instance")]
    NoInstances,

    #[error("time-spectral method takes no frequencies")]
    UnexpectedFrequencies,

    #[error("harmonic balance needs at least one harmonic")]
    NoHarmonics,

    #[error("expected {n_harmonics} harmonic-balance frequencies, got {given}")]
    HarmonicCountMismatch { n_harmonics: usize, given: usize },

    #[error(
        "harmonic balance with {n_harmonics} harmonic(s) needs {} time instances, found {n_instances}",
        2 * .n_harmonics + 1
    )]
    HarmonicInstanceMismatch {
        n_harmonics: usize,
        n_instances: usize,
    },

    #[error("frequency {index} must be finite and positive, got {value}")]
    Frequency { index: usize, value: f64 },

    #[error("coupling tolerance must be finite and non-negative, got {0}")]
    Tolerance(f64),

    #[error("max_iters must be at least 1")]
    MaxIters,

    #[error("relaxation factor must be finite and positive, got {0}")]
    RelaxationFactor(f64),

    #[error("failed to read '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "serde")]
    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl SimulationConfig {
    #[must_use]
    pub fn n_zones(&self) -> usize {
        self.zones.len()
    }

    /// Parses a configuration from TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid configuration.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    #[cfg(feature = "serde")]
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::Io { path, source })?;
        Self::from_toml_str(&text)
    }

    /// Checks the configuration for unsupported combinations.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n_zones = self.zones.len();

        for (zone, config) in self.zones.iter().enumerate() {
            if config.equations.is_empty() {
                return Err(ConfigError::NoEquations { zone });
            }
            if config.has(Equation::Turbulence) && !config.has(Equation::Flow) {
                return Err(ConfigError::TurbulenceWithoutFlow { zone });
            }
        }

        match self.driver {
            DriverKind::Single => self.expect_zones(n_zones == 1, "exactly 1"),
            DriverKind::Multi => self.expect_zones(n_zones >= 1, "at least 1"),
            DriverKind::Spectral => {
                self.expect_zones(n_zones >= 2, "at least 2")?;
                let spectral = self.spectral.as_ref().ok_or(ConfigError::MissingSection {
                    driver: self.driver,
                    section: "spectral",
                })?;
                self.validate_instances()?;
                spectral.validate(n_zones)
            }
            DriverKind::Fsi => {
                self.expect_zones(n_zones == 2, "exactly 2")?;
                let fsi = self.fsi.as_ref().ok_or(ConfigError::MissingSection {
                    driver: self.driver,
                    section: "fsi",
                })?;
                if !self.zones[0].has(Equation::Flow) {
                    return Err(ConfigError::MissingEquation {
                        zone: 0,
                        equation: Equation::Flow,
                    });
                }
                if !self.zones[1].has(Equation::Structural) {
                    return Err(ConfigError::MissingEquation {
                        zone: 1,
                        equation: Equation::Structural,
                    });
                }
                fsi.validate()
            }
        }
    }

    fn expect_zones(&self, ok: bool, expected: &'static str) -> Result<(), ConfigError> {
        if ok {
            Ok(())
        } else {
            Err(ConfigError::ZoneCount {
                driver: self.driver,
                expected,
                found: self.zones.len(),
            })
        }
    }

    /// Time instances are copies of one physical zone: same equations, same
    /// grid motion, and no structural field.
    fn validate_instances(&self) -> Result<(), ConfigError> {
        let first = &self.zones[0];
        for (zone, config) in self.zones.iter().enumerate() {
            if config.has(Equation::Structural) {
                return Err(ConfigError::UnsupportedEquation {
                    driver: self.driver,
                    zone,
                    equation: Equation::Structural,
                });
            }
            if config.equations != first.equations || config.grid_movement != first.grid_movement
            {
                return Err(ConfigError::InconsistentInstances { zone });
            }
        }
        Ok(())
    }
}
