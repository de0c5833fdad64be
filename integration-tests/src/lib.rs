//! Model zones shared by the end-to-end tests.
//!
//! - [`oscillator`]: time instances of `du/dt + λ·u = f(t)` for the spectral
//!   driver, assembled through [`tandem_core::preprocess`]
//! - [`piston`]: a gas cylinder closed by a spring-loaded piston for the FSI
//!   driver

pub mod oscillator;
pub mod piston;
