//! simplico: message passing on simplicial complexes.
//!
//! Provides a sparse [`Incidence`] relation between simplex ranks, the [`Conv`]
//! message-passing primitive, and the two-step [`TemplateLayer`]
//! (faces → edges → faces), built on `candle` tensors. With the
//! `backend-burn` feature, [`burn_simplicial`] runs the same layers on Burn.

pub mod conv;
pub mod error;
pub mod incidence;
pub mod template;

#[cfg(feature = "backend-burn")]
pub mod burn_simplicial;

#[cfg(test)]
mod test_util;

pub use conv::{Conv, ConvConfig, Initialization, UpdateFunc};
pub use error::{Error, Result};
pub use incidence::Incidence;
pub use template::TemplateLayer;
