//! Message-passing convolution over a fixed sparse neighborhood.
//!
//! `Conv` is the GCN step `N · X · W` with the neighborhood `N` taken from an
//! [`Incidence`] instead of a square adjacency matrix, so source and target
//! simplices may have different ranks. Optional row normalization divides
//! each target row by its neighborhood size before the update function runs.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use candle_core::{Device, Tensor, Var};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::incidence::Incidence;

/// Nonlinearity applied to aggregated messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateFunc {
    Sigmoid,
    Relu,
    Tanh,
    /// Return the aggregated messages unchanged.
    #[default]
    #[serde(rename = "none")]
    Identity,
}

impl UpdateFunc {
    pub fn apply(self, x: &Tensor) -> Result<Tensor> {
        let y = match self {
            Self::Sigmoid => candle_nn::ops::sigmoid(x)?,
            Self::Relu => x.relu()?,
            Self::Tanh => x.tanh()?,
            Self::Identity => x.clone(),
        };
        Ok(y)
    }
}

impl FromStr for UpdateFunc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(Self::Sigmoid),
            "relu" => Ok(Self::Relu),
            "tanh" => Ok(Self::Tanh),
            "none" | "identity" => Ok(Self::Identity),
            _ => Err(Error::UnknownUpdateFunc(s.to_string())),
        }
    }
}

impl fmt::Display for UpdateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sigmoid => "sigmoid",
            Self::Relu => "relu",
            Self::Tanh => "tanh",
            Self::Identity => "none",
        };
        f.write_str(name)
    }
}

/// Weight initialization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initialization {
    /// `U(-a, a)` with `a = gain * sqrt(6 / (fan_in + fan_out))`.
    #[default]
    XavierUniform,
    /// `N(0, std)` with `std = gain * sqrt(2 / (fan_in + fan_out))`.
    XavierNormal,
}

/// Hyperparameters of a [`Conv`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvConfig {
    pub in_channels: usize,
    pub out_channels: usize,
    /// Divide aggregated messages by the target's neighborhood size.
    #[serde(default)]
    pub aggr_norm: bool,
    #[serde(default)]
    pub update_func: UpdateFunc,
    #[serde(default)]
    pub initialization: Initialization,
    #[serde(default = "default_gain")]
    pub initialization_gain: f64,
}

fn default_gain() -> f64 {
    1.414
}

impl ConvConfig {
    pub fn new(in_channels: usize, out_channels: usize) -> Self {
        Self {
            in_channels,
            out_channels,
            aggr_norm: false,
            update_func: UpdateFunc::default(),
            initialization: Initialization::default(),
            initialization_gain: default_gain(),
        }
    }

    #[must_use]
    pub fn with_aggr_norm(mut self, aggr_norm: bool) -> Self {
        self.aggr_norm = aggr_norm;
        self
    }

    #[must_use]
    pub fn with_update_func(mut self, update_func: UpdateFunc) -> Self {
        self.update_func = update_func;
        self
    }

    #[must_use]
    pub fn with_initialization(mut self, initialization: Initialization, gain: f64) -> Self {
        self.initialization = initialization;
        self.initialization_gain = gain;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.in_channels == 0 || self.out_channels == 0 {
            return Err(Error::InvalidConfig(format!(
                "channel counts must be positive (in={}, out={})",
                self.in_channels, self.out_channels
            )));
        }
        if !(self.initialization_gain.is_finite() && self.initialization_gain > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "initialization gain must be positive, got {}",
                self.initialization_gain
            )));
        }
        Ok(())
    }

    fn init_weight(&self, device: &Device) -> Result<Tensor> {
        let fans = (self.in_channels + self.out_channels) as f64;
        let shape = (self.in_channels, self.out_channels);
        let w = match self.initialization {
            Initialization::XavierUniform => {
                let bound = (self.initialization_gain * (6.0 / fans).sqrt()) as f32;
                Tensor::rand(-bound, bound, shape, device)?
            }
            Initialization::XavierNormal => {
                let std = (self.initialization_gain * (2.0 / fans).sqrt()) as f32;
                Tensor::randn(0f32, std, shape, device)?
            }
        };
        Ok(w)
    }
}

/// Convolution from source simplices (neighborhood columns) to target
/// simplices (neighborhood rows).
pub struct Conv {
    config: ConvConfig,
    weight: Var,
    neighborhood: Arc<Incidence>,
    row_index: Tensor,
    col_index: Tensor,
    values: Tensor,
    /// `[n_target, 1]` reciprocal row sums, present when `aggr_norm` is set.
    inv_degree: Option<Tensor>,
    device: Device,
}

impl Conv {
    pub fn new(config: ConvConfig, neighborhood: Arc<Incidence>, device: &Device) -> Result<Self> {
        config.validate()?;

        let weight = Var::from_tensor(&config.init_weight(device)?)?;

        let inv_degree = if config.aggr_norm {
            let sums = neighborhood.row_sums();
            let zero_rows = sums.iter().filter(|&&s| s == 0.0).count();
            if zero_rows > 0 {
                warn!(
                    zero_rows,
                    rows = neighborhood.rows(),
                    "zero row sum; normalized messages stay zero"
                );
            }
            let inv: Vec<f32> = sums
                .into_iter()
                .map(|s| if s == 0.0 { 0.0 } else { s.recip() })
                .collect();
            Some(Tensor::from_vec(inv, (neighborhood.rows(), 1), device)?)
        } else {
            None
        };

        debug!(
            in_channels = config.in_channels,
            out_channels = config.out_channels,
            targets = neighborhood.rows(),
            sources = neighborhood.cols(),
            nnz = neighborhood.nnz(),
            aggr_norm = config.aggr_norm,
            update = %config.update_func,
            "built conv"
        );

        Ok(Self {
            row_index: neighborhood.row_index(device)?,
            col_index: neighborhood.col_index(device)?,
            values: neighborhood.value_column(device)?,
            inv_degree,
            weight,
            neighborhood,
            config,
            device: device.clone(),
        })
    }

    /// Draw fresh weights according to the configured initialization.
    pub fn reset_parameters(&self) -> Result<()> {
        let fresh = self.config.init_weight(&self.device)?;
        self.weight.set(&fresh)?;
        Ok(())
    }

    /// Overwrite the weight with `weight`, which must be `[in_channels, out_channels]`.
    pub fn load_weight(&self, weight: &Tensor) -> Result<()> {
        let expected = [self.config.in_channels, self.config.out_channels];
        if weight.dims() != expected {
            return Err(Error::InvalidConfig(format!(
                "weight shape {:?} does not match {:?}",
                weight.dims(),
                expected
            )));
        }
        let weight = weight.to_device(&self.device)?.to_dtype(self.weight.dtype())?;
        self.weight.set(&weight)?;
        Ok(())
    }

    /// `x`: `[n_source, in_channels]` → `[n_target, out_channels]`.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let (n_source, channels) = x.dims2()?;
        if n_source != self.neighborhood.cols() {
            return Err(Error::shape_mismatch(
                "source simplices",
                self.neighborhood.cols(),
                n_source,
            ));
        }
        if channels != self.config.in_channels {
            return Err(Error::ChannelMismatch {
                expected: self.config.in_channels,
                actual: channels,
            });
        }

        let messages = x.matmul(self.weight.as_tensor())?;
        let zeros = Tensor::zeros(
            (self.neighborhood.rows(), self.config.out_channels),
            messages.dtype(),
            &self.device,
        )?;
        let aggregated = if self.neighborhood.nnz() == 0 {
            zeros
        } else {
            let weighted = messages
                .index_select(&self.col_index, 0)?
                .broadcast_mul(&self.values)?;
            zeros.index_add(&self.row_index, &weighted, 0)?
        };
        let aggregated = match &self.inv_degree {
            Some(inv) => aggregated.broadcast_mul(inv)?,
            None => aggregated,
        };
        trace!(dims = ?aggregated.dims(), "conv aggregated");

        self.config.update_func.apply(&aggregated)
    }

    pub fn config(&self) -> &ConvConfig {
        &self.config
    }

    pub fn neighborhood(&self) -> &Arc<Incidence> {
        &self.neighborhood
    }

    pub fn weight(&self) -> &Tensor {
        self.weight.as_tensor()
    }

    /// Trainable variables, e.g. for `candle_nn::SGD::new`.
    pub fn parameters(&self) -> Vec<Var> {
        vec![self.weight.clone()]
    }
}
