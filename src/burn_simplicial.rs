//! Burn-backed simplicial layers (opt-in).
//!
//! Mirrors [`Conv`](crate::conv::Conv) and [`TemplateLayer`] on Burn tensors so a
//! trained layer can run on Burn backends (ndarray / wgpu / tch).
//!
//! The candle implementation stays the source of truth: Burn layers are built
//! from a candle layer, copying its weights, and are parity-tested against it.
//! Neighborhoods are held dense with row normalization folded in.

use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

use crate::conv::{Conv, UpdateFunc};
use crate::error::{Error, Result};
use crate::template::TemplateLayer;

/// One convolution step on Burn tensors.
#[derive(Debug, Clone)]
pub struct BurnConv<B: Backend> {
    weight: Tensor<B, 2>,
    /// `[n_target, n_source]`, already divided by row sums when normalizing.
    neighborhood: Tensor<B, 2>,
    update_func: UpdateFunc,
}

impl<B: Backend> BurnConv<B> {
    /// Copy weights and neighborhood out of a candle [`Conv`].
    pub fn from_conv(conv: &Conv, device: &B::Device) -> Result<Self> {
        let cfg = conv.config();
        let weight = conv.weight().to_vec2::<f32>()?.concat();
        let weight = Tensor::from_data(
            TensorData::new(weight, [cfg.in_channels, cfg.out_channels]),
            device,
        );

        let inc = conv.neighborhood();
        let (rows, cols) = inc.shape();
        let sums = inc.row_sums();
        let mut dense = vec![0f32; rows * cols];
        for (r, c, v) in inc.iter() {
            dense[r * cols + c] = match (cfg.aggr_norm, sums[r]) {
                (false, _) => v,
                (true, s) if s == 0.0 => 0.0,
                (true, s) => v / s,
            };
        }
        let neighborhood = Tensor::from_data(TensorData::new(dense, [rows, cols]), device);

        Ok(Self {
            weight,
            neighborhood,
            update_func: cfg.update_func,
        })
    }

    fn update(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        match self.update_func {
            UpdateFunc::Sigmoid => activation::sigmoid(x),
            UpdateFunc::Relu => activation::relu(x),
            UpdateFunc::Tanh => x.tanh(),
            UpdateFunc::Identity => x,
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let [n_source, channels] = x.dims();
        let [_, expected_sources] = self.neighborhood.dims();
        if n_source != expected_sources {
            return Err(Error::shape_mismatch(
                "source simplices",
                expected_sources,
                n_source,
            ));
        }
        let [in_channels, _] = self.weight.dims();
        if channels != in_channels {
            return Err(Error::ChannelMismatch {
                expected: in_channels,
                actual: channels,
            });
        }

        let messages = x.matmul(self.weight.clone());
        Ok(self.update(self.neighborhood.clone().matmul(messages)))
    }
}

/// [`TemplateLayer`] on Burn tensors.
#[derive(Debug, Clone)]
pub struct BurnTemplateLayer<B: Backend> {
    faces: usize,
    conv_level1_2_to_1: BurnConv<B>,
    conv_level2_1_to_2: BurnConv<B>,
}

impl<B: Backend> BurnTemplateLayer<B> {
    pub fn from_layer(layer: &TemplateLayer, device: &B::Device) -> Result<Self> {
        Ok(Self {
            faces: layer.incidence_2().cols(),
            conv_level1_2_to_1: BurnConv::from_conv(layer.conv_level1_2_to_1(), device)?,
            conv_level2_1_to_2: BurnConv::from_conv(layer.conv_level2_1_to_2(), device)?,
        })
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let [n_faces, _] = x.dims();
        if n_faces != self.faces {
            return Err(Error::shape_mismatch("faces", self.faces, n_faces));
        }
        let x_edges = self.conv_level1_2_to_1.forward(x)?;
        self.conv_level2_1_to_2.forward(x_edges)
    }
}
