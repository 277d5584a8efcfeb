//! The two-step faces → edges → faces layer.

use std::sync::Arc;

use candle_core::{Device, Tensor, Var};
use tracing::{debug, trace};

use crate::conv::{Conv, ConvConfig, UpdateFunc};
use crate::error::{Error, Result};
use crate::incidence::Incidence;

/// Two-step simplicial layer: faces → edges → faces.
///
/// The first convolution pushes face features onto edges through `B2`
/// (`[n_edges, n_faces]`), the second pulls them back through `B2ᵀ`. Both
/// steps row-normalize the aggregation and apply a sigmoid update, so outputs
/// lie in `(0, 1)`.
pub struct TemplateLayer {
    incidence_2: Arc<Incidence>,
    incidence_2_transpose: Arc<Incidence>,
    conv_level1_2_to_1: Conv,
    conv_level2_1_to_2: Conv,
}

impl TemplateLayer {
    pub fn new(
        in_channels: usize,
        intermediate_channels: usize,
        out_channels: usize,
        incidence_2: Arc<Incidence>,
        device: &Device,
    ) -> Result<Self> {
        // One-off dense round-trip; the relation is fixed for the layer's lifetime.
        let dense_t = incidence_2.to_dense(device)?.t()?;
        let incidence_2_transpose = Arc::new(Incidence::from_dense(&dense_t)?);

        let conv_level1_2_to_1 = Conv::new(
            ConvConfig::new(in_channels, intermediate_channels)
                .with_aggr_norm(true)
                .with_update_func(UpdateFunc::Sigmoid),
            incidence_2.clone(),
            device,
        )?;
        let conv_level2_1_to_2 = Conv::new(
            ConvConfig::new(intermediate_channels, out_channels)
                .with_aggr_norm(true)
                .with_update_func(UpdateFunc::Sigmoid),
            incidence_2_transpose.clone(),
            device,
        )?;

        debug!(
            edges = incidence_2.rows(),
            faces = incidence_2.cols(),
            in_channels,
            intermediate_channels,
            out_channels,
            "built template layer"
        );

        Ok(Self {
            incidence_2,
            incidence_2_transpose,
            conv_level1_2_to_1,
            conv_level2_1_to_2,
        })
    }

    pub fn reset_parameters(&self) -> Result<()> {
        self.conv_level1_2_to_1.reset_parameters()?;
        self.conv_level2_1_to_2.reset_parameters()
    }

    /// `x`: face features `[n_faces, in_channels]` → `[n_faces, out_channels]`.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let (n_faces, _) = x.dims2()?;
        if n_faces != self.incidence_2.cols() {
            return Err(Error::shape_mismatch(
                "faces",
                self.incidence_2.cols(),
                n_faces,
            ));
        }

        let x_edges = self.conv_level1_2_to_1.forward(x)?;
        trace!(dims = ?x_edges.dims(), "faces -> edges");
        self.conv_level2_1_to_2.forward(&x_edges)
    }

    pub fn incidence_2(&self) -> &Arc<Incidence> {
        &self.incidence_2
    }

    pub fn incidence_2_transpose(&self) -> &Arc<Incidence> {
        &self.incidence_2_transpose
    }

    pub fn conv_level1_2_to_1(&self) -> &Conv {
        &self.conv_level1_2_to_1
    }

    pub fn conv_level2_1_to_2(&self) -> &Conv {
        &self.conv_level2_1_to_2
    }

    pub fn parameters(&self) -> Vec<Var> {
        let mut params = self.conv_level1_2_to_1.parameters();
        params.extend(self.conv_level2_1_to_2.parameters());
        params
    }
}
