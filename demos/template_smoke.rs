//! Minimal template-layer smoke example (Candle backend).
//!
//! Run:
//!   RUST_LOG=simplico=debug cargo run --example template_smoke

use std::sync::Arc;

use candle_core::{Device, Tensor};
use simplico::{Incidence, Result, TemplateLayer};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dev = &Device::Cpu;

    // Boundary of a tetrahedron. Edges 01 02 03 12 13 23, faces 012 013 023 123.
    let b2 = Incidence::from_pairs(
        6,
        4,
        [
            (0, 0), (1, 0), (3, 0),
            (0, 1), (2, 1), (4, 1),
            (1, 2), (2, 2), (5, 2),
            (3, 3), (4, 3), (5, 3),
        ],
    )?;
    let (n_faces, d) = (b2.cols(), 4usize);

    let layer = TemplateLayer::new(d, 8, 2, Arc::new(b2), dev)?;
    let x = Tensor::randn(0f32, 1f32, (n_faces, d), dev)?;

    let y = layer.forward(&x)?;
    let (yn, yd) = y.dims2()?;
    println!("y shape: [{yn}, {yd}]");

    layer.reset_parameters()?;
    let y2 = layer.forward(&x)?;
    println!("y after reset (first row): {:?}", y2.get(0)?.to_vec1::<f32>()?);

    let edges_as_faces = Tensor::zeros((6, d), candle_core::DType::F32, dev)?;
    if let Err(e) = layer.forward(&edges_as_faces) {
        println!("rejected: {e}");
    }

    Ok(())
}
