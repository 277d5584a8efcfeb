//! Minimal Burn template-layer smoke example.
//!
//! Run:
//!   cargo run --example burn_template_smoke --features backend-burn

#[cfg(not(feature = "backend-burn"))]
fn main() {
    eprintln!("This example requires `--features backend-burn`.");
}

#[cfg(feature = "backend-burn")]
fn main() -> simplico::Result<()> {
    use std::sync::Arc;

    use burn::tensor::backend::Backend;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;
    use simplico::burn_simplicial::BurnTemplateLayer;
    use simplico::{Incidence, TemplateLayer};

    type B = NdArray<f32>;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Two triangles glued along one edge.
    let b2 = Incidence::from_pairs(5, 2, [(0, 0), (1, 0), (2, 0), (2, 1), (3, 1), (4, 1)])?;
    let layer = TemplateLayer::new(3, 4, 2, Arc::new(b2), &candle_core::Device::Cpu)?;

    let device = <B as Backend>::Device::default();
    let burn_layer = BurnTemplateLayer::<B>::from_layer(&layer, &device)?;

    let x = burn::tensor::Tensor::<B, 2>::from_data(
        TensorData::new(vec![0.10f32, -0.05, 0.02, 0.03, 0.04, -0.01], [2, 3]),
        &device,
    );
    let y = burn_layer.forward(x)?;
    println!("y: {:?}", y.to_data());

    Ok(())
}
