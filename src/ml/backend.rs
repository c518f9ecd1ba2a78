// ============================================================
// Layer 5: Backend Selection
// ============================================================
// Training runs on Autodiff<Inner>; validation and inference
// run on Inner directly via AutodiffModule::valid().
//
// The default inner backend is NdArray (CPU). Building with
// `--features wgpu` moves everything onto the GPU.

#[cfg(not(feature = "wgpu"))]
pub type InnerBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InnerBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InnerBackend>;

pub type Device = <InnerBackend as burn::tensor::backend::Backend>::Device;

pub fn default_device() -> Device {
    Device::default()
}
