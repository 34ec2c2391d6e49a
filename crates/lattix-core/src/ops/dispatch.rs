//! Device kernel dispatch.
//!
//! The tensor core never sees a device algorithm. The only thing that
//! crosses the boundary is a [`KernelLaunch`]: an operation name, operand
//! metadata, and the backend-side buffers. The built-in backend (the `cuda`
//! feature) compiles a small element-wise module at first use via NVRTC and
//! caches it per device.

use crate::scalar::Scalar;
use crate::tensor::Tensor;
use crate::Result;

/// Data-only description of a device kernel launch.
#[derive(Debug)]
pub struct KernelLaunch<'a> {
    /// Kernel base name, e.g. `"add"`.
    pub op: &'a str,
    /// Logical shape shared by every operand.
    pub shape: &'a [usize],
    /// Strides of each source operand.
    pub src_strides: Vec<&'a [usize]>,
    /// Total element count.
    pub numel: usize,
}

pub(crate) fn launch_binary<T: Scalar>(
    a: &Tensor<T>,
    b: &Tensor<T>,
    op: &'static str,
) -> Result<Tensor<T>> {
    let launch = KernelLaunch {
        op,
        shape: a.shape().dims(),
        src_strides: vec![a.strides(), b.strides()],
        numel: a.numel(),
    };
    backend::binary(&launch, a, b)
}

pub(crate) fn launch_unary<T: Scalar>(a: &Tensor<T>, op: &'static str) -> Result<Tensor<T>> {
    let launch = KernelLaunch {
        op,
        shape: a.shape().dims(),
        src_strides: vec![a.strides()],
        numel: a.numel(),
    };
    backend::unary(&launch, a)
}

#[cfg(not(feature = "cuda"))]
mod backend {
    use super::KernelLaunch;
    use crate::error::LattixError;
    use crate::scalar::Scalar;
    use crate::tensor::Tensor;
    use crate::Result;

    pub(crate) fn binary<T: Scalar>(
        _launch: &KernelLaunch<'_>,
        _a: &Tensor<T>,
        _b: &Tensor<T>,
    ) -> Result<Tensor<T>> {
        Err(LattixError::Unsupported(
            "device tensors require the `cuda` feature".into(),
        ))
    }

    pub(crate) fn unary<T: Scalar>(
        _launch: &KernelLaunch<'_>,
        _a: &Tensor<T>,
    ) -> Result<Tensor<T>> {
        Err(LattixError::Unsupported(
            "device tensors require the `cuda` feature".into(),
        ))
    }
}

#[cfg(feature = "cuda")]
mod backend {
    use std::any::TypeId;
    use std::sync::Arc;

    use cudarc::driver::{CudaDevice, CudaFunction, CudaSlice, LaunchAsync, LaunchConfig};
    use smallvec::SmallVec;

    use super::KernelLaunch;
    use crate::error::LattixError;
    use crate::scalar::Scalar;
    use crate::shape::Shape;
    use crate::storage::Storage;
    use crate::tensor::Tensor;
    use crate::Result;

    const MODULE: &str = "lattix_elementwise";
    const FUNCS: &[&str] = &["add_f32", "sub_f32", "neg_f32"];

    const ELEMENTWISE_CU: &str = r#"
extern "C" __global__ void add_f32(float *out, const float *a, const float *b, int n) {
    int i = blockIdx.x * blockDim.x + threadIdx.x;
    if (i < n) { out[i] = a[i] + b[i]; }
}
extern "C" __global__ void sub_f32(float *out, const float *a, const float *b, int n) {
    int i = blockIdx.x * blockDim.x + threadIdx.x;
    if (i < n) { out[i] = a[i] - b[i]; }
}
extern "C" __global__ void neg_f32(float *out, const float *a, int n) {
    int i = blockIdx.x * blockDim.x + threadIdx.x;
    if (i < n) { out[i] = -a[i]; }
}
"#;

    /// Get a kernel function, compiling and loading the module on first use.
    fn get_func(dev: &Arc<CudaDevice>, name: &str) -> Result<CudaFunction> {
        if let Some(f) = dev.get_func(MODULE, name) {
            return Ok(f);
        }
        let ptx = cudarc::nvrtc::compile_ptx(ELEMENTWISE_CU)
            .map_err(|e| LattixError::DeviceError(format!("PTX compile: {e}")))?;
        dev.load_ptx(ptx, MODULE, FUNCS)
            .map_err(|e| LattixError::DeviceError(format!("load module: {e}")))?;
        dev.get_func(MODULE, name)
            .ok_or_else(|| LattixError::DeviceError(format!("kernel '{name}' not found")))
    }

    /// The built-in backend implements f32 only; other element types must
    /// come from an external backend.
    fn as_f32<T: Scalar>(t: &Tensor<T>) -> Result<&Tensor<f32>> {
        if TypeId::of::<T>() == TypeId::of::<f32>() {
            // Safety: T is f32, so the layouts are identical.
            Ok(unsafe { &*(t as *const Tensor<T> as *const Tensor<f32>) })
        } else {
            Err(LattixError::Unsupported(
                "the built-in device backend implements f32 element-wise kernels only".into(),
            ))
        }
    }

    /// Inverse of [`as_f32`]; caller guarantees `T` is `f32`.
    fn into_generic<T: Scalar>(t: Tensor<f32>) -> Tensor<T> {
        let out = unsafe { std::mem::transmute_copy(&t) };
        std::mem::forget(t);
        out
    }

    fn operand_parts<'t>(
        t: &'t Tensor<f32>,
    ) -> Result<(Arc<CudaDevice>, usize, &'t CudaSlice<f32>)> {
        if !t.is_contiguous() {
            return Err(LattixError::Unsupported(
                "the built-in device backend needs contiguous operands".into(),
            ));
        }
        let dev = t
            .storage_ref()
            .cuda_device()
            .ok_or_else(|| LattixError::DeviceError("tensor is not device-resident".into()))?;
        let idx = t
            .device()
            .cuda_index()
            .ok_or_else(|| LattixError::DeviceError("tensor is not device-resident".into()))?;
        let slice = t
            .storage_ref()
            .as_cuda_slice()
            .ok_or_else(|| LattixError::DeviceError("tensor is not device-resident".into()))?;
        Ok((dev, idx, slice))
    }

    pub(crate) fn binary<T: Scalar>(
        launch: &KernelLaunch<'_>,
        a: &Tensor<T>,
        b: &Tensor<T>,
    ) -> Result<Tensor<T>> {
        let a32 = as_f32(a)?;
        let b32 = as_f32(b)?;
        let (dev, idx, a_slice) = operand_parts(a32)?;
        let (_, b_idx, b_slice) = operand_parts(b32)?;
        if idx != b_idx || a32.layout() != b32.layout() {
            return Err(LattixError::DeviceError(
                "operands must share one device and storage order".into(),
            ));
        }

        let n = launch.numel;
        let mut out = dev
            .alloc_zeros::<f32>(n)
            .map_err(|e| LattixError::DeviceError(format!("device alloc: {e}")))?;
        let func = get_func(&dev, &format!("{}_f32", launch.op))?;
        let cfg = LaunchConfig::for_num_elems(n as u32);
        unsafe { func.launch(cfg, (&mut out, a_slice, b_slice, n as i32)) }
            .map_err(|e| LattixError::DeviceError(format!("kernel launch: {e}")))?;

        let storage = Storage::from_cuda(dev, out, idx, n);
        let strides: SmallVec<[usize; 4]> = SmallVec::from_slice(a32.strides());
        let result = Tensor::from_storage(storage, Shape::new(launch.shape), strides, 0);
        Ok(into_generic(result))
    }

    pub(crate) fn unary<T: Scalar>(
        launch: &KernelLaunch<'_>,
        a: &Tensor<T>,
    ) -> Result<Tensor<T>> {
        let a32 = as_f32(a)?;
        let (dev, idx, a_slice) = operand_parts(a32)?;

        let n = launch.numel;
        let mut out = dev
            .alloc_zeros::<f32>(n)
            .map_err(|e| LattixError::DeviceError(format!("device alloc: {e}")))?;
        let func = get_func(&dev, &format!("{}_f32", launch.op))?;
        let cfg = LaunchConfig::for_num_elems(n as u32);
        unsafe { func.launch(cfg, (&mut out, a_slice, n as i32)) }
            .map_err(|e| LattixError::DeviceError(format!("kernel launch: {e}")))?;

        let storage = Storage::from_cuda(dev, out, idx, n);
        let strides: SmallVec<[usize; 4]> = SmallVec::from_slice(a32.strides());
        let result = Tensor::from_storage(storage, Shape::new(launch.shape), strides, 0);
        Ok(into_generic(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    #[test]
    fn test_launch_contract_fields() {
        let a = Tensor::from_vec(&[2, 2], vec![1.0f32, 2.0, 3.0, 4.0], Layout::ColMajor).unwrap();
        let b = a.view();
        let launch = KernelLaunch {
            op: "add",
            shape: a.shape().dims(),
            src_strides: vec![a.strides(), b.strides()],
            numel: a.numel(),
        };
        assert_eq!(launch.op, "add");
        assert_eq!(launch.shape, &[2, 2]);
        assert_eq!(launch.numel, 4);
        assert_eq!(launch.src_strides.len(), 2);
    }
}
