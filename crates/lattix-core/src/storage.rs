use std::sync::Arc;

use crate::device::Device;
use crate::scalar::Scalar;

#[cfg(feature = "cuda")]
use crate::error::LattixError;
#[cfg(feature = "cuda")]
use crate::Result;
#[cfg(feature = "cuda")]
use cudarc::driver::{CudaDevice, CudaSlice, DeviceRepr, ValidAsZeroBits};

/// Backing buffer for tensor elements.
#[derive(Debug, Clone)]
pub enum StorageData<T> {
    /// Host heap allocation.
    Host(Vec<T>),
    /// CUDA device allocation with its owning device handle.
    #[cfg(feature = "cuda")]
    Cuda {
        device: Arc<CudaDevice>,
        buffer: Arc<CudaSlice<T>>,
        device_idx: usize,
    },
}

/// Shared, reference-counted element storage.
///
/// Multiple tensors can point at one storage (views produced by reshape,
/// transpose, permute, and subview). Writes go through copy-on-write
/// (`Arc::make_mut`): mutating a tensor whose storage is shared detaches it
/// from the other holders first.
#[derive(Debug, Clone)]
pub struct Storage<T> {
    data: Arc<StorageData<T>>,
    device: Device,
    numel: usize,
}

impl<T: Scalar> Storage<T> {
    /// Take ownership of a host buffer.
    pub fn from_vec(data: Vec<T>) -> Self {
        let numel = data.len();
        Self {
            data: Arc::new(StorageData::Host(data)),
            device: Device::Host,
            numel,
        }
    }

    /// Allocate host storage holding `numel` copies of `value`.
    pub fn filled(value: T, numel: usize) -> Self {
        Self::from_vec(vec![value; numel])
    }

    /// Allocate zeroed host storage for `numel` elements.
    pub fn zeros(numel: usize) -> Self {
        Self::filled(T::zero(), numel)
    }

    /// The memory space of this storage.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        self.numel
    }

    /// Whether this storage is uniquely owned (no other references).
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.data) == 1
    }

    /// Whether this storage is host-resident.
    pub fn is_host(&self) -> bool {
        self.device.is_host()
    }

    /// Whether this storage is CUDA-resident.
    pub fn is_cuda(&self) -> bool {
        self.device.is_cuda()
    }

    /// Read-only view of the host buffer.
    ///
    /// Panics if the storage is device-resident; transfer with
    /// [`Storage::to_host`] first.
    pub fn as_slice(&self) -> &[T] {
        match self.data.as_ref() {
            StorageData::Host(v) => v,
            #[cfg(feature = "cuda")]
            StorageData::Cuda { .. } => {
                panic!("cannot access device storage as a host slice; transfer to host first")
            }
        }
    }

    /// Mutable view of the host buffer (copy-on-write when shared).
    ///
    /// Panics if the storage is device-resident.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        let data = Arc::make_mut(&mut self.data);
        match data {
            StorageData::Host(v) => v,
            #[cfg(feature = "cuda")]
            StorageData::Cuda { .. } => {
                panic!("cannot mutate device storage as a host slice; transfer to host first")
            }
        }
    }

    /// The raw storage variant (for kernel dispatch).
    pub fn data(&self) -> &StorageData<T> {
        self.data.as_ref()
    }
}

#[cfg(feature = "cuda")]
impl<T: Scalar + DeviceRepr + ValidAsZeroBits + Unpin> Storage<T> {
    /// Copy this storage to a CUDA device (H2D). No-op when already there.
    pub fn to_cuda(&self, device_idx: usize) -> Result<Self> {
        if let Device::Cuda(idx) = self.device {
            if idx == device_idx {
                return Ok(self.clone());
            }
        }
        let host = self.to_host()?;
        let cuda_dev = CudaDevice::new(device_idx)
            .map_err(|e| LattixError::DeviceError(format!("CUDA device init: {e}")))?;
        let buffer = cuda_dev
            .htod_copy(host.as_slice().to_vec())
            .map_err(|e| LattixError::DeviceError(format!("H2D copy: {e}")))?;
        Ok(Self {
            data: Arc::new(StorageData::Cuda {
                device: cuda_dev,
                buffer: Arc::new(buffer),
                device_idx,
            }),
            device: Device::Cuda(device_idx),
            numel: self.numel,
        })
    }

    /// Copy device storage back to the host (D2H). No-op for host storage.
    pub fn to_host(&self) -> Result<Self> {
        match self.data.as_ref() {
            StorageData::Host(_) => Ok(self.clone()),
            StorageData::Cuda { device, buffer, .. } => {
                let host: Vec<T> = device
                    .dtoh_sync_copy(buffer.as_ref())
                    .map_err(|e| LattixError::DeviceError(format!("D2H copy: {e}")))?;
                Ok(Self::from_vec(host))
            }
        }
    }

    /// Wrap an existing CUDA buffer (used by kernel dispatch).
    pub fn from_cuda(
        device: Arc<CudaDevice>,
        buffer: CudaSlice<T>,
        device_idx: usize,
        numel: usize,
    ) -> Self {
        Self {
            data: Arc::new(StorageData::Cuda {
                device,
                buffer: Arc::new(buffer),
                device_idx,
            }),
            device: Device::Cuda(device_idx),
            numel,
        }
    }

    /// The underlying CUDA buffer, if device-resident.
    pub fn as_cuda_slice(&self) -> Option<&CudaSlice<T>> {
        match self.data.as_ref() {
            StorageData::Cuda { buffer, .. } => Some(buffer.as_ref()),
            _ => None,
        }
    }

    /// The CUDA device handle, if device-resident.
    pub fn cuda_device(&self) -> Option<Arc<CudaDevice>> {
        match self.data.as_ref() {
            StorageData::Cuda { device, .. } => Some(Arc::clone(device)),
            _ => None,
        }
    }
}
