use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use anyhow::{ensure, Context, Result};
use bytes::BytesMut;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Device {
    Cpu,
    Cuda { device_id: u32 },
    Hip { device_id: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    F32,
    F16,
    I64,
    I32,
    U8,
}

impl DType {
    pub fn size(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::F16 => 2,
            DType::I64 => 8,
            DType::U8 => 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }

    /// Element count; errors when the dims overflow `usize`.
    pub fn checked_numel(&self) -> Result<usize> {
        self.0
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .with_context(|| format!("shape {self} has too many elements"))
    }

    pub fn checked_byte_len(&self, dtype: DType) -> Result<usize> {
        self.checked_numel()?
            .checked_mul(dtype.size())
            .with_context(|| format!("shape {self} of {dtype:?} is too large"))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0.as_slice())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct TensorDesc {
    dtype: DType,
    shape: Shape,
    device: Device,
}

/// Process-unique identity of a tensor implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(u64);

fn next_tensor_id() -> TensorId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    TensorId(NEXT.fetch_add(1, Ordering::Relaxed))
}

struct TensorBody {
    desc: TensorDesc,
    data: BytesMut,
}

/// The storage behind a defined tensor handle.
///
/// Metadata and bytes live behind a lock so an operator holding one handle
/// can resize and fill the tensor in place while the caller still observes
/// the same identity through its own handle.
pub struct TensorImpl {
    id: TensorId,
    body: RwLock<TensorBody>,
}

impl TensorImpl {
    fn read(&self) -> RwLockReadGuard<'_, TensorBody> {
        self.body.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TensorBody> {
        self.body.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A reference-counted tensor handle.
///
/// The default value is an *undefined* handle with no storage, which is what
/// an output slot holds before an operator allocates into it. Cloning a
/// defined handle shares the implementation.
#[derive(Clone, Default)]
pub struct Tensor {
    inner: Option<Arc<TensorImpl>>,
}

impl Tensor {
    pub fn undefined() -> Self {
        Self { inner: None }
    }

    /// CPU tensor over little-endian `data`, which must match the shape.
    pub fn from_cpu_bytes(dtype: DType, shape: Shape, data: BytesMut) -> Result<Self> {
        let byte_len = shape.checked_byte_len(dtype)?;
        ensure!(
            data.len() == byte_len,
            "shape {shape} of {dtype:?} needs {byte_len} bytes, got {}",
            data.len()
        );
        Ok(Self::from_parts(
            TensorDesc {
                dtype,
                shape,
                device: Device::Cpu,
            },
            data,
        ))
    }

    /// Zero-filled tensor on `device`.
    pub fn zeros(dtype: DType, shape: Shape, device: Device) -> Result<Self> {
        let byte_len = shape.checked_byte_len(dtype)?;
        Ok(Self::from_parts(
            TensorDesc {
                dtype,
                shape,
                device,
            },
            BytesMut::zeroed(byte_len),
        ))
    }

    pub fn from_f32(shape: &[usize], values: &[f32]) -> Result<Self> {
        let mut data = BytesMut::with_capacity(values.len() * 4);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        Self::from_cpu_bytes(DType::F32, Shape::from_slice(shape), data)
    }

    pub fn from_i64(shape: &[usize], values: &[i64]) -> Result<Self> {
        let mut data = BytesMut::with_capacity(values.len() * 8);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        Self::from_cpu_bytes(DType::I64, Shape::from_slice(shape), data)
    }

    fn from_parts(desc: TensorDesc, data: BytesMut) -> Self {
        Self {
            inner: Some(Arc::new(TensorImpl {
                id: next_tensor_id(),
                body: RwLock::new(TensorBody { desc, data }),
            })),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.inner.is_some()
    }

    pub fn id(&self) -> Option<TensorId> {
        self.inner.as_ref().map(|t| t.id)
    }

    /// True when both handles point at the same implementation.
    /// Two undefined handles are never the same handle.
    pub fn same_handle(&self, other: &Tensor) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn downgrade(&self) -> WeakTensor {
        WeakTensor {
            inner: self.inner.as_ref().map(Arc::downgrade),
        }
    }

    fn defined(&self) -> Result<&TensorImpl> {
        match &self.inner {
            Some(t) => Ok(t),
            None => anyhow::bail!("tensor is undefined"),
        }
    }

    pub fn dtype(&self) -> Result<DType> {
        Ok(self.defined()?.read().desc.dtype)
    }

    pub fn shape(&self) -> Result<Shape> {
        Ok(self.defined()?.read().desc.shape.clone())
    }

    pub fn device(&self) -> Option<Device> {
        self.inner.as_ref().map(|t| t.read().desc.device)
    }

    pub fn byte_len(&self) -> usize {
        self.inner.as_ref().map_or(0, |t| t.read().data.len())
    }

    /// Reshape the storage in place, keeping handle identity.
    ///
    /// Existing bytes are kept when the byte length is unchanged, otherwise
    /// the storage is reallocated zero-filled.
    pub fn resize(&self, dtype: DType, shape: Shape) -> Result<()> {
        let imp = self.defined()?;
        let byte_len = shape.checked_byte_len(dtype)?;
        let mut body = imp.write();
        if body.data.len() != byte_len {
            body.data = BytesMut::zeroed(byte_len);
        }
        body.desc.dtype = dtype;
        body.desc.shape = shape;
        Ok(())
    }

    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        Ok(f(&self.defined()?.read().data))
    }

    pub fn with_bytes_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        Ok(f(&mut self.defined()?.write().data))
    }

    pub fn to_vec_f32(&self) -> Result<Vec<f32>> {
        ensure!(self.dtype()? == DType::F32, "expected an f32 tensor");
        self.with_bytes(|b| {
            b.chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        })
    }

    pub fn to_vec_i64(&self) -> Result<Vec<i64>> {
        ensure!(self.dtype()? == DType::I64, "expected an i64 tensor");
        self.with_bytes(|b| {
            b.chunks_exact(8)
                .map(|c| {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(c);
                    i64::from_le_bytes(raw)
                })
                .collect()
        })
    }

    pub fn copy_from_f32(&self, values: &[f32]) -> Result<()> {
        ensure!(self.dtype()? == DType::F32, "expected an f32 tensor");
        self.with_bytes_mut(|b| {
            ensure!(
                b.len() == values.len() * 4,
                "tensor holds {} bytes, got {} values",
                b.len(),
                values.len()
            );
            for (dst, v) in b.chunks_exact_mut(4).zip(values) {
                dst.copy_from_slice(&v.to_le_bytes());
            }
            Ok(())
        })?
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            None => f.write_str("Tensor(undefined)"),
            Some(t) => {
                let body = t.read();
                f.debug_struct("Tensor")
                    .field("id", &t.id.0)
                    .field("dtype", &body.desc.dtype)
                    .field("shape", &body.desc.shape)
                    .field("device", &body.desc.device)
                    .finish()
            }
        }
    }
}

/// Non-owning observer of a tensor handle.
#[derive(Clone, Debug, Default)]
pub struct WeakTensor {
    inner: Option<Weak<TensorImpl>>,
}

impl WeakTensor {
    /// True once every strong handle to the implementation has been dropped.
    pub fn is_released(&self) -> bool {
        self.inner.as_ref().map_or(true, |w| w.strong_count() == 0)
    }
}
