//! Typed result buffers.

use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs_storage::store::MemoryStore;

use crate::error::{Result, StoreError};

/// Element storage, one variant per supported dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferData {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Applies `$body` to the vector inside any numeric variant; `$bool` handles `Bool`.
macro_rules! dispatch {
    ($data:expr, $v:ident => $body:expr, $b:ident => $bool:expr) => {
        match $data {
            BufferData::Bool($b) => $bool,
            BufferData::Int8($v) => $body,
            BufferData::UInt8($v) => $body,
            BufferData::Int16($v) => $body,
            BufferData::UInt16($v) => $body,
            BufferData::Int32($v) => $body,
            BufferData::UInt32($v) => $body,
            BufferData::Int64($v) => $body,
            BufferData::UInt64($v) => $body,
            BufferData::Float32($v) => $body,
            BufferData::Float64($v) => $body,
        }
    };
}

/// Expands `$make!(Variant, element type)` for every supported zarrs data type.
macro_rules! by_data_type {
    ($data_type:expr, $make:ident) => {
        match $data_type {
            DataType::Bool => $make!(Bool, bool),
            DataType::Int8 => $make!(Int8, i8),
            DataType::UInt8 => $make!(UInt8, u8),
            DataType::Int16 => $make!(Int16, i16),
            DataType::UInt16 => $make!(UInt16, u16),
            DataType::Int32 => $make!(Int32, i32),
            DataType::UInt32 => $make!(UInt32, u32),
            DataType::Int64 => $make!(Int64, i64),
            DataType::UInt64 => $make!(UInt64, u64),
            DataType::Float32 => $make!(Float32, f32),
            DataType::Float64 => $make!(Float64, f64),
            other => return Err(StoreError::unsupported(format!("data type {:?}", other))),
        }
    };
}

impl BufferData {
    /// An empty buffer of `data_type`; fails for types this store does not expose.
    pub fn empty(data_type: &DataType) -> Result<Self> {
        macro_rules! empty {
            ($variant:ident, $ty:ty) => {
                BufferData::$variant(Vec::<$ty>::new())
            };
        }
        Ok(by_data_type!(data_type, empty))
    }

    /// Decode `subset` of `array`, row-major.
    ///
    /// Blocking: runs the codec chain of every intersecting chunk.
    pub(crate) fn retrieve(array: &Array<MemoryStore>, subset: &ArraySubset) -> Result<Self> {
        macro_rules! elements {
            ($variant:ident, $ty:ty) => {
                BufferData::$variant(
                    array
                        .retrieve_array_subset_elements::<$ty>(subset)
                        .map_err(|e| StoreError::Decode(e.to_string()))?,
                )
            };
        }
        Ok(by_data_type!(array.data_type(), elements))
    }

    /// The elements at `indices`, in that order.
    pub(crate) fn gather(&self, indices: &[usize]) -> Self {
        macro_rules! pick {
            ($variant:ident, $v:expr) => {
                BufferData::$variant(indices.iter().map(|&i| $v[i]).collect())
            };
        }
        match self {
            BufferData::Bool(v) => pick!(Bool, v),
            BufferData::Int8(v) => pick!(Int8, v),
            BufferData::UInt8(v) => pick!(UInt8, v),
            BufferData::Int16(v) => pick!(Int16, v),
            BufferData::UInt16(v) => pick!(UInt16, v),
            BufferData::Int32(v) => pick!(Int32, v),
            BufferData::UInt32(v) => pick!(UInt32, v),
            BufferData::Int64(v) => pick!(Int64, v),
            BufferData::UInt64(v) => pick!(UInt64, v),
            BufferData::Float32(v) => pick!(Float32, v),
            BufferData::Float64(v) => pick!(Float64, v),
        }
    }

    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len(), b => b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_f64(&self, index: usize) -> Option<f64> {
        dispatch!(
            self,
            v => v.get(index).map(|&x| x as f64),
            b => b.get(index).map(|&x| if x { 1.0 } else { 0.0 })
        )
    }

    pub fn to_f64(&self) -> Vec<f64> {
        dispatch!(
            self,
            v => v.iter().map(|&x| x as f64).collect(),
            b => b.iter().map(|&x| if x { 1.0 } else { 0.0 }).collect()
        )
    }

    pub fn to_f32(&self) -> Vec<f32> {
        dispatch!(
            self,
            v => v.iter().map(|&x| x as f32).collect(),
            b => b.iter().map(|&x| if x { 1.0 } else { 0.0 }).collect()
        )
    }
}

/// Result of a selection read: row-major data plus its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedBuffer {
    pub shape: Vec<usize>,
    pub data: BufferData,
}

impl TypedBuffer {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get_f64(&self, index: usize) -> Option<f64> {
        self.data.get_f64(index)
    }

    pub fn to_f64(&self) -> Vec<f64> {
        self.data.to_f64()
    }

    pub fn to_f32(&self) -> Vec<f32> {
        self.data.to_f32()
    }
}
