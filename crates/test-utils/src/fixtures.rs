//! In-memory zarr v2 store fixtures.
//!
//! A `ZarrFixture` collects the objects a zarr v2 store would hold (group and
//! array documents plus encoded chunk files) in a key -> bytes map. Tests load
//! the map into whatever backend they exercise.

use std::collections::BTreeMap;
use std::io::Write;

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression as FlateLevel;
use serde_json::{json, Map, Value};

/// Chunk compressor written into `.zarray` documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Zlib,
    Gzip,
    /// Blosc frames with the memcpy flag, as c-blosc writes them at `clevel` 0
    Blosc,
}

/// Element types the fixture can encode.
pub trait FixtureElement: Copy {
    /// zarr v2 dtype string (little endian)
    const DTYPE: &'static str;

    fn write_le(&self, out: &mut Vec<u8>);

    fn fill_json(fill: Option<Self>) -> Value;
}

impl FixtureElement for f32 {
    const DTYPE: &'static str = "<f4";

    fn write_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn fill_json(fill: Option<Self>) -> Value {
        float_fill_json(fill.map(f64::from))
    }
}

impl FixtureElement for f64 {
    const DTYPE: &'static str = "<f8";

    fn write_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn fill_json(fill: Option<Self>) -> Value {
        float_fill_json(fill)
    }
}

impl FixtureElement for i32 {
    const DTYPE: &'static str = "<i4";

    fn write_le(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn fill_json(fill: Option<Self>) -> Value {
        fill.map(Value::from).unwrap_or(Value::Null)
    }
}

fn float_fill_json(fill: Option<f64>) -> Value {
    match fill {
        None => Value::Null,
        Some(v) if v.is_nan() => json!("NaN"),
        Some(v) if v == f64::INFINITY => json!("Infinity"),
        Some(v) if v == f64::NEG_INFINITY => json!("-Infinity"),
        Some(v) => json!(v),
    }
}

/// Description of an array to add to a fixture.
#[derive(Debug, Clone)]
pub struct ArraySpec {
    pub shape: Vec<usize>,
    pub chunks: Vec<usize>,
    pub dimensions: Option<Vec<String>>,
    pub attributes: Map<String, Value>,
}

impl ArraySpec {
    /// Array chunked as a single chunk.
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            chunks: shape.iter().map(|&s| s.max(1)).collect(),
            dimensions: None,
            attributes: Map::new(),
        }
    }

    pub fn chunks(mut self, chunks: &[usize]) -> Self {
        self.chunks = chunks.to_vec();
        self
    }

    pub fn dims(mut self, names: &[&str]) -> Self {
        self.dimensions = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn attr(mut self, key: &str, value: Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }
}

/// Builder for the objects of a zarr v2 store.
#[derive(Debug, Clone)]
pub struct ZarrFixture {
    files: BTreeMap<String, Vec<u8>>,
    compression: Compression,
    dimension_separator: Option<char>,
}

impl Default for ZarrFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ZarrFixture {
    pub fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            compression: Compression::None,
            dimension_separator: None,
        }
    }

    /// Compressor used for arrays added after this call.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Write `dimension_separator` into arrays added after this call.
    pub fn with_dimension_separator(mut self, separator: char) -> Self {
        self.dimension_separator = Some(separator);
        self
    }

    /// Add a group with attributes at `path` (`""` for the root).
    pub fn group(mut self, path: &str, attributes: Value) -> Self {
        self.put_json(&join(path, ".zgroup"), &json!({"zarr_format": 2}));
        if attributes.as_object().map(|o| !o.is_empty()).unwrap_or(false) {
            self.put_json(&join(path, ".zattrs"), &attributes);
        }
        self
    }

    /// Add an array whose data is given in C order.
    pub fn array<T: FixtureElement>(
        mut self,
        path: &str,
        spec: ArraySpec,
        data: &[T],
        fill: Option<T>,
    ) -> Self {
        let expected: usize = spec.shape.iter().product();
        assert_eq!(expected, data.len(), "fixture data length must match shape");
        assert_eq!(spec.shape.len(), spec.chunks.len(), "chunks rank must match shape");

        let compressor = match self.compression {
            Compression::None => Value::Null,
            Compression::Zlib => json!({"id": "zlib", "level": 1}),
            Compression::Gzip => json!({"id": "gzip", "level": 1}),
            Compression::Blosc => {
                json!({"id": "blosc", "cname": "lz4", "clevel": 0, "shuffle": 0, "blocksize": 0})
            }
        };
        let mut zarray = json!({
            "zarr_format": 2,
            "shape": spec.shape,
            "chunks": spec.chunks,
            "dtype": T::DTYPE,
            "compressor": compressor,
            "fill_value": T::fill_json(fill),
            "filters": null,
            "order": "C",
        });
        if let Some(sep) = self.dimension_separator {
            zarray["dimension_separator"] = json!(sep.to_string());
        }
        self.put_json(&join(path, ".zarray"), &zarray);

        let mut attrs = spec.attributes.clone();
        if let Some(dims) = &spec.dimensions {
            attrs.insert("_ARRAY_DIMENSIONS".to_string(), json!(dims));
        }
        if !attrs.is_empty() {
            self.put_json(&join(path, ".zattrs"), &Value::Object(attrs));
        }

        let separator = self.dimension_separator.unwrap_or('.');
        for (chunk_coords, bytes) in encode_chunks(&spec.shape, &spec.chunks, data, fill) {
            let key = if chunk_coords.is_empty() {
                "0".to_string()
            } else {
                chunk_coords
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(&separator.to_string())
            };
            let encoded = compress(self.compression, &bytes, std::mem::size_of::<T>());
            self.files.insert(join(path, &key), encoded);
        }
        self
    }

    /// Write a `.zmetadata` document for the group at `group_path` covering every
    /// metadata document below it.
    pub fn consolidate(mut self, group_path: &str) -> Self {
        let prefix = if group_path.is_empty() {
            String::new()
        } else {
            format!("{}/", group_path.trim_matches('/'))
        };
        let mut metadata = Map::new();
        for (key, bytes) in &self.files {
            let Some(relative) = key.strip_prefix(&prefix) else {
                continue;
            };
            let is_doc = [".zgroup", ".zattrs", ".zarray"]
                .iter()
                .any(|doc| relative == *doc || relative.ends_with(&format!("/{}", doc)));
            if !is_doc {
                continue;
            }
            if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
                metadata.insert(relative.to_string(), value);
            }
        }
        let doc = json!({"metadata": metadata, "zarr_consolidated_format": 1});
        self.put_json(&join(group_path, ".zmetadata"), &doc);
        self
    }

    /// Remove per-node documents so only the consolidated document describes the store.
    pub fn without_node_documents(mut self) -> Self {
        self.files.retain(|key, _| {
            !(key.ends_with(".zgroup") || key.ends_with(".zattrs") || key.ends_with(".zarray"))
        });
        self
    }

    /// Insert raw bytes at a key, e.g. a corrupt document.
    pub fn raw(mut self, key: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(key.to_string(), bytes.into());
        self
    }

    /// Remove an object, e.g. to simulate a chunk that was never written.
    pub fn remove(mut self, key: &str) -> Self {
        self.files.remove(key);
        self
    }

    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.files
    }

    pub fn into_files(self) -> BTreeMap<String, Vec<u8>> {
        self.files
    }

    fn put_json(&mut self, key: &str, value: &Value) {
        let bytes = serde_json::to_vec_pretty(value).unwrap_or_default();
        self.files.insert(key.to_string(), bytes);
    }
}

fn join(path: &str, leaf: &str) -> String {
    let path = path.trim_matches('/');
    if path.is_empty() {
        leaf.to_string()
    } else {
        format!("{}/{}", path, leaf)
    }
}

fn compress(compression: Compression, bytes: &[u8], typesize: usize) -> Vec<u8> {
    match compression {
        Compression::None => bytes.to_vec(),
        Compression::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), FlateLevel::fast());
            let _ = encoder.write_all(bytes);
            encoder.finish().unwrap_or_default()
        }
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), FlateLevel::fast());
            let _ = encoder.write_all(bytes);
            encoder.finish().unwrap_or_default()
        }
        Compression::Blosc => blosc_frame(bytes, typesize),
    }
}

/// Blosc 1 frame carrying `bytes` uncompressed.
///
/// Header: format version, codec version, flags, typesize, then little-endian
/// `nbytes`, `blocksize` and `cbytes`.
fn blosc_frame(bytes: &[u8], typesize: usize) -> Vec<u8> {
    const HEADER: u32 = 16;
    const MEMCPYED: u8 = 0x02;
    let nbytes = bytes.len() as u32;

    let mut frame = Vec::with_capacity(bytes.len() + HEADER as usize);
    frame.extend_from_slice(&[2, 1, MEMCPYED, typesize as u8]);
    frame.extend_from_slice(&nbytes.to_le_bytes());
    frame.extend_from_slice(&nbytes.to_le_bytes());
    frame.extend_from_slice(&(nbytes + HEADER).to_le_bytes());
    frame.extend_from_slice(bytes);
    frame
}

/// Split C-order data into full-size (edge padded) C-order chunks.
fn encode_chunks<T: FixtureElement>(
    shape: &[usize],
    chunks: &[usize],
    data: &[T],
    fill: Option<T>,
) -> Vec<(Vec<usize>, Vec<u8>)> {
    let ndim = shape.len();
    if ndim == 0 {
        let mut bytes = Vec::new();
        data[0].write_le(&mut bytes);
        return vec![(vec![], bytes)];
    }
    let grid: Vec<usize> = shape
        .iter()
        .zip(chunks)
        .map(|(&s, &c)| s.div_ceil(c.max(1)))
        .collect();
    let array_strides = strides(shape);
    let chunk_len: usize = chunks.iter().product();
    let pad = fill.unwrap_or(data[0]);

    let mut out = Vec::new();
    let mut chunk_coords = vec![0usize; ndim];
    if grid.iter().any(|&g| g == 0) {
        return out;
    }
    loop {
        let mut bytes = Vec::new();
        let mut local = vec![0usize; ndim];
        for _ in 0..chunk_len {
            let mut inside = true;
            let mut flat = 0;
            for d in 0..ndim {
                let global = chunk_coords[d] * chunks[d] + local[d];
                if global >= shape[d] {
                    inside = false;
                    break;
                }
                flat += global * array_strides[d];
            }
            let value = if inside { data[flat] } else { pad };
            value.write_le(&mut bytes);
            increment(&mut local, chunks);
        }
        out.push((chunk_coords.clone(), bytes));
        if !increment(&mut chunk_coords, &grid) {
            break;
        }
    }
    out
}

fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

/// Odometer increment; returns false after wrapping past the last position.
fn increment(index: &mut [usize], bounds: &[usize]) -> bool {
    for d in (0..index.len()).rev() {
        index[d] += 1;
        if index[d] < bounds[d] {
            return true;
        }
        index[d] = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_writes_documents_and_chunks() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let fixture = ZarrFixture::new().group("", json!({})).array(
            "tas",
            ArraySpec::new(&[3, 4]).chunks(&[2, 3]).dims(&["lat", "lon"]),
            &data,
            Some(f32::NAN),
        );
        let files = fixture.files();
        assert!(files.contains_key(".zgroup"));
        assert!(files.contains_key("tas/.zarray"));
        assert!(files.contains_key("tas/.zattrs"));
        for key in ["tas/0.0", "tas/0.1", "tas/1.0", "tas/1.1"] {
            assert_eq!(files[key].len(), 2 * 3 * 4, "chunk {}", key);
        }
    }

    #[test]
    fn test_edge_chunk_is_padded_with_fill() {
        let data: Vec<i32> = vec![1, 2, 3];
        let fixture =
            ZarrFixture::new().array("x", ArraySpec::new(&[3]).chunks(&[2]), &data, Some(-1));
        let last = &fixture.files()["x/1"];
        assert_eq!(&last[0..4], &3i32.to_le_bytes());
        assert_eq!(&last[4..8], &(-1i32).to_le_bytes());
    }

    #[test]
    fn test_consolidate_collects_documents() {
        let fixture = ZarrFixture::new()
            .group("", json!({"title": "t"}))
            .array("a", ArraySpec::new(&[2]), &[1.0f64, 2.0], None)
            .consolidate("");
        let doc: Value = serde_json::from_slice(&fixture.files()[".zmetadata"]).unwrap();
        let metadata = doc["metadata"].as_object().unwrap();
        assert!(metadata.contains_key(".zgroup"));
        assert!(metadata.contains_key(".zattrs"));
        assert!(metadata.contains_key("a/.zarray"));
        assert!(!metadata.contains_key("a/0"));
    }

    #[test]
    fn test_without_node_documents_keeps_chunks() {
        let fixture = ZarrFixture::new()
            .group("", json!({}))
            .array("a", ArraySpec::new(&[2]), &[1.0f32, 2.0], None)
            .consolidate("")
            .without_node_documents();
        let keys: Vec<_> = fixture.files().keys().cloned().collect();
        assert_eq!(keys, vec![".zmetadata".to_string(), "a/0".to_string()]);
    }

    #[test]
    fn test_blosc_chunks_are_framed() {
        let fixture = ZarrFixture::new()
            .with_compression(Compression::Blosc)
            .array("v", ArraySpec::new(&[2]), &[1.0f64, 2.0], None);
        let files = fixture.files();

        let chunk = &files["v/0"];
        assert_eq!(chunk.len(), 16 + 16);
        assert_eq!(&chunk[..4], &[2, 1, 0x02, 8]);
        assert_eq!(&chunk[16..24], &1.0f64.to_le_bytes());

        let zarray: Value = serde_json::from_slice(&files["v/.zarray"]).unwrap();
        assert_eq!(zarray["compressor"]["id"], "blosc");
    }
}
