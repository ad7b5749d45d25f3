//! Hyperslab selections.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Per-axis selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// A single index; the axis is dropped from the result shape.
    Index(usize),
    /// Every index along the axis.
    All,
    /// `start..stop` with a positive `step`.
    Range { start: usize, stop: usize, step: usize },
}

impl Selection {
    pub fn range(start: usize, stop: usize) -> Self {
        Selection::Range { start, stop, step: 1 }
    }

    pub fn strided(start: usize, stop: usize, step: usize) -> Self {
        Selection::Range { start, stop, step }
    }

    /// Source indices along an axis of length `len`.
    fn resolve(&self, axis: usize, len: usize) -> Result<Vec<usize>> {
        match *self {
            Selection::Index(i) if i < len => Ok(vec![i]),
            Selection::Index(i) => Err(StoreError::invalid_selection(format!(
                "index {} out of range for axis {} of length {}",
                i, axis, len
            ))),
            Selection::All => Ok((0..len).collect()),
            Selection::Range { step: 0, .. } => Err(StoreError::invalid_selection(format!(
                "zero step on axis {}",
                axis
            ))),
            Selection::Range { start, stop, step } => {
                if start > stop || stop > len {
                    return Err(StoreError::invalid_selection(format!(
                        "range {}..{} out of bounds for axis {} of length {}",
                        start, stop, axis, len
                    )));
                }
                Ok((start..stop).step_by(step).collect())
            }
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Index(i) => write!(f, "{}", i),
            Selection::All => write!(f, ":"),
            Selection::Range { start, stop, step: 1 } => write!(f, "{}:{}", start, stop),
            Selection::Range { start, stop, step } => write!(f, "{}:{}:{}", start, stop, step),
        }
    }
}

impl From<Option<usize>> for Selection {
    fn from(index: Option<usize>) -> Self {
        match index {
            Some(i) => Selection::Index(i),
            None => Selection::All,
        }
    }
}

/// Canonical text form of a selection list, used in cache keys.
pub fn selection_key(selection: &[Selection]) -> String {
    selection
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// A validated selection against a concrete array shape.
#[derive(Debug, Clone)]
pub struct ReadPlan {
    axes: Vec<Vec<usize>>,
    keep: Vec<bool>,
}

impl ReadPlan {
    pub fn new(selection: &[Selection], shape: &[usize]) -> Result<Self> {
        if selection.len() != shape.len() {
            return Err(StoreError::invalid_selection(format!(
                "selection of rank {} for array of rank {}",
                selection.len(),
                shape.len()
            )));
        }
        let axes = selection
            .iter()
            .zip(shape)
            .enumerate()
            .map(|(axis, (sel, &len))| sel.resolve(axis, len))
            .collect::<Result<Vec<_>>>()?;
        let keep = selection
            .iter()
            .map(|sel| !matches!(sel, Selection::Index(_)))
            .collect();
        Ok(Self { axes, keep })
    }

    /// Shape of the result, index axes dropped.
    pub fn output_shape(&self) -> Vec<usize> {
        self.axes
            .iter()
            .zip(&self.keep)
            .filter(|(_, keep)| **keep)
            .map(|(indices, _)| indices.len())
            .collect()
    }

    pub fn output_len(&self) -> usize {
        self.axes.iter().map(Vec::len).product()
    }

    /// Start and extent of the smallest box enclosing the selection, per axis.
    pub fn bounding_box(&self) -> (Vec<u64>, Vec<u64>) {
        self.axes
            .iter()
            .map(|indices| match (indices.first(), indices.last()) {
                (Some(&first), Some(&last)) => (first as u64, (last - first + 1) as u64),
                _ => (0, 0),
            })
            .unzip()
    }

    /// Row-major positions of the selected elements inside the bounding box,
    /// or `None` when every element of the box is selected.
    pub fn gather_indices(&self) -> Option<Vec<usize>> {
        let (_, extents) = self.bounding_box();
        let extents: Vec<usize> = extents.into_iter().map(|e| e as usize).collect();
        if self.axes.iter().zip(&extents).all(|(indices, &e)| indices.len() == e) {
            return None;
        }
        if self.output_len() == 0 {
            return Some(Vec::new());
        }

        let strides = row_major_strides(&extents);
        let mut positions = Vec::with_capacity(self.output_len());
        let mut cursor = vec![0usize; self.axes.len()];
        loop {
            positions.push(
                cursor
                    .iter()
                    .zip(&self.axes)
                    .zip(&strides)
                    .map(|((&c, indices), &stride)| (indices[c] - indices[0]) * stride)
                    .sum::<usize>(),
            );
            if !advance(&mut cursor, |axis| self.axes[axis].len()) {
                break;
            }
        }
        Some(positions)
    }
}

/// Row-major odometer step; returns false once every combination was visited.
fn advance(cursor: &mut [usize], len: impl Fn(usize) -> usize) -> bool {
    for axis in (0..cursor.len()).rev() {
        cursor[axis] += 1;
        if cursor[axis] < len(axis) {
            return true;
        }
        cursor[axis] = 0;
    }
    false
}

fn row_major_strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; dims.len()];
    for i in (0..dims.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * dims[i + 1];
    }
    strides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_shape_drops_index_axes() {
        let plan = ReadPlan::new(
            &[Selection::Index(3), Selection::All, Selection::strided(0, 10, 3)],
            &[12, 5, 10],
        )
        .unwrap();
        assert_eq!(plan.output_shape(), vec![5, 4]);
        assert_eq!(plan.output_len(), 20);
    }

    #[test]
    fn test_invalid_selections() {
        assert!(ReadPlan::new(&[Selection::All], &[2, 2]).is_err());
        assert!(ReadPlan::new(&[Selection::Index(2)], &[2]).is_err());
        assert!(ReadPlan::new(&[Selection::strided(0, 2, 0)], &[2]).is_err());
        assert!(ReadPlan::new(&[Selection::range(1, 3)], &[2]).is_err());
        assert!(ReadPlan::new(&[Selection::range(2, 1)], &[2]).is_err());
    }

    #[test]
    fn test_contiguous_selection_needs_no_gather() {
        let plan = ReadPlan::new(&[Selection::range(3, 5), Selection::Index(9)], &[10, 10]).unwrap();
        assert_eq!(plan.bounding_box(), (vec![3, 9], vec![2, 1]));
        assert_eq!(plan.gather_indices(), None);
    }

    #[test]
    fn test_strided_selection_gathers_from_box() {
        // rows 1 and 3 of a 2..=3 column band
        let plan = ReadPlan::new(&[Selection::strided(1, 4, 2), Selection::range(2, 4)], &[4, 6]).unwrap();
        assert_eq!(plan.bounding_box(), (vec![1, 2], vec![3, 2]));
        assert_eq!(plan.gather_indices(), Some(vec![0, 1, 4, 5]));

        // a step that overshoots the stop keeps only the first index
        let plan = ReadPlan::new(&[Selection::strided(2, 4, 5)], &[8]).unwrap();
        assert_eq!(plan.bounding_box(), (vec![2], vec![1]));
        assert_eq!(plan.gather_indices(), None);
    }

    #[test]
    fn test_scalar_and_empty_selections() {
        let scalar = ReadPlan::new(&[], &[]).unwrap();
        assert_eq!(scalar.output_len(), 1);
        assert_eq!(scalar.bounding_box(), (vec![], vec![]));

        let empty = ReadPlan::new(&[Selection::range(2, 2)], &[4]).unwrap();
        assert_eq!(empty.output_shape(), vec![0]);
        assert_eq!(empty.output_len(), 0);
    }

    #[test]
    fn test_selection_key() {
        let key = selection_key(&[Selection::Index(0), Selection::All, Selection::strided(1, 9, 2)]);
        assert_eq!(key, "0,:,1:9:2");
    }
}
