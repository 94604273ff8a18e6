//! Paired x/y arrays, as produced by a spectrum axis and its intensities.

use serde::{Deserialize, Serialize};

use crate::array::{find_closest_index, ArrayError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XyData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl XyData {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y }
    }

    /// Both arrays non-empty and of equal length
    pub fn check(&self) -> Result<(), ArrayError> {
        if self.x.len() != self.y.len() {
            return Err(ArrayError::LengthMismatch {
                left: self.x.len(),
                right: self.y.len(),
            });
        }
        if self.x.is_empty() {
            return Err(ArrayError::Empty);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

pub fn sort_points_by_x(points: &mut [Point]) {
    points.sort_by(|a, b| a.x.total_cmp(&b.x));
}

// =========================================================================
//  Reduction for display
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReduceOptions {
    /// Defaults to the first x value
    pub from: Option<f64>,
    /// Defaults to the last x value
    pub to: Option<f64>,
    pub nb_points: usize,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            nb_points: 4000,
        }
    }
}

/// Reduce the number of points in `[from, to]` while keeping the noise
/// envelope: every slot contributes its minimum and its maximum.
///
/// `x` must be ascending. Ranges already smaller than `nb_points` are
/// returned unchanged.
pub fn reduce(data: &XyData, options: &ReduceOptions) -> Result<XyData, ArrayError> {
    data.check()?;
    let (x, y) = (&data.x, &data.y);
    let last = x.len() - 1;

    let from = options.from.unwrap_or(x[0]);
    let to = options.to.unwrap_or(x[last]);
    let mut from_index = find_closest_index(x, from).unwrap_or(0);
    let mut to_index = find_closest_index(x, to).unwrap_or(last);
    if from_index > 0 && x[from_index] > from {
        from_index -= 1;
    }
    if to_index < last && x[to_index] < to {
        to_index += 1;
    }
    if to_index < from_index {
        std::mem::swap(&mut from_index, &mut to_index);
    }

    if to_index - from_index < options.nb_points {
        return Ok(XyData::new(
            x[from_index..=to_index].to_vec(),
            y[from_index..=to_index].to_vec(),
        ));
    }

    // each slot emits two points after the first one
    let slots = options.nb_points / 2 + 1;
    let slot = (x[to_index] - x[from_index]) / slots.saturating_sub(1).max(1) as f64;

    let mut new_x = vec![x[from_index]];
    let mut new_y = vec![y[from_index]];
    let mut current_x = x[from_index] + slot;
    let mut min_y = f64::MAX;
    let mut max_y = f64::MIN;
    for i in from_index + 1..=to_index {
        min_y = min_y.min(y[i]);
        max_y = max_y.max(y[i]);

        if x[i] >= current_x || i == to_index {
            new_x.push(current_x - slot / 2.0);
            new_y.push(min_y);
            new_x.push(current_x);
            new_y.push(max_y);
            current_x += slot;
            min_y = f64::MAX;
            max_y = f64::MIN;
        }
    }

    Ok(XyData::new(new_x, new_y))
}

// =========================================================================
//  Local minimum search
// =========================================================================

/// Where to start the downhill walk
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartAt {
    Index(usize),
    /// Point closest to this x value
    X(f64),
}

impl Default for StartAt {
    fn default() -> Self {
        StartAt::Index(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestPoint {
    pub x: f64,
    pub y: f64,
    pub index: usize,
}

/// Walk downhill from the start point until neither neighbour is lower
pub fn min_closest_y_point(data: &XyData, start: StartAt) -> Result<ClosestPoint, ArrayError> {
    data.check()?;
    let (x, y) = (&data.x, &data.y);

    let mut current = match start {
        StartAt::Index(index) if index < x.len() => index,
        StartAt::Index(index) => {
            return Err(ArrayError::IndexOutOfRange {
                index,
                len: x.len(),
            })
        }
        StartAt::X(target) => find_closest_index(x, target).unwrap_or(0),
    };

    loop {
        let min_y = y[current];
        if current > 0 && y[current - 1] < min_y {
            current -= 1;
        } else if current + 1 < x.len() && y[current + 1] < min_y {
            current += 1;
        } else {
            break;
        }
    }

    Ok(ClosestPoint {
        x: x[current],
        y: y[current],
        index: current,
    })
}
