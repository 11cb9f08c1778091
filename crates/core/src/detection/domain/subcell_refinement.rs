//! Recovers a continuous peak position from a heat-map cell and its
//! 4-neighborhood, one independent 1-D fit per axis.

use serde::{Deserialize, Serialize};

use super::heat_map::Neighborhood;

/// Sub-cell refinement strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Refinement {
    /// `(next - prev) / (center + prev + next)`
    #[default]
    Linear,
    /// Vertex of the parabola through `prev, center, next`.
    Quadratic,
}

impl Refinement {
    /// Offset from the peak cell's index, in cells, along x and y.
    pub fn offset(self, n: &Neighborhood) -> (f32, f32) {
        let fit = match self {
            Refinement::Linear => linear_offset,
            Refinement::Quadratic => quadratic_offset,
        };
        (fit(n.left, n.center, n.right), fit(n.up, n.center, n.down))
    }
}

impl std::str::FromStr for Refinement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Refinement::Linear),
            "quadratic" => Ok(Refinement::Quadratic),
            other => Err(format!(
                "refinement must be 'linear' or 'quadratic', got '{other}'"
            )),
        }
    }
}

impl std::fmt::Display for Refinement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Refinement::Linear => write!(f, "linear"),
            Refinement::Quadratic => write!(f, "quadratic"),
        }
    }
}

fn linear_offset(prev: f32, center: f32, next: f32) -> f32 {
    let total = center + prev + next;
    if total <= 0.0 || !total.is_finite() {
        return 0.0;
    }
    (next - prev) / total
}

fn quadratic_offset(prev: f32, center: f32, next: f32) -> f32 {
    let a = 0.5 * next + 0.5 * prev - center;
    let b = 0.5 * next - 0.5 * prev;
    if a == 0.0 {
        return 0.0;
    }
    let offset = -b / (2.0 * a);
    if offset.is_finite() {
        offset
    } else {
        0.0
    }
}
