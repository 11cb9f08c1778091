use crate::detection::domain::heat_map::HeatMap;
use crate::detection::domain::subcell_refinement::Refinement;
use crate::geometry::domain::coordinates::grid_to_frame;

/// A refined face location from one heat map.
///
/// `grid_x`/`grid_y` are continuous grid coordinates (cell `p` spans
/// `[p, p + 1)`), `frame_x`/`frame_y` the same point in frame pixels,
/// rounded to the nearest pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub grid_x: f64,
    pub grid_y: f64,
    pub frame_x: i32,
    pub frame_y: i32,
    pub confidence: f32,
}

/// Finds the face in a heat map, or `None` if the strongest cell does not
/// strictly exceed `threshold`.
pub fn locate(
    heat_map: &HeatMap,
    factor: u32,
    threshold: f32,
    refinement: Refinement,
) -> Option<Detection> {
    let peak = heat_map.peak()?;
    if peak.value <= threshold {
        return None;
    }

    let (ax, ay) = refinement.offset(&heat_map.neighborhood(peak.x, peak.y));
    let cell_x = peak.x as f64 + ax as f64;
    let cell_y = peak.y as f64 + ay as f64;
    let (frame_x, frame_y) = grid_to_frame(cell_x, cell_y, factor);

    Some(Detection {
        grid_x: cell_x + 0.5,
        grid_y: cell_y + 0.5,
        frame_x: frame_x.round() as i32,
        frame_y: frame_y.round() as i32,
        confidence: peak.value,
    })
}
