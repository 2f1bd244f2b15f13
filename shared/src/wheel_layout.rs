use serde::{Deserialize, Serialize};

/// Labels sit at this fraction of the radius, measured from the centre.
pub const LABEL_RADIUS_RATIO: f64 = 0.7;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Geometry of one wedge. Angles are degrees clockwise from 12 o'clock.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SliceGeometry {
    pub index: usize,
    pub start_angle: f64,
    pub end_angle: f64,
    pub start: Point,
    pub end: Point,
    pub large_arc: bool,
    pub label_anchor: Point,
    pub label_rotation: f64,
    pub path: String,
}

/// Vector layout of a wheel with `n` equal slices, centred at `(radius, radius)`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WheelLayout {
    pub radius: f64,
    pub center: Point,
    pub slices: Vec<SliceGeometry>,
}

/// Point on a circle for a clock angle. The -90 shifts 12 o'clock onto the maths x-axis.
pub fn point_on_circle(center: Point, radius: f64, clock_degrees: f64) -> Point {
    let radians = (clock_degrees - 90.0).to_radians();
    Point {
        x: center.x + radius * radians.cos(),
        y: center.y + radius * radians.sin(),
    }
}

// An arc whose endpoints coincide draws nothing, so the whole disc is two half arcs.
fn full_disc_path(center: Point, radius: f64) -> String {
    let top = point_on_circle(center, radius, 0.0);
    let bottom = point_on_circle(center, radius, 180.0);
    format!(
        "M {:.2} {:.2} A {r:.2} {r:.2} 0 1 1 {:.2} {:.2} A {r:.2} {r:.2} 0 1 1 {:.2} {:.2} Z",
        top.x,
        top.y,
        bottom.x,
        bottom.y,
        top.x,
        top.y,
        r = radius,
    )
}

impl WheelLayout {
    pub fn new(slice_count: usize, radius: f64) -> Self {
        let center = Point { x: radius, y: radius };
        let width = if slice_count == 0 { 0.0 } else { 360.0 / slice_count as f64 };

        let slices = (0..slice_count)
            .map(|index| {
                let start_angle = index as f64 * width;
                let end_angle = (index + 1) as f64 * width;
                let start = point_on_circle(center, radius, start_angle);
                let end = point_on_circle(center, radius, end_angle);
                let large_arc = end_angle - start_angle > 180.0;

                let label_rotation = (start_angle + end_angle) / 2.0;
                let label_anchor = point_on_circle(center, radius * LABEL_RADIUS_RATIO, label_rotation);

                let path = if slice_count == 1 {
                    full_disc_path(center, radius)
                } else {
                    format!(
                        "M {:.2} {:.2} L {:.2} {:.2} A {:.2} {:.2} 0 {} 1 {:.2} {:.2} Z",
                        center.x,
                        center.y,
                        start.x,
                        start.y,
                        radius,
                        radius,
                        if large_arc { 1 } else { 0 },
                        end.x,
                        end.y,
                    )
                };

                SliceGeometry {
                    index,
                    start_angle,
                    end_angle,
                    start,
                    end,
                    large_arc,
                    label_anchor,
                    label_rotation,
                    path,
                }
            })
            .collect();

        Self { radius, center, slices }
    }
}
