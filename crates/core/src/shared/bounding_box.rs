use serde::{Deserialize, Serialize};

/// Axis-aligned face box in frame pixel coordinates, `(x1, y1)` top-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Integer pixel rectangle, always inside the frame it was clamped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let x1 = self.x1.max(other.x1) as f64;
        let y1 = self.y1.max(other.y1) as f64;
        let x2 = self.x2.min(other.x2) as f64;
        let y2 = self.y2.min(other.y2) as f64;

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let area_a = self.area() as f64;
        let area_b = other.area() as f64;
        inter / (area_a + area_b - inter)
    }

    /// The box truncated to whole pixels and clipped to a `frame_w` x `frame_h` frame.
    pub fn to_pixel_rect(&self, frame_w: u32, frame_h: u32) -> PixelRect {
        clamp_rect(self.x1, self.y1, self.x2, self.y2, frame_w, frame_h)
    }

    /// A square of side `max(width, height) * scale` centred on the box,
    /// clipped to the frame.
    pub fn square_rect(&self, scale: f32, frame_w: u32, frame_h: u32) -> PixelRect {
        let (cx, cy) = self.center();
        let half = self.width().max(self.height()) * scale / 2.0;
        clamp_rect(cx - half, cy - half, cx + half, cy + half, frame_w, frame_h)
    }
}

fn clamp_rect(x1: f32, y1: f32, x2: f32, y2: f32, frame_w: u32, frame_h: u32) -> PixelRect {
    let left = (x1.max(0.0) as u32).min(frame_w);
    let top = (y1.max(0.0) as u32).min(frame_h);
    let right = (x2.max(0.0) as u32).min(frame_w).max(left);
    let bottom = (y2.max(0.0) as u32).min(frame_h).max(top);
    PixelRect {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    }
}
