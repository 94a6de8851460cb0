/// Axis-aligned box in frame pixel coordinates, corners `(x1, y1)`–`(x2, y2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds a box from YOLO-style center/size values.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
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

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Integer pixel rectangle `(x, y, w, h)` clipped to a `frame_w` × `frame_h`
    /// frame. Returns `None` when nothing of the box is visible.
    pub fn clamped(&self, frame_w: u32, frame_h: u32) -> Option<(i32, i32, u32, u32)> {
        let x1 = self.x1.round().clamp(0.0, frame_w as f32) as i32;
        let y1 = self.y1.round().clamp(0.0, frame_h as f32) as i32;
        let x2 = self.x2.round().clamp(0.0, frame_w as f32) as i32;
        let y2 = self.y2.round().clamp(0.0, frame_h as f32) as i32;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1, y1, (x2 - x1) as u32, (y2 - y1) as u32))
    }
}
