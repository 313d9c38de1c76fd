//! Visibility Gate
//!
//! Turns intersection measurements into visible/hidden transitions so
//! off-screen videos stop decoding.

/// Default fraction of the element that must be on screen
pub const DEFAULT_THRESHOLD: f32 = 0.1;

/// DOM rect
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 { self.x + self.width }
    pub fn bottom(&self) -> f32 { self.y + self.height }

    /// Calculate intersection with another rect
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right > x && bottom > y {
            Some(Rect {
                x,
                y,
                width: right - x,
                height: bottom - y,
            })
        } else {
            None
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Fraction of `target` inside `viewport`, in `0.0..=1.0`
pub fn intersection_ratio(target: &Rect, viewport: &Rect) -> f32 {
    if target.area() <= 0.0 {
        return 0.0;
    }
    target
        .intersect(viewport)
        .map(|i| (i.area() / target.area()).clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

/// Single-target intersection observer with one threshold.
#[derive(Debug, Clone)]
pub struct VisibilityGate {
    threshold: f32,
    last_ratio: Option<f32>,
    observing: bool,
}

impl VisibilityGate {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            last_ratio: None,
            observing: true,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Report a new intersection ratio.
    ///
    /// Returns `Some(visible)` on the first report and whenever the
    /// ratio crosses the threshold, `None` otherwise.
    pub fn observe(&mut self, ratio: f32) -> Option<bool> {
        if !self.observing {
            return None;
        }
        let visible = self.is_visible_at(ratio);
        let changed = match self.last_ratio {
            Some(last) => self.is_visible_at(last) != visible,
            None => true,
        };
        self.last_ratio = Some(ratio);
        changed.then_some(visible)
    }

    /// Measure `target` against `viewport` and report
    pub fn observe_rects(&mut self, target: &Rect, viewport: &Rect) -> Option<bool> {
        self.observe(intersection_ratio(target, viewport))
    }

    /// Last reported visibility, if any report arrived yet
    pub fn is_visible(&self) -> Option<bool> {
        self.last_ratio.map(|r| self.is_visible_at(r))
    }

    /// Stop reacting to measurements
    pub fn disconnect(&mut self) {
        self.observing = false;
        self.last_ratio = None;
    }

    fn is_visible_at(&self, ratio: f32) -> bool {
        if self.threshold == 0.0 {
            ratio > 0.0
        } else {
            ratio >= self.threshold
        }
    }
}

impl Default for VisibilityGate {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
