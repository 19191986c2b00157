//! The "smooth and zoom" fly curve.
//!
//! Closed-form optimal path of van Wijk and Nuij, in the parameterisation
//! used by web map renderers for their fly animation. The camera zooms out,
//! pans and zooms back in; `w(s)` is the visible span relative to the start
//! and `u(s)` the fraction of the ground distance covered.

use crate::coord::{project_world, world_size};
use crate::host::Viewport;

use super::pose::CameraPose;

/// Pixel distances below this are treated as "no pan".
const MIN_PATH_LENGTH: f64 = 2e-6;

/// Precomputed fly curve between two poses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyCurve {
    start_zoom: f64,
    rho: f64,
    w0: f64,
    u1: f64,
    r0: f64,
    length: f64,
    /// `Some(sign)` when the path degenerates to a pure zoom.
    pure_zoom: Option<f64>,
}

impl FlyCurve {
    /// Builds the curve from `start` to `end` for a viewport.
    ///
    /// `rho` is the curve parameter. When `min_zoom` is given and the
    /// centers differ, `rho` is recomputed so the highest point of the
    /// curve sits at `min_zoom`.
    pub fn new(
        start: &CameraPose,
        end: &CameraPose,
        viewport: &Viewport,
        rho: f64,
        min_zoom: Option<f64>,
    ) -> Self {
        let w0 = viewport.max_side().max(1.0);
        let w1 = w0 / (end.zoom - start.zoom).exp2();

        let ws = world_size(viewport.tile_size, start.zoom);
        let (x0, y0) = project_world(start.center.lng, start.center.lat, ws);
        let (x1, y1) = project_world(end.center.lng, end.center.lat, ws);
        let u1 = (x1 - x0).hypot(y1 - y0);

        let mut rho = rho;
        if let Some(min_zoom) = min_zoom {
            if u1.abs() >= MIN_PATH_LENGTH {
                let min_zoom = min_zoom.min(start.zoom).min(end.zoom);
                let w_max = w0 / (min_zoom - start.zoom).exp2();
                rho = (2.0 * w_max / u1).sqrt();
            }
        }
        let rho2 = rho * rho;

        let zoom_out_factor = |descent: bool| {
            let sign = if descent { -1.0 } else { 1.0 };
            let wi = if descent { w1 } else { w0 };
            let b = (w1 * w1 - w0 * w0 + sign * rho2 * rho2 * u1 * u1) / (2.0 * wi * rho2 * u1);
            ((b * b + 1.0).sqrt() - b).ln()
        };

        let r0 = zoom_out_factor(false);
        let length = (zoom_out_factor(true) - r0) / rho;

        if u1.abs() < MIN_PATH_LENGTH || !length.is_finite() {
            let sign = if w1 < w0 { -1.0 } else { 1.0 };
            return Self {
                start_zoom: start.zoom,
                rho,
                w0,
                u1,
                r0,
                length: (w1 / w0).ln().abs() / rho,
                pure_zoom: Some(sign),
            };
        }

        Self {
            start_zoom: start.zoom,
            rho,
            w0,
            u1,
            r0,
            length,
            pure_zoom: None,
        }
    }

    /// Total path length `S` in curve units.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Effective curve parameter after any `min_zoom` adjustment.
    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Whether the centers coincide and the path is a pure zoom.
    pub fn is_pure_zoom(&self) -> bool {
        self.pure_zoom.is_some()
    }

    /// Visible span at `s`, relative to the start span.
    pub fn width(&self, s: f64) -> f64 {
        match self.pure_zoom {
            Some(sign) => (sign * self.rho * s).exp(),
            None => self.r0.cosh() / (self.r0 + self.rho * s).cosh(),
        }
    }

    /// Fraction of the ground distance covered at `s`.
    pub fn progress(&self, s: f64) -> f64 {
        match self.pure_zoom {
            Some(_) => 0.0,
            None => {
                let rho2 = self.rho * self.rho;
                let r0 = self.r0;
                self.w0 * ((r0.cosh() * (r0 + self.rho * s).tanh() - r0.sinh()) / rho2) / self.u1
            }
        }
    }

    /// Zoom level at animation fraction `k` in `[0, 1]`.
    pub fn zoom_at(&self, k: f64) -> f64 {
        let scale = 1.0 / self.width(k * self.length);
        self.start_zoom + scale.log2()
    }

    /// Lowest zoom level reached along the path.
    pub fn peak_zoom_out(&self) -> f64 {
        let mut candidates = vec![0.0, self.length];
        if self.pure_zoom.is_none() && self.rho > 0.0 {
            // w(s) peaks where r0 + rho * s crosses zero.
            let s_peak = -self.r0 / self.rho;
            if s_peak > 0.0 && s_peak < self.length {
                candidates.push(s_peak);
            }
        }
        candidates
            .into_iter()
            .map(|s| self.width(s))
            .filter(|w| w.is_finite() && *w > 0.0)
            .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |a| a.max(w))))
            .map_or(self.start_zoom, |w| self.start_zoom - w.log2())
    }
}
