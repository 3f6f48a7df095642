//! CPU raster surface and drawing primitives.
//!
//! All procedural textures in the crate are composed on [`Raster`]
//! buffers: tightly packed RGBA8 with straight (non-premultiplied)
//! alpha, origin at the top-left. The GPU layer uploads them verbatim.
//!
//! # Example
//!
//! ```
//! use stardrift::raster::Raster;
//!
//! let mut r = Raster::new(64, 64);
//! r.fill_disc(32.0, 32.0, 20.0, [255, 102, 255, 255]);
//! assert_eq!(r.get(32, 32)[3], 255);
//! assert_eq!(r.get(1, 1)[3], 0);
//! ```

use glam::Vec2;

/// Linear interpolation between two u8 values.
pub fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t.clamp(0.0, 1.0)) as u8
}

/// An RGBA8 pixel buffer with drawing operations.
#[derive(Debug, Clone)]
pub struct Raster {
    /// Packed RGBA bytes, row-major from the top-left.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Raster {
    /// Create a fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; (width * height * 4) as usize],
            width,
            height,
        }
    }

    /// Create a raster filled with a single color.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut r = Self::new(width, height);
        for px in r.data.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
        r
    }

    /// Wrap an existing RGBA byte buffer. Panics if the length does not
    /// match the dimensions.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Self {
        assert_eq!(data.len(), (width * height * 4) as usize);
        Self {
            data,
            width,
            height,
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        ((y * self.width + x) * 4) as usize
    }

    /// Read a pixel. Out-of-bounds reads return transparent black.
    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Overwrite a pixel. Out-of-bounds writes are ignored.
    pub fn put(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&color);
    }

    /// Source-over blend a pixel onto the buffer.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x >= self.width || y >= self.height || color[3] == 0 {
            return;
        }
        let i = self.index(x, y);
        let sa = color[3] as u32;
        let da = self.data[i + 3] as u32;
        let out_a = sa + da * (255 - sa) / 255;
        if out_a == 0 {
            return;
        }
        for c in 0..3 {
            let sc = color[c] as u32;
            let dc = self.data[i + c] as u32;
            self.data[i + c] = ((sc * sa + dc * da * (255 - sa) / 255) / out_a) as u8;
        }
        self.data[i + 3] = out_a as u8;
    }

    /// Source-over blend an equally sized raster onto this one.
    pub fn composite(&mut self, other: &Raster) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        for y in 0..self.height.min(other.height) {
            for x in 0..self.width.min(other.width) {
                self.blend_pixel(x, y, other.get(x, y));
            }
        }
    }

    /// Fill the whole buffer with a radial gradient centered in the
    /// raster. `stops` pairs a normalized distance in `[0, 1]` with a
    /// color; distances beyond the last stop clamp to it.
    pub fn fill_radial_gradient(&mut self, stops: &[(f32, [u8; 4])]) {
        if stops.is_empty() {
            return;
        }
        let cx = self.width as f32 / 2.0;
        let cy = self.height as f32 / 2.0;
        let max_r = cx.min(cy);
        for y in 0..self.height {
            for x in 0..self.width {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt() / max_r;
                self.put(x, y, sample_stops(stops, d));
            }
        }
    }

    /// Hard-edged filled disc.
    pub fn fill_disc(&mut self, cx: f32, cy: f32, radius: f32, color: [u8; 4]) {
        let (x0, x1, y0, y1) = self.clip_box(cx, cy, radius);
        let r2 = radius * radius;
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    /// Soft-edged blob: full alpha at the center falling off linearly
    /// to zero at `radius`.
    pub fn radial_blob(&mut self, cx: f32, cy: f32, radius: f32, color: [u8; 4]) {
        let (x0, x1, y0, y1) = self.clip_box(cx, cy, radius);
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                if d < radius {
                    let a = (color[3] as f32 * (1.0 - d / radius)) as u8;
                    self.blend_pixel(x, y, [color[0], color[1], color[2], a]);
                }
            }
        }
    }

    /// Ring outline of the given stroke width.
    pub fn fill_ring(&mut self, cx: f32, cy: f32, radius: f32, stroke: f32, color: [u8; 4]) {
        let outer = radius + stroke / 2.0;
        let inner = (radius - stroke / 2.0).max(0.0);
        let (x0, x1, y0, y1) = self.clip_box(cx, cy, outer);
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt();
                if d >= inner && d <= outer {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    /// Stroke a cubic Bezier by stamping discs along sampled points.
    /// Stamps accumulate into a mask first so overlapping samples do
    /// not double-blend.
    pub fn stroke_bezier(&mut self, pts: [Vec2; 4], stroke: f32, color: [u8; 4]) {
        let mut mask = Raster::new(self.width, self.height);
        let approx = pts[0].distance(pts[1]) + pts[1].distance(pts[2]) + pts[2].distance(pts[3]);
        let steps = (approx as usize).clamp(16, 512);
        let radius = stroke / 2.0;
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            let p = cubic_point(pts, t);
            mask.stamp_disc_max(p.x, p.y, radius, color);
        }
        self.composite(&mask);
    }

    /// Fill a polygon with even-odd scanline rules.
    pub fn fill_polygon(&mut self, pts: &[Vec2], color: [u8; 4]) {
        if pts.len() < 3 {
            return;
        }
        let mut xs = Vec::new();
        for y in 0..self.height {
            let yc = y as f32 + 0.5;
            xs.clear();
            for i in 0..pts.len() {
                let a = pts[i];
                let b = pts[(i + 1) % pts.len()];
                if (a.y <= yc && b.y > yc) || (b.y <= yc && a.y > yc) {
                    xs.push(a.x + (yc - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
            xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            for pair in xs.chunks_exact(2) {
                let x0 = pair[0].max(0.0) as u32;
                let x1 = (pair[1].min(self.width as f32)).max(0.0) as u32;
                for x in x0..x1 {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    /// Letterbox blit of `src` into this raster, clipped to a rounded
    /// rectangle. The source keeps its aspect ratio, is centered on the
    /// shorter axis, and its corners outside `corner_radius` stay
    /// transparent.
    pub fn blit_rounded(&mut self, src: &Raster, corner_radius: f32) {
        if src.width == 0 || src.height == 0 {
            return;
        }
        let dw = self.width as f32;
        let dh = self.height as f32;
        let scale = (dw / src.width as f32).min(dh / src.height as f32);
        let draw_w = src.width as f32 * scale;
        let draw_h = src.height as f32 * scale;
        let off_x = (dw - draw_w) / 2.0;
        let off_y = (dh - draw_h) / 2.0;
        let r = corner_radius.min(draw_w / 2.0).min(draw_h / 2.0);
        for y in 0..self.height {
            for x in 0..self.width {
                let px = x as f32 + 0.5 - off_x;
                let py = y as f32 + 0.5 - off_y;
                if px < 0.0 || py < 0.0 || px >= draw_w || py >= draw_h {
                    continue;
                }
                if !inside_rounded_rect(px, py, draw_w, draw_h, r) {
                    continue;
                }
                let sx = px / scale;
                let sy = py / scale;
                self.put(x, y, src.get(sx as u32, sy as u32));
            }
        }
    }

    /// Separable box blur, `radius` pixels in each direction. Used for
    /// the glow underlays behind band text.
    pub fn box_blur(&mut self, radius: u32) {
        if radius == 0 {
            return;
        }
        let blurred_h = self.blur_axis(radius, true);
        self.data = blurred_h;
        let blurred_v = self.blur_axis(radius, false);
        self.data = blurred_v;
    }

    /// One blur pass along a single axis. A running window sum slides
    /// along each lane, so the cost per pixel is independent of the
    /// radius; windows shrink at the lane edges and divide by the
    /// in-bounds sample count.
    fn blur_axis(&self, radius: u32, horizontal: bool) -> Vec<u8> {
        let mut out = vec![0u8; self.data.len()];
        let (lanes, len) = if horizontal {
            (self.height as usize, self.width as usize)
        } else {
            (self.width as usize, self.height as usize)
        };
        if len == 0 {
            return out;
        }
        let r = radius as usize;
        let stride = self.width as usize;
        for lane in 0..lanes {
            let index = |j: usize| -> usize {
                if horizontal {
                    (lane * stride + j) * 4
                } else {
                    (j * stride + lane) * 4
                }
            };

            let mut acc = [0u64; 4];
            let mut n = 0u64;
            for j in 0..=r.min(len - 1) {
                let i = index(j);
                for c in 0..4 {
                    acc[c] += self.data[i + c] as u64;
                }
                n += 1;
            }

            for j in 0..len {
                let i = index(j);
                for c in 0..4 {
                    out[i + c] = (acc[c] / n) as u8;
                }
                let entering = j + r + 1;
                if entering < len {
                    let i = index(entering);
                    for c in 0..4 {
                        acc[c] += self.data[i + c] as u64;
                    }
                    n += 1;
                }
                if j >= r {
                    let i = index(j - r);
                    for c in 0..4 {
                        acc[c] -= self.data[i + c] as u64;
                    }
                    n -= 1;
                }
            }
        }
        out
    }

    /// Recolor every covered pixel, keeping this raster's alpha. Used
    /// to turn a blurred white text mask into a colored glow.
    pub fn tinted(&self, color: [u8; 3]) -> Raster {
        let mut out = self.clone();
        for px in out.data.chunks_exact_mut(4) {
            px[0] = color[0];
            px[1] = color[1];
            px[2] = color[2];
        }
        out
    }

    fn stamp_disc_max(&mut self, cx: f32, cy: f32, radius: f32, color: [u8; 4]) {
        let (x0, x1, y0, y1) = self.clip_box(cx, cy, radius);
        let r2 = radius * radius;
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    let i = self.index(x, y);
                    if color[3] > self.data[i + 3] {
                        self.data[i..i + 4].copy_from_slice(&color);
                    }
                }
            }
        }
    }

    fn clip_box(&self, cx: f32, cy: f32, radius: f32) -> (u32, u32, u32, u32) {
        let x0 = (cx - radius).floor().max(0.0) as u32;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((cy + radius).ceil().max(0.0) as u32).min(self.height);
        (x0, x1, y0, y1)
    }
}

/// Evaluate a cubic Bezier at `t` (Bernstein form).
pub fn cubic_point(pts: [Vec2; 4], t: f32) -> Vec2 {
    let u = 1.0 - t;
    pts[0] * (u * u * u)
        + pts[1] * (3.0 * u * u * t)
        + pts[2] * (3.0 * u * t * t)
        + pts[3] * (t * t * t)
}

fn sample_stops(stops: &[(f32, [u8; 4])], d: f32) -> [u8; 4] {
    if d <= stops[0].0 {
        return stops[0].1;
    }
    for w in stops.windows(2) {
        let (d0, c0) = w[0];
        let (d1, c1) = w[1];
        if d <= d1 {
            let t = if d1 > d0 { (d - d0) / (d1 - d0) } else { 0.0 };
            return [
                lerp_u8(c0[0], c1[0], t),
                lerp_u8(c0[1], c1[1], t),
                lerp_u8(c0[2], c1[2], t),
                lerp_u8(c0[3], c1[3], t),
            ];
        }
    }
    stops[stops.len() - 1].1
}

fn inside_rounded_rect(x: f32, y: f32, w: f32, h: f32, r: f32) -> bool {
    let cx = x.clamp(r, w - r);
    let cy = y.clamp(r, h - r);
    let dx = x - cx;
    let dy = y - cy;
    dx * dx + dy * dy <= r * r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_u8() {
        assert_eq!(lerp_u8(0, 100, 0.0), 0);
        assert_eq!(lerp_u8(0, 100, 1.0), 100);
        assert_eq!(lerp_u8(0, 100, 0.5), 50);
        assert_eq!(lerp_u8(0, 100, 2.0), 100);
    }

    #[test]
    fn test_blend_opaque_over_transparent() {
        let mut r = Raster::new(4, 4);
        r.blend_pixel(1, 1, [200, 100, 50, 255]);
        assert_eq!(r.get(1, 1), [200, 100, 50, 255]);
    }

    #[test]
    fn test_blend_out_of_bounds_ignored() {
        let mut r = Raster::new(4, 4);
        r.blend_pixel(10, 10, [255, 255, 255, 255]);
        r.put(10, 10, [255, 255, 255, 255]);
        assert!(r.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_radial_gradient_center_and_edge() {
        let mut r = Raster::new(32, 32);
        r.fill_radial_gradient(&[(0.0, [255, 0, 0, 255]), (1.0, [0, 0, 255, 0])]);
        let center = r.get(16, 16);
        assert!(center[0] > 200);
        let edge = r.get(0, 16);
        assert!(edge[3] < 80);
    }

    #[test]
    fn test_rounded_blit_clips_corners() {
        let src = Raster::solid(8, 8, [255, 255, 255, 255]);
        let mut dst = Raster::new(32, 32);
        dst.blit_rounded(&src, 8.0);
        assert_eq!(dst.get(0, 0)[3], 0);
        assert_eq!(dst.get(16, 16)[3], 255);
    }

    #[test]
    fn test_blur_spreads_coverage() {
        let mut r = Raster::new(16, 16);
        r.put(8, 8, [255, 255, 255, 255]);
        r.box_blur(2);
        assert!(r.get(7, 8)[3] > 0);
        assert!(r.get(8, 8)[3] < 255);
    }

    // per-pixel window average, the straightforward O(w*h*r) form the
    // sliding-window pass must agree with
    fn blur_axis_reference(src: &Raster, radius: i64, horizontal: bool) -> Vec<u8> {
        let mut out = vec![0u8; src.data.len()];
        for y in 0..src.height as i64 {
            for x in 0..src.width as i64 {
                let mut acc = [0u64; 4];
                let mut n = 0u64;
                for k in -radius..=radius {
                    let (sx, sy) = if horizontal { (x + k, y) } else { (x, y + k) };
                    if sx < 0 || sy < 0 || sx >= src.width as i64 || sy >= src.height as i64 {
                        continue;
                    }
                    let i = ((sy as u32 * src.width + sx as u32) * 4) as usize;
                    for c in 0..4 {
                        acc[c] += src.data[i + c] as u64;
                    }
                    n += 1;
                }
                let i = ((y as u32 * src.width + x as u32) * 4) as usize;
                for c in 0..4 {
                    out[i + c] = (acc[c] / n) as u8;
                }
            }
        }
        out
    }

    #[test]
    fn test_blur_matches_windowed_average() {
        let mut r = Raster::new(9, 5);
        for (k, px) in r.data.chunks_exact_mut(4).enumerate() {
            let v = ((k * 37) % 251) as u8;
            px[0] = v;
            px[1] = v / 2;
            px[3] = 255 - v;
        }
        for radius in [1u32, 2, 4] {
            assert_eq!(
                r.blur_axis(radius, true),
                blur_axis_reference(&r, radius as i64, true),
                "horizontal radius {radius}"
            );
            assert_eq!(
                r.blur_axis(radius, false),
                blur_axis_reference(&r, radius as i64, false),
                "vertical radius {radius}"
            );
        }
        // a radius wider than the raster averages each full lane
        assert_eq!(r.blur_axis(20, true), blur_axis_reference(&r, 20, true));
        assert_eq!(r.blur_axis(20, false), blur_axis_reference(&r, 20, false));
    }

    #[test]
    fn test_blur_keeps_uniform_raster_uniform() {
        let mut r = Raster::solid(24, 6, [90, 140, 30, 200]);
        r.box_blur(3);
        assert!(r.data.chunks_exact(4).all(|px| px == [90, 140, 30, 200]));
    }

    #[test]
    fn test_cubic_endpoints() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(3.0, 2.0),
            Vec2::new(4.0, 0.0),
        ];
        assert!(cubic_point(pts, 0.0).distance(pts[0]) < 1e-6);
        assert!(cubic_point(pts, 1.0).distance(pts[3]) < 1e-6);
    }
}
