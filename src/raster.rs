//! Software RGBA drawing surface.
//!
//! [`PixelCanvas`] rasterizes projected paths into an in-memory buffer that
//! a host can upload as an egui texture. Fills use the even-odd rule so that
//! holes and limb-closed rings come out right; strokes are drawn by distance
//! to each segment. Pixels are blended source-over.

use crate::geo::ScreenPath;
use crate::render::DrawSurface;
use crate::viewport::Viewport;
use eframe::egui::{Color32, ColorImage, Pos2};

/// An RGBA pixel buffer implementing [`DrawSurface`].
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    host: Viewport,
    size: Viewport,
    /// Unmultiplied RGBA, row-major
    pixels: Vec<[u8; 4]>,
}

impl PixelCanvas {
    pub fn new(host: Viewport) -> Self {
        Self {
            host,
            size: Viewport::default(),
            pixels: Vec::new(),
        }
    }

    /// Records the size of the area the canvas is shown in.
    pub fn set_host_size(&mut self, host: Viewport) {
        self.host = host;
    }

    /// Pixel at `(x, y)` as unmultiplied RGBA.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.size.width as usize + x as usize)
            .copied()
    }

    /// Copies the buffer into an image egui can load as a texture.
    pub fn to_color_image(&self) -> ColorImage {
        let bytes: Vec<u8> = self.pixels.iter().flatten().copied().collect();
        ColorImage::from_rgba_unmultiplied(
            [self.size.width as usize, self.size.height as usize],
            &bytes,
        )
    }

    fn blend_mask(&mut self, mask: &[bool], color: Color32) {
        let src = color.to_srgba_unmultiplied();
        if src[3] == 0 {
            return;
        }
        for (pixel, _) in self.pixels.iter_mut().zip(mask).filter(|(_, m)| **m) {
            *pixel = blend(*pixel, src);
        }
    }

    fn mask(&self) -> Vec<bool> {
        vec![false; self.pixels.len()]
    }
}

/// Source-over blend of unmultiplied RGBA.
fn blend(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    if src[3] == 255 {
        return src;
    }
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        out[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    out
}

/// Segments of a ring, closing it when `closed`.
fn segments(ring: &[Pos2], closed: bool) -> impl Iterator<Item = (Pos2, Pos2)> + '_ {
    let closing = match (closed, ring.first(), ring.last()) {
        (true, Some(first), Some(last)) if ring.len() > 2 && first != last => Some((*last, *first)),
        _ => None,
    };
    ring.windows(2).map(|w| (w[0], w[1])).chain(closing)
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

impl DrawSurface for PixelCanvas {
    fn host_size(&self) -> Viewport {
        self.host
    }

    fn size(&self) -> Viewport {
        self.size
    }

    fn set_size(&mut self, size: Viewport) {
        if size != self.size {
            log::debug!("Resizing canvas to {}x{}", size.width, size.height);
        }
        self.size = size;
        self.pixels = vec![[0; 4]; size.width as usize * size.height as usize];
    }

    fn clear(&mut self) {
        self.pixels.fill([0; 4]);
    }

    fn fill(&mut self, path: &ScreenPath, color: Color32) {
        let (width, height) = (self.size.width as usize, self.size.height as usize);
        let mut mask = self.mask();
        let mut crossings: Vec<f32> = Vec::new();

        for row in 0..height {
            let sy = row as f32 + 0.5;
            crossings.clear();
            for ring in &path.rings {
                for (a, b) in segments(ring, true) {
                    if (a.y > sy) != (b.y > sy) {
                        crossings.push(a.x + (sy - a.y) * (b.x - a.x) / (b.y - a.y));
                    }
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0) as usize;
                let end = ((span[1] - 0.5).ceil().max(0.0) as usize).min(width);
                for col in start..end {
                    mask[row * width + col] = true;
                }
            }
        }

        self.blend_mask(&mask, color);
    }

    fn stroke(&mut self, path: &ScreenPath, color: Color32, width: f32) {
        let (w, h) = (self.size.width as i64, self.size.height as i64);
        let radius = (width / 2.0).max(0.5);
        let mut mask = self.mask();

        for ring in &path.rings {
            for (a, b) in segments(ring, path.closed) {
                let x0 = ((a.x.min(b.x) - radius).floor() as i64).max(0);
                let x1 = ((a.x.max(b.x) + radius).ceil() as i64).min(w - 1);
                let y0 = ((a.y.min(b.y) - radius).floor() as i64).max(0);
                let y1 = ((a.y.max(b.y) + radius).ceil() as i64).min(h - 1);

                for y in y0..=y1 {
                    for x in x0..=x1 {
                        let centre = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
                        if distance_to_segment(centre, a, b) <= radius {
                            mask[(y * w + x) as usize] = true;
                        }
                    }
                }
            }
        }

        self.blend_mask(&mask, color);
    }
}
