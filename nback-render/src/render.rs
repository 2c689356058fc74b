use ab_glyph::{point, Font, FontRef, Glyph, PxScale, ScaleFont};
use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use log::debug;
use nback_cache::{get_text, intern_text, text_count, Atom};
use nback_core::{Phase, StimulusSet, TaskView};
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::{Color, IntSize, Pixmap, PremultipliedColorU8};

/// Stimuli are presented at a fixed square size regardless of source.
const STIMULUS_SIZE: u32 = 200;
const HEADLINE_PX: f32 = 48.0;
const HUD_PX: f32 = 24.0;
/// Score labels pre-rendered at startup; higher scores render on demand.
const SCORE_WARM_LIMIT: u32 = 64;
const COUNTDOWN_WARM_LIMIT: u32 = 10;

const COMPLETE_MESSAGE: &str = "Well done. You have completed the task!";

fn load_font() -> Result<FontRef<'static>> {
    FontRef::try_from_slice(include_bytes!("../../assets/DejaVuSans.ttf"))
        .map_err(|e| anyhow!("font load failed: {}", e))
}

/// Rasterized labels keyed by interned atom, rendered once per label.
struct TextCache {
    size_px: f32,
    map: HashMap<Atom, Arc<Pixmap>>,
}

impl TextCache {
    fn new(size_px: f32) -> Self {
        Self {
            size_px,
            map: HashMap::new(),
        }
    }

    fn get_or_render(&mut self, font: &FontRef<'static>, text: &str) -> Arc<Pixmap> {
        self.get_or_render_atom(font, Atom::from(text))
    }

    fn get_or_render_atom(&mut self, font: &FontRef<'static>, atom: Atom) -> Arc<Pixmap> {
        if let Some(pixmap) = self.map.get(&atom) {
            return Arc::clone(pixmap);
        }
        let pixmap = Arc::new(render_text_pixmap(
            atom.as_ref(),
            self.size_px,
            font,
            Color::WHITE,
        ));
        self.map.insert(atom, Arc::clone(&pixmap));
        pixmap
    }
}

/// Lays out and rasterizes one line of text into a premultiplied pixmap
/// sized to the glyph bounds.
pub fn render_text_pixmap(text: &str, size_px: f32, font: &FontRef<'static>, color: Color) -> Pixmap {
    let scale = PxScale::from(size_px);
    let scaled = font.as_scaled(scale);

    let mut glyphs: Vec<Glyph> = Vec::with_capacity(text.len());
    let mut pen_x = 0.0f32;
    let mut previous = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = previous {
            pen_x += scaled.kern(prev, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, scaled.ascent()),
        });
        pen_x += scaled.h_advance(id);
        previous = Some(id);
    }

    let outlined: Vec<_> = glyphs
        .into_iter()
        .filter_map(|glyph| font.outline_glyph(glyph))
        .collect();

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for outline in &outlined {
        let bounds = outline.px_bounds();
        min_x = min_x.min(bounds.min.x);
        min_y = min_y.min(bounds.min.y);
        max_x = max_x.max(bounds.max.x);
        max_y = max_y.max(bounds.max.y);
    }
    if outlined.is_empty() || min_x > max_x {
        return Pixmap::new(1, 1).expect("pixmap");
    }

    let origin_x = min_x.floor();
    let origin_y = min_y.floor();
    let width = (max_x.ceil() - origin_x).max(1.0) as u32;
    let height = (max_y.ceil() - origin_y).max(1.0) as u32;
    let mut pixmap = Pixmap::new(width, height).expect("pixmap");

    let stride = width as usize;
    let pixels = pixmap.pixels_mut();
    for outline in &outlined {
        let bounds = outline.px_bounds();
        outline.draw(|x, y, coverage| {
            if coverage <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + bounds.min.x - origin_x) as i32;
            let iy = (y as f32 + bounds.min.y - origin_y) as i32;
            if ix < 0 || iy < 0 || ix >= width as i32 || iy >= height as i32 {
                return;
            }
            let alpha = (coverage * color.alpha()).clamp(0.0, 1.0);
            let premultiplied = PremultipliedColorU8::from_rgba(
                (color.red() * alpha * 255.0) as u8,
                (color.green() * alpha * 255.0) as u8,
                (color.blue() * alpha * 255.0) as u8,
                (alpha * 255.0) as u8,
            );
            if let Some(src) = premultiplied {
                let i = iy as usize * stride + ix as usize;
                // Kerned pairs can overlap; keep the denser coverage.
                if src.alpha() >= pixels[i].alpha() {
                    pixels[i] = src;
                }
            }
        });
    }

    pixmap
}

/// Decodes every stimulus image once, resized for presentation.
pub fn load_stimuli(set: &StimulusSet) -> Result<Vec<Pixmap>> {
    let mut pixmaps = Vec::with_capacity(set.len());
    for (name, path) in set.iter() {
        let decoded = image::open(&path)
            .with_context(|| format!("loading stimulus {}", path.display()))?;
        let resized = decoded
            .resize_exact(STIMULUS_SIZE, STIMULUS_SIZE, FilterType::Triangle)
            .to_rgba8();
        pixmaps.push(pixmap_from_rgba(resized)?);
        debug!("loaded stimulus {} from {}", name, path.display());
    }
    Ok(pixmaps)
}

/// Converts straight-alpha RGBA into tiny-skia's premultiplied layout.
pub fn pixmap_from_rgba(image: image::RgbaImage) -> Result<Pixmap> {
    let (width, height) = image.dimensions();
    let size = IntSize::from_wh(width, height).ok_or_else(|| anyhow!("empty image"))?;
    let mut data = image.into_raw();
    for pixel in data.chunks_exact_mut(4) {
        let alpha = pixel[3] as u16;
        pixel[0] = ((pixel[0] as u16 * alpha) / 255) as u8;
        pixel[1] = ((pixel[1] as u16 * alpha) / 255) as u8;
        pixel[2] = ((pixel[2] as u16 * alpha) / 255) as u8;
    }
    Pixmap::from_vec(data, size).ok_or_else(|| anyhow!("pixmap allocation failed"))
}

/// Blits `src` centered at `pos`, clipping at the canvas edges. Fully
/// opaque regions take a per-row copy; everything else blends
/// premultiplied.
fn blit_center(canvas: &mut Pixmap, src: &Pixmap, pos: (f32, f32)) {
    let (canvas_w, canvas_h) = (canvas.width() as i32, canvas.height() as i32);
    let (src_w, src_h) = (src.width() as i32, src.height() as i32);
    let x0 = (pos.0 - src_w as f32 * 0.5).floor() as i32;
    let y0 = (pos.1 - src_h as f32 * 0.5).floor() as i32;

    let dst_x = x0.max(0);
    let dst_y = y0.max(0);
    let dst_x_end = (x0 + src_w).min(canvas_w);
    let dst_y_end = (y0 + src_h).min(canvas_h);
    if dst_x_end <= dst_x || dst_y_end <= dst_y {
        return;
    }

    let src_x = (dst_x - x0) as usize;
    let src_y = (dst_y - y0) as usize;
    let copy_w = (dst_x_end - dst_x) as usize;
    let copy_h = (dst_y_end - dst_y) as usize;

    let src_stride = src.width() as usize;
    let dst_stride = canvas.width() as usize;
    let src_pixels = src.pixels();
    let dst_pixels = canvas.pixels_mut();

    let mut fully_opaque = true;
    'scan: for row in 0..copy_h {
        let start = (src_y + row) * src_stride + src_x;
        for pixel in &src_pixels[start..start + copy_w] {
            if pixel.alpha() != 255 {
                fully_opaque = false;
                break 'scan;
            }
        }
    }

    if fully_opaque {
        for row in 0..copy_h {
            let src_start = (src_y + row) * src_stride + src_x;
            let dst_start = (dst_y as usize + row) * dst_stride + dst_x as usize;
            dst_pixels[dst_start..dst_start + copy_w]
                .copy_from_slice(&src_pixels[src_start..src_start + copy_w]);
        }
        return;
    }

    for row in 0..copy_h {
        for col in 0..copy_w {
            let s = src_pixels[(src_y + row) * src_stride + src_x + col];
            let d = &mut dst_pixels[(dst_y as usize + row) * dst_stride + dst_x as usize + col];
            let inv = 255 - s.alpha() as u32;
            let blend = |sc: u8, dc: u8| (sc as u32 + (dc as u32 * inv + 127) / 255) as u8;
            let blended = PremultipliedColorU8::from_rgba(
                blend(s.red(), d.red()),
                blend(s.green(), d.green()),
                blend(s.blue(), d.blue()),
                blend(s.alpha(), d.alpha()),
            );
            if let Some(out) = blended {
                *d = out;
            }
        }
    }
}

/// Draws the session onto an offscreen canvas and copies it into the
/// window's frame buffer.
pub struct TaskRenderer {
    width: u32,
    height: u32,
    center: (f32, f32),
    font: FontRef<'static>,
    headline: TextCache,
    hud: TextCache,
    /// Interned "Score: N" labels, indexed by score.
    score_labels: Vec<usize>,
    stimuli: Vec<Pixmap>,
    canvas: Pixmap,
}

impl TaskRenderer {
    pub fn new(width: u32, height: u32, stimuli: Vec<Pixmap>) -> Result<Self> {
        let font = load_font()?;
        let canvas = Pixmap::new(width, height).ok_or_else(|| anyhow!("zero-sized canvas"))?;
        let mut renderer = Self {
            width,
            height,
            center: (width as f32 / 2.0, height as f32 / 2.0),
            font,
            headline: TextCache::new(HEADLINE_PX),
            hud: TextCache::new(HUD_PX),
            score_labels: Vec::new(),
            stimuli,
            canvas,
        };
        renderer.warm_labels();
        Ok(renderer)
    }

    /// Rasterizes the labels every session shows before the first frame.
    fn warm_labels(&mut self) {
        for remaining in 0..=COUNTDOWN_WARM_LIMIT {
            self.headline
                .get_or_render(&self.font, &remaining.to_string());
        }
        for score in 0..=SCORE_WARM_LIMIT {
            let label = format!("Score: {}", score);
            let id = intern_text(&label);
            self.score_labels.push(id);
            self.hud.get_or_render(&self.font, &label);
        }
        self.headline.get_or_render(&self.font, COMPLETE_MESSAGE);
        debug!("pre-rendered labels, {} interned", text_count());
    }

    /// Pre-rendered labels cover the common scores; anything past the warm
    /// limit rasterizes on first use.
    fn score_label(&mut self, score: u32) -> Arc<Pixmap> {
        match self
            .score_labels
            .get(score as usize)
            .copied()
            .and_then(get_text)
        {
            Some(atom) => self.hud.get_or_render_atom(&self.font, atom),
            None => self
                .hud
                .get_or_render(&self.font, &format!("Score: {}", score)),
        }
    }

    pub fn render_frame(&mut self, view: &TaskView, frame: &mut [u8]) -> Result<()> {
        self.canvas.fill(Color::BLACK);

        match view.phase {
            p if p.is_countdown() => {
                let label = self
                    .headline
                    .get_or_render(&self.font, &view.countdown_remaining.to_string());
                blit_center(&mut self.canvas, &label, self.center);
            }
            p if p.is_task() => {
                if let Some(index) = view.stimulus {
                    if let Some(stimulus) = self.stimuli.get(index) {
                        blit_center(&mut self.canvas, stimulus, self.center);
                    }
                }
                let label = self.score_label(view.score);
                blit_center(
                    &mut self.canvas,
                    &label,
                    (
                        self.center.0,
                        self.center.1 + STIMULUS_SIZE as f32 / 2.0 + 40.0,
                    ),
                );
            }
            p if p.is_complete() => {
                let message = self.headline.get_or_render(&self.font, COMPLETE_MESSAGE);
                blit_center(&mut self.canvas, &message, self.center);
                let label = self.score_label(view.score);
                blit_center(
                    &mut self.canvas,
                    &label,
                    (self.center.0, self.center.1 + 80.0),
                );
            }
            _ => {}
        }

        let data = self.canvas.data();
        if frame.len() != data.len() {
            return Err(anyhow!(
                "frame buffer size mismatch: {} vs {}",
                frame.len(),
                data.len()
            ));
        }
        frame.copy_from_slice(data);
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = Pixmap::new(width, height).ok_or_else(|| anyhow!("zero-sized canvas"))?;
        self.width = width;
        self.height = height;
        self.center = (width as f32 / 2.0, height as f32 / 2.0);
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
