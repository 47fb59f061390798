use crate::audio::constants::{
    SPECTROGRAM_FALLBACK_MAX, SPECTROGRAM_LEVEL_RANGE, SPECTROGRAM_SKEW,
};
use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Colour from hue, saturation and lightness. The hue wraps around every
    /// whole turn, saturation and lightness are clamped to `[0, 1]`.
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hue = hue.rem_euclid(1.0);
        let saturation = saturation.clamp(0.0, 1.0);
        let lightness = lightness.clamp(0.0, 1.0);

        let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let sector = hue * 6.0;
        let second = chroma * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
        let (r, g, b) = match sector as u32 {
            0 => (chroma, second, 0.0),
            1 => (second, chroma, 0.0),
            2 => (0.0, chroma, second),
            3 => (0.0, second, chroma),
            4 => (second, 0.0, chroma),
            _ => (chroma, 0.0, second),
        };
        let offset = lightness - chroma / 2.0;

        let to_byte = |channel: f32| ((channel + offset) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self {
            r: to_byte(r),
            g: to_byte(g),
            b: to_byte(b),
        }
    }
}

/// Scrolling waterfall image. Row-major, row 0 at the top, newest column at the
/// right edge.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl SpectrogramImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, colour: Rgb) {
        self.pixels[y * self.width + x] = colour;
    }

    /// Copy of column `x`, top to bottom
    pub fn column(&self, x: usize) -> Vec<Rgb> {
        (0..self.height).map(|y| self.pixel(x, y)).collect()
    }

    /// Move every column one pixel to the left. The leftmost column is lost,
    /// the rightmost keeps its old contents until it is drawn over.
    pub fn shift_left(&mut self) {
        if self.width < 2 {
            return;
        }
        for row in self.pixels.chunks_exact_mut(self.width) {
            row.copy_within(1.., 0);
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Rgb::BLACK);
    }
}

/// Draws one spectrogram column per transform frame.
///
/// Runs its own unwindowed FFT over a full transform-size block and normalises
/// the magnitudes against the frame's maximum. Rows are spread over the bins
/// with an exponential skew so low frequencies get most of the height.
pub struct SpectrogramRenderer {
    fft: Arc<dyn RealToComplex<f32>>,
    time_domain_buffer: Vec<f32>,
    frequency_domain_buffer: Vec<Complex32>,
    scratch: Vec<Complex32>,
    magnitudes: Vec<f32>,

    image: SpectrogramImage,

    skew: f32,
    fallback_max: f32,
    level_range: f32,
}

impl SpectrogramRenderer {
    pub fn new(transform_size: usize, width: usize, height: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(transform_size);

        Self {
            time_domain_buffer: vec![0.0; transform_size],
            frequency_domain_buffer: fft.make_output_vec(),
            scratch: fft.make_scratch_vec(),
            magnitudes: vec![0.0; transform_size / 2 + 1],
            fft,
            image: SpectrogramImage::new(width, height),
            skew: SPECTROGRAM_SKEW,
            fallback_max: SPECTROGRAM_FALLBACK_MAX,
            level_range: SPECTROGRAM_LEVEL_RANGE,
        }
    }

    pub fn transform_size(&self) -> usize {
        self.time_domain_buffer.len()
    }

    pub fn image(&self) -> &SpectrogramImage {
        &self.image
    }

    /// Maximum used for normalisation when a frame is entirely silent
    pub fn set_fallback_max(&mut self, fallback_max: f32) {
        nih_plug::nih_debug_assert!(fallback_max > 0.0);
        if fallback_max > 0.0 {
            self.fallback_max = fallback_max;
        }
    }

    pub fn fallback_max(&self) -> f32 {
        self.fallback_max
    }

    /// Largest finite magnitude below the Nyquist bin, or the fallback maximum
    /// when there is none above zero
    pub fn frame_max(&self, magnitudes: &[f32]) -> f32 {
        let half = self.transform_size() / 2;
        let last_bin = half.min(magnitudes.len().saturating_sub(1));
        let max_level = magnitudes[..last_bin.max(1).min(magnitudes.len())]
            .iter()
            .copied()
            .filter(|m| m.is_finite())
            .fold(0.0f32, f32::max);

        if max_level > 0.0 {
            max_level
        } else {
            self.fallback_max
        }
    }

    pub fn clear(&mut self) {
        self.image.clear();
    }

    /// Transform one block of raw samples and draw it as the newest column.
    /// Shorter blocks are zero padded, longer ones keep their newest samples.
    pub fn draw_next_line(&mut self, samples: &[f32]) -> bool {
        let size = self.time_domain_buffer.len();
        let samples = &samples[samples.len().saturating_sub(size)..];
        self.time_domain_buffer[..samples.len()].copy_from_slice(samples);
        self.time_domain_buffer[samples.len()..].fill(0.0);

        if self
            .fft
            .process_with_scratch(
                &mut self.time_domain_buffer,
                &mut self.frequency_domain_buffer,
                &mut self.scratch,
            )
            .is_err()
        {
            return false;
        }

        for (magnitude, bin) in self.magnitudes.iter_mut().zip(&self.frequency_domain_buffer) {
            *magnitude = bin.norm();
        }

        let magnitudes = std::mem::take(&mut self.magnitudes);
        self.draw_magnitudes(&magnitudes);
        self.magnitudes = magnitudes;

        true
    }

    /// Shift the image and draw `magnitudes` (transform size / 2 + 1 raw bin
    /// magnitudes) into the rightmost column. Row 0 is left as background.
    pub fn draw_magnitudes(&mut self, magnitudes: &[f32]) {
        let width = self.image.width();
        let height = self.image.height();
        if width == 0 || height == 0 || magnitudes.is_empty() {
            return;
        }

        let right_edge = width - 1;
        self.image.shift_left();

        let half = self.transform_size() / 2;
        let last_bin = half.min(magnitudes.len() - 1);
        let max_level = self.frame_max(magnitudes);

        for row in 1..height {
            let proportion = 1.0 - libm::expf(libm::logf(row as f32 / height as f32) * self.skew);
            let bin = ((proportion * half as f32) as usize).min(last_bin);

            // Levels past 1.0 wrap the hue but saturate the lightness to white
            let level = magnitudes[bin] / max_level * self.level_range;
            let level = if level.is_nan() {
                0.0
            } else {
                level.clamp(0.0, self.level_range)
            };

            self.image
                .set_pixel(right_edge, row, Rgb::from_hsl(level, 1.0, level));
        }
    }
}
