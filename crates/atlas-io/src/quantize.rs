//! Median-cut color quantization.
//!
//! Reduces RGB colors to a palette of at most 256 entries for palettized
//! output. Images with few enough distinct colors get an exact palette.
//!
//! # Algorithm
//!
//! 1. Count every distinct color.
//! 2. Start with one box holding all of them.
//! 3. Repeatedly split the box with the widest channel range at the
//!    pixel-weighted median of that channel.
//! 4. Each box becomes one palette entry: the weighted mean of its colors.

use std::collections::HashMap;

/// Largest palette the quantizer produces.
pub const MAX_COLORS: usize = 256;

/// Palette and per-pixel indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantized {
    /// Palette entries, at most `max_colors`.
    pub palette: Vec<[u8; 3]>,
    /// One palette index per input pixel.
    pub indices: Vec<u8>,
}

struct ColorBox {
    colors: Vec<([u8; 3], u32)>,
}

impl ColorBox {
    /// Widest channel and its range.
    fn widest_channel(&self) -> (usize, u8) {
        let mut best = (0, 0);
        for ch in 0..3 {
            let (lo, hi) = self
                .colors
                .iter()
                .fold((u8::MAX, u8::MIN), |(lo, hi), (c, _)| (lo.min(c[ch]), hi.max(c[ch])));
            let range = hi.saturating_sub(lo);
            if range > best.1 {
                best = (ch, range);
            }
        }
        best
    }

    fn split(mut self) -> (ColorBox, ColorBox) {
        let (ch, _) = self.widest_channel();
        self.colors.sort_unstable_by_key(|(c, _)| c[ch]);

        let total: u64 = self.colors.iter().map(|(_, n)| *n as u64).sum();
        let mut acc = 0u64;
        let mut cut = 1;
        for (i, (_, n)) in self.colors.iter().enumerate() {
            acc += *n as u64;
            if acc * 2 >= total {
                cut = i + 1;
                break;
            }
        }
        // Both halves must be non-empty
        let cut = cut.clamp(1, self.colors.len() - 1);

        let upper = self.colors.split_off(cut);
        (self, ColorBox { colors: upper })
    }

    fn mean(&self) -> [u8; 3] {
        let mut sum = [0u64; 3];
        let mut total = 0u64;
        for (c, n) in &self.colors {
            for ch in 0..3 {
                sum[ch] += c[ch] as u64 * *n as u64;
            }
            total += *n as u64;
        }
        let total = total.max(1);
        [
            ((sum[0] + total / 2) / total) as u8,
            ((sum[1] + total / 2) / total) as u8,
            ((sum[2] + total / 2) / total) as u8,
        ]
    }
}

/// Quantizes RGBA8 pixels (alpha ignored) to at most `max_colors` colors.
///
/// `max_colors` is clamped to `1..=256`.
///
/// # Example
///
/// ```rust
/// use atlas_io::quantize::median_cut;
///
/// let rgba = [255, 0, 0, 255, 0, 0, 255, 255, 255, 0, 0, 128];
/// let q = median_cut(&rgba, 256);
/// assert_eq!(q.palette.len(), 2);
/// assert_eq!(q.indices[0], q.indices[2]);
/// ```
pub fn median_cut(rgba: &[u8], max_colors: usize) -> Quantized {
    let max_colors = max_colors.clamp(1, MAX_COLORS);

    let mut counts: HashMap<[u8; 3], u32> = HashMap::new();
    let mut order: Vec<[u8; 3]> = Vec::new();
    for px in rgba.chunks_exact(4) {
        let c = [px[0], px[1], px[2]];
        let n = counts.entry(c).or_insert(0);
        if *n == 0 {
            order.push(c);
        }
        *n += 1;
    }

    let lookup: HashMap<[u8; 3], u8>;
    let palette: Vec<[u8; 3]>;

    if order.len() <= max_colors {
        // Exact palette in first-seen order
        lookup = order.iter().enumerate().map(|(i, c)| (*c, i as u8)).collect();
        palette = order;
    } else {
        let mut boxes = vec![ColorBox {
            colors: order.iter().map(|c| (*c, counts[c])).collect(),
        }];

        while boxes.len() < max_colors {
            let candidate = boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.colors.len() > 1)
                .max_by_key(|(_, b)| b.widest_channel().1)
                .map(|(i, _)| i);
            let Some(i) = candidate else { break };
            let (a, b) = boxes.swap_remove(i).split();
            boxes.push(a);
            boxes.push(b);
        }

        let mut map = HashMap::with_capacity(order.len());
        let mut entries = Vec::with_capacity(boxes.len());
        for (i, b) in boxes.iter().enumerate() {
            entries.push(b.mean());
            for (c, _) in &b.colors {
                map.insert(*c, i as u8);
            }
        }
        lookup = map;
        palette = entries;
    }

    let indices = rgba
        .chunks_exact(4)
        .map(|px| lookup.get(&[px[0], px[1], px[2]]).copied().unwrap_or(0))
        .collect();

    Quantized { palette, indices }
}
