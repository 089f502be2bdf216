//! YIQ colour distance and anti-aliasing detection on raw RGBA buffers.
//!
//! Buffers are row-major RGBA; `k`/`m` arguments are byte offsets of a pixel.

/// Largest possible YIQ delta between two opaque colours.
pub(crate) const MAX_YIQ_DELTA: f64 = 35215.0;

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.298_895_31 + g * 0.586_622_47 + b * 0.114_482_23
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.595_977_99 - g * 0.274_176_10 - b * 0.321_801_89
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.211_470_17 - g * 0.522_617_11 + b * 0.311_146_94
}

/// Blend a channel value over white.
pub(crate) fn blend(c: f64, alpha: f64) -> f64 {
    255.0 + (c - 255.0) * alpha
}

fn channels(img: &[u8], k: usize) -> (f64, f64, f64) {
    let (r, g, b) = (img[k] as f64, img[k + 1] as f64, img[k + 2] as f64);
    let a = img[k + 3];
    if a < 255 {
        let alpha = a as f64 / 255.0;
        (blend(r, alpha), blend(g, alpha), blend(b, alpha))
    } else {
        (r, g, b)
    }
}

/// Squared YIQ distance between pixel `k` of `img1` and pixel `m` of `img2`.
///
/// The sign is negative when the first pixel is brighter. With `y_only` only
/// the luma difference is returned.
pub(crate) fn color_delta(img1: &[u8], img2: &[u8], k: usize, m: usize, y_only: bool) -> f64 {
    if img1[k..k + 4] == img2[m..m + 4] {
        return 0.0;
    }

    let (r1, g1, b1) = channels(img1, k);
    let (r2, g2, b2) = channels(img2, m);

    let y1 = rgb2y(r1, g1, b1);
    let y2 = rgb2y(r2, g2, b2);
    let y = y1 - y2;
    if y_only {
        return y;
    }

    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);
    let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;

    if y1 > y2 {
        -delta
    } else {
        delta
    }
}

/// Faded greyscale value of a pixel for the diff image background.
pub(crate) fn faded_gray(img: &[u8], k: usize, fade: f64) -> u8 {
    let y = rgb2y(img[k] as f64, img[k + 1] as f64, img[k + 2] as f64);
    let alpha = fade * img[k + 3] as f64 / 255.0;
    blend(y, alpha).round().clamp(0.0, 255.0) as u8
}

#[derive(Debug, Clone, Copy)]
struct Window {
    x0: u32,
    y0: u32,
    x2: u32,
    y2: u32,
    on_edge: bool,
}

impl Window {
    fn around(x: u32, y: u32, width: u32, height: u32) -> Self {
        let x0 = x.saturating_sub(1);
        let y0 = y.saturating_sub(1);
        let x2 = (x + 1).min(width - 1);
        let y2 = (y + 1).min(height - 1);
        Self {
            x0,
            y0,
            x2,
            y2,
            on_edge: x == x0 || x == x2 || y == y0 || y == y2,
        }
    }
}

fn offset(x: u32, y: u32, width: u32) -> usize {
    (y as usize * width as usize + x as usize) * 4
}

/// Whether the pixel at (`x`, `y`) of `img` looks like an anti-aliased edge,
/// confirmed against `other` (the image it is being compared with).
pub(crate) fn is_antialiased(img: &[u8], other: &[u8], x: u32, y: u32, width: u32, height: u32) -> bool {
    let win = Window::around(x, y, width, height);
    let pos = offset(x, y, width);
    let mut zeroes = u32::from(win.on_edge);
    let mut min = 0.0;
    let mut max = 0.0;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (0, 0, 0, 0);

    for nx in win.x0..=win.x2 {
        for ny in win.y0..=win.y2 {
            if nx == x && ny == y {
                continue;
            }

            let delta = color_delta(img, img, pos, offset(nx, ny, width), true);
            if delta == 0.0 {
                zeroes += 1;
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                min_x = nx;
                min_y = ny;
            } else if delta > max {
                max = delta;
                max_x = nx;
                max_y = ny;
            }
        }
    }

    // no darker or no brighter neighbour: not an edge
    if min == 0.0 || max == 0.0 {
        return false;
    }

    (has_many_siblings(img, min_x, min_y, width, height)
        && has_many_siblings(other, min_x, min_y, width, height))
        || (has_many_siblings(img, max_x, max_y, width, height)
            && has_many_siblings(other, max_x, max_y, width, height))
}

/// More than two neighbours share the exact colour of (`x`, `y`).
fn has_many_siblings(img: &[u8], x: u32, y: u32, width: u32, height: u32) -> bool {
    let win = Window::around(x, y, width, height);
    let pos = offset(x, y, width);
    let mut zeroes = u32::from(win.on_edge);

    for nx in win.x0..=win.x2 {
        for ny in win.y0..=win.y2 {
            if nx == x && ny == y {
                continue;
            }
            let other = offset(nx, ny, width);
            if img[pos..pos + 4] == img[other..other + 4] {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_versus_white_is_a_pure_luma_delta() {
        let black = [0, 0, 0, 255];
        let white = [255, 255, 255, 255];
        let delta = color_delta(&black, &white, 0, 0, false);
        let luma_only = 0.5053 * 255.0 * 255.0;
        assert!((delta - luma_only).abs() < 1.0, "delta {delta}");
        assert!(delta <= MAX_YIQ_DELTA);
        assert!(color_delta(&white, &black, 0, 0, false) < 0.0);
    }

    #[test]
    fn transparent_pixels_blend_over_white() {
        let clear_black = [0, 0, 0, 0];
        let white = [255, 255, 255, 255];
        assert_eq!(color_delta(&clear_black, &white, 0, 0, false), 0.0);
    }

    #[test]
    fn faded_gray_of_white_stays_white() {
        assert_eq!(faded_gray(&[255, 255, 255, 255], 0, 0.1), 255);
        assert!(faded_gray(&[0, 0, 0, 255], 0, 0.1) > 200);
    }

    #[test]
    fn hard_edge_is_not_antialiased() {
        // 3x3, left column black, rest white: centre has 3+ identical neighbours.
        let mut img = vec![255u8; 3 * 3 * 4];
        for y in 0..3 {
            let k = offset(0, y, 3);
            img[k..k + 3].copy_from_slice(&[0, 0, 0]);
        }
        assert!(!is_antialiased(&img, &img, 1, 1, 3, 3));
    }

    #[test]
    fn intermediate_pixel_between_flat_regions_is_antialiased() {
        // 5x5: columns 0-1 black, column 2 grey, columns 3-4 white.
        let (w, h) = (5, 5);
        let mut img = vec![255u8; (w * h * 4) as usize];
        for y in 0..h {
            for x in 0..w {
                let k = offset(x, y, w);
                let v = match x {
                    0 | 1 => 0,
                    2 => 128,
                    _ => 255,
                };
                img[k..k + 3].copy_from_slice(&[v, v, v]);
            }
        }
        // Only two identical (grey) neighbours in the window, with darker and
        // brighter neighbours that sit inside flat regions.
        assert!(is_antialiased(&img, &img, 2, 2, w, h));
    }
}
