//! Pixel store the engine paints into.

/// Color-index canvas consumed by the engine.
///
/// Coordinates are signed so that callers can read just outside the
/// canvas: reads there return 0 and writes are dropped.
pub trait PixelStore {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn get_pixel(&self, x: i32, y: i32) -> u32;
    fn put_pixel(&mut self, x: i32, y: i32, color: u32);

    /// Write `colors` to row `y` starting at column `x_start`.
    fn put_row(&mut self, y: i32, x_start: i32, colors: &[u32]) {
        for (x, &color) in (x_start..).zip(colors) {
            self.put_pixel(x, y, color);
        }
    }

    /// Read row `y` starting at column `x_start` into `out`.
    fn get_row(&self, y: i32, x_start: i32, out: &mut [u32]) {
        for (x, slot) in (x_start..).zip(out.iter_mut()) {
            *slot = self.get_pixel(x, y);
        }
    }

    /// Paint columns `x_start..=x_stop` of row `y` with one color.
    fn fill_row(&mut self, y: i32, x_start: i32, x_stop: i32, color: u32) {
        for x in x_start..=x_stop {
            self.put_pixel(x, y, color);
        }
    }
}

/// In-memory row-major canvas. Starts all zero (unpainted).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: i32,
    height: i32,
    pixels: Vec<u32>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.min(i32::MAX as u32) as i32;
        let height = height.min(i32::MAX as u32) as i32;
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn row(&self, y: i32) -> &[u32] {
        let start = (y * self.width) as usize;
        &self.pixels[start..start + self.width as usize]
    }

    /// Number of pixels holding `color`.
    pub fn count(&self, color: u32) -> usize {
        self.pixels.iter().filter(|&&c| c == color).count()
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            None
        } else {
            Some((y * self.width + x) as usize)
        }
    }
}

impl PixelStore for Canvas {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn get_pixel(&self, x: i32, y: i32) -> u32 {
        self.index(x, y).map_or(0, |i| self.pixels[i])
    }

    fn put_pixel(&mut self, x: i32, y: i32, color: u32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    fn fill_row(&mut self, y: i32, x_start: i32, x_stop: i32, color: u32) {
        if y < 0 || y >= self.height {
            return;
        }
        let left = x_start.max(0);
        let right = x_stop.min(self.width - 1);
        if left > right {
            return;
        }
        let base = (y * self.width) as usize;
        self.pixels[base + left as usize..=base + right as usize].fill(color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_canvas_is_unpainted() {
        let canvas = Canvas::new(8, 4);
        assert_eq!(canvas.pixels().len(), 32);
        assert_eq!(canvas.count(0), 32);
    }

    #[test]
    fn off_canvas_access_is_harmless() {
        let mut canvas = Canvas::new(4, 4);
        canvas.put_pixel(-1, 0, 7);
        canvas.put_pixel(4, 0, 7);
        canvas.put_pixel(0, 4, 7);
        assert_eq!(canvas.count(7), 0);
        assert_eq!(canvas.get_pixel(-1, -1), 0);
        assert_eq!(canvas.get_pixel(10, 0), 0);
    }

    #[test]
    fn fill_row_clips_to_canvas() {
        let mut canvas = Canvas::new(5, 2);
        canvas.fill_row(1, -3, 2, 9);
        assert_eq!(canvas.row(1), &[9, 9, 9, 0, 0]);
        canvas.fill_row(0, 3, 10, 4);
        assert_eq!(canvas.row(0), &[0, 0, 0, 4, 4]);
        canvas.fill_row(5, 0, 4, 1);
        assert_eq!(canvas.count(1), 0);
    }

    #[test]
    fn put_and_get_row() {
        let mut canvas = Canvas::new(6, 3);
        canvas.put_row(2, 1, &[1, 2, 3]);

        let mut out = [0u32; 4];
        canvas.get_row(2, 0, &mut out);
        assert_eq!(out, [0, 1, 2, 3]);
    }
}
