//! Mandelbrot set iterated in arbitrary precision.
//!
//! Pixel coordinates and the orbit are carried as [`BigFloat`]; the engine
//! only sees an f64 shadow of `z` for periodicity checks and coloring.

use crate::plugin::{ImageSetup, OrbitPlugin};
use orbitscan_core::{
    calculate_precision_bits, BigFloat, Complex, EngineError, FractalConfig, SymmetryKind,
    BIG_MANDELBROT_CONFIG,
};

#[derive(Clone, Debug)]
struct PixelGrid {
    x_min: BigFloat,
    y_max: BigFloat,
    del_x: BigFloat,
    del_y: BigFloat,
    del_x2: BigFloat,
    del_y2: BigFloat,
}

#[derive(Clone, Debug)]
pub struct BigMandelbrotPlugin {
    config: &'static FractalConfig,
    precision_bits: usize,
    grid: Option<PixelGrid>,
    c_re: BigFloat,
    c_im: BigFloat,
    z_re: BigFloat,
    z_im: BigFloat,
}

impl Default for BigMandelbrotPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl BigMandelbrotPlugin {
    pub fn new() -> Self {
        let bits = 64;
        Self {
            config: &BIG_MANDELBROT_CONFIG,
            precision_bits: bits,
            grid: None,
            c_re: BigFloat::zero(bits),
            c_im: BigFloat::zero(bits),
            z_re: BigFloat::zero(bits),
            z_im: BigFloat::zero(bits),
        }
    }

    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }
}

impl OrbitPlugin for BigMandelbrotPlugin {
    fn id(&self) -> &str {
        self.config.id
    }

    fn symmetry(&self) -> SymmetryKind {
        self.config.symmetry
    }

    fn bailout(&self) -> f64 {
        self.config.bailout
    }

    fn per_image(&mut self, setup: &ImageSetup<'_>) -> Result<(), EngineError> {
        let rect = setup.map.rect();
        let width = setup.map.width();
        let height = setup.map.height();
        let bits = calculate_precision_bits(
            rect,
            width.max(1) as u32,
            height.max(1) as u32,
            setup.max_iterations,
        );
        let big = |v: f64| BigFloat::with_precision(v, bits);

        let cols = big(f64::from((width - 1).max(1)));
        let rows = big(f64::from((height - 1).max(1)));
        let x_min = big(rect.x_min);
        let y_min = big(rect.y_min);
        let x_3rd = big(rect.x_3rd);
        let y_3rd = big(rect.y_3rd);

        self.grid = Some(PixelGrid {
            del_x: big(rect.x_max).sub(&x_3rd).div(&cols),
            del_y: big(rect.y_max).sub(&y_3rd).div(&rows),
            del_x2: x_3rd.sub(&x_min).div(&rows),
            del_y2: y_3rd.sub(&y_min).div(&cols),
            x_min,
            y_max: big(rect.y_max),
        });
        self.precision_bits = bits;
        log::debug!("big_mandelbrot precision {} bits", bits);
        Ok(())
    }

    fn per_pixel(&mut self, col: i32, row: i32, point: Complex) -> Complex {
        let bits = self.precision_bits;
        let (c_re, c_im) = match &self.grid {
            Some(grid) => {
                let col = BigFloat::with_precision(f64::from(col), bits);
                let row = BigFloat::with_precision(f64::from(row), bits);
                (
                    grid.x_min
                        .add(&col.mul(&grid.del_x))
                        .add(&row.mul(&grid.del_x2)),
                    grid.y_max
                        .sub(&row.mul(&grid.del_y))
                        .sub(&col.mul(&grid.del_y2)),
                )
            }
            // Without setup the f64 point is all there is.
            None => (
                BigFloat::with_precision(point.re, bits),
                BigFloat::with_precision(point.im, bits),
            ),
        };
        self.z_re = c_re.clone();
        self.z_im = c_im.clone();
        self.c_re = c_re;
        self.c_im = c_im;
        Complex::new(self.z_re.to_f64(), self.z_im.to_f64())
    }

    fn orbit_step(&mut self, z: &mut Complex) -> bool {
        let re_sq = self.z_re.square();
        let im_sq = self.z_im.square();
        let two_re_im = self.z_re.mul(&self.z_im);
        let two_re_im = two_re_im.add(&two_re_im);

        self.z_re = re_sq.sub(&im_sq).add(&self.c_re);
        self.z_im = two_re_im.add(&self.c_im);

        *z = Complex::new(self.z_re.to_f64(), self.z_im.to_f64());
        z.norm_sq() >= self.config.bailout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::computers::MandelbrotPlugin;
    use orbitscan_core::{ComplexRect, CoordinateMap};

    fn set_up(plugin: &mut BigMandelbrotPlugin, rect: ComplexRect, w: i32, h: i32) {
        let map = CoordinateMap::new(&rect, w, h);
        let setup = ImageSetup {
            map: &map,
            max_iterations: 200,
            find_attractors: false,
        };
        assert!(plugin.per_image(&setup).is_ok());
    }

    #[test]
    fn precision_grows_with_zoom() {
        let mut shallow = BigMandelbrotPlugin::new();
        set_up(&mut shallow, ComplexRect::new(-2.0, 1.0, -1.0, 1.0), 64, 48);

        let mut deep = BigMandelbrotPlugin::new();
        set_up(
            &mut deep,
            ComplexRect::new(1e12, 1e12 + 1e-3, 0.0, 1e-3),
            64,
            48,
        );

        assert!(deep.precision_bits() > shallow.precision_bits());
    }

    #[test]
    fn agrees_with_f64_plugin_at_shallow_zoom() {
        let rect = ComplexRect::new(-2.0, 1.0, -1.0, 1.0);
        let map = CoordinateMap::new(&rect, 16, 12);
        let mut big = BigMandelbrotPlugin::new();
        set_up(&mut big, rect, 16, 12);
        let mut small = MandelbrotPlugin::new();

        for (col, row) in [(0, 0), (5, 5), (8, 6), (15, 11)] {
            let point = map.pixel_to_complex(col, row);
            let mut zb = big.per_pixel(col, row, point);
            let mut zs = small.per_pixel(col, row, point);
            let mut escaped_big = None;
            let mut escaped_small = None;
            for i in 1..100 {
                if escaped_big.is_none() && big.orbit_step(&mut zb) {
                    escaped_big = Some(i);
                }
                if escaped_small.is_none() && small.orbit_step(&mut zs) {
                    escaped_small = Some(i);
                }
                if escaped_big.is_some() && escaped_small.is_some() {
                    break;
                }
            }
            assert_eq!(escaped_big, escaped_small, "pixel ({col}, {row})");
        }
    }
}
