//! Symmetry reducer.
//!
//! Decides how much of the current work item is redundant under the
//! fractal's symmetry, shrinks the compute bounds accordingly, and
//! installs a plot mode that writes each computed pixel together with its
//! mirror images. Off-center axes split the item, pushing the asymmetric
//! remainder back onto the work list.

use crate::engine::EngineContext;
use orbitscan_core::{SymmetryKind, SymmetryState, WorkItem, MAX_WORK_ITEMS};
use std::f64::consts::PI;

/// How a computed pixel is written to the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlotMode {
    Plain,
    /// Mirror across the horizontal axis.
    XAxis,
    /// Mirror across the vertical axis.
    YAxis,
    /// Point reflection through the center.
    Origin,
    /// Four-way mirror.
    XYAxis,
    /// Repeat every `pixel_pi` columns.
    Pi,
    PiOrigin,
    PiXYAxis,
}

/// C-style sign: zero has its own sign.
fn sign(v: f64) -> i32 {
    if v < 0.0 {
        -1
    } else if v > 0.0 {
        1
    } else {
        0
    }
}

/// How far, in half pixels, an axis may sit from a pixel center or a
/// midpoint between two pixels.
const AXIS_TOLERANCE: f64 = 1e-3;

/// Pixel index of the zero crossing between `from` (pixel 0) and `to`
/// (pixel `pixels - 1`), and whether it falls between two pixels. An axis
/// anywhere else has no pixel-exact mirror and yields `None`.
fn axis_position(from: f64, to: f64, pixels: i32) -> Option<(i32, bool)> {
    if sign(from) == sign(to) {
        return None;
    }
    let halves = -from / (to - from) * f64::from(pixels - 1) * 2.0;
    let snapped = halves.round();
    if (halves - snapped).abs() > AXIS_TOLERANCE {
        log::debug!("axis at pixel {:.3} is off the pixel grid", halves / 2.0);
        return None;
    }
    let snapped = snapped as i32;
    Some((snapped / 2, snapped % 2 == 1))
}

impl EngineContext<'_> {
    /// Choose the plot mode and compute bounds for the current item.
    pub(crate) fn set_symmetry(&mut self, kind: SymmetryKind) {
        let config = self.config;
        let rect = config.rect;
        let inversion = config.inversion;

        if kind == SymmetryKind::None {
            return;
        }
        if config.potential_16bit
            || inversion.is_some_and(|inv| inv.center.im != 0.0)
            || config.decomposition
            || rect.is_rotated()
        {
            log::debug!("symmetry {:?} not applicable to this view", kind);
            return;
        }
        if !matches!(kind, SymmetryKind::XAxis | SymmetryKind::XAxisNoParam)
            && inversion.is_some_and(|inv| inv.center.re != 0.0)
        {
            log::debug!("symmetry {:?} broken by off-center inversion", kind);
            return;
        }
        if config.outside.uses_final_orbit() {
            log::warn!(
                "symmetry {:?} disabled by outside coloring {:?}",
                kind,
                config.outside
            );
            return;
        }

        let params = self.plugin.parameters();
        let init = self.plugin.uses_initial_orbit();
        let params_zero = params.is_zero() && !init;
        let allowed = match kind {
            SymmetryKind::XAxisNoReal => params.re == 0.0 && !init,
            SymmetryKind::XAxisNoImag => params.im == 0.0 && !init,
            SymmetryKind::XAxisNoParam
            | SymmetryKind::YAxisNoParam
            | SymmetryKind::XYAxisNoParam
            | SymmetryKind::OriginNoParam
            | SymmetryKind::PiSymNoParam => params_zero,
            _ => true,
        };
        if !allowed {
            log::debug!("symmetry {:?} needs zero parameters", kind);
            return;
        }

        let x_axis = axis_position(rect.y_max, rect.y_min, self.height);
        let y_axis = axis_position(rect.x_min, rect.x_max, self.width);

        match kind {
            SymmetryKind::XAxis
            | SymmetryKind::XAxisNoParam
            | SymmetryKind::XAxisNoReal
            | SymmetryKind::XAxisNoImag => {
                if self.split_x_axis(x_axis) {
                    self.plot_mode = PlotMode::XAxis;
                }
            }
            SymmetryKind::YAxis | SymmetryKind::YAxisNoParam => {
                if self.split_y_axis(y_axis) {
                    self.plot_mode = PlotMode::YAxis;
                }
            }
            SymmetryKind::XYAxis | SymmetryKind::XYAxisNoParam => {
                self.split_x_axis(x_axis);
                self.split_y_axis(y_axis);
                let sym = self.item.sym;
                self.plot_mode = match (sym.x_mirrored(), sym.y_mirrored()) {
                    (true, true) => PlotMode::XYAxis,
                    (true, false) => PlotMode::XAxis,
                    (false, true) => PlotMode::YAxis,
                    (false, false) => PlotMode::Plain,
                };
            }
            SymmetryKind::Origin | SymmetryKind::OriginNoParam => {
                self.origin_symmetry(x_axis, y_axis);
            }
            SymmetryKind::PiSym | SymmetryKind::PiSymNoParam => {
                if rect.width().abs() < PI / 4.0 {
                    return;
                }
                if inversion.is_some() {
                    self.origin_symmetry(x_axis, y_axis);
                } else {
                    self.pi_symmetry(x_axis, y_axis, params.im == 0.0);
                }
            }
            SymmetryKind::None => {}
        }

        log::debug!(
            "symmetry {:?}: plot {:?}, compute x {}..={} y {}..={}",
            kind,
            self.plot_mode,
            self.ix_start,
            self.x_stop,
            self.iy_start,
            self.y_stop
        );
    }

    fn origin_symmetry(&mut self, x_axis: Option<(i32, bool)>, y_axis: Option<(i32, bool)>) {
        if self.split_x_axis(x_axis) && self.split_y_axis(y_axis) {
            self.plot_mode = PlotMode::Origin;
            self.x_stop = self.item.x_stop;
        } else {
            self.y_stop = self.item.y_stop;
            self.item.sym = SymmetryState::NO_MIRROR;
        }
    }

    fn pi_symmetry(
        &mut self,
        x_axis: Option<(i32, bool)>,
        y_axis: Option<(i32, bool)>,
        real_param: bool,
    ) {
        self.plot_mode = PlotMode::Pi;
        if self.split_x_axis(x_axis) && self.split_y_axis(y_axis) {
            self.plot_mode = if real_param {
                PlotMode::PiXYAxis
            } else {
                PlotMode::PiOrigin
            };
        } else {
            self.y_stop = self.item.y_stop;
            self.item.sym = SymmetryState::NO_MIRROR;
        }

        let span = self.config.rect.width().abs();
        self.pixel_pi = ((PI / span) * f64::from(self.width)) as i32;
        self.pixel_pi = self.pixel_pi.max(1);
        self.x_stop = (self.item.x_start + self.pixel_pi - 1).min(self.item.x_stop);
        if self.plot_mode == PlotMode::PiXYAxis {
            self.x_stop = self
                .x_stop
                .min((self.item.x_start + self.item.x_stop) / 2);
        }
    }

    /// Try to mirror the current item across the horizontal axis. Returns
    /// true when the item is mirrored and `y_stop` now ends at the axis.
    fn split_x_axis(&mut self, axis: Option<(i32, bool)>) -> bool {
        let sym = self.item.sym;
        if sym.x_decided() && !sym.x_mirrored() {
            return false;
        }
        if sym.x_mirrored() {
            self.y_stop = (self.item.y_start + self.item.y_stop) / 2;
            return true;
        }

        self.item.sym.mark_x_decided();
        let (yy_start, yy_stop) = (self.item.y_start, self.item.y_stop);
        let Some((row, between)) = axis else {
            return false;
        };
        if row <= yy_start || row >= yy_stop {
            return false;
        }

        let mirror_end = row + (row - yy_start) + i32::from(between);
        if mirror_end > yy_stop {
            // The rows above reach past the axis reflection: compute them
            // plainly and hand the symmetric lower part back as a new item.
            if self.work_list.len() >= MAX_WORK_ITEMS - 1 {
                return false;
            }
            self.y_stop = row - (yy_stop - row) - i32::from(!between);
            let rest = self.item_rows(self.y_stop + 1, yy_stop);
            self.split_off(rest);
            self.item.y_stop = self.y_stop;
            return false;
        }
        if mirror_end < yy_stop {
            if self.work_list.len() >= MAX_WORK_ITEMS - 1 {
                return false;
            }
            let rest = self.item_rows(mirror_end + 1, yy_stop);
            self.split_off(rest);
            self.item.y_stop = mirror_end;
        }
        self.y_stop = row;
        self.item.sym.mark_x_mirrored();
        true
    }

    /// Column counterpart of [`Self::split_x_axis`].
    fn split_y_axis(&mut self, axis: Option<(i32, bool)>) -> bool {
        let sym = self.item.sym;
        if sym.y_decided() && !sym.y_mirrored() {
            return false;
        }
        if sym.y_mirrored() {
            self.x_stop = (self.item.x_start + self.item.x_stop) / 2;
            return true;
        }

        self.item.sym.mark_y_decided();
        let (xx_start, xx_stop) = (self.item.x_start, self.item.x_stop);
        let Some((col, between)) = axis else {
            return false;
        };
        if col <= xx_start || col >= xx_stop {
            return false;
        }

        let mirror_end = col + (col - xx_start) + i32::from(between);
        if mirror_end > xx_stop {
            if self.work_list.len() >= MAX_WORK_ITEMS - 1 {
                return false;
            }
            self.x_stop = col - (xx_stop - col) - i32::from(!between);
            let rest = self.item_cols(self.x_stop + 1, xx_stop);
            self.split_off(rest);
            self.item.x_stop = self.x_stop;
            return false;
        }
        if mirror_end < xx_stop {
            if self.work_list.len() >= MAX_WORK_ITEMS - 1 {
                return false;
            }
            let rest = self.item_cols(mirror_end + 1, xx_stop);
            self.split_off(rest);
            self.item.x_stop = mirror_end;
        }
        self.x_stop = col;
        self.item.sym.mark_y_mirrored();
        true
    }

    fn item_rows(&self, y_start: i32, y_stop: i32) -> WorkItem {
        WorkItem::new(self.item.x_start, self.item.x_stop, y_start, y_stop)
            .with_pass(self.item.pass)
    }

    fn item_cols(&self, x_start: i32, x_stop: i32) -> WorkItem {
        WorkItem::new(x_start, x_stop, self.item.y_start, self.item.y_stop)
            .with_pass(self.item.pass)
    }

    fn split_off(&mut self, rest: WorkItem) {
        let added = self.work_list.add(rest);
        debug_assert!(added.is_ok(), "work list full after room check");
    }

    /// Row mirrored across the horizontal axis, if it lies in the
    /// not-yet-computed half.
    #[inline]
    pub(crate) fn mirror_row(&self, y: i32) -> Option<i32> {
        let i = self.item.y_stop - (y - self.item.y_start);
        (i > self.y_stop && i < self.height).then_some(i)
    }

    #[inline]
    fn mirror_col(&self, x: i32) -> i32 {
        self.item.x_stop - (x - self.item.x_start)
    }

    /// Write one computed pixel and its symmetric images.
    pub(crate) fn plot(&mut self, x: i32, y: i32, color: u32) {
        match self.plot_mode {
            PlotMode::Plain => self.store.put_pixel(x, y, color),
            PlotMode::XAxis => {
                self.store.put_pixel(x, y, color);
                if let Some(i) = self.mirror_row(y) {
                    self.store.put_pixel(x, i, color);
                }
            }
            PlotMode::YAxis => {
                self.store.put_pixel(x, y, color);
                let j = self.mirror_col(x);
                if j < self.width {
                    self.store.put_pixel(j, y, color);
                }
            }
            PlotMode::Origin => {
                self.store.put_pixel(x, y, color);
                let j = self.mirror_col(x);
                if let Some(i) = self.mirror_row(y) {
                    if j < self.width {
                        self.store.put_pixel(j, i, color);
                    }
                }
            }
            PlotMode::XYAxis => self.plot_four(x, y, color),
            PlotMode::Pi => {
                let mut x = x;
                while x <= self.item.x_stop {
                    self.store.put_pixel(x, y, color);
                    x += self.pixel_pi;
                }
            }
            PlotMode::PiOrigin => {
                let mut x = x;
                while x <= self.item.x_stop {
                    self.store.put_pixel(x, y, color);
                    let j = self.mirror_col(x);
                    if let Some(i) = self.mirror_row(y) {
                        if j < self.width {
                            self.store.put_pixel(j, i, color);
                        }
                    }
                    x += self.pixel_pi;
                }
            }
            PlotMode::PiXYAxis => {
                let mut x = x;
                while x <= (self.item.x_start + self.item.x_stop) / 2 {
                    self.plot_four(x, y, color);
                    x += self.pixel_pi;
                }
            }
        }
    }

    fn plot_four(&mut self, x: i32, y: i32, color: u32) {
        let j = self.mirror_col(x);
        self.store.put_pixel(x, y, color);
        if j < self.width {
            self.store.put_pixel(j, y, color);
        }
        if let Some(i) = self.mirror_row(y) {
            self.store.put_pixel(x, i, color);
            if j < self.width {
                self.store.put_pixel(j, i, color);
            }
        }
    }

    /// Paint `left..=right` of `row` with one color, plus its symmetric
    /// images. Charges the poll budget by the amount of work saved.
    pub(crate) fn fill_line(&mut self, row: i32, left: i32, right: i32, color: u32) {
        let length = i64::from(right - left + 1);
        match self.plot_mode {
            PlotMode::Plain => {
                self.store.fill_row(row, left, right, color);
                self.charge(length >> 4);
            }
            PlotMode::XAxis => {
                self.store.fill_row(row, left, right, color);
                if let Some(i) = self.mirror_row(row) {
                    self.store.fill_row(i, left, right, color);
                    self.charge(length >> 3);
                }
            }
            PlotMode::YAxis => {
                self.store.fill_row(row, left, right, color);
                let (j, k) = (self.mirror_col(right), self.mirror_col(left));
                self.store.fill_row(row, j, k, color);
                self.charge(length >> 3);
            }
            PlotMode::Origin => {
                self.store.fill_row(row, left, right, color);
                let j = self.mirror_col(right).min(self.width - 1);
                let k = self.mirror_col(left).min(self.width - 1);
                if let Some(i) = self.mirror_row(row) {
                    if j <= k {
                        self.store.fill_row(i, j, k, color);
                    }
                }
                self.charge(length >> 3);
            }
            PlotMode::XYAxis => {
                self.store.fill_row(row, left, right, color);
                let j = self.mirror_col(right).min(self.width - 1);
                let k = self.mirror_col(left).min(self.width - 1);
                if let Some(i) = self.mirror_row(row) {
                    self.store.fill_row(i, left, right, color);
                    if j <= k {
                        self.store.fill_row(i, j, k, color);
                    }
                }
                if j <= k {
                    self.store.fill_row(row, j, k, color);
                }
                self.charge(length >> 2);
            }
            PlotMode::Pi | PlotMode::PiOrigin | PlotMode::PiXYAxis => {
                for x in left..=right {
                    self.plot(x, row, color);
                }
                self.charge(length >> 1);
            }
        }
    }

    /// True when plotting writes more than the row being computed plus its
    /// mirror row, so row-at-a-time painting cannot be used.
    pub(crate) fn plots_scattered(&self) -> bool {
        !matches!(
            self.plot_mode,
            PlotMode::Plain | PlotMode::XAxis | PlotMode::Origin
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_between_pixels() {
        // 100 rows over [-1, 1]: the axis sits between rows 49 and 50.
        assert_eq!(axis_position(1.0, -1.0, 100), Some((49, true)));
    }

    #[test]
    fn axis_on_a_pixel() {
        // 101 rows over [-1, 1]: row 50 is exactly on the axis.
        assert_eq!(axis_position(1.0, -1.0, 101), Some((50, false)));
    }

    #[test]
    fn axis_off_screen() {
        assert_eq!(axis_position(2.0, 0.5, 100), None);
    }

    #[test]
    fn axis_off_the_pixel_grid_is_not_mirrored() {
        // 48 rows over [-0.5, 1.5]: the axis is a quarter pixel past row 35.
        assert_eq!(axis_position(1.5, -0.5, 48), None);
        assert_eq!(axis_position(-1.0, 3.0, 64), None);
    }

    #[test]
    fn axis_within_rounding_of_a_midpoint() {
        assert_eq!(axis_position(1.0 + 1e-12, -1.0, 100), Some((49, true)));
    }

    #[test]
    fn axis_on_the_edge_counts_as_on_screen() {
        assert_eq!(axis_position(1.0, 0.0, 11), Some((10, false)));
    }
}
