//! Polygon geometry: shoelace area, even-odd rasterization and mask bounding boxes
//!
//! Coordinates follow the image convention: `x` is the column, `y` is the row,
//! and integer coordinates sit on pixel centers.

/// A single polygon vertex as `(x, y)`
pub type Point = (f64, f64);

/// A row-major boolean raster, `true` where a polygon covers the pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.data[idx] = true;
        }
    }

    /// Set a pixel given signed coordinates, ignoring anything off the raster
    fn set_signed(&mut self, x: i64, y: i64) {
        if x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64 {
            self.set(x as u32, y as u32);
        }
    }

    /// Number of set pixels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Iterate over `(x, y)` of every set pixel in row-major order
    pub fn iter_set(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width.max(1) as usize;
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v)
            .map(move |(idx, _)| ((idx % width) as u32, (idx / width) as u32))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Calculate polygon area using the shoelace formula
///
/// Fewer than three vertices yields 0. Orientation does not matter, the
/// absolute value is returned.
pub fn polygon_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let (x_i, y_i) = vertices[i];
        let (x_j, y_j) = vertices[(i + 1) % n];
        area += x_i * y_j - x_j * y_i;
    }

    area.abs() / 2.0
}

/// Rasterize a polygon into a `width` x `height` mask.
///
/// The interior is filled with the even-odd rule sampled at pixel centers and
/// the outline is drawn on top, so boundary pixels are always included.
/// Vertices outside the raster are clipped, not rejected.
pub fn rasterize_polygon(vertices: &[Point], height: u32, width: u32) -> BinaryMask {
    let mut mask = BinaryMask::new(width, height);
    if vertices.is_empty() || width == 0 || height == 0 {
        return mask;
    }

    fill_even_odd(&mut mask, vertices);

    let n = vertices.len();
    for i in 0..n {
        draw_line(&mut mask, vertices[i], vertices[(i + 1) % n]);
    }

    mask
}

/// Smallest axis-aligned box `[x, y, width, height]` covering the set pixels.
///
/// Width and height are the distance between the extreme pixel centers, so a
/// single pixel yields a zero-sized box. Returns `None` for an empty mask;
/// callers treat that as fatal.
pub fn bounding_box_from_mask(mask: &BinaryMask) -> Option<[f64; 4]> {
    let mut pixels = mask.iter_set();
    let (x0, y0) = pixels.next()?;

    let (min_x, min_y, max_x, max_y) = pixels.fold(
        (x0, y0, x0, y0),
        |(min_x, min_y, max_x, max_y), (x, y)| {
            (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
        },
    );

    Some([
        min_x as f64,
        min_y as f64,
        (max_x - min_x) as f64,
        (max_y - min_y) as f64,
    ])
}

/// Flatten `[(x0, y0), (x1, y1), ...]` to `[x0, y0, x1, y1, ...]`
pub fn flatten_points(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|&(x, y)| [x, y]).collect()
}

/// Inverse of [`flatten_points`]; a trailing odd coordinate is dropped
pub fn unflatten_points(flat: &[f64]) -> Vec<Point> {
    flat.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
}

fn fill_even_odd(mask: &mut BinaryMask, vertices: &[Point]) {
    let n = vertices.len();
    if n < 3 {
        return;
    }

    let (min_y, max_y) = vertices
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    let first_row = min_y.ceil().max(0.0);
    let last_row = max_y.floor().min((mask.height - 1) as f64);
    if first_row > last_row {
        return;
    }
    let last_col = (mask.width - 1) as f64;

    let mut crossings: Vec<f64> = Vec::with_capacity(n);
    for row in first_row as u32..=last_row as u32 {
        let y = row as f64;
        crossings.clear();

        for i in 0..n {
            let (x0, y0) = vertices[i];
            let (x1, y1) = vertices[(i + 1) % n];
            // Half-open edges so a shared vertex is counted once
            if (y0 <= y && y < y1) || (y1 <= y && y < y0) {
                crossings.push(x0 + (y - y0) * (x1 - x0) / (y1 - y0));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            let start = span[0].ceil().max(0.0);
            let end = span[1].floor().min(last_col);
            if start > end {
                continue;
            }
            for col in start as u32..=end as u32 {
                mask.set(col, row);
            }
        }
    }
}

// Bresenham between the rounded endpoints, after clipping the segment to the
// raster grown by one pixel so the step count stays bounded by the raster size
fn draw_line(mask: &mut BinaryMask, from: Point, to: Point) {
    let bounds = (-1.0, -1.0, mask.width as f64, mask.height as f64);
    let Some((from, to)) = clip_segment(from, to, bounds) else {
        return;
    };

    let (mut x, mut y) = (from.0.round() as i64, from.1.round() as i64);
    let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);

    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        mask.set_signed(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Liang-Barsky clip of `from..to` against `(min_x, min_y, max_x, max_y)`.
///
/// `None` when the segment misses the box or has a non-finite endpoint.
fn clip_segment(from: Point, to: Point, bounds: (f64, f64, f64, f64)) -> Option<(Point, Point)> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }

    let (min_x, min_y, max_x, max_y) = bounds;
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-dx, from.0 - min_x),
        (dx, max_x - from.0),
        (-dy, from.1 - min_y),
        (dy, max_y - from.1),
    ] {
        if p == 0.0 {
            // Parallel to this edge: inside or entirely out
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let start = if t0 > 0.0 { (from.0 + t0 * dx, from.1 + t0 * dy) } else { from };
    let end = if t1 < 1.0 { (from.0 + t1 * dx, from.1 + t1 * dy) } else { to };
    Some((start, end))
}
