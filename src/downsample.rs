//! Point reduction for drawing
//!
//! Chromatograms of long runs hold one point per scan and are thinned with
//! LTTB (Largest Triangle Three Buckets) before they reach the plot. Stem
//! series keep every peak but are culled to the visible m/z window.

use crate::constants::performance::DOWNSAMPLE_THRESHOLD;

/// LTTB over x-sorted points. First and last points always survive.
pub fn lttb(points: &[[f64; 2]], target: usize) -> Vec<[f64; 2]> {
    profiling::scope!("lttb");
    let n = points.len();
    if n <= target || target < 3 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity(target);
    out.push(points[0]);

    let bucket = (n - 2) as f64 / (target - 2) as f64;
    let mut anchor = points[0];

    for i in 0..target - 2 {
        let start = (i as f64 * bucket).floor() as usize + 1;
        let end = (((i + 1) as f64 * bucket).floor() as usize + 1).min(n - 1);

        // Centroid of the following bucket, or the last point
        let next_end = (((i + 2) as f64 * bucket).floor() as usize + 1).min(n);
        let (cx, cy) = if end < next_end {
            let slice = &points[end..next_end];
            let len = slice.len() as f64;
            let (sx, sy) = slice
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
            (sx / len, sy / len)
        } else {
            (points[n - 1][0], points[n - 1][1])
        };

        let mut best = start;
        let mut best_area = -1.0;
        for (j, p) in points.iter().enumerate().take(end.max(start + 1)).skip(start) {
            let area = ((anchor[0] - cx) * (p[1] - anchor[1])
                - (anchor[0] - p[0]) * (cy - anchor[1]))
                .abs();
            if area > best_area {
                best_area = area;
                best = j;
            }
        }

        anchor = points[best];
        out.push(anchor);
    }

    out.push(points[n - 1]);
    out
}

/// Thin a line series once it exceeds the drawing threshold
pub fn for_display(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    if points.len() > DOWNSAMPLE_THRESHOLD {
        lttb(points, DOWNSAMPLE_THRESHOLD)
    } else {
        points.to_vec()
    }
}

/// Points of an x-sorted series inside `[x_min, x_max]`, plus one neighbour
/// on each side so lines run off the plot edge
pub fn cull(points: &[[f64; 2]], x_min: f64, x_max: f64) -> &[[f64; 2]] {
    if points.is_empty() || x_min > x_max {
        return points;
    }
    let start = points.partition_point(|p| p[0] < x_min).saturating_sub(1);
    let end = (points.partition_point(|p| p[0] <= x_max) + 1).min(points.len());
    if start >= end {
        return &points[0..0];
    }
    &points[start..end]
}
