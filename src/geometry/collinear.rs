//! Contour hygiene
//!
//! Passes that run on a picture right before it becomes a glyph outline:
//! closing contours whose ends meet, dropping degenerate (collinear)
//! contours and loops, and pruning redundant points on straight runs.

use super::outline::{wrapped_slice, Outline, OutlinePoint};

/// Whether all points lie within `threshold` of a single straight line.
///
/// Fits a least-squares line (swapping axes for steep point sets) and
/// compares the largest perpendicular distance against the threshold.
pub fn is_collinear(points: &[OutlinePoint], threshold: f64) -> bool {
    if points.is_empty() {
        return true;
    }
    let n = points.len() as f64;
    let mut x_mean = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mut y_mean = points.iter().map(|p| p.y).sum::<f64>() / n;
    let x_var = points.iter().map(|p| (p.x - x_mean).powi(2)).sum::<f64>() / n;
    let y_var = points.iter().map(|p| (p.y - y_mean).powi(2)).sum::<f64>() / n;
    if x_var < 0.01 && y_var < 0.01 {
        return true;
    }

    let xy: Vec<(f64, f64)> = if x_var < y_var {
        std::mem::swap(&mut x_mean, &mut y_mean);
        points.iter().map(|p| (p.y, p.x)).collect()
    } else {
        points.iter().map(|p| (p.x, p.y)).collect()
    };

    let sxy: f64 = xy.iter().map(|(x, y)| (x - x_mean) * (y - y_mean)).sum();
    let sxx: f64 = xy.iter().map(|(x, _)| (x - x_mean).powi(2)).sum();
    let beta = sxy / sxx;
    let alpha = y_mean - beta * x_mean;
    let denominator = (beta * beta + 1.0).sqrt();
    let d_max = xy
        .iter()
        .map(|(x, y)| (-beta * x + y - alpha).abs() / denominator)
        .fold(0.0, f64::max);
    d_max < threshold
}

/// Close open contours whose first and last points coincide
pub fn fix_contours(outline: &mut Outline) {
    for contour in &mut outline.contours {
        if contour.closed || contour.is_empty() {
            continue;
        }
        let first = contour.points[0];
        let last = contour.points[contour.len() - 1];
        if contour.len() > 1 && first.pos() == last.pos() {
            contour.close();
        }
    }
}

/// Remove on-curve points that sit on a straight run between two others.
///
/// Closed contours that are collinear as a whole are removed. Open contours
/// are left alone.
pub fn remove_collinear(outline: &mut Outline, threshold: f64) {
    let mut i_c = 0;
    while i_c < outline.contours.len() {
        if !outline.contours[i_c].closed {
            i_c += 1;
            continue;
        }
        if is_collinear(&outline.contours[i_c].points, threshold) {
            outline.contours.remove(i_c);
            continue;
        }

        let contour = &mut outline.contours[i_c];
        let mut i_p1 = 0;
        while i_p1 < contour.len() {
            if !contour.points[i_p1].on_curve {
                i_p1 += 1;
                continue;
            }
            let n = contour.len();
            let mut i_p2 = i_p1 + 2;
            let mut collinear_run: Option<Vec<OutlinePoint>> = None;
            loop {
                i_p2 %= n;
                if i_p2 == i_p1 {
                    break;
                }
                if !contour.points[i_p2].on_curve {
                    i_p2 += 1;
                    continue;
                }
                let run = wrapped_slice(&contour.points, i_p1, i_p2);
                if is_collinear(&run, threshold) {
                    collinear_run = Some(run);
                    i_p2 += 1;
                } else {
                    break;
                }
            }

            if let Some(run) = collinear_run {
                let inner_on_curve = run.len() > 2 && run[1..run.len() - 1].iter().any(|p| p.on_curve);
                if inner_on_curve {
                    let i_p2 = (i_p1 + run.len() - 1) % n;
                    if i_p1 < i_p2 {
                        contour.remove_range(i_p1 + 1, i_p2 - 1);
                    } else {
                        if i_p1 + 1 < n {
                            contour.remove_range(i_p1 + 1, n - 1);
                        }
                        if i_p2 >= 1 {
                            contour.remove_range(0, i_p2 - 1);
                        }
                    }
                }
            }
            i_p1 += 1;
        }
        i_c += 1;
    }
}

/// Remove collinear closed contours and collinear loops inside contours.
///
/// A loop is the stretch between two on-curve points closer than
/// `point_threshold` in both axes; if every point of that stretch lies on a
/// line it is cut out.
pub fn remove_artifacts(outline: &mut Outline, point_threshold: f64, distance_threshold: f64) {
    let mut i_c = 0;
    while i_c < outline.contours.len() {
        if !outline.contours[i_c].closed {
            i_c += 1;
            continue;
        }
        if is_collinear(&outline.contours[i_c].points, distance_threshold) {
            outline.contours.remove(i_c);
            continue;
        }

        let contour = &mut outline.contours[i_c];
        while let Some((a, b)) = find_collinear_loop(&contour.points, point_threshold, distance_threshold) {
            let n = contour.len();
            if a < b {
                contour.remove_range(a + 1, b);
            } else {
                contour.remove_range(a, n - 1);
                if b >= 1 {
                    contour.remove_range(0, b - 1);
                }
            }
        }
        i_c += 1;
    }
}

fn find_collinear_loop(
    points: &[OutlinePoint],
    point_threshold: f64,
    distance_threshold: f64,
) -> Option<(usize, usize)> {
    let n = points.len();
    let on_curve: Vec<usize> = (0..n).filter(|&i| points[i].on_curve).collect();
    for &a in &on_curve {
        for &b in &on_curve {
            if a == b {
                continue;
            }
            let gap = a.abs_diff(b);
            let (p1, p2) = (points[a], points[b]);
            if !(1 < gap && gap + 1 < n)
                || (p2.x - p1.x).abs() >= point_threshold
                || (p2.y - p1.y).abs() >= point_threshold
            {
                continue;
            }
            let stretch = if a < b {
                points[a..b].to_vec()
            } else {
                let mut stretch = points[a..].to_vec();
                stretch.extend_from_slice(&points[..b]);
                stretch
            };
            if is_collinear(&stretch, distance_threshold) {
                return Some((a, b));
            }
        }
    }
    None
}
