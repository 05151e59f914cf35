//! Tour heuristics over free-form point sets
//!
//! Tours are closed: the route returns from the last stop to the first.
//! `two_opt` finds a local optimum only.

use glam::Vec2;

/// Length of the closed tour visiting `points` in `tour` order
pub fn tour_length(points: &[Vec2], tour: &[usize]) -> f32 {
    if tour.len() < 2 {
        return 0.0;
    }
    tour.iter()
        .zip(tour.iter().cycle().skip(1))
        .map(|(a, b)| points[*a].distance(points[*b]))
        .sum()
}

/// Greedy tour: from `start`, repeatedly visit the closest unvisited point
pub fn nearest_neighbor_tour(points: &[Vec2], start: usize) -> Vec<usize> {
    if points.is_empty() {
        return Vec::new();
    }
    let mut current = if start < points.len() { start } else { 0 };
    let mut visited = vec![false; points.len()];
    let mut tour = Vec::with_capacity(points.len());
    visited[current] = true;
    tour.push(current);

    while tour.len() < points.len() {
        let next = (0..points.len())
            .filter(|i| !visited[*i])
            .min_by(|a, b| {
                let da = points[current].distance_squared(points[*a]);
                let db = points[current].distance_squared(points[*b]);
                da.total_cmp(&db)
            });
        let Some(next) = next else { break };
        visited[next] = true;
        tour.push(next);
        current = next;
    }
    tour
}

/// Reverse tour segments while doing so shortens the tour. The first stop
/// stays first.
pub fn two_opt(points: &[Vec2], mut tour: Vec<usize>) -> Vec<usize> {
    let n = tour.len();
    if n < 4 {
        return tour;
    }
    let dist = |a: usize, b: usize| points[a].distance(points[b]);

    let mut improved = true;
    while improved {
        improved = false;
        for i in 1..n - 1 {
            for j in i + 1..n {
                let (a, b) = (tour[i - 1], tour[i]);
                let (c, d) = (tour[j], tour[(j + 1) % n]);
                let delta = dist(a, c) + dist(b, d) - dist(a, b) - dist(c, d);
                if delta < -1e-4 {
                    tour[i..=j].reverse();
                    improved = true;
                }
            }
        }
    }
    tour
}
