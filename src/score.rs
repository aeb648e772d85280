//! Scorer: per-punter connected-component scoring from mines, plus the
//! optional futures bonus/malus.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::map::{Map, PunterId, SiteId};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct Future {
    pub source: SiteId,
    pub target: SiteId,
}

/// A punter's score together with the unrealized futures bonus (the sum of
/// `dist^3` for declared futures whose target has not yet been reached).
/// Used for `--log_score_every_step` progress logging; does not affect the
/// final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionalScore {
    pub score: i64,
    pub potential_change: i64,
}

/// Sites reachable from `mine` using only edges owned by `punter`.
fn visited_from_mine(map: &Map, mine: SiteId, owned_adjacency: &HashMap<SiteId, Vec<SiteId>>) -> HashSet<SiteId> {
    let mut visited = HashSet::new();
    visited.insert(mine);
    let mut stack = vec![mine];
    while let Some(site) = stack.pop() {
        if let Some(neighbors) = owned_adjacency.get(&site) {
            for &next in neighbors {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }
    }
    let _ = map;
    visited
}

fn owned_adjacency(map: &Map, punter: PunterId) -> HashMap<SiteId, Vec<SiteId>> {
    let mut adjacency: HashMap<SiteId, Vec<SiteId>> = HashMap::new();
    for river in &map.rivers {
        if river.owner == Some(punter) {
            adjacency.entry(river.source).or_default().push(river.target);
            adjacency.entry(river.target).or_default().push(river.source);
        }
    }
    adjacency
}

fn base_score(map: &Map, punter: PunterId) -> (i64, HashMap<SiteId, HashSet<SiteId>>) {
    let adjacency = owned_adjacency(map, punter);
    let mut total = 0i64;
    let mut visited_by_mine = HashMap::new();

    for &mine in &map.mines {
        let visited = visited_from_mine(map, mine, &adjacency);
        for &site in &visited {
            let d = map.distance(mine, site).unwrap_or(0) as i64;
            total += d * d;
        }
        visited_by_mine.insert(mine, visited);
    }

    (total, visited_by_mine)
}

fn futures_term(
    map: &Map,
    visited_by_mine: &HashMap<SiteId, HashSet<SiteId>>,
    futures: &[Future],
) -> (i64, i64) {
    let mut realized = 0i64;
    let mut potential_change = 0i64;

    for future in futures {
        let visited = visited_by_mine
            .get(&future.source)
            .map(|v| v.contains(&future.target))
            .unwrap_or(false);
        let magnitude = map
            .distance(future.source, future.target)
            .map(|d| (d as i64).pow(3))
            .unwrap_or(0);

        if visited {
            realized += magnitude;
        } else {
            realized -= magnitude;
            potential_change += magnitude;
        }
    }

    (realized, potential_change)
}

/// Compute the final score for every punter (0..num_punters). `futures` maps
/// a punter id to the futures it declared during setup (absent = none).
pub fn compute_scores(
    map: &Map,
    num_punters: u64,
    futures: &HashMap<PunterId, Vec<Future>>,
) -> Vec<i64> {
    (0..num_punters)
        .map(|p| {
            let (base, visited_by_mine) = base_score(map, p);
            let bonus = futures
                .get(&p)
                .map(|fs| futures_term(map, &visited_by_mine, fs).0)
                .unwrap_or(0);
            base + bonus
        })
        .collect()
}

/// Like [`compute_scores`] but also reports each punter's unrealized futures
/// potential, for progress logging mid-match.
pub fn compute_scores_provisional(
    map: &Map,
    num_punters: u64,
    futures: &HashMap<PunterId, Vec<Future>>,
) -> Vec<ProvisionalScore> {
    (0..num_punters)
        .map(|p| {
            let (base, visited_by_mine) = base_score(map, p);
            let (bonus, potential_change) = futures
                .get(&p)
                .map(|fs| futures_term(map, &visited_by_mine, fs))
                .unwrap_or((0, 0));
            ProvisionalScore {
                score: base + bonus,
                potential_change,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapJson;

    fn triangle() -> Map {
        let json: MapJson = serde_json::from_value(serde_json::json!({
            "sites": [{"id": 0}, {"id": 1}, {"id": 2}],
            "mines": [0],
            "rivers": [
                {"source": 0, "target": 1},
                {"source": 1, "target": 2},
                {"source": 0, "target": 2}
            ]
        }))
        .unwrap();
        Map::from_json(&json).unwrap()
    }

    #[test]
    fn all_pass_scores_zero() {
        let map = triangle();
        let scores = compute_scores(&map, 2, &HashMap::new());
        assert_eq!(scores, vec![0, 0]);
    }

    #[test]
    fn two_edges_owned_scores_sum_of_squares() {
        let mut map = triangle();
        map.claim(0, 1, 0).unwrap();
        map.claim(1, 2, 0).unwrap();
        let scores = compute_scores(&map, 2, &HashMap::new());
        // dist[0][0]=0, dist[0][1]=1, dist[0][2]=1 -> 0 + 1 + 1 = 2
        assert_eq!(scores[0], 2);
        assert_eq!(scores[1], 0);
    }

    #[test]
    fn unreached_future_subtracts_cubed_distance() {
        let mut map = triangle();
        // punter 0 owns nothing reaching site 2 from mine 0
        map.claim(0, 1, 1).unwrap();
        let mut futures = HashMap::new();
        futures.insert(0, vec![Future { source: 0, target: 2 }]);
        let scores = compute_scores(&map, 2, &futures);
        // dist[0][2] = 1 (triangle has a direct 0-2 edge), not visited -> -1^3 = -1
        assert_eq!(scores[0], -1);
    }

    #[test]
    fn reached_future_adds_cubed_distance() {
        let mut map = triangle();
        map.claim(0, 2, 0).unwrap();
        let mut futures = HashMap::new();
        futures.insert(0, vec![Future { source: 0, target: 2 }]);
        let scores = compute_scores(&map, 1, &futures);
        // base: dist[0][0]^2 + dist[0][2]^2 = 0 + 1 = 1, plus future dist^3 = 1 -> 2
        assert_eq!(scores[0], 2);
    }

    #[test]
    fn provisional_mode_reports_potential_without_subtracting() {
        let mut map = triangle();
        map.claim(0, 1, 0).unwrap();
        let mut futures = HashMap::new();
        futures.insert(0, vec![Future { source: 0, target: 2 }]);
        let provisional = compute_scores_provisional(&map, 1, &futures);
        assert_eq!(provisional[0].potential_change, 1);
        // score itself still reflects the malus, matching compute_scores
        assert_eq!(provisional[0].score, compute_scores(&map, 1, &futures)[0]);
    }
}
