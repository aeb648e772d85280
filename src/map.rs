//! Map model: sites, mines, rivers, and per-mine BFS distances.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};

pub type SiteId = u64;
pub type PunterId = u64;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteJson {
    pub id: SiteId,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RiverJson {
    pub source: SiteId,
    pub target: SiteId,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapJson {
    pub sites: Vec<SiteJson>,
    pub mines: Vec<SiteId>,
    pub rivers: Vec<RiverJson>,
}

/// A normalized river: `source < target`, with an owner once claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct River {
    pub source: SiteId,
    pub target: SiteId,
    pub owner: Option<PunterId>,
}

impl River {
    pub fn new(a: SiteId, b: SiteId) -> Self {
        let (source, target) = normalize(a, b);
        River {
            source,
            target,
            owner: None,
        }
    }
}

/// Normalize an unordered site pair so `source < target`.
pub fn normalize(a: SiteId, b: SiteId) -> (SiteId, SiteId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

pub struct Map {
    pub sites: Vec<SiteId>,
    pub mines: Vec<SiteId>,
    pub rivers: Vec<River>,
    /// dist[mine] -> (site -> hops), absent entry means unreachable.
    dist: HashMap<SiteId, HashMap<SiteId, u64>>,
}

impl Map {
    pub fn from_json(map: &MapJson) -> Result<Self> {
        let sites: Vec<SiteId> = map.sites.iter().map(|s| s.id).collect();
        let site_set: std::collections::HashSet<SiteId> = sites.iter().copied().collect();

        for river in &map.rivers {
            if !site_set.contains(&river.source) || !site_set.contains(&river.target) {
                return Err(ArenaError::MapSchema {
                    detail: format!(
                        "river ({}, {}) references a site not in `sites`",
                        river.source, river.target
                    ),
                });
            }
        }
        for mine in &map.mines {
            if !site_set.contains(mine) {
                return Err(ArenaError::MapSchema {
                    detail: format!("mine {mine} is not in `sites`"),
                });
            }
        }

        let rivers: Vec<River> = map
            .rivers
            .iter()
            .map(|r| River::new(r.source, r.target))
            .collect();

        let mut adjacency: HashMap<SiteId, Vec<SiteId>> = HashMap::new();
        for &site in &sites {
            adjacency.entry(site).or_default();
        }
        for river in &rivers {
            adjacency.entry(river.source).or_default().push(river.target);
            adjacency.entry(river.target).or_default().push(river.source);
        }

        let mut dist = HashMap::new();
        for &mine in &map.mines {
            dist.insert(mine, bfs(&adjacency, mine));
        }

        Ok(Map {
            sites,
            mines: map.mines.clone(),
            rivers,
            dist,
        })
    }

    /// Hop count from `mine` to `site`, or `None` if unreachable.
    pub fn distance(&self, mine: SiteId, site: SiteId) -> Option<u64> {
        self.dist.get(&mine)?.get(&site).copied()
    }

    /// Claim the river identified by an unordered `(a, b)` pair for `punter`.
    ///
    /// Returns `true` if the claim succeeded (the river was unclaimed),
    /// `false` if it was already owned (a conflict — the caller is
    /// responsible for recording the turn as a pass).
    pub fn claim(&mut self, a: SiteId, b: SiteId, punter: PunterId) -> Option<bool> {
        let (source, target) = normalize(a, b);
        let river = self
            .rivers
            .iter_mut()
            .find(|r| r.source == source && r.target == target)?;
        if river.owner.is_some() {
            Some(false)
        } else {
            river.owner = Some(punter);
            Some(true)
        }
    }

    pub fn river_owner(&self, a: SiteId, b: SiteId) -> Option<Option<PunterId>> {
        let (source, target) = normalize(a, b);
        self.rivers
            .iter()
            .find(|r| r.source == source && r.target == target)
            .map(|r| r.owner)
    }
}

fn bfs(adjacency: &HashMap<SiteId, Vec<SiteId>>, start: SiteId) -> HashMap<SiteId, u64> {
    let mut dist = HashMap::new();
    dist.insert(start, 0);
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(site) = queue.pop_front() {
        let here = dist[&site];
        if let Some(neighbors) = adjacency.get(&site) {
            for &next in neighbors {
                if !dist.contains_key(&next) {
                    dist.insert(next, here + 1);
                    queue.push_back(next);
                }
            }
        }
    }

    dist
}
