use crate::graph::{NodeId, RoutingGraph};
use fpga_common::db::fabric::Location;
use fpga_common::db::indices::WireId;
use priority_queue::PriorityQueue;
use std::cmp::{Ordering, Reverse};
use std::collections::VecDeque;

/// Path cost with a total order, so it can live in the priority queue.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A found route: locations from start to target inclusive and the wire
/// used between each consecutive pair.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutedPath {
    pub locations: Vec<Location>,
    pub wires: Vec<WireId>,
    pub cost: f64,
}

impl RoutedPath {
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn hops(&self) -> usize {
        self.wires.len()
    }

    pub fn start(&self) -> Option<Location> {
        self.locations.first().copied()
    }

    pub fn target(&self) -> Option<Location> {
        self.locations.last().copied()
    }
}

const NO_PARENT: u32 = u32::MAX;

/// Single-source single-target Dijkstra. Scratch buffers are kept between
/// calls and invalidated with a generation tag instead of being cleared.
#[derive(Clone)]
pub struct Dijkstra {
    dist: Vec<f64>,
    /// Fewest hops from the start, independent of cost.
    depth: Vec<u32>,
    parents: Vec<u32>,
    parent_wires: Vec<WireId>,
    within_tag: Vec<u32>,
    reached_tag: Vec<u32>,
    settled_tag: Vec<u32>,
    current_tag: u32,
}

impl Dijkstra {
    pub fn new() -> Self {
        Self {
            dist: Vec::new(),
            depth: Vec::new(),
            parents: Vec::new(),
            parent_wires: Vec::new(),
            within_tag: Vec::new(),
            reached_tag: Vec::new(),
            settled_tag: Vec::new(),
            current_tag: 0,
        }
    }

    fn ensure_capacity(&mut self, size: usize) {
        if size > self.dist.len() {
            self.dist.resize(size, f64::INFINITY);
            self.depth.resize(size, 0);
            self.parents.resize(size, NO_PARENT);
            self.parent_wires.resize(size, WireId(u32::MAX));
            self.within_tag.resize(size, 0);
            self.reached_tag.resize(size, 0);
            self.settled_tag.resize(size, 0);
        }
    }

    fn reset(&mut self) {
        self.current_tag = self.current_tag.wrapping_add(1);
        if self.current_tag == 0 {
            self.within_tag.fill(0);
            self.reached_tag.fill(0);
            self.settled_tag.fill(0);
            self.current_tag = 1;
        }
    }

    /// Breadth-first hop distances from `s`, stopping at `max_depth`.
    fn mark_within_depth(&mut self, graph: &RoutingGraph, s: NodeId, max_depth: usize) {
        let tag = self.current_tag;
        let mut frontier = VecDeque::new();
        self.depth[s.index()] = 0;
        self.within_tag[s.index()] = tag;
        frontier.push_back(s);
        while let Some(u) = frontier.pop_front() {
            let next = self.depth[u.index()] + 1;
            if next as usize > max_depth {
                continue;
            }
            for edge in graph.edges(u) {
                let vi = edge.to.index();
                if self.within_tag[vi] != tag {
                    self.within_tag[vi] = tag;
                    self.depth[vi] = next;
                    frontier.push_back(edge.to);
                }
            }
        }
    }

    /// Lowest-cost path from `start` to `target`, or `None` when the
    /// target cannot be reached.
    ///
    /// `max_depth` bounds the explored area: only nodes that some path
    /// reaches in fewer than `max_depth` hops are expanded. The target is
    /// found exactly when a path of at most `max_depth` hops exists, and
    /// the returned path is the cheapest one through the explored area,
    /// whatever its own hop count.
    pub fn find_path(
        &mut self,
        graph: &RoutingGraph,
        start: Location,
        target: Location,
        max_depth: usize,
    ) -> Option<RoutedPath> {
        let s = graph.node_id(start)?;
        let t = graph.node_id(target)?;

        self.ensure_capacity(graph.num_nodes());
        self.reset();
        let tag = self.current_tag;
        self.mark_within_depth(graph, s, max_depth);
        if self.within_tag[t.index()] != tag {
            return None;
        }

        let mut queue: PriorityQueue<NodeId, Reverse<Cost>> = PriorityQueue::new();
        self.dist[s.index()] = 0.0;
        self.parents[s.index()] = NO_PARENT;
        self.reached_tag[s.index()] = tag;
        queue.push(s, Reverse(Cost(0.0)));

        while let Some((u, Reverse(Cost(d)))) = queue.pop() {
            let ui = u.index();
            self.settled_tag[ui] = tag;
            if u == t {
                return Some(self.reconstruct_path(graph, s, t));
            }
            if self.depth[ui] as usize >= max_depth {
                continue;
            }

            for edge in graph.edges(u) {
                let vi = edge.to.index();
                if self.settled_tag[vi] == tag {
                    continue;
                }
                let tentative = d + edge.cost;
                if self.reached_tag[vi] != tag || tentative < self.dist[vi] {
                    self.dist[vi] = tentative;
                    self.parents[vi] = u.0;
                    self.parent_wires[vi] = edge.wire;
                    self.reached_tag[vi] = tag;
                    // Updates the priority in place if already queued.
                    queue.push(edge.to, Reverse(Cost(tentative)));
                }
            }
        }
        None
    }

    fn reconstruct_path(&self, graph: &RoutingGraph, start: NodeId, end: NodeId) -> RoutedPath {
        let mut locations = Vec::new();
        let mut wires = Vec::new();
        let mut curr = end;
        loop {
            locations.push(graph.location(curr));
            if curr == start {
                break;
            }
            wires.push(self.parent_wires[curr.index()]);
            curr = NodeId(self.parents[curr.index()]);
        }
        locations.reverse();
        wires.reverse();
        RoutedPath {
            locations,
            wires,
            cost: self.dist[end.index()],
        }
    }
}

impl Default for Dijkstra {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{line_locations, triangle};

    #[test]
    fn prefers_cheaper_detour() {
        let mut t = triangle();
        t.select_all();
        let graph = RoutingGraph::build(&t.ctx, t.a, t.c);
        let path = Dijkstra::new().find_path(&graph, t.a, t.c, 100).unwrap();
        assert_eq!(path.locations, vec![t.a, t.b, t.c]);
        assert_eq!(path.cost, 2.0);
        assert_eq!(path.hops(), 2);
        assert_eq!(path.start(), Some(t.a));
        assert_eq!(path.target(), Some(t.c));
    }

    #[test]
    fn depth_bound_limits_hops() {
        let mut t = triangle();
        t.select_all();
        let graph = RoutingGraph::build(&t.ctx, t.a, t.c);
        let mut solver = Dijkstra::new();
        let path = solver.find_path(&graph, t.a, t.c, 1).unwrap();
        assert_eq!(path.locations, vec![t.a, t.c]);
        assert_eq!(path.cost, 5.0);
        assert!(solver.find_path(&graph, t.a, t.c, 0).is_none());
    }

    #[test]
    fn unreachable_target() {
        let mut t = triangle();
        t.select_all();
        let graph = RoutingGraph::build(&t.ctx, t.c, t.a);
        assert!(Dijkstra::new().find_path(&graph, t.c, t.a, 100).is_none());
    }

    #[test]
    fn start_equals_target() {
        let t = triangle();
        let graph = RoutingGraph::new(t.b, t.b);
        let path = Dijkstra::new().find_path(&graph, t.b, t.b, 0).unwrap();
        assert_eq!(path.locations, vec![t.b]);
        assert!(path.wires.is_empty());
        assert_eq!(path.cost, 0.0);
    }

    #[test]
    fn unknown_endpoint() {
        let t = triangle();
        let graph = RoutingGraph::new(t.a, t.b);
        assert!(Dijkstra::new().find_path(&graph, t.a, t.c, 10).is_none());
    }

    #[test]
    fn solver_is_reusable() {
        let mut t = triangle();
        t.select_all();
        let mut solver = Dijkstra::new();
        let g1 = RoutingGraph::build(&t.ctx, t.a, t.b);
        let g2 = RoutingGraph::build(&t.ctx, t.a, t.c);
        assert_eq!(solver.find_path(&g1, t.a, t.b, 100).unwrap().cost, 1.0);
        assert_eq!(solver.find_path(&g2, t.a, t.c, 100).unwrap().cost, 2.0);
        assert_eq!(solver.find_path(&g1, t.a, t.b, 100).unwrap().cost, 1.0);
    }

    #[test]
    fn cheap_long_detour_does_not_hide_short_path() {
        // s -> c1 -> .. -> c4 -> m is cheap but takes five hops, s -> m is
        // one expensive hop. m -> t is the only way into t.
        let locs = line_locations(7);
        let (s, m, t) = (locs[0], locs[5], locs[6]);
        let mut graph = RoutingGraph::new(s, t);
        let ids: Vec<NodeId> = locs.iter().map(|&l| graph.add_node(l)).collect();
        for i in 0..5 {
            graph.connect(ids[i], ids[i + 1], 0.01, WireId::new(i));
        }
        graph.connect(ids[0], ids[5], 5.0, WireId::new(10));
        graph.connect(ids[5], ids[6], 1.0, WireId::new(11));

        let mut solver = Dijkstra::new();
        let path = solver.find_path(&graph, s, t, 5).unwrap();
        assert!((path.cost - 1.05).abs() < 1e-9, "{}", path.cost);
        assert_eq!(path.hops(), 6);

        let path = solver.find_path(&graph, s, t, 2).unwrap();
        assert_eq!(path.locations, vec![s, m, t]);
        assert_eq!(path.cost, 6.0);

        assert!(solver.find_path(&graph, s, t, 1).is_none());
    }

    // Exhaustive check against every simple path on small dense graphs,
    // unbounded and under tight depth bounds.
    #[test]
    fn cost_is_minimal_over_all_simple_paths() {
        let locs = line_locations(5);
        for seed in 0..20u64 {
            let mut graph = RoutingGraph::new(locs[0], locs[4]);
            let ids: Vec<NodeId> = locs.iter().map(|&l| graph.add_node(l)).collect();
            let mut state = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let mut weights = vec![vec![None; 5]; 5];
            for i in 0..5 {
                for j in 0..5 {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                    if i != j && (state >> 33) % 3 != 0 {
                        let w = ((state >> 40) % 10) as f64 * 0.5;
                        graph.connect(ids[i], ids[j], w, WireId::new(i * 5 + j));
                        weights[i][j] = Some(w);
                    }
                }
            }

            let depths = hop_distances(&weights, 0);
            let mut solver = Dijkstra::new();
            for max_depth in [1, 2, 3, 4, 100] {
                // Only nodes closer than the bound may be left again.
                let expandable: Vec<bool> = depths
                    .iter()
                    .map(|d| d.is_some_and(|d| d < max_depth))
                    .collect();
                let best = brute_force(&weights, &expandable, 0, 4);
                let found = solver.find_path(&graph, locs[0], locs[4], max_depth);
                assert_eq!(
                    found.is_some(),
                    depths[4].is_some_and(|d| d <= max_depth),
                    "seed {} depth {}",
                    seed,
                    max_depth
                );
                check_against(seed, max_depth, &locs, &weights, best, found);
            }
        }
    }

    fn check_against(
        seed: u64,
        max_depth: usize,
        locs: &[Location],
        weights: &[Vec<Option<f64>>],
        best: Option<f64>,
        found: Option<RoutedPath>,
    ) {
        match (best, found) {
            (None, None) => {}
            (Some(b), Some(p)) => {
                assert!(
                    (p.cost - b).abs() < 1e-9,
                    "seed {} depth {}: {} vs {}",
                    seed,
                    max_depth,
                    p.cost,
                    b
                );
                let sum: f64 = p
                    .locations
                    .windows(2)
                    .map(|w| {
                        let i = locs.iter().position(|&l| l == w[0]).unwrap();
                        let j = locs.iter().position(|&l| l == w[1]).unwrap();
                        weights[i][j].unwrap()
                    })
                    .sum();
                assert!((sum - p.cost).abs() < 1e-9);
            }
            (b, p) => panic!(
                "seed {} depth {}: brute force {:?}, dijkstra {:?}",
                seed, max_depth, b, p
            ),
        }
    }

    fn hop_distances(weights: &[Vec<Option<f64>>], from: usize) -> Vec<Option<usize>> {
        let mut depths = vec![None; weights.len()];
        depths[from] = Some(0);
        let mut frontier = VecDeque::from([from]);
        while let Some(node) = frontier.pop_front() {
            let next_depth = depths[node].map(|d| d + 1);
            for next in 0..weights.len() {
                if weights[node][next].is_some() && depths[next].is_none() {
                    depths[next] = next_depth;
                    frontier.push_back(next);
                }
            }
        }
        depths
    }

    fn brute_force(
        weights: &[Vec<Option<f64>>],
        expandable: &[bool],
        from: usize,
        to: usize,
    ) -> Option<f64> {
        fn walk(
            weights: &[Vec<Option<f64>>],
            expandable: &[bool],
            node: usize,
            to: usize,
            visited: &mut Vec<bool>,
            cost: f64,
            best: &mut Option<f64>,
        ) {
            if node == to {
                if best.is_none_or(|b| cost < b) {
                    *best = Some(cost);
                }
                return;
            }
            if !expandable[node] {
                return;
            }
            for next in 0..weights.len() {
                if let Some(w) = weights[node][next]
                    && !visited[next]
                {
                    visited[next] = true;
                    walk(weights, expandable, next, to, visited, cost + w, best);
                    visited[next] = false;
                }
            }
        }
        let mut visited = vec![false; weights.len()];
        visited[from] = true;
        let mut best = None;
        walk(weights, expandable, from, to, &mut visited, 0.0, &mut best);
        best
    }
}
