//! Edge flags for goal directed pruning.
//!
//! Region `r` is flagged on edge `(u, v)` if the edge lies on some shortest path from `u` to a node of `r`.
//! Flags are derived from one to all searches on the reverse graph: an edge is flagged for the region of the root
//! if `dist(u, root) == weight(u, v) + dist(v, root)`.
//!
//! A query towards a node of region `r` may skip every edge not flagged for `r` without losing optimality.

use super::dijkstra::query::{bidirectional_dijkstra, dijkstra};
use super::dijkstra::*;
use super::partition::*;
use super::*;
use crate::cli::Config;
use crate::report::benchmark::measure;
use crate::{Error, Result};

use rayon::prelude::*;
use serde::Serialize;

use std::fs::File;
use std::io::{prelude::*, BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Which nodes serve as roots for the flag searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlagPolicy {
    /// One search from every node.
    Naive,
    /// Searches only from boundary nodes, edges inside a region are flagged for that region directly.
    Enhanced,
}

/// Dense bit matrix with one row of `num_regions` bits per edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeFlags {
    num_edges: usize,
    num_regions: usize,
    words_per_edge: usize,
    bits: Vec<u64>,
}

impl EdgeFlags {
    pub fn new(num_edges: usize, num_regions: usize) -> EdgeFlags {
        let words_per_edge = (num_regions + 63) / 64;
        EdgeFlags {
            num_edges,
            num_regions,
            words_per_edge,
            bits: vec![0; num_edges * words_per_edge],
        }
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn num_regions(&self) -> usize {
        self.num_regions
    }

    #[inline]
    fn word_and_mask(&self, edge: EdgeId, region: RegionId) -> (usize, u64) {
        debug_assert!((edge as usize) < self.num_edges);
        debug_assert!((region as usize) < self.num_regions);
        let region = region as usize;
        (edge as usize * self.words_per_edge + region / 64, 1 << (region % 64))
    }

    pub fn set(&mut self, edge: EdgeId, region: RegionId) {
        let (word, mask) = self.word_and_mask(edge, region);
        self.bits[word] |= mask;
    }

    #[inline]
    pub fn get(&self, edge: EdgeId, region: RegionId) -> bool {
        let (word, mask) = self.word_and_mask(edge, region);
        self.bits[word] & mask != 0
    }

    #[inline]
    pub fn is_flagged(&self, edge: EdgeId, region: RegionId) -> bool {
        self.get(edge, region)
    }

    /// All flags of an edge, by ascending region id.
    pub fn flags_of(&self, edge: EdgeId) -> impl Iterator<Item = bool> + '_ {
        (0..self.num_regions as RegionId).map(move |region| self.get(edge, region))
    }

    /// Total number of set flags over all edges.
    pub fn count_set(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Bitwise or of both tables.
    pub fn merge(&mut self, other: &EdgeFlags) {
        assert_eq!(self.num_edges, other.num_edges);
        assert_eq!(self.num_regions, other.num_regions);
        for (word, other) in self.bits.iter_mut().zip(&other.bits) {
            *word |= other;
        }
    }

    /// Compute flags for all edges of `graph`. `reverse` has to be the reverse graph of `graph`.
    /// Returns the flags and the number of root searches.
    pub fn compute(graph: &OwnedGraph, reverse: &OwnedGraph, partition: &Partition, policy: FlagPolicy, parallel: bool) -> (EdgeFlags, usize) {
        assert_eq!(graph.num_nodes(), partition.num_nodes());
        let num_edges = graph.num_arcs();
        let num_regions = partition.num_regions();

        let roots: Vec<(NodeId, RegionId)> = match policy {
            FlagPolicy::Naive => partition
                .regions()
                .iter()
                .flat_map(|region| region.vertices.iter().map(move |&node| (node, region.id)))
                .collect(),
            FlagPolicy::Enhanced => partition
                .boundary_vertices(graph)
                .into_iter()
                .map(|node| (node, partition.region_of(node)))
                .collect(),
        };
        log::info!("{} edge flag searches on {} regions", roots.len(), num_regions);

        let mut flags = if parallel {
            roots
                .par_iter()
                .fold(
                    || (EdgeFlags::new(num_edges, num_regions), DijkstraData::new(graph.num_nodes())),
                    |(mut flags, mut data), &(root, region)| {
                        flags.flag_shortest_path_dag(graph, reverse, &mut data, root, region);
                        (flags, data)
                    },
                )
                .map(|(flags, _)| flags)
                .reduce(
                    || EdgeFlags::new(num_edges, num_regions),
                    |mut acc, flags| {
                        acc.merge(&flags);
                        acc
                    },
                )
        } else {
            let mut flags = EdgeFlags::new(num_edges, num_regions);
            let mut data = DijkstraData::new(graph.num_nodes());
            for (i, &(root, region)) in roots.iter().enumerate() {
                flags.flag_shortest_path_dag(graph, reverse, &mut data, root, region);
                if (i + 1) % 1000 == 0 {
                    log::debug!("{}/{} flag searches done", i + 1, roots.len());
                }
            }
            flags
        };

        if policy == FlagPolicy::Enhanced {
            for (tail, link) in graph.edges() {
                let region = partition.region_of(tail);
                if region == partition.region_of(link.node) {
                    flags.set(link.edge_id, region);
                }
            }
        }

        (flags, roots.len())
    }

    fn flag_shortest_path_dag(&mut self, graph: &OwnedGraph, reverse: &OwnedGraph, data: &mut DijkstraData, root: NodeId, region: RegionId) {
        let run = DijkstraRun::query(reverse, data, DefaultOps(), root, None);
        // distances are only final once the search is exhausted
        run.for_each(drop);

        for (tail, link) in graph.edges() {
            let (tail_dist, head_dist) = (data.distance(tail), data.distance(link.node));
            if tail_dist < INFINITY && head_dist < INFINITY && u64::from(tail_dist) == u64::from(head_dist) + u64::from(link.weight) {
                self.set(link.edge_id, region);
            }
        }
    }

    /// Write one line per edge in edge id order: `tail head bits`, tab separated, with one based node ids.
    pub fn write_to<W: Write>(&self, graph: &OwnedGraph, mut writer: W) -> Result<()> {
        assert_eq!(graph.num_arcs(), self.num_edges);
        let mut bits = String::with_capacity(self.num_regions);
        for (tail, link) in graph.edges() {
            if link.edge_id > 0 {
                writeln!(writer)?;
            }
            bits.clear();
            bits.extend(self.flags_of(link.edge_id).map(|flag| if flag { '1' } else { '0' }));
            write!(writer, "{}\t{}\t{}", tail + 1, link.node + 1, bits)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read flags written by `write_to` for the same graph and number of regions.
    pub fn read_from<R: BufRead>(graph: &OwnedGraph, num_regions: usize, reader: R) -> Result<EdgeFlags> {
        let mut flags = EdgeFlags::new(graph.num_arcs(), num_regions);
        let mut edges = graph.edges();
        let mismatch = |line: usize, msg: String| Error::FlagFileMismatch(format!("line {}: {}", line, msg));

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let (tail, link) = edges.next().ok_or_else(|| mismatch(line_number, "more lines than edges".to_string()))?;

            let mut fields = line.split_whitespace();
            let mut endpoint = |name: &str| -> Result<u64> {
                fields
                    .next()
                    .and_then(|field| field.parse::<u64>().ok())
                    .ok_or_else(|| mismatch(line_number, format!("invalid {}", name)))
            };
            let (src, dst) = (endpoint("source")?, endpoint("destination")?);
            if src != u64::from(tail) + 1 || dst != u64::from(link.node) + 1 {
                return Err(mismatch(
                    line_number,
                    format!("expected edge {} -> {}, found {} -> {}", tail + 1, link.node + 1, src, dst),
                ));
            }

            let bits = fields.next().unwrap_or("");
            if bits.len() != num_regions {
                return Err(mismatch(line_number, format!("expected {} flags, found {}", num_regions, bits.len())));
            }
            for (region, flag) in bits.bytes().enumerate() {
                match flag {
                    b'1' => flags.set(link.edge_id, region as RegionId),
                    b'0' => (),
                    _ => return Err(mismatch(line_number, format!("invalid flag {:?}", flag as char))),
                }
            }
            if fields.next().is_some() {
                return Err(mismatch(line_number, "trailing fields".to_string()));
            }
        }

        if edges.next().is_some() {
            return Err(Error::FlagFileMismatch(format!("fewer lines than the {} edges of the graph", graph.num_arcs())));
        }
        Ok(flags)
    }

    pub fn write_to_file(&self, graph: &OwnedGraph, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        self.write_to(graph, BufWriter::new(File::create(path)?))
    }

    pub fn read_from_file(graph: &OwnedGraph, num_regions: usize, path: &Path) -> Result<EdgeFlags> {
        EdgeFlags::read_from(graph, num_regions, BufReader::new(File::open(path)?))
    }
}

/// Name of the side file holding the flags of a graph.
pub fn flag_file_name(reversed: bool) -> &'static str {
    if reversed {
        "edgeFlagDataRev.txt"
    } else {
        "edgeFlagData.txt"
    }
}

pub fn flag_file_path(flag_dir: &Path, reversed: bool) -> PathBuf {
    flag_dir.join(flag_file_name(reversed))
}

/// Companion of a flag file recording the partition the flags were computed for.
pub fn region_file_path(flag_path: &Path) -> PathBuf {
    let mut name = flag_path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(".regions");
    flag_path.with_file_name(name)
}

/// Write the number of regions followed by the region of every node, one per line.
pub fn write_region_ids<W: Write>(partition: &Partition, mut writer: W) -> Result<()> {
    writeln!(writer, "{}", partition.num_regions())?;
    for &region in partition.region_ids() {
        writeln!(writer, "{}", region)?;
    }
    writer.flush()?;
    Ok(())
}

/// Check that region ids written by `write_region_ids` describe exactly `partition`.
pub fn check_region_ids<R: BufRead>(partition: &Partition, reader: R) -> Result<()> {
    let mismatch = |msg: String| Error::FlagFileMismatch(format!("flags belong to another partition: {}", msg));
    let mut values = reader.lines().filter(|line| line.as_ref().map(|line| !line.trim().is_empty()).unwrap_or(true));

    let mut next_value = |what: &str| -> Result<usize> {
        let line = values.next().ok_or_else(|| mismatch(format!("missing {}", what)))??;
        line.trim().parse().map_err(|_| mismatch(format!("invalid {} {:?}", what, line.trim())))
    };

    let num_regions = next_value("region count")?;
    if num_regions != partition.num_regions() {
        return Err(mismatch(format!("{} regions instead of {}", num_regions, partition.num_regions())));
    }
    for (node, &region) in partition.region_ids().iter().enumerate() {
        let stored = next_value("region id")?;
        if stored != region as usize {
            return Err(mismatch(format!("node {} in region {} instead of {}", node + 1, stored, region)));
        }
    }
    if values.next().is_some() {
        return Err(mismatch("more nodes than the graph".to_string()));
    }
    Ok(())
}

fn read_matching_flags(graph: &OwnedGraph, partition: &Partition, path: &Path) -> Result<EdgeFlags> {
    check_region_ids(partition, BufReader::new(File::open(region_file_path(path))?))?;
    EdgeFlags::read_from_file(graph, partition.num_regions(), path)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreprocessingStats {
    pub execution_time_nanos: u64,
    pub nodes_scanned: usize,
    pub loaded_from_persisted_file: bool,
}

impl PreprocessingStats {
    pub fn combine(&self, other: &PreprocessingStats) -> PreprocessingStats {
        PreprocessingStats {
            execution_time_nanos: self.execution_time_nanos + other.execution_time_nanos,
            nodes_scanned: self.nodes_scanned + other.nodes_scanned,
            loaded_from_persisted_file: self.loaded_from_persisted_file && other.loaded_from_persisted_file,
        }
    }
}

pub struct Preprocessed {
    pub partition: Partition,
    pub flags: EdgeFlags,
    pub stats: PreprocessingStats,
}

/// Partition the graph and load its edge flags from the flag directory or compute and store them.
pub fn preprocess(graph: &OwnedGraph, reverse: &OwnedGraph, coords: &Coordinates, config: &Config) -> Result<Preprocessed> {
    let partitioning = config.partitioning()?;
    report!("partitioning", partitioning);
    let (partition, partition_time) = measure(|| partitioning.partition(coords));
    let partition = partition?;
    let (flags, mut stats) = load_or_compute_flags(graph, reverse, &partition, config)?;
    stats.execution_time_nanos += partition_time.as_nanos() as u64;

    Ok(Preprocessed { partition, flags, stats })
}

/// Flags of `graph` for an existing partition.
/// A side file that does not match the graph or the partition is replaced.
pub fn load_or_compute_flags(graph: &OwnedGraph, reverse: &OwnedGraph, partition: &Partition, config: &Config) -> Result<(EdgeFlags, PreprocessingStats)> {
    let path = flag_file_path(&config.flag_dir, graph.is_reversed());

    if path.exists() {
        let (loaded, time) = measure(|| read_matching_flags(graph, partition, &path));
        match loaded {
            Ok(flags) => {
                log::info!("edge flags read from {}", path.display());
                let stats = PreprocessingStats {
                    execution_time_nanos: time.as_nanos() as u64,
                    nodes_scanned: 0,
                    loaded_from_persisted_file: true,
                };
                return Ok((flags, stats));
            }
            Err(err) => log::warn!("ignoring {}: {}, recomputing edge flags", path.display(), err),
        }
    }

    let ((flags, nodes_scanned), time) =
        measure(|| EdgeFlags::compute(graph, reverse, partition, config.edge_flag_calc_method, config.parallel_preprocessing));
    flags.write_to_file(graph, &path)?;
    write_region_ids(partition, BufWriter::new(File::create(region_file_path(&path))?))?;
    log::info!("edge flags written to {}", path.display());

    let stats = PreprocessingStats {
        execution_time_nanos: time.as_nanos() as u64,
        nodes_scanned,
        loaded_from_persisted_file: false,
    };
    Ok((flags, stats))
}

/// Skip every edge not flagged for the region of the node the search is heading for.
#[derive(Debug, Clone)]
pub struct EdgeFlagOps<'a> {
    flags: &'a EdgeFlags,
    partition: &'a Partition,
    target_region: Option<RegionId>,
}

impl<'a> EdgeFlagOps<'a> {
    pub fn new(flags: &'a EdgeFlags, partition: &'a Partition) -> Self {
        assert_eq!(flags.num_regions(), partition.num_regions());
        Self {
            flags,
            partition,
            target_region: None,
        }
    }
}

impl<'a, G> DijkstraOps<G> for EdgeFlagOps<'a> {
    fn init(&mut self, target: Option<NodeId>) {
        self.target_region = target.map(|node| self.partition.region_of(node));
    }

    #[inline(always)]
    fn link_weight(&mut self, _graph: &G, _tail: NodeId, link: &LinkWithId) -> Option<Weight> {
        match self.target_region {
            Some(region) if !self.flags.is_flagged(link.edge_id, region) => None,
            _ => Some(link.weight),
        }
    }
}

pub type FlaggedServer<'a, G> = dijkstra::Server<'a, G, EdgeFlagOps<'a>>;
pub type BidirectionalFlaggedServer<'a, G> = bidirectional_dijkstra::Server<'a, G, EdgeFlagOps<'a>, EdgeFlagOps<'a>>;

/// Unidirectional query pruned with the flags of `graph`.
pub fn flagged_server<'a>(graph: &'a OwnedGraph, flags: &'a EdgeFlags, partition: &'a Partition) -> FlaggedServer<'a, OwnedGraph> {
    assert_eq!(flags.num_edges(), graph.num_arcs());
    dijkstra::Server::with_ops(graph, EdgeFlagOps::new(flags, partition))
}

/// Bidirectional query, the backward search is pruned with the flags of the reverse graph.
pub fn bidirectional_flagged_server<'a>(
    graph: &'a OwnedGraph,
    reverse: &'a OwnedGraph,
    forward_flags: &'a EdgeFlags,
    backward_flags: &'a EdgeFlags,
    partition: &'a Partition,
) -> BidirectionalFlaggedServer<'a, OwnedGraph> {
    assert_eq!(forward_flags.num_edges(), graph.num_arcs());
    assert_eq!(backward_flags.num_edges(), reverse.num_arcs());
    bidirectional_dijkstra::Server::with_ops(graph, reverse, EdgeFlagOps::new(forward_flags, partition), EdgeFlagOps::new(backward_flags, partition))
}

#[cfg(test)]
mod tests {
    use super::*;

    // regions {0, 1} and {2, 3}
    //
    //    0 --1--> 1 --1--> 2 --1--> 3
    //
    fn chain() -> (OwnedGraph, OwnedGraph, Partition) {
        let graph = OwnedGraph::from_arcs(4, &[(0, 1, 1), (1, 2, 1), (2, 3, 1)]);
        let reverse = graph.reverse();
        (graph, reverse, Partition::from_region_ids(vec![0, 0, 1, 1], 2))
    }

    fn as_strings(flags: &EdgeFlags) -> Vec<String> {
        (0..flags.num_edges() as EdgeId)
            .map(|edge| flags.flags_of(edge).map(|flag| if flag { '1' } else { '0' }).collect())
            .collect()
    }

    #[test]
    fn bits_beyond_one_word() {
        let mut flags = EdgeFlags::new(3, 130);
        flags.set(1, 0);
        flags.set(1, 129);
        flags.set(2, 64);
        assert!(flags.is_flagged(1, 129));
        assert!(!flags.is_flagged(0, 129));
        assert!(!flags.is_flagged(2, 63));
        assert_eq!(flags.count_set(), 3);
        assert_eq!(flags.flags_of(1).filter(|&flag| flag).count(), 2);
    }

    #[test]
    fn naive_and_enhanced_on_chain() {
        let (graph, reverse, partition) = chain();
        assert_eq!(partition.boundary_vertices(&graph), vec![1, 2]);

        let (naive, naive_roots) = EdgeFlags::compute(&graph, &reverse, &partition, FlagPolicy::Naive, false);
        let (enhanced, enhanced_roots) = EdgeFlags::compute(&graph, &reverse, &partition, FlagPolicy::Enhanced, false);
        assert_eq!(naive_roots, 4);
        assert_eq!(enhanced_roots, 2);

        // the cross region edge is flagged for the region it leads to
        assert!(naive.is_flagged(1, 1));
        assert!(enhanced.is_flagged(1, 1));
        assert!(!enhanced.is_flagged(1, 0));
        // same region edges without a search from inside
        assert!(enhanced.is_flagged(2, 1));
        assert!(enhanced.is_flagged(0, 0));

        assert_eq!(as_strings(&naive), vec!["11", "01", "01"]);
        assert_eq!(naive, enhanced);
    }

    #[test]
    fn parallel_equals_sequential() {
        let graph = OwnedGraph::from_arcs(
            6,
            &[(0, 1, 2), (1, 2, 2), (2, 0, 1), (2, 3, 4), (3, 4, 1), (4, 5, 1), (5, 3, 3), (1, 4, 9), (4, 1, 2)],
        );
        let reverse = graph.reverse();
        let partition = Partition::from_region_ids(vec![0, 0, 1, 1, 2, 2], 3);
        for &policy in &[FlagPolicy::Naive, FlagPolicy::Enhanced] {
            let sequential = EdgeFlags::compute(&graph, &reverse, &partition, policy, false);
            let parallel = EdgeFlags::compute(&graph, &reverse, &partition, policy, true);
            assert_eq!(sequential, parallel);
        }
    }

    #[test]
    fn persistence_format() {
        let (graph, reverse, partition) = chain();
        let (flags, _) = EdgeFlags::compute(&graph, &reverse, &partition, FlagPolicy::Naive, false);

        let mut buffer = Vec::new();
        flags.write_to(&graph, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer.clone()).unwrap(), "1\t2\t11\n2\t3\t01\n3\t4\t01");

        let read = EdgeFlags::read_from(&graph, 2, &buffer[..]).unwrap();
        assert_eq!(read, flags);
    }

    #[test]
    fn rejects_mismatching_files() {
        let (graph, _, _) = chain();
        let cases: [&[u8]; 6] = [
            b"1\t2\t11\n2\t3\t01",
            b"1\t2\t11\n2\t3\t01\n3\t4\t01\n3\t4\t01",
            b"1\t2\t111\n2\t3\t01\n3\t4\t01",
            b"1\t3\t11\n2\t3\t01\n3\t4\t01",
            b"1\t2\t1x\n2\t3\t01\n3\t4\t01",
            b"1\t2\n2\t3\t01\n3\t4\t01",
        ];
        for case in &cases {
            assert!(matches!(EdgeFlags::read_from(&graph, 2, *case), Err(Error::FlagFileMismatch(_))));
        }
    }

    #[test]
    fn region_ids_identify_the_partition() {
        let (_, _, partition) = chain();
        let mut buffer = Vec::new();
        write_region_ids(&partition, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer.clone()).unwrap(), "2\n0\n0\n1\n1\n");
        assert!(check_region_ids(&partition, &buffer[..]).is_ok());

        let same_count = Partition::from_region_ids(vec![0, 1, 1, 1], 2);
        assert!(matches!(check_region_ids(&same_count, &buffer[..]), Err(Error::FlagFileMismatch(_))));
        let more_regions = Partition::from_region_ids(vec![0, 0, 1, 2], 3);
        assert!(check_region_ids(&more_regions, &buffer[..]).is_err());
        assert!(check_region_ids(&partition, &b"2\n0\n0\n1\n"[..]).is_err());
        assert!(check_region_ids(&partition, &b"2\n0\n0\n1\n1\n0\n"[..]).is_err());
        assert!(check_region_ids(&partition, &b""[..]).is_err());
    }

    #[test]
    fn region_file_next_to_flag_file() {
        assert_eq!(region_file_path(Path::new("input/edgeFlagData.txt")), PathBuf::from("input/edgeFlagData.txt.regions"));
    }

    #[test]
    fn pruned_query_on_chain() {
        let (graph, reverse, partition) = chain();
        let (flags, _) = EdgeFlags::compute(&graph, &reverse, &partition, FlagPolicy::Enhanced, false);
        let mut server = flagged_server(&graph, &flags, &partition);
        let mut result = server.query(Query { from: 0, to: 3 });
        assert_eq!(result.distance(), Some(3));
        assert_eq!(result.path().len(), 3);
        assert_eq!(server.query(Query { from: 3, to: 0 }).distance(), None);
    }
}
