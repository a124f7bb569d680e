//! The text formats of the 9th DIMACS implementation challenge.
//!
//! All formats are line based. Lines starting with `c` are comments, the first token selects the record type.
//! Node ids in files are 1-based, in memory they are 0-based.
//!
//! ```text
//! c graph                  c coordinates                  c queries
//! p sp <n> <m>             p aux sp co <n>                p aux sp p2p <k>
//! a <tail> <head> <w>      v <node> <lon> <lat>           q <from> <to>
//! ```

use crate::algo::Query;
use crate::datastr::graph::{coordinates::*, *};
use crate::{Error, Result};
use std::io::prelude::*;

/// Non comment lines with their 1-based line number, split into whitespace separated tokens.
struct Records<R> {
    lines: std::iter::Enumerate<std::io::Lines<R>>,
}

impl<R: BufRead> Records<R> {
    fn new(reader: R) -> Self {
        Records { lines: reader.lines().enumerate() }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<(usize, Vec<String>)>;

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, line) in &mut self.lines {
            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            match tokens.first().map(String::as_str) {
                None => continue,
                Some(token) if token.starts_with('c') => continue,
                _ => return Some(Ok((idx + 1, tokens))),
            }
        }
        None
    }
}

/// Parse field `idx` of a record.
fn field<T: std::str::FromStr>(tokens: &[String], idx: usize, line: usize, name: &str) -> Result<T> {
    let token = tokens.get(idx).ok_or_else(|| Error::parse(line, format!("missing {}", name)))?;
    token.parse().map_err(|_| Error::parse(line, format!("invalid {} {:?}", name, token)))
}

fn expect_len(tokens: &[String], len: usize, line: usize) -> Result<()> {
    if tokens.len() != len {
        return Err(Error::parse(line, format!("expected {} fields, found {}", len, tokens.len())));
    }
    Ok(())
}

/// Convert a 1-based node id from a file.
fn node_id(id: i64, num_nodes: usize) -> Result<NodeId> {
    if id < 1 || id > num_nodes as i64 {
        return Err(Error::VertexOutOfRange { id, num_nodes });
    }
    Ok((id - 1) as NodeId)
}

/// Read a graph in `.gr` format. Arcs keep their order of appearance per tail node.
pub fn read_graph<R: BufRead>(reader: R) -> Result<OwnedGraph> {
    let mut header: Option<(usize, usize)> = None;
    let mut arcs: Vec<(NodeId, NodeId, Weight)> = Vec::new();

    for record in Records::new(reader) {
        let (line, tokens) = record?;
        match tokens[0].as_str() {
            "p" => {
                if header.is_some() {
                    return Err(Error::parse(line, "duplicate problem line"));
                }
                expect_len(&tokens, 4, line)?;
                if tokens[1] != "sp" {
                    return Err(Error::parse(line, format!("expected problem type sp, found {}", tokens[1])));
                }
                let num_nodes: usize = field(&tokens, 2, line, "number of nodes")?;
                let num_arcs: usize = field(&tokens, 3, line, "number of arcs")?;
                if num_nodes > NodeId::max_value() as usize / 2 || num_arcs > EdgeId::max_value() as usize / 2 {
                    return Err(Error::parse(line, "graph too large"));
                }
                arcs.reserve(num_arcs);
                header = Some((num_nodes, num_arcs));
            }
            "a" => {
                let (num_nodes, num_arcs) = header.ok_or_else(|| Error::parse(line, "arc before problem line"))?;
                expect_len(&tokens, 4, line)?;
                if arcs.len() == num_arcs {
                    return Err(Error::parse(line, format!("more than {} arcs", num_arcs)));
                }
                let tail = node_id(field(&tokens, 1, line, "tail")?, num_nodes)?;
                let head = node_id(field(&tokens, 2, line, "head")?, num_nodes)?;
                let weight: i64 = field(&tokens, 3, line, "weight")?;
                if weight < 0 {
                    return Err(Error::parse(line, format!("negative weight {}", weight)));
                }
                if weight >= i64::from(INFINITY) {
                    return Err(Error::parse(line, format!("weight {} too large", weight)));
                }
                arcs.push((tail, head, weight as Weight));
            }
            other => return Err(Error::parse(line, format!("unknown record type {:?}", other))),
        }
    }

    let (num_nodes, num_arcs) = header.ok_or_else(|| Error::parse(0, "missing problem line"))?;
    if arcs.len() != num_arcs {
        return Err(Error::parse(0, format!("expected {} arcs, found {}", num_arcs, arcs.len())));
    }
    Ok(OwnedGraph::from_arcs(num_nodes, &arcs))
}

/// Read node coordinates in `.co` format for a graph with `num_nodes` nodes.
/// Nodes without a `v` line get the coordinates `(0, 0)`, a later line for the same node wins.
pub fn read_coordinates<R: BufRead>(reader: R, num_nodes: usize) -> Result<Coordinates> {
    let mut longitude = vec![0; num_nodes];
    let mut latitude = vec![0; num_nodes];
    let mut seen = vec![false; num_nodes];

    for record in Records::new(reader) {
        let (line, tokens) = record?;
        match tokens[0].as_str() {
            "p" => {
                let announced: Option<usize> = tokens.get(4).and_then(|token| token.parse().ok());
                if announced.map_or(false, |announced| announced != num_nodes) {
                    log::warn!("coordinate file announces {} nodes, the graph has {}", tokens[4], num_nodes);
                }
            }
            "v" => {
                expect_len(&tokens, 4, line)?;
                let node = node_id(field(&tokens, 1, line, "node")?, num_nodes)? as usize;
                let lon: i64 = field(&tokens, 2, line, "longitude")?;
                let lat: i64 = field(&tokens, 3, line, "latitude")?;
                if lon.unsigned_abs() > MAX_LONGITUDE as u64 {
                    return Err(Error::LongitudeOutOfRange(lon));
                }
                if lat.unsigned_abs() > MAX_LATITUDE as u64 {
                    return Err(Error::LatitudeOutOfRange(lat));
                }
                longitude[node] = lon as i32;
                latitude[node] = lat as i32;
                seen[node] = true;
            }
            other => return Err(Error::parse(line, format!("unknown record type {:?}", other))),
        }
    }

    let missing = seen.iter().filter(|&&seen| !seen).count();
    if missing > 0 {
        log::warn!("{} nodes without coordinates", missing);
    }
    Coordinates::new(longitude, latitude)
}

/// Read point to point queries in `.p2p` format for a graph with `num_nodes` nodes.
pub fn read_queries<R: BufRead>(reader: R, num_nodes: usize) -> Result<Vec<Query>> {
    let mut num_queries: Option<usize> = None;
    let mut queries = Vec::new();

    for record in Records::new(reader) {
        let (line, tokens) = record?;
        match tokens[0].as_str() {
            "p" => {
                if num_queries.is_some() {
                    return Err(Error::parse(line, "duplicate problem line"));
                }
                expect_len(&tokens, 5, line)?;
                if tokens[1..4] != ["aux", "sp", "p2p"] {
                    return Err(Error::parse(line, "expected problem type aux sp p2p"));
                }
                num_queries = Some(field(&tokens, 4, line, "number of queries")?);
            }
            "q" => {
                let expected = num_queries.ok_or_else(|| Error::parse(line, "query before problem line"))?;
                expect_len(&tokens, 3, line)?;
                if queries.len() == expected {
                    return Err(Error::parse(line, format!("more than {} queries", expected)));
                }
                let from = node_id(field(&tokens, 1, line, "source")?, num_nodes)?;
                let to = node_id(field(&tokens, 2, line, "destination")?, num_nodes)?;
                queries.push(Query { from, to });
            }
            other => return Err(Error::parse(line, format!("unknown record type {:?}", other))),
        }
    }

    let expected = num_queries.ok_or_else(|| Error::parse(0, "missing problem line"))?;
    if queries.len() != expected {
        return Err(Error::parse(0, format!("expected {} queries, found {}", expected, queries.len())));
    }
    Ok(queries)
}

pub fn write_graph<W: Write>(graph: &OwnedGraph, mut writer: W) -> Result<()> {
    writeln!(writer, "p sp {} {}", graph.num_nodes(), graph.num_arcs())?;
    for (tail, link) in graph.edges() {
        writeln!(writer, "a {} {} {}", tail + 1, link.node + 1, link.weight)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_coordinates<W: Write>(coords: &Coordinates, mut writer: W) -> Result<()> {
    writeln!(writer, "p aux sp co {}", coords.len())?;
    for node in 0..coords.len() as NodeId {
        let (lon, lat) = coords.get(node);
        writeln!(writer, "v {} {} {}", node + 1, lon, lat)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_queries<W: Write>(queries: &[Query], mut writer: W) -> Result<()> {
    writeln!(writer, "c problem specification file contains {} query pairs", queries.len())?;
    writeln!(writer, "p aux sp p2p {}", queries.len())?;
    for query in queries {
        writeln!(writer, "q {} {}", query.from + 1, query.to + 1)?;
    }
    writer.flush()?;
    Ok(())
}
