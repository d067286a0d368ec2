//! FESOM2 ASCII mesh files
//!
//! A mesh directory holds three fixed-format text files:
//!
//! - `nod2d.out`: node count, then `id lon lat flag` per node
//! - `elem2d.out`: element count, then three 1-based node ids per element
//! - `aux3d.out`: level count, the (negative) level depths, then the
//!   (negative) bottom depth of every node
//!
//! Node ids are 1-based on disk and 0-based in memory.

use crate::config::OverwritePolicy;
use crate::errors::{Result, RuFeDiagError};
use log::{debug, info};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const NODES_FILE: &str = "nod2d.out";
pub const ELEMENTS_FILE: &str = "elem2d.out";
pub const DEPTHS_FILE: &str = "aux3d.out";

/// A surface node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshNode {
    pub lon: f64,
    pub lat: f64,
    /// Node lies on the domain boundary
    pub boundary: bool,
}

/// Horizontal triangular mesh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh2D {
    pub nodes: Vec<MeshNode>,
    /// Triangles as 0-based node indices
    pub elements: Vec<[usize; 3]>,
}

/// Node and element-centroid coordinates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshCoordinates {
    pub lon_nodes: Vec<f64>,
    pub lat_nodes: Vec<f64>,
    pub lon_elems: Vec<f64>,
    pub lat_elems: Vec<f64>,
}

impl Mesh2D {
    /// Read `nod2d.out` and `elem2d.out` from `dir`
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::MeshParseError`] on malformed content, an
    /// element that references a missing node, or a count line that
    /// disagrees with the number of records.
    pub fn read(dir: &Path) -> Result<Self> {
        let nodes_path = dir.join(NODES_FILE);
        let nodes = parse_records(&nodes_path, |fields| {
            if fields.len() < 3 {
                return Err("expected `id lon lat [flag]`".to_string());
            }
            let flag: i64 = match fields.get(3) {
                Some(token) => parse_token(token)?,
                None => 0,
            };
            Ok(MeshNode {
                lon: parse_token(fields[1])?,
                lat: parse_token(fields[2])?,
                boundary: flag != 0,
            })
        })?;

        let elements_path = dir.join(ELEMENTS_FILE);
        let n_nodes = nodes.len();
        let elements = parse_records(&elements_path, |fields| {
            if fields.len() < 3 {
                return Err("expected three node ids".to_string());
            }
            let mut element = [0_usize; 3];
            for (slot, token) in element.iter_mut().zip(fields) {
                let id: usize = parse_token(token)?;
                if id == 0 || id > n_nodes {
                    return Err(format!("node id {id} outside 1..={n_nodes}"));
                }
                *slot = id - 1;
            }
            Ok(element)
        })?;

        debug!(
            "Read mesh with {} nodes and {} elements from {}",
            nodes.len(),
            elements.len(),
            dir.display()
        );
        Ok(Self { nodes, elements })
    }

    /// Write `nod2d.out` and `elem2d.out` into `dir`
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::OutputExists`] if either file exists and
    /// `policy` forbids replacing it, or an I/O error.
    pub fn write(&self, dir: &Path, policy: OverwritePolicy) -> Result<()> {
        let nodes_path = dir.join(NODES_FILE);
        let elements_path = dir.join(ELEMENTS_FILE);
        policy.check(&nodes_path)?;
        policy.check(&elements_path)?;
        fs::create_dir_all(dir)?;

        let mut text = format!("{}\n", self.nodes.len());
        for (n, node) in self.nodes.iter().enumerate() {
            let _ = writeln!(
                text,
                "{}   {:.5}  {:.5}  {}",
                n + 1,
                node.lon,
                node.lat,
                u8::from(node.boundary)
            );
        }
        fs::write(&nodes_path, text)?;

        let mut text = format!("{}\n", self.elements.len());
        for [a, b, c] in &self.elements {
            let _ = writeln!(text, "{}    {}    {}", a + 1, b + 1, c + 1);
        }
        fs::write(&elements_path, text)?;

        info!(
            "✅ Wrote {} nodes and {} elements to {}",
            self.nodes.len(),
            self.elements.len(),
            dir.display()
        );
        Ok(())
    }

    /// Centroid of every element
    #[must_use]
    pub fn centroids(&self) -> Vec<[f64; 2]> {
        self.elements
            .iter()
            .map(|element| {
                let (lon, lat) = element.iter().fold((0.0, 0.0), |(x, y), &n| {
                    (x + self.nodes[n].lon, y + self.nodes[n].lat)
                });
                [lon / 3.0, lat / 3.0]
            })
            .collect()
    }

    /// Node coordinates and element centroids
    ///
    /// With `soufflet` the wrap-around elements of the periodic channel are
    /// left out of the centroids.
    ///
    /// # Errors
    ///
    /// Returns an error if `soufflet` is set and the trim cannot be derived.
    pub fn coordinates(&self, soufflet: bool) -> Result<MeshCoordinates> {
        let mut centroids = self.centroids();
        if soufflet {
            let trim = PeriodicChannelTrim::from_mesh(self)?;
            centroids.truncate(trim.kept_elements);
        }

        Ok(MeshCoordinates {
            lon_nodes: self.nodes.iter().map(|n| n.lon).collect(),
            lat_nodes: self.nodes.iter().map(|n| n.lat).collect(),
            lon_elems: centroids.iter().map(|c| c[0]).collect(),
            lat_elems: centroids.iter().map(|c| c[1]).collect(),
        })
    }

    /// Element connectivity, trimmed like [`Mesh2D::coordinates`] with `soufflet`
    ///
    /// # Errors
    ///
    /// Returns an error if `soufflet` is set and the trim cannot be derived.
    pub fn triangles(&self, soufflet: bool) -> Result<Vec<[usize; 3]>> {
        let mut elements = self.elements.clone();
        if soufflet {
            elements.truncate(PeriodicChannelTrim::from_mesh(self)?.kept_elements);
        }
        Ok(elements)
    }
}

/// Wrap-around elements at the end of a periodic-channel element list
///
/// The channel's western column of elements is stored with node ids from
/// the eastern edge, so their centroids land across the whole domain. They
/// are the last `2·ny − 2` elements, where `ny` is the length of one node
/// column: one plus the index of the first node at the maximal latitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicChannelTrim {
    pub ny: usize,
    pub kept_elements: usize,
    pub dropped_elements: usize,
}

impl PeriodicChannelTrim {
    /// Derive the trim from the node latitudes
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh has no nodes or fewer elements than the
    /// trim would drop.
    pub fn from_mesh(mesh: &Mesh2D) -> Result<Self> {
        let lats: Vec<f64> = mesh.nodes.iter().map(|n| n.lat).collect();
        Self::from_latitudes(&lats, mesh.elements.len())
    }

    /// Derive the trim from node latitudes and the element count
    ///
    /// # Errors
    ///
    /// As for [`PeriodicChannelTrim::from_mesh`].
    pub fn from_latitudes(lat_nodes: &[f64], n_elements: usize) -> Result<Self> {
        let max_lat = lat_nodes
            .iter()
            .copied()
            .filter(|lat| !lat.is_nan())
            .fold(f64::NEG_INFINITY, f64::max);
        let first_max = lat_nodes
            .iter()
            .position(|&lat| lat == max_lat)
            .ok_or_else(|| {
                RuFeDiagError::Generic("Cannot derive a channel trim from a mesh without nodes".to_string())
            })?;

        let ny = first_max + 1;
        let dropped_elements = 2 * ny - 2;
        let kept_elements = n_elements.checked_sub(dropped_elements).ok_or_else(|| {
            RuFeDiagError::Generic(format!(
                "Channel trim would drop {dropped_elements} elements but the mesh has {n_elements}"
            ))
        })?;

        Ok(Self {
            ny,
            kept_elements,
            dropped_elements,
        })
    }
}

/// Vertical levels and per-node bottom depths from `aux3d.out`
///
/// Depths are stored positive downward; the file writes them negated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DepthLevels {
    pub levels: Vec<f64>,
    pub node_depths: Vec<f64>,
}

impl DepthLevels {
    /// Levels with every node reaching the deepest one
    #[must_use]
    pub fn flat_bottom(levels: &[f64], n_nodes: usize) -> Self {
        let bottom = levels.last().copied().unwrap_or(0.0);
        Self {
            levels: levels.to_vec(),
            node_depths: vec![bottom; n_nodes],
        }
    }

    /// Read `aux3d.out` from `dir`
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::MeshParseError`] on malformed content or when
    /// the file holds fewer levels than announced.
    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(DEPTHS_FILE);
        let text = fs::read_to_string(&path)?;
        let mut lines = numbered_lines(&text);

        let (line_no, first) = lines.next().ok_or_else(|| parse_error(&path, 1, "empty file"))?;
        let count: usize = parse_token(first).map_err(|m| parse_error(&path, line_no, &m))?;

        let mut depths = Vec::new();
        for (line_no, line) in lines {
            let value: f64 = parse_token(line).map_err(|m| parse_error(&path, line_no, &m))?;
            depths.push(-value);
        }

        if depths.len() < count {
            return Err(parse_error(
                &path,
                1,
                &format!("announced {count} levels, found {}", depths.len()),
            ));
        }
        let node_depths = depths.split_off(count);

        Ok(Self {
            levels: depths,
            node_depths,
        })
    }

    /// Write `aux3d.out` into `dir`
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::OutputExists`] if the file exists and `policy`
    /// forbids replacing it, or an I/O error.
    pub fn write(&self, dir: &Path, policy: OverwritePolicy) -> Result<()> {
        let path = dir.join(DEPTHS_FILE);
        policy.check(&path)?;
        fs::create_dir_all(dir)?;

        let mut text = format!("{}\n", self.levels.len());
        for z in &self.levels {
            let _ = writeln!(text, "-{z:.5}");
        }
        for z in &self.node_depths {
            let _ = writeln!(text, "-{z:.1}");
        }
        fs::write(&path, text)?;
        Ok(())
    }
}

/// Non-blank lines with their 1-based line numbers
fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// Parse a count line followed by exactly that many records
fn parse_records<T>(
    path: &Path,
    parse: impl Fn(&[&str]) -> std::result::Result<T, String>,
) -> Result<Vec<T>> {
    let text = fs::read_to_string(path)?;
    let mut lines = numbered_lines(&text);

    let (line_no, first) = lines.next().ok_or_else(|| parse_error(path, 1, "empty file"))?;
    let count: usize = parse_token(first).map_err(|m| parse_error(path, line_no, &m))?;

    let mut records = Vec::with_capacity(count);
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        records.push(parse(&fields).map_err(|m| parse_error(path, line_no, &m))?);
    }

    if records.len() != count {
        return Err(parse_error(
            path,
            line_no,
            &format!("count line says {count}, file has {} records", records.len()),
        ));
    }
    Ok(records)
}

fn parse_token<T: FromStr>(token: &str) -> std::result::Result<T, String> {
    token
        .trim()
        .parse()
        .map_err(|_| format!("cannot parse '{}'", token.trim()))
}

fn parse_error(path: &Path, line: usize, message: &str) -> RuFeDiagError {
    RuFeDiagError::MeshParseError {
        file: PathBuf::from(path),
        line,
        message: message.to_string(),
    }
}
