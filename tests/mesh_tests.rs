//! Mesh file I/O, periodic-channel trimming and mesh generation

use ru_fe_diag::config::OverwritePolicy;
use ru_fe_diag::errors::{Result, RuFeDiagError};
use ru_fe_diag::mesh::{
    DepthLevels, Mesh2D, MeshNode, PeriodicChannelTrim, DEPTHS_FILE, ELEMENTS_FILE, NODES_FILE,
};
use ru_fe_diag::meshgen::{ChannelCorners, ChannelMeshBuilder, SOUFFLET_ZBAR};
use std::fs;
use tempfile::tempdir;

fn square_mesh() -> Mesh2D {
    let node = |lon, lat, boundary| MeshNode { lon, lat, boundary };
    Mesh2D {
        nodes: vec![
            node(0.5, 30.25, true),
            node(1.5, 30.25, true),
            node(1.5, 31.0, false),
            node(0.5, 31.0, true),
        ],
        elements: vec![[0, 1, 2], [0, 2, 3]],
    }
}

#[test]
fn test_mesh_write_read_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let mesh = square_mesh();
    mesh.write(dir.path(), OverwritePolicy::Fail)?;

    let text = fs::read_to_string(dir.path().join(NODES_FILE))?;
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("4"));
    assert_eq!(lines.next(), Some("1   0.50000  30.25000  1"));

    let text = fs::read_to_string(dir.path().join(ELEMENTS_FILE))?;
    assert_eq!(text.lines().nth(2), Some("1    3    4"));

    let read = Mesh2D::read(dir.path())?;
    assert_eq!(read, mesh);

    assert!(matches!(
        mesh.write(dir.path(), OverwritePolicy::Fail),
        Err(RuFeDiagError::OutputExists { .. })
    ));
    mesh.write(dir.path(), OverwritePolicy::Overwrite)?;
    Ok(())
}

#[test]
fn test_mesh_parse_errors() -> Result<()> {
    let dir = tempdir()?;
    let elements = "1\n1 2 3\n";

    fs::write(dir.path().join(NODES_FILE), "3\n1 0.0 30.0 1\n2 abc 31.0 0\n3 1.0 31.0 0\n")?;
    fs::write(dir.path().join(ELEMENTS_FILE), elements)?;
    match Mesh2D::read(dir.path()) {
        Err(RuFeDiagError::MeshParseError { line, message, .. }) => {
            assert_eq!(line, 3);
            assert!(message.contains("abc"));
        }
        other => panic!("Expected MeshParseError, got {other:?}"),
    }

    // Count line disagrees with the records
    fs::write(dir.path().join(NODES_FILE), "4\n1 0.0 30.0 1\n2 1.0 30.0 0\n3 1.0 31.0 0\n")?;
    assert!(matches!(
        Mesh2D::read(dir.path()),
        Err(RuFeDiagError::MeshParseError { .. })
    ));

    // Element references a node that does not exist
    fs::write(dir.path().join(NODES_FILE), "3\n1 0.0 30.0 1\n2 1.0 30.0 0\n3 1.0 31.0 0\n")?;
    fs::write(dir.path().join(ELEMENTS_FILE), "1\n1 2 4\n")?;
    match Mesh2D::read(dir.path()) {
        Err(RuFeDiagError::MeshParseError { line, .. }) => assert_eq!(line, 2),
        other => panic!("Expected MeshParseError, got {other:?}"),
    }

    // Missing flag column defaults to interior
    fs::write(dir.path().join(NODES_FILE), "3\n1 0.0 30.0\n2 1.0 30.0\n3 1.0 31.0\n")?;
    fs::write(dir.path().join(ELEMENTS_FILE), elements)?;
    let mesh = Mesh2D::read(dir.path())?;
    assert!(mesh.nodes.iter().all(|n| !n.boundary));
    assert_eq!(mesh.elements, vec![[0, 1, 2]]);
    Ok(())
}

#[test]
fn test_depth_levels_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let depths = DepthLevels::flat_bottom(&[0.0, 10.0, 25.5], 3);
    assert_eq!(depths.node_depths, vec![25.5; 3]);
    depths.write(dir.path(), OverwritePolicy::Fail)?;

    let text = fs::read_to_string(dir.path().join(DEPTHS_FILE))?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "3");
    assert_eq!(lines[2], "-10.00000");
    assert_eq!(lines[4], "-25.5");

    let read = DepthLevels::read(dir.path())?;
    assert_eq!(read, depths);

    fs::write(dir.path().join(DEPTHS_FILE), "5\n-0.0\n-10.0\n")?;
    assert!(matches!(
        DepthLevels::read(dir.path()),
        Err(RuFeDiagError::MeshParseError { .. })
    ));
    Ok(())
}

#[test]
fn test_periodic_channel_trim() -> Result<()> {
    // Columns of three nodes, the first maximal latitude at index 2
    let lats = [0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
    let trim = PeriodicChannelTrim::from_latitudes(&lats, 10)?;
    assert_eq!(trim.ny, 3);
    assert_eq!(trim.dropped_elements, 4);
    assert_eq!(trim.kept_elements, 6);

    assert!(PeriodicChannelTrim::from_latitudes(&lats, 3).is_err());
    assert!(PeriodicChannelTrim::from_latitudes(&[], 3).is_err());
    Ok(())
}

#[test]
fn test_centroids_and_trimmed_coordinates() -> Result<()> {
    let mesh = square_mesh();
    let centroids = mesh.centroids();
    assert_eq!(centroids.len(), 2);
    assert!((centroids[0][0] - 3.5 / 3.0).abs() < 1e-12);
    assert!((centroids[0][1] - 91.5 / 3.0).abs() < 1e-12);

    let full = mesh.coordinates(false)?;
    assert_eq!(full.lon_nodes, vec![0.5, 1.5, 1.5, 0.5]);
    assert_eq!(full.lon_elems.len(), 2);

    // First maximal latitude at node 2 → ny = 3, drops 4 > 2 elements
    assert!(mesh.coordinates(true).is_err());
    Ok(())
}

#[test]
fn test_channel_grid_counts() {
    let builder = ChannelMeshBuilder::new();
    assert_eq!(builder.diagonal_step(), 0.1414);
    assert_eq!(builder.grid_counts(), (107, 142));

    let coarse = ChannelMeshBuilder::new().dx(1.0);
    assert_eq!(coarse.diagonal_step(), 0.7071);
    assert_eq!(coarse.grid_counts(), (22, 29));
}

#[test]
fn test_channel_mesh_generation() -> Result<()> {
    let generated = ChannelMeshBuilder::new().dx(1.0).build()?;
    let mesh = &generated.mesh;
    let (n_i, n_j) = (22, 29);

    assert_eq!(mesh.nodes.len(), n_i * n_j - 2);
    assert_eq!(mesh.elements.len(), 2 * (n_i - 1) * (n_j - 1) - 2);
    assert_eq!(generated.depths.levels, SOUFFLET_ZBAR.to_vec());
    assert_eq!(generated.depths.node_depths, vec![4000.0; mesh.nodes.len()]);

    // First node sits on the western corner
    let first = mesh.nodes[0];
    assert_eq!((first.lon, first.lat), (0.0, 30.0));
    assert!(first.boundary);

    // Column i = 0 lies on the left–top side; (1, 1) is one leg inside
    assert!(mesh.nodes[5].boundary);
    let inner = mesh.nodes[n_j - 1 + 1];
    assert!(!inner.boundary);
    assert!((inner.lon - 2.0 * 0.7071).abs() < 1e-12);
    assert!((inner.lat - 30.0).abs() < 1e-12);

    // First element of node 0: (0,0), (0,1), (1,1)
    assert_eq!(mesh.elements[0], [0, 1, n_j]);
    assert_eq!(mesh.elements[1], [0, n_j, n_j - 1]);

    for element in &mesh.elements {
        assert!(element.iter().all(|&n| n < mesh.nodes.len()));
    }
    Ok(())
}

#[test]
fn test_generated_mesh_write() -> Result<()> {
    let dir = tempdir()?;
    let generated = ChannelMeshBuilder::new()
        .corners(ChannelCorners {
            left: [0.0, 5.0],
            bottom: [3.0, 2.0],
            right: [7.0, 6.0],
            top: [4.0, 9.0],
        })
        .dx(0.5)
        .levels(vec![0.0, 50.0, 100.0])
        .build()?;
    generated.write(dir.path(), OverwritePolicy::Fail)?;

    let mesh = Mesh2D::read(dir.path())?;
    assert_eq!(mesh.nodes.len(), generated.mesh.nodes.len());
    assert_eq!(mesh.elements, generated.mesh.elements);
    let depths = DepthLevels::read(dir.path())?;
    assert_eq!(depths.levels, vec![0.0, 50.0, 100.0]);

    assert!(matches!(
        generated.write(dir.path(), OverwritePolicy::Fail),
        Err(RuFeDiagError::OutputExists { .. })
    ));
    Ok(())
}

#[test]
fn test_channel_builder_rejects_bad_input() {
    assert!(matches!(
        ChannelMeshBuilder::new().dx(0.0).build(),
        Err(RuFeDiagError::InvalidConfig { .. })
    ));
    assert!(matches!(
        ChannelMeshBuilder::new().dx(f64::NAN).build(),
        Err(RuFeDiagError::InvalidConfig { .. })
    ));
    assert!(matches!(
        ChannelMeshBuilder::new().dx(1.0).levels(Vec::new()).build(),
        Err(RuFeDiagError::InvalidConfig { .. })
    ));
    assert!(matches!(
        ChannelMeshBuilder::new().dx(100.0).build(),
        Err(RuFeDiagError::InvalidConfig { .. })
    ));
}
