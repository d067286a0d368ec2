//! Creates a small synthetic periodic-channel run for trying out RuFeDiag.
//!
//! Writes a channel mesh (`nod2d.out`, `elem2d.out`, `aux3d.out`), the mesh
//! diagnostics file and two years of `u`, `v`, `w` and `temp` output into
//! `synthetic_run/`. Afterwards:
//!
//! ```text
//! ru_fe_diag profiles --results synthetic_run/
//! ru_fe_diag regrid --results synthetic_run/ --mesh synthetic_run/ --var temp \
//!     --lon 5:30:26 --lat 20:45:26 --output temp_regridded.nc
//! ```

use ndarray::{Array1, Array2, Array3};
use netcdf::create;
use ru_fe_diag::config::OverwritePolicy;
use ru_fe_diag::meshgen::{ChannelCorners, ChannelMeshBuilder};
use std::path::Path;

const DAYS: usize = 5;
const LEVELS: [f64; 5] = [0.0, 10.0, 25.0, 45.0, 70.0];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = Path::new("synthetic_run");
    std::fs::create_dir_all(output_dir)?;

    println!("🔨 Creating synthetic run in {}", output_dir.display());

    let generated = ChannelMeshBuilder::new()
        .corners(ChannelCorners {
            left: [0.0, 30.0],
            bottom: [5.0, 25.0],
            right: [25.0, 45.0],
            top: [20.0, 50.0],
        })
        .dx(1.0)
        .levels(LEVELS.to_vec())
        .build()?;
    generated.write(output_dir, OverwritePolicy::Overwrite)?;

    let mesh = &generated.mesh;
    let n_nod = mesh.nodes.len();
    let n_elem = mesh.elements.len();
    let nz = LEVELS.len();
    let nz1 = nz - 1;
    let levels = LEVELS.to_vec();
    let mid_levels: Vec<f64> = LEVELS.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();

    println!("   Mesh: {n_nod} nodes, {n_elem} elements, {nz} levels");

    write_mesh_diag(&output_dir.join("fesom.mesh.diag.nc"), n_nod, n_elem, nz)?;

    let centroids = mesh.centroids();
    for (year_index, year) in [1950, 1951].into_iter().enumerate() {
        let t0 = (year_index * DAYS) as f64;

        let u = Array3::from_shape_fn((DAYS, nz1, n_elem), |(t, k, e)| {
            let phase = (t as f64 + t0) * 0.7 + centroids[e][0] * 0.3;
            0.2 * phase.sin() / (1.0 + k as f64)
        });
        let v = Array3::from_shape_fn((DAYS, nz1, n_elem), |(t, k, e)| {
            let phase = (t as f64 + t0) * 0.5 + centroids[e][1] * 0.2;
            0.1 * phase.cos() / (1.0 + k as f64)
        });
        let w = Array3::from_shape_fn((DAYS, nz, n_nod), |(t, k, n)| {
            if k == 0 {
                return 0.0;
            }
            let phase = (t as f64 + t0) * 0.9 + mesh.nodes[n].lon * 0.4;
            1e-4 * phase.sin()
        });
        let temp = Array3::from_shape_fn((DAYS, nz1, n_nod), |(t, k, n)| {
            let phase = (t as f64 + t0) * 0.9 + mesh.nodes[n].lon * 0.4;
            15.0 - 0.1 * mid_levels[k] + 0.5 * phase.sin()
        });

        let times: Vec<f64> = (0..DAYS).map(|t| t as f64 + t0).collect();
        let chunks = [
            ("u", "nz1", "elem", &u, &mid_levels),
            ("v", "nz1", "elem", &v, &mid_levels),
            ("w", "nz", "nod2", &w, &levels),
            ("temp", "nz1", "nod2", &temp, &mid_levels),
        ];
        for (var, depth_dim, horizontal_dim, values, depths) in chunks {
            let path = output_dir.join(format!("{var}.fesom.{year}.nc"));
            write_chunk(&path, var, &times, (depth_dim, depths), horizontal_dim, values)?;
        }
    }

    println!("✅ Successfully created synthetic run");
    println!("📊 Variables: u, v (time, nz1, elem), w (time, nz, nod2), temp (time, nz1, nod2)");
    Ok(())
}

fn write_chunk(
    path: &Path,
    var: &str,
    times: &[f64],
    (depth_dim, depths): (&str, &Vec<f64>),
    horizontal_dim: &str,
    values: &Array3<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (nt, nk, nh) = values.dim();
    let mut file = create(path)?;
    file.add_dimension("time", nt)?;
    file.add_dimension(depth_dim, nk)?;
    file.add_dimension(horizontal_dim, nh)?;

    {
        let mut time_var = file.add_variable::<f64>("time", &["time"])?;
        time_var.put_attribute("units", "days since 1950-01-01")?;
        time_var.put(Array1::from(times.to_vec()).view(), ..)?;
    }
    {
        let mut depth_var = file.add_variable::<f64>(depth_dim, &[depth_dim])?;
        depth_var.put_attribute("units", "m")?;
        depth_var.put(Array1::from(depths.clone()).view(), ..)?;
    }

    let mut data_var = file.add_variable::<f64>(var, &["time", depth_dim, horizontal_dim])?;
    data_var.put(values.view(), ..)?;
    Ok(())
}

fn write_mesh_diag(
    path: &Path,
    n_nod: usize,
    n_elem: usize,
    nz: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = create(path)?;
    file.add_dimension("elem", n_elem)?;
    file.add_dimension("nod2", n_nod)?;
    file.add_dimension("nz", nz)?;

    let mut elem_area = file.add_variable::<f64>("elem_area", &["elem"])?;
    elem_area.put(Array1::from_elem(n_elem, 1.0e8).view(), ..)?;

    let mut nod_area = file.add_variable::<f64>("nod_area", &["nz", "nod2"])?;
    nod_area.put(Array2::from_elem((nz, n_nod), 2.0e8).view(), ..)?;
    Ok(())
}
