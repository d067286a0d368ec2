//! Entry point for the RuFeDiag application.
//! Handles CLI parsing, logging and thread set-up, and dispatches the subcommands.

use clap::Parser;
use log::info;
use ru_fe_diag::cli::{overwrite_policy, Args, Command};
use ru_fe_diag::logging::init_logging;
use ru_fe_diag::mesh::{Mesh2D, PeriodicChannelTrim};
use ru_fe_diag::parallel::{get_parallel_info, ParallelConfig};
use ru_fe_diag::pipeline::{regrid_variable, run_profiles, RegridRequest};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    // stdout carries the JSON profiles, so the banner goes to stderr
    eprintln!(
        r#"
------------------------------------------------------------------
          ______      ______     ______  _
          | ___ \     |  ___|    |  _  \(_)
          | |_/ /   _ | |_  ___  | | | | _   __ _   __ _
          |    / | | ||  _|/ _ \ | | | || | / _` | / _` |
          | |\ \ |_| || | |  __/ | |/ / | || (_| || (_| |
          \_| \_\__,_|\_|  \___| |___/  |_| \__,_| \__, |
                  FESOM2 channel diagnostics        __/ |
                                                   |___/
------------------------------------------------------------------
                        "#
    );

    let parallel = ParallelConfig::new(args.threads);
    parallel.setup_global_pool()?;
    if args.verbose {
        get_parallel_info().log_info();
    }

    match args.command {
        Command::Profiles(profiles) => {
            let config = profiles.into_run_config()?;
            run_profiles(&config)?;
        }
        Command::Regrid(regrid) => {
            let request = RegridRequest {
                load: regrid.load_options(),
                grid: regrid.target_grid()?,
                results_path: regrid.results,
                mesh_path: regrid.mesh,
                variable: regrid.var,
                soufflet: regrid.soufflet,
                method: regrid.method,
                output_path: regrid.output.clone(),
                overwrite: overwrite_policy(regrid.overwrite),
                parallel,
            };
            regrid_variable(&request)?;
            info!("✅ Saved regridded '{}' to {}", request.variable, regrid.output.display());
        }
        Command::GenerateMesh(generate) => {
            let mesh = generate.builder().build()?;
            mesh.write(&generate.output, overwrite_policy(generate.overwrite))?;
        }
        Command::MeshInfo(info_args) => {
            let mesh = Mesh2D::read(&info_args.mesh)?;
            println!("Nodes:    {}", mesh.nodes.len());
            println!("Elements: {}", mesh.elements.len());
            println!(
                "Boundary nodes: {}",
                mesh.nodes.iter().filter(|n| n.boundary).count()
            );
            if info_args.soufflet {
                let trim = PeriodicChannelTrim::from_mesh(&mesh)?;
                println!("Nodes per column (ny): {}", trim.ny);
                println!(
                    "Elements kept / dropped: {} / {}",
                    trim.kept_elements, trim.dropped_elements
                );
            }
        }
    }

    Ok(())
}
