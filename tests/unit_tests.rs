//! Unit tests for the building blocks: errors, thread pools, reductions,
//! fields, configuration and command-line parsing
//!
//! These tests provide extensive coverage of the core functionality
//! to ensure reliability and prevent regressions.

mod common;

use clap::Parser;
use common::assert_close;
use ndarray::{arr1, arr2, ArrayD};
use ru_fe_diag::cli::{parse_grid_axis, parse_method, parse_point, Args, Command};
use ru_fe_diag::config::{OverwritePolicy, RunConfig};
use ru_fe_diag::errors::{Result, RuFeDiagError};
use ru_fe_diag::field::{Dim, Field, LabeledAxis};
use ru_fe_diag::gridding::InterpolationMethod;
use ru_fe_diag::loader::{year_token, YearRange};
use ru_fe_diag::parallel::{get_parallel_info, ParallelConfig};
use ru_fe_diag::statistics::{
    parallel_nan_mean_axis, parallel_nan_weighted_mean_axis, NanReduction, Reduction,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

#[test]
fn test_error_types() {
    let generic_err = RuFeDiagError::Generic("Test error".to_string());
    assert_eq!(format!("{generic_err}"), "Test error");

    let var_err = RuFeDiagError::VariableNotFound {
        var: "temp".to_string(),
    };
    assert!(format!("{var_err}").contains("Variable 'temp' not found"));

    let axis_err = RuFeDiagError::AxisNotFound {
        field: "u".to_string(),
        axis: "nz1".to_string(),
    };
    assert_eq!(format!("{axis_err}"), "Axis 'nz1' not found in field 'u'");

    let ambiguous = RuFeDiagError::AmbiguousVariable {
        var: "u".to_string(),
        candidates: vec!["a".to_string(), "b".to_string()],
    };
    assert!(format!("{ambiguous}").contains("[a, b]"));

    let parse_err = RuFeDiagError::MeshParseError {
        file: PathBuf::from("mesh/nod2d.out"),
        line: 7,
        message: "cannot parse 'x'".to_string(),
    };
    assert_eq!(format!("{parse_err}"), "mesh/nod2d.out:7: cannot parse 'x'");

    let io_err: RuFeDiagError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(format!("{io_err}").contains("I/O error"));
    assert!(std::error::Error::source(&io_err).is_some());
    assert!(std::error::Error::source(&var_err).is_none());
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_threads.is_none());
    assert_eq!(ParallelConfig::new(None), default_config);

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));
    assert_eq!(config_4.current_threads(), 4);

    let all_cores_config = ParallelConfig::all_cores();
    assert!(all_cores_config.num_threads.is_some_and(|n| n > 0));

    assert!(default_config.current_threads() > 0);
}

#[test]
fn test_parallel_install() -> Result<()> {
    let value = ParallelConfig::with_threads(2).install(rayon::current_num_threads)?;
    assert_eq!(value, 2);

    let value = ParallelConfig::default().install(|| 40 + 2)?;
    assert_eq!(value, 42);

    assert!(matches!(
        ParallelConfig::with_threads(0).install(|| ()),
        Err(RuFeDiagError::ThreadPoolError(_))
    ));
    Ok(())
}

#[test]
fn test_parallel_info() {
    let info = get_parallel_info();
    assert!(info.current_threads > 0);
    assert!(info.available_cores > 0);
    assert!(info.available_parallelism > 0);

    // Logging without a logger installed must not panic
    info.log_info();
}

#[test]
fn test_reduction_kinds() {
    assert_eq!(Reduction::Mean.as_str(), "mean");
    assert_eq!(Reduction::WeightedMean(&[1.0]).as_str(), "weighted mean");
    assert_ne!(Reduction::Mean, Reduction::WeightedMean(&[]));
}

#[test]
fn test_nan_mean_axis() -> Result<()> {
    let data = arr2(&[[1.0, f64::NAN, 3.0], [f64::NAN, f64::NAN, 6.0]]).into_dyn();

    let over_rows = parallel_nan_mean_axis(&data, 0)?;
    assert_eq!(over_rows[[0]], 1.0);
    assert!(over_rows[[1]].is_nan());
    assert_eq!(over_rows[[2]], 4.5);

    let over_cols = data.reduce_along_axis(1, Reduction::Mean)?;
    assert_eq!(over_cols[[0]], 2.0);
    assert_eq!(over_cols[[1]], 6.0);

    assert!(parallel_nan_mean_axis(&data, 2).is_err());
    Ok(())
}

#[test]
fn test_nan_weighted_mean_axis() -> Result<()> {
    let data = arr2(&[[1.0, 2.0, f64::NAN], [4.0, 4.0, 4.0]]).into_dyn();
    let weights = [1.0, 3.0, 100.0];

    let result = parallel_nan_weighted_mean_axis(&data, 1, &weights)?;
    // Weight of the missing sample drops out of the denominator
    assert_close(result[[0]], 7.0 / 4.0, 1e-15);
    assert_close(result[[1]], 4.0, 1e-15);

    assert!(matches!(
        parallel_nan_weighted_mean_axis(&data, 1, &[1.0, 2.0]),
        Err(RuFeDiagError::WeightLengthMismatch { .. })
    ));

    let all_missing = ArrayD::from_elem(vec![2, 2], f64::NAN);
    let result = all_missing.reduce_along_axis(0, Reduction::WeightedMean(&[1.0, 1.0]))?;
    assert!(result.iter().all(|v| v.is_nan()));
    Ok(())
}

fn profile_field() -> Field {
    // (time = 2, nz = 3) with depth coordinates
    Field::from_shape_vec(
        "w",
        vec![
            LabeledAxis::new(Dim::Time),
            LabeledAxis::with_coords(Dim::Nz, vec![0.0, 10.0, 30.0]),
        ],
        vec![2, 3],
        vec![0.0, 1.0, 5.0, 2.0, 4.0, 8.0],
    )
    .expect("valid field")
}

#[test]
fn test_field_construction_checks() {
    let data = ArrayD::zeros(vec![2, 3]);

    assert!(matches!(
        Field::new("x", vec![LabeledAxis::new(Dim::Time)], data.clone()),
        Err(RuFeDiagError::AxisMismatch { .. })
    ));
    assert!(matches!(
        Field::new(
            "x",
            vec![LabeledAxis::new(Dim::Time), LabeledAxis::new(Dim::Time)],
            data.clone()
        ),
        Err(RuFeDiagError::AxisMismatch { .. })
    ));
    assert!(matches!(
        Field::new(
            "x",
            vec![
                LabeledAxis::new(Dim::Time),
                LabeledAxis::with_coords(Dim::Nz, vec![1.0, 2.0]),
            ],
            data
        ),
        Err(RuFeDiagError::AxisLengthMismatch { .. })
    ));
}

#[test]
fn test_dim_names() {
    for name in ["time", "nz", "nz1", "nod2", "elem"] {
        assert_eq!(Dim::from_name(name).name(), name);
    }
    assert_eq!(Dim::from_name("lat"), Dim::Other("lat".to_string()));
    assert!(Dim::Nz.is_vertical());
    assert!(Dim::Nz1.is_vertical());
    assert!(!Dim::Elem.is_vertical());
}

#[test]
fn test_field_transpose_and_select() -> Result<()> {
    let field = profile_field();
    let swapped = field.transposed(&[Dim::Nz, Dim::Time])?;
    assert_eq!(swapped.dims(), vec![Dim::Nz, Dim::Time]);
    assert_eq!(swapped.shape(), &[3, 2]);
    assert_eq!(swapped.data()[[2, 1]], 8.0);
    assert_eq!(swapped.coords(&Dim::Nz), Some(&[0.0, 10.0, 30.0][..]));

    assert!(field.transposed(&[Dim::Time, Dim::Nz1]).is_err());

    let second_day = field.select(&Dim::Time, 1)?;
    assert_eq!(second_day.dims(), vec![Dim::Nz]);
    assert_eq!(second_day.values_1d()?, arr1(&[2.0, 4.0, 8.0]));
    assert!(field.select(&Dim::Time, 2).is_err());
    Ok(())
}

#[test]
fn test_field_anomaly_and_means() -> Result<()> {
    let field = profile_field();

    let mean = field.mean_over(&Dim::Time)?;
    assert_eq!(mean.values_1d()?, arr1(&[1.0, 2.5, 6.5]));

    let anomaly = field.anomaly(&Dim::Time)?;
    assert_eq!(anomaly.shape(), field.shape());
    assert_eq!(anomaly.data()[[0, 0]], -1.0);
    assert_eq!(anomaly.data()[[1, 2]], 1.5);

    let weighted = field.weighted_mean_over(&Dim::Nz, &[1.0, 1.0, 2.0])?;
    assert_eq!(weighted.values_1d()?, arr1(&[11.0 / 4.0, 22.0 / 4.0]));

    match field.weighted_mean_over(&Dim::Nz, &[1.0]) {
        Err(RuFeDiagError::WeightLengthMismatch {
            axis,
            weights,
            axis_len,
        }) => {
            assert_eq!(axis, "nz");
            assert_eq!(weights, 1);
            assert_eq!(axis_len, 3);
        }
        other => panic!("Expected WeightLengthMismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_interp_axis() -> Result<()> {
    let field = profile_field();
    let targets = [0.0, 5.0, 20.0, 30.0, 40.0];
    let result = field.interp_axis(&Dim::Nz, &targets)?;

    assert_eq!(result.coords(&Dim::Nz), Some(&targets[..]));
    let day0: Vec<f64> = result.select(&Dim::Time, 0)?.data().iter().copied().collect();
    // Exact at shared coordinates, linear in between, NaN outside
    assert_eq!(day0[0], 0.0);
    assert_close(day0[1], 0.5, 1e-15);
    assert_close(day0[2], 3.0, 1e-15);
    assert_eq!(day0[3], 5.0);
    assert!(day0[4].is_nan());

    // Decreasing source coordinates give the same values
    let flipped = Field::from_shape_vec(
        "w",
        vec![LabeledAxis::with_coords(Dim::Nz, vec![30.0, 10.0, 0.0])],
        vec![3],
        vec![5.0, 1.0, 0.0],
    )?;
    let values = flipped.interp_axis(&Dim::Nz, &[5.0, 20.0])?;
    assert_close(values.data()[[0]], 0.5, 1e-15);
    assert_close(values.data()[[1]], 3.0, 1e-15);

    let bare = Field::from_shape_vec("w", vec![LabeledAxis::new(Dim::Nz)], vec![2], vec![1.0, 2.0])?;
    assert!(matches!(
        bare.interp_axis(&Dim::Nz, &[0.5]),
        Err(RuFeDiagError::CoordinateNotFound { .. })
    ));
    Ok(())
}

#[test]
fn test_zip_with_and_rename() -> Result<()> {
    let field = profile_field();
    let swapped = field.transposed(&[Dim::Nz, Dim::Time])?;

    let doubled = field.zip_with(&swapped, "adding", |a, b| a + b)?;
    assert_eq!(doubled.dims(), field.dims());
    assert_eq!(doubled.data()[[1, 2]], 16.0);

    let renamed = field.clone().rename_axis(&Dim::Nz, Dim::Nz1)?;
    assert!(renamed.has_axis(&Dim::Nz1));
    assert!(!renamed.has_axis(&Dim::Nz));
    assert_eq!(renamed.coords(&Dim::Nz1), Some(&[0.0, 10.0, 30.0][..]));
    assert!(field.clone().rename_axis(&Dim::Nz, Dim::Time).is_err());

    assert!(matches!(
        field.zip_with(&renamed, "multiplying", |a, b| a * b),
        Err(RuFeDiagError::AxisMismatch { .. })
    ));

    let shorter = field.select(&Dim::Time, 0)?;
    let shorter = Field::concat(&[shorter.clone(), shorter], &Dim::Nz)?;
    assert_eq!(shorter.shape(), &[6]);
    Ok(())
}

#[test]
fn test_concat_along_time() -> Result<()> {
    let piece = |t: f64| {
        Field::from_shape_vec(
            "u",
            vec![
                LabeledAxis::with_coords(Dim::Time, vec![t]),
                LabeledAxis::new(Dim::Elem),
            ],
            vec![1, 2],
            vec![t, -t],
        )
    };
    let joined = Field::concat(&[piece(1.0)?, piece(2.0)?, piece(3.0)?], &Dim::Time)?;
    assert_eq!(joined.shape(), &[3, 2]);
    assert_eq!(joined.coords(&Dim::Time), Some(&[1.0, 2.0, 3.0][..]));
    assert_eq!(joined.data()[[2, 1]], -3.0);

    let wide = Field::from_shape_vec(
        "u",
        vec![LabeledAxis::new(Dim::Time), LabeledAxis::new(Dim::Elem)],
        vec![1, 3],
        vec![0.0; 3],
    )?;
    assert!(matches!(
        Field::concat(&[piece(1.0)?, wide], &Dim::Time),
        Err(RuFeDiagError::AxisLengthMismatch { .. })
    ));
    assert!(Field::concat(&[], &Dim::Time).is_err());
    Ok(())
}

#[test]
fn test_year_range_and_tokens() {
    let range = YearRange::new(Some(1902), Some(1904));
    assert!(!range.contains(1901));
    assert!(range.contains(1902));
    assert!(range.contains(1904));
    assert!(!range.contains(1905));
    assert!(YearRange::all().contains(-5));
    assert!(YearRange::new(None, Some(1900)).contains(1));

    assert_eq!(year_token(Path::new("/data/u.fesom.1902.nc")), Some("1902"));
    assert_eq!(year_token(Path::new("temp.1950.nc")), Some("1950"));
    assert_eq!(year_token(Path::new("w.fesom.final.nc")), Some("final"));
}

#[test]
fn test_overwrite_policy() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.nc");

    OverwritePolicy::Fail.check(&path)?;
    fs::write(&path, b"existing")?;
    assert!(matches!(
        OverwritePolicy::Fail.check(&path),
        Err(RuFeDiagError::OutputExists { .. })
    ));
    OverwritePolicy::Overwrite.check(&path)?;
    assert_eq!(OverwritePolicy::default(), OverwritePolicy::Fail);
    Ok(())
}

#[test]
fn test_run_config_validation() -> Result<()> {
    let dir = tempdir()?;
    let mut config = RunConfig::new(dir.path());
    assert!(config.mask_zeros);
    config.validate()?;

    config.year_1 = Some(1905);
    config.year_f = Some(1900);
    assert!(matches!(
        config.validate(),
        Err(RuFeDiagError::InvalidConfig { .. })
    ));
    config.year_f = Some(1905);
    config.validate()?;

    config.buoyancy.alpha = f64::NAN;
    assert!(config.validate().is_err());
    config.buoyancy.alpha = 0.0002;

    config.output_path = Some(dir.path().to_path_buf());
    assert!(matches!(
        config.validate(),
        Err(RuFeDiagError::InvalidConfig { .. })
    ));

    let existing = dir.path().join("profiles.nc");
    fs::write(&existing, b"x")?;
    config.output_path = Some(existing);
    assert!(matches!(
        config.validate(),
        Err(RuFeDiagError::OutputExists { .. })
    ));
    config.overwrite = OverwritePolicy::Overwrite;
    config.validate()?;

    let options = config.load_options();
    assert_eq!(options.years, YearRange::new(Some(1905), Some(1905)));
    assert!(options.mask_zeros);
    Ok(())
}

#[test]
fn test_run_config_from_json() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("run.json");
    fs::write(
        &path,
        r#"{
            "results_path": "/work/results/souff_20",
            "year_1": 1902,
            "overwrite": "overwrite",
            "buoyancy": { "alpha": 0.0002 }
        }"#,
    )?;

    let config = RunConfig::from_json_file(&path)?;
    assert_eq!(config.results_path, PathBuf::from("/work/results/souff_20"));
    assert_eq!(config.year_1, Some(1902));
    assert_eq!(config.year_f, None);
    assert_eq!(config.overwrite, OverwritePolicy::Overwrite);
    assert!(config.mask_zeros);
    assert_eq!(config.buoyancy.alpha, 0.0002);
    assert_eq!(config.buoyancy.temp_0, 10.0);

    fs::write(&path, "{ not json")?;
    assert!(matches!(
        RunConfig::from_json_file(&path),
        Err(RuFeDiagError::JsonError(_))
    ));
    Ok(())
}

#[test]
fn test_cli_value_parsers() {
    assert_eq!(parse_grid_axis("0:10:11"), Ok((0.0, 10.0, 11)));
    assert_eq!(parse_grid_axis(" -5 : 5 : 3 "), Ok((-5.0, 5.0, 3)));
    assert!(parse_grid_axis("0:10").is_err());
    assert!(parse_grid_axis("0:10:0").is_err());
    assert!(parse_grid_axis("a:10:2").is_err());

    assert_eq!(parse_point("15,15"), Ok([15.0, 15.0]));
    assert_eq!(parse_point("-1.5, 30"), Ok([-1.5, 30.0]));
    assert!(parse_point("15").is_err());

    assert_eq!(parse_method("Cubic"), Ok(InterpolationMethod::Cubic));
    assert!(parse_method("spline").is_err());
}

#[test]
fn test_cli_profiles_arguments() -> Result<()> {
    let args = Args::try_parse_from([
        "ru_fe_diag",
        "-t",
        "2",
        "profiles",
        "--results",
        "/work/results",
        "--year-1",
        "1902",
        "--keep-zeros",
        "--alpha",
        "0.0002",
        "--overwrite",
    ])
    .expect("valid arguments");
    assert_eq!(args.threads, Some(2));

    let Command::Profiles(profiles) = args.command else {
        panic!("expected the profiles subcommand");
    };
    let config = profiles.into_run_config()?;
    assert_eq!(config.results_path, PathBuf::from("/work/results"));
    assert_eq!(config.year_1, Some(1902));
    assert_eq!(config.year_f, None);
    assert!(!config.mask_zeros);
    assert_eq!(config.buoyancy.alpha, 0.0002);
    assert_eq!(config.overwrite, OverwritePolicy::Overwrite);
    assert!(config.output_path.is_none());

    assert!(Args::try_parse_from(["ru_fe_diag", "profiles"]).is_err());
    Ok(())
}

#[test]
fn test_cli_regrid_and_mesh_arguments() -> Result<()> {
    let args = Args::try_parse_from([
        "ru_fe_diag",
        "regrid",
        "--results",
        "results",
        "--mesh",
        "mesh",
        "--var",
        "temp",
        "--method",
        "nearest",
        "--lon",
        "0:35:36",
        "--lat",
        "15:50:8",
        "--output",
        "temp.nc",
    ])
    .expect("valid arguments");
    let Command::Regrid(regrid) = args.command else {
        panic!("expected the regrid subcommand");
    };
    assert_eq!(regrid.method, InterpolationMethod::Nearest);
    assert!(regrid.load_options().mask_zeros);
    let grid = regrid.target_grid()?;
    assert_eq!(grid.shape(), (8, 36));
    assert_eq!(grid.lat()[7], 50.0);

    let args = Args::try_parse_from([
        "ru_fe_diag",
        "generate-mesh",
        "--output",
        "mesh",
        "--dx",
        "0.5",
        "--bottom",
        "16,14",
    ])
    .expect("valid arguments");
    let Command::GenerateMesh(generate) = args.command else {
        panic!("expected the generate-mesh subcommand");
    };
    let builder = generate.builder();
    assert_eq!(builder.diagonal_step(), 0.3536);
    Ok(())
}
