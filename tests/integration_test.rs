//! End-to-end tests on small synthetic WAVEWATCH III / ADCIRC-like files

use image::GenericImageView;
use netcdf::{create, open};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;
use ww3vis::dataset::{resolve_pattern, GridLayout, WaveDataset};
use ww3vis::errors::Ww3VisError;
use ww3vis::inspect::{inspect, summarize};
use ww3vis::plots::{
    difference, plot_contours, plot_tri_direction, plot_tri_height, ContourOptions,
    DifferenceOptions, DirectionOptions, PlotOptions, TriOptions,
};
use ww3vis::render::MapCanvas;

const WW3_TIME_UNITS: &str = "days since 1990-01-01 00:00:00";
/// 2015-12-14 00:00:00 as days since 1990-01-01
const DEC_14_2015: f64 = 9478.0;

/// 6 × 6 nodes over a small coastal box, stored as an unstructured node list
fn mesh_nodes() -> (Vec<f64>, Vec<f64>) {
    let mut lon = Vec::new();
    let mut lat = Vec::new();
    for j in 0..6 {
        for i in 0..6 {
            lon.push(-72.6 + 0.04 * i as f64);
            lat.push(40.8 + 0.02 * j as f64);
        }
    }
    (lon, lat)
}

fn add_time(file: &mut netcdf::FileMut, times: &[f64], units: &str) {
    let mut time = file
        .add_variable::<f64>("time", &["time"])
        .expect("Failed to add time");
    time.put_attribute("units", units)
        .expect("Failed to add units");
    time.put_values(times, ..).expect("Failed to write time");
}

/// Unstructured file with `var(time, node)`; `field(step, lon, lat)` gives the values
fn write_mesh_file(path: &Path, times: &[f64], var: &str, field: impl Fn(usize, f64, f64) -> f32) {
    let (lon, lat) = mesh_nodes();
    let mut file = create(path).expect("Failed to create NetCDF file");
    file.add_dimension("node", lon.len())
        .expect("Failed to add dimension node");
    file.add_dimension("time", times.len())
        .expect("Failed to add dimension time");

    file.add_variable::<f64>("longitude", &["node"])
        .expect("Failed to add longitude")
        .put_values(&lon, ..)
        .expect("Failed to write longitude");
    file.add_variable::<f64>("latitude", &["node"])
        .expect("Failed to add latitude")
        .put_values(&lat, ..)
        .expect("Failed to write latitude");
    add_time(&mut file, times, WW3_TIME_UNITS);

    let values: Vec<f32> = (0..times.len())
        .flat_map(|t| lon.iter().zip(&lat).map(move |(&x, &y)| (t, x, y)))
        .map(|(t, x, y)| field(t, x, y))
        .collect();
    let mut v = file
        .add_variable::<f32>(var, &["time", "node"])
        .expect("Failed to add field");
    v.put_attribute("units", "m").expect("Failed to add units");
    v.put_values(&values, ..).expect("Failed to write field");
}

/// Structured 5 × 4 file with `hs(time, latitude, longitude)`
fn write_grid_file(path: &Path, times: &[f64]) {
    let mut file = create(path).expect("Failed to create NetCDF file");
    file.add_dimension("longitude", 5)
        .expect("Failed to add dimension longitude");
    file.add_dimension("latitude", 4)
        .expect("Failed to add dimension latitude");
    file.add_dimension("time", times.len())
        .expect("Failed to add dimension time");
    file.add_variable::<f64>("longitude", &["longitude"])
        .expect("Failed to add longitude")
        .put_values(&[-80.0, -75.0, -70.0, -65.0, -60.0], ..)
        .expect("Failed to write longitude");
    file.add_variable::<f64>("latitude", &["latitude"])
        .expect("Failed to add latitude")
        .put_values(&[30.0, 35.0, 40.0, 45.0], ..)
        .expect("Failed to write latitude");
    add_time(&mut file, times, WW3_TIME_UNITS);

    let values: Vec<f32> = (0..times.len() * 4 * 5)
        .map(|k| (k % 20) as f32 * 0.2)
        .collect();
    file.add_variable::<f32>("hs", &["time", "latitude", "longitude"])
        .expect("Failed to add hs")
        .put_values(&values, ..)
        .expect("Failed to write hs");
}

fn wave_height(t: usize, lon: f64, lat: f64) -> f32 {
    (0.5 + 2.0 * (lon + 72.6) + 5.0 * (lat - 40.8) + 0.1 * t as f64) as f32
}

fn plot_options(output_dir: &Path, site: &str) -> PlotOptions {
    PlotOptions {
        site: site.to_string(),
        output_dir: output_dir.to_path_buf(),
        generation_stamp: "20240101".to_string(),
        width: 400,
        height: 300,
        meridian_step: 0.07,
        parallel_step: 0.03,
        ..PlotOptions::default()
    }
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_tri_height_pipeline_writes_one_png_per_step() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input = temp_dir.path().join("ww3.Constant.20151214_hs.nc");
    write_mesh_file(&input, &[DEC_14_2015, DEC_14_2015 + 0.125], "hs", wave_height);

    let out_dir = temp_dir.path().join("plots");
    let opts = PlotOptions {
        file_suffix: "_tri".to_string(),
        ..plot_options(&out_dir, "Shinnecock_WW3")
    };
    let tri_opts = TriOptions {
        pattern: input.to_string_lossy().into_owned(),
        grid_size: (60, 60),
        ..TriOptions::default()
    };

    let written = plot_tri_height(&opts, &tri_opts).expect("tri plot failed");
    assert_eq!(
        file_names(&written),
        vec![
            "20240101_Shinnecock_WW3_20151214_000000_tri.png",
            "20240101_Shinnecock_WW3_20151214_030000_tri.png",
        ]
    );

    // The middle of the map is inside the mesh and gets colored
    let layout = MapCanvas::new(400, 300, (-72.6, -72.4, 40.8, 40.9)).expect("canvas");
    let frame = layout.frame();
    for path in &written {
        let image = image::open(path).expect("Failed to read PNG");
        assert_eq!(image.dimensions(), (400, 300));
        let center = image
            .get_pixel(frame.x + frame.width / 2, frame.y + frame.height / 2)
            .0;
        assert_ne!(center, [255, 255, 255, 255]);
        assert!(center[0] != center[1] || center[1] != center[2]);
    }
}

#[test]
fn test_contour_pipeline_on_structured_grid() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input = temp_dir.path().join("ec2001_hs.nc");
    write_grid_file(&input, &[DEC_14_2015, DEC_14_2015 + 1.0]);

    let dataset = WaveDataset::open(&input.to_string_lossy()).expect("open");
    let coords = dataset.coordinates().expect("coordinates");
    assert_eq!(coords.layout, GridLayout::Structured { nlat: 4, nlon: 5 });
    assert_eq!(coords.len(), 20);
    // Row-major expansion: node 6 is latitude row 1, longitude column 1
    assert_eq!((coords.lon[6], coords.lat[6]), (-75.0, 35.0));
    let record = dataset.read_record("hs", 1).expect("record");
    assert_eq!(record.len(), 20);
    assert!((record[6] - 1.2).abs() < 1e-6);

    let out_dir = temp_dir.path().join("plots");
    let opts = PlotOptions {
        meridian_step: 5.0,
        parallel_step: 5.0,
        ..plot_options(&out_dir, "EC2001_WW3")
    };
    let contour = ContourOptions {
        pattern: input.to_string_lossy().into_owned(),
        ..ContourOptions::default()
    };
    let written = plot_contours(&opts, &contour).expect("contour plot failed");
    assert_eq!(
        file_names(&written),
        vec![
            "20240101_EC2001_WW3_20151214_000000.png",
            "20240101_EC2001_WW3_20151215_000000.png",
        ]
    );
    assert!(written.iter().all(|p| p.exists()));
}

#[test]
fn test_tri_direction_pipeline_with_stations() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let times = [DEC_14_2015, DEC_14_2015 + 0.5];
    write_mesh_file(&temp_dir.path().join("ww3.20151214_hs.nc"), &times, "hs", wave_height);
    write_mesh_file(&temp_dir.path().join("ww3.20151214_dir.nc"), &times, "dir", |t, _, _| {
        if t == 0 {
            270.0
        } else {
            225.0
        }
    });
    let stations = temp_dir.path().join("erie_ndbc.loc");
    std::fs::write(
        &stations,
        "$ test buoys\n-72.5 40.85 'A'\n-72.45 40.88\n-10.0 10.0 $ outside the map\n",
    )
    .expect("Failed to write station file");

    let out_dir = temp_dir.path().join("plots");
    let opts = PlotOptions {
        title_prefix: Some("(12 km): Hsig:".to_string()),
        ..plot_options(&out_dir, "Erie_WW3")
    };
    assert_eq!(
        opts.title("20151214 00:00:00"),
        "Erie_WW3 (12 km): Hsig: 20151214 00:00:00 (m)"
    );
    let tri_opts = TriOptions {
        pattern: temp_dir
            .path()
            .join("ww3.????????_hs.nc")
            .to_string_lossy()
            .into_owned(),
        flatness: 0.10,
        grid_size: (50, 50),
        vmax: Some(4.0),
        ..TriOptions::default()
    };
    let dir_opts = DirectionOptions {
        pattern: temp_dir
            .path()
            .join("ww3.????????_dir.nc")
            .to_string_lossy()
            .into_owned(),
        stations: Some(stations),
        ..DirectionOptions::default()
    };

    let written = plot_tri_direction(&opts, &tri_opts, &dir_opts).expect("tri-dir plot failed");
    assert_eq!(
        file_names(&written),
        vec![
            "20240101_Erie_WW3_20151214_000000.png",
            "20240101_Erie_WW3_20151214_120000.png",
        ]
    );

    // Direction file with a different number of steps cannot be paired
    let short = temp_dir.path().join("short_dir.nc");
    write_mesh_file(&short, &times[..1], "dir", |_, _, _| 90.0);
    let misaligned = DirectionOptions {
        pattern: short.to_string_lossy().into_owned(),
        stations: None,
        ..DirectionOptions::default()
    };
    assert!(matches!(
        plot_tri_direction(&opts, &tri_opts, &misaligned),
        Err(Ww3VisError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_misaligned_inputs_are_rejected() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let times = [DEC_14_2015, DEC_14_2015 + 0.5];

    // Same step count, direction output six hours later
    let hs = temp_dir.path().join("hs.nc");
    let dir = temp_dir.path().join("dir.nc");
    write_mesh_file(&hs, &times, "hs", wave_height);
    write_mesh_file(&dir, &[times[0] + 0.25, times[1] + 0.25], "dir", |_, _, _| 270.0);
    let heights = WaveDataset::open(&hs.to_string_lossy()).expect("open");
    let directions = WaveDataset::open(&dir.to_string_lossy()).expect("open");
    assert_eq!(heights.len(), directions.len());
    assert!(matches!(
        heights.check_aligned(&directions),
        Err(Ww3VisError::ShapeMismatch { .. })
    ));

    // Under a second of drift still pairs up
    let close = temp_dir.path().join("close_dir.nc");
    let drift = 0.5 / 86_400.0;
    write_mesh_file(&close, &[times[0] + drift, times[1] + drift], "dir", |_, _, _| 270.0);
    let close = WaveDataset::open(&close.to_string_lossy()).expect("open");
    assert!(heights.check_aligned(&close).is_ok());

    // A multi-file set whose second file has a different node count
    let set_dir = temp_dir.path().join("set");
    std::fs::create_dir_all(&set_dir).expect("Failed to create set dir");
    write_mesh_file(&set_dir.join("ww3.20151214_hs.nc"), &times, "hs", wave_height);
    write_grid_file(&set_dir.join("ww3.20151215_hs.nc"), &[DEC_14_2015 + 1.0]);
    let pattern = set_dir.join("ww3.????????_hs.nc");
    assert!(matches!(
        WaveDataset::open(&pattern.to_string_lossy()),
        Err(Ww3VisError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_multi_file_aggregation_order() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    // Written out of order; aggregation follows the sorted file names
    write_mesh_file(
        &temp_dir.path().join("ww3.20151215_hs.nc"),
        &[DEC_14_2015 + 1.0, DEC_14_2015 + 1.5],
        "hs",
        |t, _, _| 10.0 + t as f32,
    );
    write_mesh_file(
        &temp_dir.path().join("ww3.20151214_hs.nc"),
        &[DEC_14_2015, DEC_14_2015 + 0.5],
        "hs",
        |t, _, _| t as f32,
    );

    let pattern = temp_dir.path().join("ww3.????????_hs.nc");
    let pattern = pattern.to_string_lossy();
    let paths = resolve_pattern(&pattern).expect("resolve");
    assert_eq!(
        file_names(&paths),
        vec!["ww3.20151214_hs.nc", "ww3.20151215_hs.nc"]
    );

    let dataset = WaveDataset::open(&pattern).expect("open");
    assert_eq!(dataset.len(), 4);
    assert_eq!(
        dataset.times(),
        &[DEC_14_2015, DEC_14_2015 + 0.5, DEC_14_2015 + 1.0, DEC_14_2015 + 1.5]
    );
    assert_eq!(dataset.read_record("hs", 1).expect("record")[0], 1.0);
    assert_eq!(dataset.read_record("hs", 2).expect("record")[0], 10.0);
    assert_eq!(dataset.read_record("hs", 3).expect("record")[0], 11.0);

    let all = dataset.read_all("hs").expect("read all");
    assert_eq!(all.dim(), (4, 36));

    let summary = summarize(&dataset).expect("summary");
    assert_eq!(summary.layout, Some(GridLayout::Unstructured));
    assert_eq!(summary.node_count, Some(36));
    assert_eq!(summary.steps, 4);
    assert_eq!(
        summary.last_time.map(|t| t.to_string()),
        Some("2015-12-15 12:00:00".to_string())
    );
}

#[test]
fn test_packed_short_variable_is_unpacked() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("packed_hs.nc");
    {
        let (lon, lat) = mesh_nodes();
        let mut file = create(&path).expect("Failed to create NetCDF file");
        file.add_dimension("node", lon.len())
            .expect("Failed to add dimension node");
        file.add_dimension("time", 1)
            .expect("Failed to add dimension time");
        file.add_variable::<f64>("longitude", &["node"])
            .expect("Failed to add longitude")
            .put_values(&lon, ..)
            .expect("Failed to write longitude");
        file.add_variable::<f64>("latitude", &["node"])
            .expect("Failed to add latitude")
            .put_values(&lat, ..)
            .expect("Failed to write latitude");
        add_time(&mut file, &[0.0], "hours since 2015-12-14 06:00:00");

        let mut raw = vec![50i16; lon.len()];
        raw[0] = 123;
        raw[1] = -999;
        let mut hs = file
            .add_variable::<i16>("hs", &["time", "node"])
            .expect("Failed to add hs");
        hs.put_attribute("_FillValue", -999i16)
            .expect("Failed to add fill value");
        hs.put_attribute("scale_factor", 0.01f32)
            .expect("Failed to add scale factor");
        hs.put_attribute("add_offset", 0.0f32)
            .expect("Failed to add offset");
        hs.put_values(&raw, ..).expect("Failed to write hs");
    }

    let dataset = WaveDataset::open(&path.to_string_lossy()).expect("open");
    assert_eq!(
        dataset.datetime(0).expect("datetime").to_string(),
        "2015-12-14 06:00:00"
    );
    let record = dataset.read_record("hs", 0).expect("record");
    assert!((record[0] - 1.23).abs() < 1e-6);
    assert!(record[1].is_nan());
    assert!((record[2] - 0.5).abs() < 1e-6);
}

#[test]
fn test_difference_of_two_runs() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let write_zeta = |name: &str, values: &[f64], nodes: usize| -> PathBuf {
        let path = temp_dir.path().join(name);
        let mut file = create(&path).expect("Failed to create NetCDF file");
        file.add_dimension("time", 2)
            .expect("Failed to add dimension time");
        file.add_dimension("node", nodes)
            .expect("Failed to add dimension node");
        add_time(&mut file, &[0.0, 3600.0], "seconds since 2024-01-01 00:00:00");
        let mut zeta = file
            .add_variable::<f64>("zeta", &["time", "node"])
            .expect("Failed to add zeta");
        zeta.put_attribute("long_name", "water surface elevation above geoid")
            .expect("Failed to add long_name");
        zeta.put_attribute("units", "m")
            .expect("Failed to add units");
        zeta.put_values(values, ..).expect("Failed to write zeta");
        path
    };

    let baseline = write_zeta("uncoupled.63.nc", &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0], 3);
    let coupled = write_zeta("coupled.63.nc", &[0.5, 0.0, -0.5, 1.2, 0.9, 1.0], 3);
    let png = temp_dir.path().join("zeta_diff.png");
    let nc = temp_dir.path().join("zeta_diff.nc");

    let opts = DifferenceOptions {
        first: baseline.to_string_lossy().into_owned(),
        second: coupled.to_string_lossy().into_owned(),
        output_png: Some(png.clone()),
        output_netcdf: Some(nc.clone()),
        ..DifferenceOptions::default()
    };
    let report = difference(&opts).expect("difference failed");

    assert_eq!(report.time_index, 1);
    assert_eq!(report.datetime.to_string(), "2024-01-01 01:00:00");
    let expected = [0.2, -0.1, 0.0];
    for (got, want) in report.slice.iter().zip(expected) {
        assert!((got - want).abs() < 1e-12);
    }
    assert!((report.stats.min + 0.1).abs() < 1e-12);
    assert!((report.stats.max - 0.2).abs() < 1e-12);
    assert!((report.stats.mean - 0.1 / 3.0).abs() < 1e-12);
    assert_eq!((report.stats.valid, report.stats.total), (3, 3));
    assert_eq!(report.written, vec![png.clone(), nc.clone()]);
    assert!(png.exists());
    report.print_summary("zeta");

    // The full field round-trips through NetCDF with attributes carried over
    let file = open(&nc).expect("Failed to open difference file");
    let var = file.variable("zeta_diff").expect("Variable not found");
    let values = var.get_values::<f64, _>(..).expect("Failed to read");
    let full = [0.5, 0.0, -0.5, 0.2, -0.1, 0.0];
    for (got, want) in values.iter().zip(full) {
        assert!((got - want).abs() < 1e-12);
    }
    assert!(var.attribute("units").is_some());
    assert!(var.attribute("comment").is_some());
    assert!(file.attribute("history").is_some());
    let times = file
        .variable("time")
        .expect("time not found")
        .get_values::<f64, _>(..)
        .expect("Failed to read time");
    assert_eq!(times, vec![0.0, 3600.0]);

    // First slice on request
    let first_slice = difference(&DifferenceOptions {
        time_index: Some(0),
        output_png: None,
        output_netcdf: None,
        ..opts.clone()
    })
    .expect("difference failed");
    assert_eq!(first_slice.slice, vec![0.5, 0.0, -0.5]);
    assert!(first_slice.written.is_empty());

    let wider = write_zeta("wider.63.nc", &[0.0; 8], 4);
    let mismatched = DifferenceOptions {
        second: wider.to_string_lossy().into_owned(),
        output_png: None,
        output_netcdf: None,
        ..opts.clone()
    };
    assert!(matches!(
        difference(&mismatched),
        Err(Ww3VisError::ShapeMismatch { .. })
    ));

    let out_of_range = DifferenceOptions {
        time_index: Some(5),
        output_png: None,
        output_netcdf: None,
        ..opts
    };
    assert!(difference(&out_of_range).is_err());
}

#[test]
fn test_error_variants_for_bad_input() {
    let temp_dir = tempdir().expect("Failed to create temp dir");

    let missing = temp_dir.path().join("nothing_*.nc");
    assert!(matches!(
        WaveDataset::open(&missing.to_string_lossy()),
        Err(Ww3VisError::NoMatchingFiles { .. })
    ));
    assert!(matches!(
        resolve_pattern("[unclosed"),
        Err(Ww3VisError::Pattern(_))
    ));

    let input = temp_dir.path().join("hs.nc");
    write_mesh_file(&input, &[DEC_14_2015], "hs", wave_height);
    let dataset = WaveDataset::open(&input.to_string_lossy()).expect("open");
    assert!(matches!(
        dataset.read_record("wind", 0),
        Err(Ww3VisError::VariableNotFound { .. })
    ));
    assert!(matches!(
        dataset.read_record("hs", 7),
        Err(Ww3VisError::ShapeMismatch { .. })
    ));

    let summary = inspect(&input.to_string_lossy()).expect("inspect");
    assert_eq!(summary.paths, vec![input.clone()]);
    assert_eq!(summary.steps, 1);

    let opts = plot_options(&temp_dir.path().join("plots"), "WW3");
    let wrong_var = TriOptions {
        pattern: input.to_string_lossy().into_owned(),
        variable: "hsig".to_string(),
        grid_size: (20, 20),
        ..TriOptions::default()
    };
    assert!(matches!(
        plot_tri_height(&opts, &wrong_var),
        Err(Ww3VisError::VariableNotFound { .. })
    ));
}

#[test]
fn test_cli_reports_failure_once() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("nothing_*.nc");
    let missing = missing.to_string_lossy().into_owned();

    let output = Command::new(env!("CARGO_BIN_EXE_ww3vis"))
        .args(["inspect", &missing])
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run ww3vis");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches(missing.as_str()).count(), 1, "stderr: {stderr}");
    assert_eq!(stderr.matches('❌').count(), 1);

    // Unknown log levels are rejected before anything runs
    let output = Command::new(env!("CARGO_BIN_EXE_ww3vis"))
        .args(["--log-level", "inof", "inspect", &missing])
        .output()
        .expect("Failed to run ww3vis");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid log level"));
}
