use std::path::PathBuf;

use raycast_core::{Assets, Config, SampleType, Volume};

fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("raycast-assets-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn i32_le(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[test]
fn raw_volume_is_normalized_to_bytes() {
    let path = scratch_file("ramp.raw", &i32_le(&[-100, 0, 100, 300, 0, 0, 0, 0]));

    let volume = Volume::load_raw(&path, [2, 2, 2], SampleType::I32).unwrap();

    assert_eq!(volume.dims, [2, 2, 2]);
    assert_eq!((volume.min, volume.max), (-100.0, 300.0));
    assert_eq!(volume.data[0], 0);
    assert_eq!(volume.data[3], 255);
    assert_eq!(volume.value_at(1, 0, 0), Some(63));
}

#[test]
fn short_volume_file_is_rejected() {
    let path = scratch_file("short.raw", &i32_le(&[1, 2, 3]));

    let err = Volume::load_raw(&path, [2, 2, 2], SampleType::I32).unwrap_err();

    assert!(format!("{err:#}").contains("need 32"));
}

#[test]
fn missing_volume_file_names_the_path() {
    let err = Volume::load_raw("/nonexistent/scan.raw", [4, 4, 4], SampleType::U8).unwrap_err();
    assert!(err.to_string().contains("scan.raw"));
}

#[test]
fn config_without_files_uses_builtins() {
    let assets = Assets::load(&Config::default()).unwrap();

    assert_eq!(assets.volume.dims, [64, 64, 64]);
    assert!(assets.colormap.width() > 1);
    assert!(assets.mesh.is_none());
    assert!(assets.shader.is_none());
}

#[test]
fn config_files_are_loaded() {
    let volume = scratch_file("cube.raw", &[0, 10, 20, 30, 40, 50, 60, 70]);
    let mesh = scratch_file(
        "tri.obj",
        b"v 0 0 0\nv 4 0 0\nv 0 2 0\nvn 0 0 1\nf 1//1 2//1 3//1\n",
    );
    let shader = scratch_file(
        "custom.wgsl",
        b"#shader vertex\n@vertex fn vertex_main(input: VertexInput) -> VertexOutput { return transform_vertex(input); }\n#shader fragment\n@fragment fn fragment_main(input: VertexOutput) -> @location(0) vec4<f32> { return input.color; }\n",
    );

    let config = Config {
        volume: Some(volume),
        dims: [2, 2, 2],
        sample_type: SampleType::U8,
        mesh: Some(mesh),
        shader: Some(shader),
        ..Config::default()
    };
    let assets = Assets::load(&config).unwrap();

    assert_eq!((assets.volume.min, assets.volume.max), (0.0, 70.0));
    assert_eq!(assets.volume.data[7], 255);

    let mesh = assets.mesh.unwrap();
    assert_eq!(mesh.triangle_count(), 1);
    let (min, max) = mesh.bounds().unwrap();
    assert!(min.iter().chain(max.iter()).all(|c| c.abs() <= 0.5 + 1e-5));

    let shader = assets.shader.unwrap();
    assert!(!shader.contains("#shader"));
    assert!(shader.contains("fn fragment_main"));
}

#[test]
fn shader_without_entry_points_is_rejected() {
    let shader = scratch_file("broken.wgsl", b"fn helper() {}\n");
    let config = Config {
        shader: Some(shader),
        ..Config::default()
    };
    assert!(Assets::load(&config).is_err());
}
