//! # Shader Module
//!
//! Builds the WGSL program of a demo. Every program is the shared prelude (uniform block,
//! texture bindings, vertex input/output structs and helpers) followed by a demo body that
//! defines `vertex_main` and `fragment_main`.
//!
//! A body can also come from a file given on the command line. Such files may keep the
//! `#shader vertex` / `#shader fragment` section markers of the old single-file shader layout;
//! WGSL holds both stages in one module, so the markers are dropped.

#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use anyhow::ensure;
#[cfg(not(target_arch = "wasm32"))]
use anyhow::Context;

pub const PRELUDE: &str = include_str!("shaders/prelude.wgsl");

pub const VERTEX_ENTRY: &str = "vertex_main";

pub const FRAGMENT_ENTRY: &str = "fragment_main";

/// Prepends the prelude to a demo body.
pub fn compose(body: &str) -> String {
    format!("{PRELUDE}\n{body}")
}

/// Drops `#shader ...` section marker lines.
pub fn strip_stage_markers(source: &str) -> String {
    source
        .lines()
        .filter(|line| !line.trim_start().starts_with("#shader"))
        .fold(String::with_capacity(source.len()), |mut out, line| {
            out.push_str(line);
            out.push('\n');
            out
        })
}

/// Checks that a body declares both entry points.
pub fn check_entry_points(body: &str) -> anyhow::Result<()> {
    for entry in [VERTEX_ENTRY, FRAGMENT_ENTRY] {
        ensure!(
            body.contains(&format!("fn {entry}")),
            "shader defines no `{entry}` entry point"
        );
    }
    Ok(())
}

/// Reads a shader body from disk.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_body(path: impl AsRef<Path>) -> anyhow::Result<String> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read shader {}", path.display()))?;
    let body = strip_stage_markers(&source);
    check_entry_points(&body).with_context(|| format!("invalid shader {}", path.display()))?;
    log::info!("Loaded shader {}", path.display());
    Ok(body)
}

pub fn create_module(device: &wgpu::Device, label: &str, body: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Owned(compose(body))),
    })
}

/// Creates the module and reports WGSL validation errors instead of leaving them to the
/// device's uncaptured error handler.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_checked_module(
    device: &wgpu::Device,
    label: &str,
    body: &str,
) -> anyhow::Result<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = create_module(device, label, body);
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        anyhow::bail!("shader {label} failed to compile: {error}");
    }
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_puts_prelude_first() {
        let program = compose("@vertex fn vertex_main() {}");
        assert!(program.starts_with(PRELUDE));
        assert!(program.ends_with("@vertex fn vertex_main() {}"));
        assert!(program.contains("struct Uniforms"));
    }

    #[test]
    fn markers_are_removed() {
        let split = "#shader vertex\nfn vertex_main() {}\n  #shader fragment\nfn fragment_main() {}\n";
        let merged = strip_stage_markers(split);
        assert_eq!(merged, "fn vertex_main() {}\nfn fragment_main() {}\n");
        assert!(check_entry_points(&merged).is_ok());
    }

    #[test]
    fn missing_entry_point_is_reported() {
        let err = check_entry_points("fn vertex_main() {}").unwrap_err();
        assert!(err.to_string().contains("fragment_main"));
    }
}
