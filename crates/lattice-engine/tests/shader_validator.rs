use std::fs;
use std::path::Path;

use lattice_engine::render::grid::{check_interface, check_source, ShaderStage};

#[test]
fn validate_all_shaders() {
    let shader_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/render/grid/shaders");
    let mut errors = Vec::new();

    if !shader_dir.exists() {
        panic!("Shader directory not found: {:?}", shader_dir);
    }

    let validated = validate_dir(&shader_dir, &mut errors);

    if !errors.is_empty() {
        panic!("Shader validation failed:\n{}", errors.join("\n"));
    }
    assert!(validated >= 2, "expected the vertex and fragment shaders, found {validated}");
}

fn validate_dir(dir: &Path, errors: &mut Vec<String>) -> usize {
    let mut count = 0;
    for entry in fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let path = entry.path();

        if path.is_dir() {
            count += validate_dir(&path, errors);
        } else if path.extension().is_some_and(|ext| ext == "wgsl") {
            validate_shader(&path, errors);
            count += 1;
        }
    }
    count
}

fn validate_shader(path: &Path, errors: &mut Vec<String>) {
    let source = fs::read_to_string(path).unwrap();
    let module = match naga::front::wgsl::parse_str(&source) {
        Ok(module) => module,
        Err(e) => {
            errors.push(format!("Failed to parse {:?}:\n{}", path.file_name().unwrap(), e.emit_to_string(&source)));
            return;
        }
    };

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );

    if let Err(e) = validator.validate(&module) {
        errors.push(format!("Failed to validate {:?}:\n{:?}", path.file_name().unwrap(), e));
    }
}

#[test]
fn shipped_stages_link() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/render/grid/shaders");
    let vs_src = fs::read_to_string(dir.join("grid_vs.wgsl")).unwrap();
    let fs_src = fs::read_to_string(dir.join("grid_fs.wgsl")).unwrap();

    let vs = check_source(&vs_src, ShaderStage::Vertex).unwrap();
    let fs = check_source(&fs_src, ShaderStage::Fragment).unwrap();

    assert!(vs.declares_uniform_block());
    check_interface(&vs, &fs).unwrap();
}
