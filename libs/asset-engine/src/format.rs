/// 3D container formats accepted for upload, recognized by filename
/// suffix only. Payload bytes are never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    /// `.glb`, single-file binary container.
    Glb,
    /// `.gltf`, JSON scene description.
    Gltf,
}

impl AssetFormat {
    /// Classify by case-insensitive suffix. `None` for anything else.
    pub fn from_filename(name: &str) -> Option<Self> {
        if has_suffix_ignore_case(name, ".glb") {
            Some(AssetFormat::Glb)
        } else if has_suffix_ignore_case(name, ".gltf") {
            Some(AssetFormat::Gltf)
        } else {
            None
        }
    }

    /// Registered media type served for this format.
    pub fn content_type(self) -> &'static str {
        match self {
            AssetFormat::Glb => "model/gltf-binary",
            AssetFormat::Gltf => "model/gltf+json",
        }
    }
}

impl std::fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetFormat::Glb => f.write_str("glb"),
            AssetFormat::Gltf => f.write_str("gltf"),
        }
    }
}

fn has_suffix_ignore_case(name: &str, suffix: &str) -> bool {
    let (name, suffix) = (name.as_bytes(), suffix.as_bytes());
    name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}
