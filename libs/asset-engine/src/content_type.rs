use crate::format::AssetFormat;

/// Wire content type for a stored asset.
///
/// The filename suffix wins over whatever the uploader declared: browsers
/// report `.glb`/`.gltf` inconsistently (often `application/octet-stream`
/// or nothing). Unknown suffixes fall back to the declared type verbatim.
pub fn resolve_content_type(name: &str, declared: &str) -> String {
    match AssetFormat::from_filename(name) {
        Some(format) => format.content_type().to_string(),
        None => declared.to_string(),
    }
}
