//! Offline derivation of the vocabulary cache from the Turtle ontology.

use regex::Regex;
use std::io::Write;
use std::path::Path;
use tracing::info;

use super::{OntologyCache, OntologyError};

/// Subject declarations of the form `:Name a owl:Class`.
const DECLARATION_PATTERN: &str =
    r"(?m)^:(\w+)\s+(?:a|rdf:type)\s+owl:(Class|ObjectProperty|DatatypeProperty|AnnotationProperty)\b";

/// Derive the cache from Turtle source text.
///
/// Only local-namespace subjects (`:Name`) declared with `a` or `rdf:type`
/// at the start of a line are considered. The resulting sets are sorted, so
/// the output is stable for a given source.
pub fn derive_cache(turtle: &str) -> Result<OntologyCache, OntologyError> {
    let pattern =
        Regex::new(DECLARATION_PATTERN).map_err(|e| OntologyError::Source(e.to_string()))?;

    let mut cache = OntologyCache::default();
    for caps in pattern.captures_iter(turtle) {
        let name = caps[1].to_string();
        let set = match &caps[2] {
            "Class" => &mut cache.classes,
            "ObjectProperty" => &mut cache.object_properties,
            "DatatypeProperty" => &mut cache.data_properties,
            _ => &mut cache.annotation_properties,
        };
        set.insert(name);
    }

    if cache.is_empty() {
        return Err(OntologyError::NoDefinitions);
    }
    cache.validate()?;
    Ok(cache)
}

/// Re-derive the cache at `target` from the Turtle file at `source`.
pub fn regenerate(source: &Path, target: &Path) -> Result<OntologyCache, OntologyError> {
    let turtle = std::fs::read_to_string(source).map_err(|e| OntologyError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;
    let cache = derive_cache(&turtle)?;
    write_cache(&cache, target)?;

    info!(
        source = %source.display(),
        target = %target.display(),
        classes = cache.classes.len(),
        object_properties = cache.object_properties.len(),
        data_properties = cache.data_properties.len(),
        annotation_properties = cache.annotation_properties.len(),
        "Regenerated ontology cache"
    );
    Ok(cache)
}

/// Atomically replace `target` with the serialized cache.
///
/// The JSON is written to a temporary file in the same directory and renamed
/// over the target, so readers never observe a partial artifact.
pub fn write_cache(cache: &OntologyCache, target: &Path) -> Result<(), OntologyError> {
    let json = cache.to_json()?;
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("cache.json");
    let temp = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| OntologyError::Io { path, source }
    };

    let result = (|| {
        let mut file = std::fs::File::create(&temp).map_err(io_err(&temp))?;
        file.write_all(json.as_bytes()).map_err(io_err(&temp))?;
        file.sync_all().map_err(io_err(&temp))?;
        std::fs::rename(&temp, target).map_err(io_err(target))
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&temp);
    }
    result
}
