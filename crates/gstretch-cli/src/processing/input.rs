//! Input file handling and path utilities.

use std::path::{Path, PathBuf};

/// Raster extensions picked up when expanding directories
pub const SUPPORTED_EXTENSIONS: &[&str] = &["tif", "tiff", "png"];

/// Suffix added to the input file stem for generated output names
const OUTPUT_SUFFIX: &str = "_gaussian";

/// Determine the output path for a stretched raster
///
/// # Arguments
/// * `input` - Input file path
/// * `out` - Optional output directory or file path
///
/// # Returns
/// `out` itself when it names a file, otherwise `<stem>_gaussian.tif` inside
/// `out` (when it is a directory) or next to the input.
pub fn determine_output_path(input: &Path, out: &Option<PathBuf>) -> Result<PathBuf, String> {
    let filename = || -> Result<String, String> {
        let stem = input
            .file_stem()
            .ok_or_else(|| format!("Invalid input filename: {}", input.display()))?
            .to_string_lossy();
        Ok(format!("{}{}.tif", stem, OUTPUT_SUFFIX))
    };

    match out {
        Some(out_path) if out_path.is_dir() => Ok(out_path.join(filename()?)),
        Some(out_path) => Ok(out_path.clone()),
        None => {
            let parent = input.parent().unwrap_or(Path::new("."));
            Ok(parent.join(filename()?))
        }
    }
}

/// Expand a list of inputs (files and directories) into a list of raster files.
///
/// Directories are scanned for supported files (.tif, .tiff, .png), skipping
/// outputs of earlier runs. If `recursive` is true, subdirectories are also
/// scanned.
pub fn expand_inputs(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            collect_rasters_from_dir(input, recursive, &mut files)?;
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(format!("Path not found: {}", input.display()));
        }
    }

    // Sort for consistent ordering
    files.sort();
    files.dedup();
    Ok(files)
}

fn collect_rasters_from_dir(
    dir: &Path,
    recursive: bool,
    files: &mut Vec<PathBuf>,
) -> Result<(), String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("Failed to read directory {}: {}", dir.display(), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("Error reading directory entry: {}", e))?;
        let path = entry.path();

        if path.is_dir() {
            if recursive {
                collect_rasters_from_dir(&path, recursive, files)?;
            }
        } else if path.is_file() && is_stretch_candidate(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_stretch_candidate(path: &Path) -> bool {
    let supported = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false);
    let already_stretched = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|stem| stem.ends_with(OUTPUT_SUFFIX))
        .unwrap_or(false);
    supported && !already_stretched
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_output_next_to_input() {
        let path = determine_output_path(Path::new("/data/landsat/band3.tif"), &None).unwrap();
        assert_eq!(path, PathBuf::from("/data/landsat/band3_gaussian.tif"));
    }

    #[test]
    fn test_output_in_directory() {
        let dir = tempdir().unwrap();
        let out = Some(dir.path().to_path_buf());
        let path = determine_output_path(Path::new("scans/dem.png"), &out).unwrap();
        assert_eq!(path, dir.path().join("dem_gaussian.tif"));
    }

    #[test]
    fn test_explicit_output_file() {
        let out = Some(PathBuf::from("/tmp/result.tif"));
        let path = determine_output_path(Path::new("in.tif"), &out).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/result.tif"));
    }

    #[test]
    fn test_expand_inputs_filters_and_sorts() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        for name in ["b.tif", "a.TIFF", "notes.txt", "c.png", "a_gaussian.tif"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::write(nested.join("d.tif"), b"").unwrap();

        let flat = expand_inputs(&[dir.path().to_path_buf()], false).unwrap();
        assert_eq!(
            flat,
            vec![
                dir.path().join("a.TIFF"),
                dir.path().join("b.tif"),
                dir.path().join("c.png"),
            ]
        );

        let recursive = expand_inputs(&[dir.path().to_path_buf()], true).unwrap();
        assert_eq!(recursive.len(), 4);
        assert!(recursive.contains(&nested.join("d.tif")));
    }

    #[test]
    fn test_expand_inputs_keeps_explicit_files() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("old_gaussian.tif");
        fs::write(&file, b"").unwrap();

        let files = expand_inputs(&[file.clone(), file.clone()], false).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_expand_inputs_missing_path() {
        let dir = tempdir().unwrap();
        let result = expand_inputs(&[dir.path().join("missing.tif")], false);
        assert!(result.unwrap_err().starts_with("Path not found"));
    }
}
