use std::ffi::OsString;
use std::io;
use std::path::Path;

/**
    Extensions (without the dot) of files picked up in bulk mode.
*/
pub const VALID_EXTENSIONS: &[&str] = &["mp4", "mkv"];

pub fn has_valid_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VALID_EXTENSIONS.contains(&ext))
}

/**
    List the file names in `dir` that bulk mode should transcode.

    Only the top level is read. Directories are skipped even when their name
    carries a video extension. Names are returned sorted so jobs run in a
    stable order.
*/
pub fn find_inputs(dir: &Path) -> io::Result<Vec<OsString>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if has_valid_extension(Path::new(&name)) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
