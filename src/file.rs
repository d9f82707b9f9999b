// src/file.rs

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

/// Resolve where to write an output file.
/// - empty → `default_filename` in the working directory
/// - trailing separator or existing directory → `default_filename` inside it
/// - anything else → used as the file path
pub fn resolve_out_path(user_o: &str, default_filename: &str) -> io::Result<PathBuf> {
    if user_o.is_empty() {
        return Ok(PathBuf::from(default_filename));
    }
    let p = PathBuf::from(normalize_separators(user_o));
    if looks_like_dir_hint(&p) || p.is_dir() {
        ensure_directory(&p)?;
        Ok(p.join(default_filename))
    } else {
        Ok(p)
    }
}

/// Write bytes (PNG) or text to the resolved path, creating parent dirs. Returns the path.
pub fn write_output(user_o: &str, default_filename: &str, contents: impl AsRef<[u8]>) -> io::Result<PathBuf> {
    let path = resolve_out_path(user_o, default_filename)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    fs::write(&path, contents)?;
    logd!("wrote {}", path.display());
    Ok(path)
}

pub fn normalize_separators(p: &str) -> String {
    let sep = std::path::MAIN_SEPARATOR;
    p.chars().map(|c| if c == '/' || c == '\\' { sep } else { c }).collect()
}

pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", dir.display()),
        ));
    }
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

pub fn looks_like_dir_hint(p: &Path) -> bool {
    let s = p.to_string_lossy();
    s.ends_with('/') || s.ends_with('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_hint_gets_default_name() {
        let base = std::env::temp_dir().join(format!("econ_scrape_file_{}", std::process::id()));
        let _ = fs::remove_dir_all(&base);
        let hint = format!("{}/cards/", base.display());

        let p = write_output(&hint, "indicator_table.png", b"png").unwrap();
        assert_eq!(p.file_name().and_then(|s| s.to_str()), Some("indicator_table.png"));
        assert_eq!(fs::read(&p).unwrap(), b"png");

        let explicit = base.join("out.txt");
        let p = write_output(&explicit.to_string_lossy(), "ignored.txt", "hello").unwrap();
        assert_eq!(p, explicit);
        let _ = fs::remove_dir_all(&base);
    }
}
