//! Opening the rendered plot in the desktop's image viewer.
//!
//! The viewer is spawned and left running; we never wait on it.

use log::{info, warn};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

/// Whether a graphical session is available to show images in.
pub fn has_display() -> bool {
    has_display_in(|var| std::env::var_os(var))
}

/// `has_display` with environment lookups done through `get`.
fn has_display_in<F: Fn(&str) -> Option<OsString>>(get: F) -> bool {
    if cfg!(target_os = "linux") {
        ["DISPLAY", "WAYLAND_DISPLAY"]
            .iter()
            .any(|v| get(v).is_some_and(|s| !s.is_empty()))
    } else {
        cfg!(any(target_os = "windows", target_os = "macos"))
    }
}

fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]).arg(path);
        c
    } else if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(path);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(path);
        c
    }
}

/// Best effort: returns whether a viewer was launched.
/// Headless sessions and viewer failures are logged, never fatal.
pub fn show<P: AsRef<Path>>(path: &P) -> bool {
    show_if(path.as_ref(), has_display())
}

fn show_if(path: &Path, display: bool) -> bool {
    if !display {
        info!("No display available, not opening {:?}", path);
        return false;
    }
    let spawned = viewer_command(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(_) => {
            info!("Opened {:?} in the image viewer", path);
            true
        }
        Err(e) => {
            warn!("Could not open image viewer for {:?}: {}", path, e);
            false
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn viewer_gets_the_path() {
        let c = viewer_command(Path::new("plot.png"));
        let args: Vec<_> = c.get_args().collect();
        assert_eq!(args.last().unwrap().to_str(), Some("plot.png"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn display_variables() {
        assert!(!has_display_in(|_| None));
        assert!(!has_display_in(|_| Some(OsString::new())));
        assert!(has_display_in(|v| {
            (v == "WAYLAND_DISPLAY").then(|| OsString::from("wayland-0"))
        }));
        assert!(has_display_in(|v| (v == "DISPLAY").then(|| OsString::from(":0"))));
    }

    #[test]
    fn headless_show_is_a_no_op() {
        // The file does not exist; nothing may try to open it.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        assert!(!show_if(&path, false));
        assert!(!path.exists());
    }
}
