use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq)]
pub enum DiskSpace {
    Available { free_mb: f64 },
    Unavailable { reason: String },
}

pub fn available_space_mb(path: &Path) -> DiskSpace {
    let probe_path = nearest_existing_path(path);

    #[cfg(unix)]
    {
        match statvfs_available_bytes(&probe_path) {
            Ok(bytes) => {
                return DiskSpace::Available {
                    free_mb: bytes as f64 / 1024.0 / 1024.0,
                }
            }
            Err(statvfs_reason) => {
                if let Some(bytes) = df_available_bytes(&probe_path) {
                    return DiskSpace::Available {
                        free_mb: bytes as f64 / 1024.0 / 1024.0,
                    };
                }
                return DiskSpace::Unavailable {
                    reason: statvfs_reason,
                };
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Some(bytes) = df_available_bytes(&probe_path) {
            return DiskSpace::Available {
                free_mb: bytes as f64 / 1024.0 / 1024.0,
            };
        }
        DiskSpace::Unavailable {
            reason: format!(
                "no free-space probe available for {}",
                probe_path.display()
            ),
        }
    }
}

fn nearest_existing_path(path: &Path) -> PathBuf {
    let mut current = path.to_path_buf();
    loop {
        if current.exists() {
            return current;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return PathBuf::from("/"),
        }
    }
}

#[cfg(unix)]
fn statvfs_available_bytes(path: &Path) -> Result<u64, String> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| format!("path contains a NUL byte: {}", path.display()))?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(format!(
            "statvfs failed for {}: {}",
            path.display(),
            std::io::Error::last_os_error()
        ));
    }

    Ok(stat.f_bavail as u64 * stat.f_frsize as u64)
}

fn df_available_bytes(path: &Path) -> Option<u64> {
    let output = Command::new("df")
        .arg("-k")
        .arg(path)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().nth(1)?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return None;
    }
    fields[3].parse::<u64>().ok().map(|kb| kb * 1024)
}
