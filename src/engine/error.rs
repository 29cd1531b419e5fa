// Error taxonomy for mesh loading and GPU upload.
//
// Load-time errors carry the file path and (where it applies) the 1-based line,
// so a startup failure names the stage and the offending input.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading or parsing a geometry file.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{}:{line}: face has {corners} corners, only triangles are supported", path.display())]
    UnsupportedFace {
        path: PathBuf,
        line: usize,
        corners: usize,
    },

    #[error("{}:{line}: vertex index {index} out of range (mesh has {vertex_count} vertices)", path.display())]
    IndexOutOfRange {
        path: PathBuf,
        line: usize,
        index: i64,
        vertex_count: usize,
    },
}

/// Failure reported by the graphics device.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter found")]
    Adapter,

    #[error("failed to open graphics device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("upload of buffer '{label}' failed: {source}")]
    Upload {
        label: &'static str,
        #[source]
        source: wgpu::Error,
    },

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

pub type MeshResult<T> = Result<T, MeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_path_and_line() {
        let err = MeshError::UnsupportedFace {
            path: PathBuf::from("models/horse.obj"),
            line: 12,
            corners: 4,
        };
        assert_eq!(
            err.to_string(),
            "models/horse.obj:12: face has 4 corners, only triangles are supported"
        );

    }

    #[test]
    fn upload_error_keeps_wgpu_cause() {
        let err = DeviceError::Upload {
            label: "Index Buffer",
            source: wgpu::Error::OutOfMemory {
                source: Box::new(std::io::Error::other("heap exhausted")),
            },
        };
        assert_eq!(err.to_string(), "upload of buffer 'Index Buffer' failed: Out of Memory");

        let cause = std::error::Error::source(&err).expect("upload error has a cause");
        assert!(matches!(cause.downcast_ref::<wgpu::Error>(), Some(wgpu::Error::OutOfMemory { .. })));

        // anyhow walks the whole chain down to the driver-level reason.
        let report = format!("{:#}", anyhow::Error::new(err).context("uploading mesh"));
        assert!(report.contains("heap exhausted"), "{report}");
    }
}
