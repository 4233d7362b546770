//! Path utilities for service-bound paths

/// Path utilities for paths handed to the processing service
pub struct PathUtils;

impl PathUtils {
    /// Convert backslash separators to forward slashes
    ///
    /// The service expects POSIX-style paths whatever the client OS is.
    pub fn to_posix(path: &str) -> String {
        path.replace('\\', "/")
    }

    /// Last component of a service path, for display
    pub fn file_name(path: &str) -> &str {
        path.rsplit(['/', '\\']).next().unwrap_or(path)
    }
}
