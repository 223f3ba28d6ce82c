/// Platform directory name used both locally and in the remote archive
pub fn platform_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "Windows"
    } else {
        "Linux"
    }
}
