mod check_error;
mod regedit;
mod window;
mod windows_version;

pub use check_error::*;
pub use regedit::*;
pub use window::*;
pub use windows_version::*;

pub fn to_wstring(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(Some(0)).collect::<Vec<u16>>()
}
