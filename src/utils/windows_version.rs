use once_cell::sync::OnceCell;
use windows::{
    Wdk::System::SystemServices::RtlGetVersion, Win32::System::SystemInformation::OSVERSIONINFOW,
};

/// Version info straight from ntdll, unaffected by compatibility shims.
pub fn os_version_info() -> Option<OSVERSIONINFOW> {
    let mut info = OSVERSIONINFOW {
        dwOSVersionInfoSize: std::mem::size_of::<OSVERSIONINFOW>() as _,
        ..Default::default()
    };

    let status = unsafe { RtlGetVersion(&mut info) };
    if status.is_ok() {
        Some(info)
    } else {
        None
    }
}

/// Cached for the life of the process.
pub fn os_build_number() -> Option<u32> {
    static BUILD: OnceCell<Option<u32>> = OnceCell::new();
    *BUILD.get_or_init(|| os_version_info().map(|info| info.dwBuildNumber))
}
