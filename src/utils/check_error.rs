use windows::core::Error;
use windows::Win32::Foundation::{SetLastError, ERROR_SUCCESS};

/// Wraps Win32 calls whose return value doesn't reliably indicate failure.
///
/// Clears the last error first and checks it afterwards.
pub fn check_error<F, R>(mut f: F) -> windows::core::Result<R>
where
    F: FnMut() -> R,
{
    unsafe {
        SetLastError(ERROR_SUCCESS);
        let result = f();
        let error = Error::from_win32();
        if error == Error::empty() {
            Ok(result)
        } else {
            Err(error)
        }
    }
}
