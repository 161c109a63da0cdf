use super::guid_to_id;
use crate::backend::{PublicManager, WindowHandle};
use crate::desktop::DesktopId;
use crate::utils::{get_foreground_window, get_shell_window, list_visible_windows};

use anyhow::{anyhow, Result};
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Shell::IVirtualDesktopManager;

/// The documented `IVirtualDesktopManager`.
pub struct ComPublicManager {
    manager: IVirtualDesktopManager,
}

impl ComPublicManager {
    pub fn new(manager: IVirtualDesktopManager) -> Self {
        Self { manager }
    }
}

fn to_handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

fn to_hwnd(window: WindowHandle) -> HWND {
    HWND(window.0 as _)
}

impl PublicManager for ComPublicManager {
    fn foreground_window(&self) -> Option<WindowHandle> {
        get_foreground_window()
            .or_else(get_shell_window)
            .map(to_handle)
    }

    fn visible_windows(&self) -> Vec<WindowHandle> {
        match list_visible_windows() {
            Ok(hwnds) => hwnds.into_iter().map(to_handle).collect(),
            Err(err) => {
                debug!("{err}");
                vec![]
            }
        }
    }

    fn window_desktop(&self, window: WindowHandle) -> Result<Option<DesktopId>> {
        let guid = unsafe { self.manager.GetWindowDesktopId(to_hwnd(window)) }
            .map_err(|err| anyhow!("Failed to get desktop of window {:#x}, {err}", window.0))?;
        let id = guid_to_id(&guid);
        Ok(if id.is_nil() { None } else { Some(id) })
    }

    fn is_on_current_desktop(&self, window: WindowHandle) -> Result<bool> {
        unsafe { self.manager.IsWindowOnCurrentVirtualDesktop(to_hwnd(window)) }
            .map(|v| v.as_bool())
            .map_err(|err| anyhow!("Failed to check window {:#x}, {err}", window.0))
    }
}

impl Drop for ComPublicManager {
    fn drop(&mut self) {
        debug!("public manager destroyed");
    }
}
