use crate::backend::{Pump, PumpEvent, PumpHandler, SwitchNotifier};
use crate::utils::{check_error, get_window_user_data, set_window_user_data};

use anyhow::{anyhow, bail, Result};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, KillTimer, PostMessageW, RegisterClassW,
    SetTimer, HWND_MESSAGE, WINDOW_EX_STYLE, WINDOW_STYLE, WM_TIMER, WNDCLASSW,
};

pub const NAME: PCWSTR = w!("Virtual Desktop Watcher");
pub const WM_USER_DESKTOP_SWITCHED: u32 = 6100;
const POLL_TIMER_ID: usize = 1;

struct PumpState {
    handler: PumpHandler,
}

/// Message-only window owned by the thread running the message loop.
///
/// Timer ticks and switch notifications posted from any thread arrive in its
/// window procedure and are forwarded to the handler.
pub struct MessagePump {
    hwnd: HWND,
    target: Arc<Mutex<Option<isize>>>,
    timer: bool,
}

impl MessagePump {
    pub fn new(handler: PumpHandler) -> Result<Self> {
        let hwnd = Self::create_window()?;
        let state = Box::into_raw(Box::new(PumpState { handler }));
        if let Err(err) = check_error(|| set_window_user_data(hwnd, state as _)) {
            unsafe {
                drop(Box::from_raw(state));
                let _ = DestroyWindow(hwnd);
            }
            bail!("Failed to set window ptr, {err}");
        }
        Ok(Self {
            hwnd,
            target: Arc::new(Mutex::new(Some(hwnd.0 as isize))),
            timer: false,
        })
    }

    fn create_window() -> Result<HWND> {
        let hinstance = unsafe { GetModuleHandleW(None) }
            .map_err(|err| anyhow!("Failed to get current module handle, {err}"))?;

        static ATOM: OnceCell<u16> = OnceCell::new();
        let atom = ATOM.get_or_try_init(|| {
            let window_class = WNDCLASSW {
                hInstance: HINSTANCE(hinstance.0),
                lpszClassName: NAME,
                lpfnWndProc: Some(Self::window_proc),
                ..Default::default()
            };
            check_error(|| unsafe { RegisterClassW(&window_class) })
                .map_err(|err| anyhow!("Failed to register class, {err}"))
        })?;

        unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                PCWSTR(*atom as _),
                NAME,
                WINDOW_STYLE(0),
                0,
                0,
                0,
                0,
                Some(HWND_MESSAGE),
                None,
                Some(hinstance.into()),
                None,
            )
        }
        .map_err(|err| anyhow!("Failed to create message window, {err}"))
    }

    unsafe extern "system" fn window_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        let event = match msg {
            WM_TIMER if wparam.0 == POLL_TIMER_ID => PumpEvent::Tick,
            WM_USER_DESKTOP_SWITCHED => PumpEvent::Switched,
            _ => return DefWindowProcW(hwnd, msg, wparam, lparam),
        };
        let state = get_window_user_data(hwnd) as *const PumpState;
        if state.is_null() {
            return LRESULT(0);
        }
        // the handler may drop this pump
        let handler = (*state).handler.clone();
        handler(event);
        LRESULT(0)
    }
}

impl Pump for MessagePump {
    fn start_timer(&mut self, interval: Duration) -> Result<()> {
        let elapse = interval.as_millis().clamp(10, u32::MAX as u128) as u32;
        let ret = unsafe { SetTimer(Some(self.hwnd), POLL_TIMER_ID, elapse, None) };
        if ret == 0 {
            bail!(
                "Failed to start poll timer, {}",
                windows::core::Error::from_win32()
            );
        }
        self.timer = true;
        debug!("poll timer started, {elapse}ms");
        Ok(())
    }

    fn stop_timer(&mut self) {
        if !self.timer {
            return;
        }
        self.timer = false;
        if let Err(err) = unsafe { KillTimer(Some(self.hwnd), POLL_TIMER_ID) } {
            warn!("Failed to stop poll timer, {err}");
        }
    }

    fn notifier(&self) -> SwitchNotifier {
        let target = self.target.clone();
        Arc::new(move || {
            if let Some(hwnd) = *target.lock() {
                let ret = unsafe {
                    PostMessageW(
                        Some(HWND(hwnd as _)),
                        WM_USER_DESKTOP_SWITCHED,
                        WPARAM(0),
                        LPARAM(0),
                    )
                };
                if let Err(err) = ret {
                    warn!("Failed to post desktop switch, {err}");
                }
            }
        })
    }
}

impl Drop for MessagePump {
    fn drop(&mut self) {
        self.target.lock().take();
        self.stop_timer();
        let state = get_window_user_data(self.hwnd) as *mut PumpState;
        set_window_user_data(self.hwnd, 0);
        if !state.is_null() {
            drop(unsafe { Box::from_raw(state) });
        }
        if let Err(err) = unsafe { DestroyWindow(self.hwnd) } {
            warn!("Failed to destroy message window, {err}");
        }
        debug!("message pump destroyed");
    }
}
