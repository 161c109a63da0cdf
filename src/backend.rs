//! Seams between the platform independent core and the OS.
//!
//! The COM implementation lives in `interop`; tests substitute fakes.

use crate::desktop::DesktopId;
use crate::tables::InterfaceTable;
use crate::version::PlatformVariant;

use anyhow::Result;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// Raw top-level window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Per-variant access to the internal desktop manager.
///
/// One implementation exists per interface family; the binary shape of the
/// underlying objects stays private to it.
pub trait DesktopManager {
    fn current(&self) -> Result<DesktopId>;
    fn count(&self) -> Result<u32>;
    /// All desktops in their on-screen order.
    fn desktops(&self) -> Result<Vec<DesktopId>>;
    /// `Ok(None)` if the family has no name accessor or the desktop is unnamed.
    fn name(&self, id: DesktopId) -> Result<Option<String>>;
}

/// The documented, stable desktop manager plus the window queries it needs.
pub trait PublicManager {
    /// The foreground window, else the shell window.
    fn foreground_window(&self) -> Option<WindowHandle>;
    /// Visible top-level windows in z-order.
    fn visible_windows(&self) -> Vec<WindowHandle>;
    /// `Ok(None)` for windows that belong to no single desktop.
    fn window_desktop(&self, window: WindowHandle) -> Result<Option<DesktopId>>;
    fn is_on_current_desktop(&self, window: WindowHandle) -> Result<bool>;
}

/// Read-only persisted desktop data kept by the shell.
pub trait DesktopStore {
    fn name(&self, id: DesktopId) -> Result<Option<String>>;
    /// The ordered identity array.
    fn desktops(&self) -> Result<Vec<DesktopId>>;
    fn current(&self) -> Result<Option<DesktopId>>;
}

/// Queues a "current desktop changed" work item on the owning pump.
///
/// May be invoked from any thread.
pub type SwitchNotifier = Arc<dyn Fn() + Send + Sync>;

pub trait NotificationService {
    /// Registers an event sink forwarding switches to `notifier`, returns its cookie.
    fn register(&mut self, notifier: SwitchNotifier) -> Result<u32>;
    fn unregister(&mut self, cookie: u32) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpEvent {
    Tick,
    Switched,
}

pub type PumpHandler = Rc<dyn Fn(PumpEvent)>;

/// Work queue of the thread that owns the message loop.
pub trait Pump {
    fn start_timer(&mut self, interval: Duration) -> Result<()>;
    fn stop_timer(&mut self);
    fn notifier(&self) -> SwitchNotifier;
}

/// Provider of every OS object the subsystem acquires.
pub trait Interop {
    fn build_number(&self) -> Option<u32>;
    /// Returns whether this call owns the activation context.
    fn initialize(&mut self) -> Result<bool>;
    fn uninitialize(&mut self);
    fn public_manager(&mut self) -> Result<Box<dyn PublicManager>>;
    fn service_locator(&mut self) -> Result<()>;
    fn internal_manager(
        &mut self,
        variant: PlatformVariant,
        table: &InterfaceTable,
    ) -> Result<Box<dyn DesktopManager>>;
    fn notification_service(
        &mut self,
        variant: PlatformVariant,
    ) -> Result<Box<dyn NotificationService>>;
    fn desktop_store(&mut self) -> Box<dyn DesktopStore>;
    fn pump(&mut self, handler: PumpHandler) -> Result<Box<dyn Pump>>;
    /// Drops the service locator.
    fn release(&mut self);
}
