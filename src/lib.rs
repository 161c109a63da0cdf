#[macro_use]
extern crate log;

mod acquire;
mod backend;
mod config;
mod desktop;
mod dispatcher;
mod polling;
mod resolver;
mod tables;
mod version;
mod virtual_desktop;

#[cfg(test)]
mod fake;
#[cfg(windows)]
mod interop;
#[cfg(windows)]
pub mod utils;

pub use crate::acquire::{Availability, Capability, SubsystemState};
pub use crate::backend::{
    DesktopManager, DesktopStore, Interop, NotificationService, PublicManager, Pump, PumpEvent,
    PumpHandler, SwitchNotifier, WindowHandle,
};
pub use crate::config::Config;
pub use crate::desktop::{DesktopId, DesktopInfo};
pub use crate::tables::{InterfaceFamily, InterfaceTable};
pub use crate::version::PlatformVariant;
pub use crate::virtual_desktop::VirtualDesktops;
