use crate::backend::{DesktopManager, DesktopStore, Interop, NotificationService, PublicManager};
use crate::config::Config;
use crate::tables::InterfaceTable;
use crate::version::PlatformVariant;

/// How current-desktop queries and switch detection are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Internal manager available; switches arrive through an event sink.
    Notification,
    /// Only the documented manager; switches are detected by sampling.
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsystemState {
    Uninitialized,
    Ready(Capability),
    Unavailable,
    ShutDown,
}

/// Outcome of `VirtualDesktops::init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Polling,
    Unavailable,
}

impl SubsystemState {
    pub fn availability(&self) -> Availability {
        match self {
            SubsystemState::Ready(Capability::Notification) => Availability::Available,
            SubsystemState::Ready(Capability::Polling) => Availability::Polling,
            _ => Availability::Unavailable,
        }
    }
}

/// Every object obtained during acquisition, in acquisition order.
#[derive(Default)]
pub struct Handles {
    pub owns_activation: bool,
    pub public: Option<Box<dyn PublicManager>>,
    pub located: bool,
    pub internal: Option<Box<dyn DesktopManager>>,
    pub notifications: Option<Box<dyn NotificationService>>,
    pub store: Option<Box<dyn DesktopStore>>,
}

impl Handles {
    pub fn capability(&self) -> Option<Capability> {
        if self.internal.is_some() {
            Some(Capability::Notification)
        } else if self.public.is_some() {
            Some(Capability::Polling)
        } else {
            None
        }
    }
}

/// Acquires as much of the interop surface as the system offers.
///
/// Never fails: each missing object lowers the capability instead.
pub fn acquire(interop: &mut dyn Interop, variant: PlatformVariant, config: &Config) -> Handles {
    let mut handles = Handles::default();

    match interop.initialize() {
        Ok(owned) => {
            handles.owns_activation = owned;
            debug!("activation context ready, owned={owned}");
        }
        Err(err) => {
            error!("{err}");
            return handles;
        }
    }

    match interop.public_manager() {
        Ok(public) => {
            info!("public desktop manager acquired");
            handles.public = Some(public);
        }
        Err(err) => warn!("{err}"),
    }

    if config.notifications {
        acquire_internal(interop, variant, &mut handles);
    } else {
        info!("internal desktop manager disabled by config");
    }

    handles.store = Some(interop.desktop_store());

    match handles.capability() {
        Some(Capability::Notification) => {
            info!("virtual desktop interfaces acquired for {variant}")
        }
        Some(Capability::Polling) => warn!("internal interfaces unavailable, polling for switches"),
        None => warn!("no virtual desktop api available"),
    }
    handles
}

fn acquire_internal(interop: &mut dyn Interop, variant: PlatformVariant, handles: &mut Handles) {
    if let Err(err) = interop.service_locator() {
        warn!("{err}");
        return;
    }
    handles.located = true;

    let table = InterfaceTable::for_variant(variant);
    match interop.internal_manager(variant, &table) {
        Ok(manager) => handles.internal = Some(manager),
        Err(err) => {
            warn!("{err}");
            return;
        }
    }

    match interop.notification_service(variant) {
        Ok(service) => handles.notifications = Some(service),
        Err(err) => warn!("{err}, switches will be polled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeInterop, World};

    #[test]
    fn test_full() {
        let world = World::with_desktops(2);
        let mut interop = FakeInterop(world);
        let handles = acquire(&mut interop, PlatformVariant::Win11_23H2, &Config::default());
        assert!(handles.owns_activation);
        assert!(handles.notifications.is_some());
        assert!(handles.store.is_some());
        assert_eq!(handles.capability(), Some(Capability::Notification));
    }

    #[test]
    fn test_downgrade() {
        let world = World::with_desktops(2);
        world.borrow_mut().fail.internal = true;
        let mut interop = FakeInterop(world.clone());
        let handles = acquire(&mut interop, PlatformVariant::Win10_22H2, &Config::default());
        assert!(handles.located);
        assert_eq!(handles.capability(), Some(Capability::Polling));

        world.borrow_mut().fail.public = true;
        let handles = acquire(&mut interop, PlatformVariant::Win10_22H2, &Config::default());
        assert_eq!(handles.capability(), None);

        world.borrow_mut().fail.activation = true;
        let handles = acquire(&mut interop, PlatformVariant::Win10_22H2, &Config::default());
        assert!(!handles.owns_activation);
        assert!(handles.store.is_none());
    }

    #[test]
    fn test_service_optional() {
        let world = World::with_desktops(2);
        world.borrow_mut().fail.service = true;
        let mut interop = FakeInterop(world);
        let handles = acquire(&mut interop, PlatformVariant::Win11_21H2, &Config::default());
        assert!(handles.notifications.is_none());
        assert_eq!(handles.capability(), Some(Capability::Notification));
    }

    #[test]
    fn test_notifications_disabled() {
        let world = World::with_desktops(2);
        let mut interop = FakeInterop(world);
        let config = Config {
            notifications: false,
            ..Default::default()
        };
        let handles = acquire(&mut interop, PlatformVariant::Win11_21H2, &config);
        assert!(!handles.located);
        assert_eq!(handles.capability(), Some(Capability::Polling));
    }
}
