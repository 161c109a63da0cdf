use crate::version::PlatformVariant;

/// Class id of the documented `VirtualDesktopManager` coclass.
#[cfg(windows)]
pub const CLSID_VIRTUAL_DESKTOP_MANAGER: u128 = 0xaa509086_5ca9_4c25_8f95_589d3c07b48a;
/// Class id of the immersive shell, the service locator for internal objects.
#[cfg(windows)]
pub const CLSID_IMMERSIVE_SHELL: u128 = 0xc2f03a33_21f5_47fa_b4bb_156362a2f239;
/// Service id of the internal desktop manager.
#[cfg(windows)]
pub const SID_VIRTUAL_DESKTOP_MANAGER_INTERNAL: u128 = 0xc5e0cdca_7b6e_41b2_9fc4_d93975cc467b;
/// Service id of the notification service.
#[cfg(windows)]
pub const SID_VIRTUAL_DESKTOP_NOTIFICATION_SERVICE: u128 = 0xa501fdec_4a09_464c_ae4e_1b9c21b84918;
/// Interface id of the notification service, unchanged across releases.
#[cfg(windows)]
pub const IID_VIRTUAL_DESKTOP_NOTIFICATION_SERVICE: u128 = 0x0cd45e71_d927_4f15_8b0a_8fef525337bf;

/// The three interface ids that change shape between releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceTable {
    pub desktop: u128,
    pub manager: u128,
    pub notification: u128,
}

/// Interface families; every variant belongs to exactly one.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceFamily {
    Win10,
    Win11_21H2,
    Win11_23H2,
    Win11_24H2_Preview,
}

const WIN10: InterfaceTable = InterfaceTable {
    desktop: 0xff72ffdd_be7e_43fc_9c03_ad81681e88e4,
    manager: 0xf31574d6_b682_4cdc_bd56_1827860abec6,
    notification: 0xc179334c_4295_40d3_bea1_c654d965605a,
};

const WIN11_21H2: InterfaceTable = InterfaceTable {
    desktop: 0x536d3495_b208_4cc9_ae26_de8111275bf8,
    manager: 0xb2f925b9_5a0f_4d2e_9f4d_2b1507593c10,
    notification: 0xcd403e52_deed_4c13_b437_b98380f2b1e8,
};

const WIN11_23H2: InterfaceTable = InterfaceTable {
    desktop: 0x3f07f4be_b107_441a_af0f_39d82529072c,
    manager: 0xa3175f2d_239c_4bd2_8aa0_eeba8b0b138e,
    notification: 0xb9e5e94d_233e_49ab_af5c_2b4541c3aade,
};

const WIN11_24H2_PREVIEW: InterfaceTable = InterfaceTable {
    desktop: 0x9f4c7c69_6ed1_408c_a3a9_1c0f89e3b7b2,
    manager: 0x53f5ca0b_158f_4124_900c_057158060b27,
    notification: 0x1ba7cf30_3591_43fa_abfa_4aaf7abeedb7,
};

impl InterfaceFamily {
    /// `Unknown` shares the newest family: future builds are more likely to
    /// look like the latest one than like an old one.
    pub fn for_variant(variant: PlatformVariant) -> Self {
        use PlatformVariant::*;
        match variant {
            Win10_1803 | Win10_1809 | Win10_1903 | Win10_1909 | Win10_2004 | Win10_20H2
            | Win10_21H1 | Win10_21H2 | Win10_22H2 => InterfaceFamily::Win10,
            Win11_21H2 | Win11_22H2 => InterfaceFamily::Win11_21H2,
            Win11_23H2 | Win11_24H2 => InterfaceFamily::Win11_23H2,
            Win11_24H2_Preview | Unknown => InterfaceFamily::Win11_24H2_Preview,
        }
    }

    pub fn table(&self) -> InterfaceTable {
        match self {
            InterfaceFamily::Win10 => WIN10,
            InterfaceFamily::Win11_21H2 => WIN11_21H2,
            InterfaceFamily::Win11_23H2 => WIN11_23H2,
            InterfaceFamily::Win11_24H2_Preview => WIN11_24H2_PREVIEW,
        }
    }
}

impl InterfaceTable {
    pub fn for_variant(variant: PlatformVariant) -> Self {
        InterfaceFamily::for_variant(variant).table()
    }

    pub fn ids(&self) -> [u128; 3] {
        [self.desktop, self.manager, self.notification]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_table() {
        for variant in PlatformVariant::ALL {
            let table = InterfaceTable::for_variant(*variant);
            let ids = table.ids();
            assert!(ids.iter().all(|id| *id != 0), "{variant}");
            assert!(ids[0] != ids[1] && ids[1] != ids[2] && ids[0] != ids[2]);
            assert_eq!(table, InterfaceTable::for_variant(*variant));
        }
    }

    #[test]
    fn test_win10_22h2() {
        let variant = PlatformVariant::classify(19045);
        assert_eq!(variant, PlatformVariant::Win10_22H2);
        assert_eq!(InterfaceFamily::for_variant(variant), InterfaceFamily::Win10);
        let table = InterfaceTable::for_variant(variant);
        assert_eq!(table.desktop, 0xff72ffdd_be7e_43fc_9c03_ad81681e88e4);
        assert_eq!(table.manager, 0xf31574d6_b682_4cdc_bd56_1827860abec6);
        assert_eq!(table.notification, 0xc179334c_4295_40d3_bea1_c654d965605a);
    }

    #[test]
    fn test_unknown_uses_newest() {
        assert_eq!(
            InterfaceTable::for_variant(PlatformVariant::Unknown),
            InterfaceTable::for_variant(PlatformVariant::NEWEST)
        );
    }
}
