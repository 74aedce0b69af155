/// Compiled-in response tokens and timing for the supported module families.
///
/// Tokens and budgets collected from the Bluetooth AT module, the sub-GHz
/// radio command shell and the GNSS receiver drivers. Field indices follow
/// [`sentence`](crate::sentence) numbering: the tag is field 1.

use crate::config::LinkConfig;
use crate::transport::Terminator;
use crate::waiter::{PendingTransaction, PollBudget};

/// Response conventions of one command-driven peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    pub name: &'static str,
    /// Substring that marks a completed command.
    pub success: &'static str,
    /// Substring the device emits when it rejects a command.
    pub error: Option<&'static str>,
    pub terminator: Terminator,
    pub budget: PollBudget,
}

impl DeviceProfile {
    /// Transaction waiting for this device's success token.
    pub const fn transaction(&self) -> PendingTransaction<'static> {
        PendingTransaction::new(self.success, self.error, self.budget)
    }

    /// Link settings carrying this device's terminator and poll budget.
    pub const fn link_config(&self) -> LinkConfig {
        LinkConfig {
            poll_delay_ms: self.budget.poll_delay_ms,
            max_polls: self.budget.max_polls,
            terminator: self.terminator,
        }
    }

    /// Transaction waiting for `expected` with this device's error token and timing.
    pub const fn expecting<'a>(&self, expected: &'a str) -> PendingTransaction<'a> {
        PendingTransaction::new(expected, self.error, self.budget)
    }
}

impl From<&DeviceProfile> for LinkConfig {
    fn from(profile: &DeviceProfile) -> Self {
        profile.link_config()
    }
}

/// Bluetooth AT-command module: `OK` / `ERR`, roughly 1 s per command.
pub const BLUETOOTH_AT: DeviceProfile = DeviceProfile {
    name: "bluetooth_at",
    success: "OK",
    error: Some("ERR"),
    terminator: Terminator::CrLf,
    budget: PollBudget::new(100, 10),
};

/// Sub-GHz radio module shell: answers with its `COM1>` prompt.
pub const SUBGHZ_RADIO: DeviceProfile = DeviceProfile {
    name: "subghz_radio",
    success: "COM1>",
    error: Some("ERR"),
    terminator: Terminator::Cr,
    budget: PollBudget::new(200, 10),
};

/// Boot banner after power-up or reset; slow, no error token.
pub const BOOT_BANNER: DeviceProfile = DeviceProfile {
    name: "boot_banner",
    success: "Ready",
    error: None,
    terminator: Terminator::CrLf,
    budget: PollBudget::new(300, 10),
};

/// GNSS receiver: streams sentences, accepts `$PMTK`-style commands acked
/// with `$PMTK001`.
pub const GNSS: DeviceProfile = DeviceProfile {
    name: "gnss",
    success: "$PMTK001",
    error: None,
    terminator: Terminator::CrLf,
    budget: PollBudget::new(100, 10),
};

/// All built-in profiles.
pub static PROFILES: &[DeviceProfile] = &[BLUETOOTH_AT, SUBGHZ_RADIO, BOOT_BANNER, GNSS];

/// Look up a built-in profile by name.
pub fn profile(name: &str) -> Option<&'static DeviceProfile> {
    PROFILES.iter().find(|p| p.name == name)
}

/// NMEA field delimiter.
pub const NMEA_DELIMITER: char = ',';

/// GGA (fix data) field indices.
pub mod gga {
    pub const TAG: &str = "GGA";
    pub const UTC_TIME: usize = 2;
    pub const LATITUDE: usize = 3;
    pub const LAT_HEMISPHERE: usize = 4;
    pub const LONGITUDE: usize = 5;
    pub const LON_HEMISPHERE: usize = 6;
    /// 0 = no fix
    pub const FIX_QUALITY: usize = 7;
    pub const SATELLITES: usize = 8;
    pub const HDOP: usize = 9;
    pub const ALTITUDE: usize = 10;
    pub const GEOID_SEPARATION: usize = 12;
}

/// RMC (recommended minimum) field indices.
pub mod rmc {
    pub const TAG: &str = "RMC";
    pub const UTC_TIME: usize = 2;
    /// `A` = valid, `V` = warning
    pub const STATUS: usize = 3;
    pub const LATITUDE: usize = 4;
    pub const LAT_HEMISPHERE: usize = 5;
    pub const LONGITUDE: usize = 6;
    pub const LON_HEMISPHERE: usize = 7;
    pub const SPEED_KNOTS: usize = 8;
    pub const COURSE: usize = 9;
    pub const DATE: usize = 10;
}
