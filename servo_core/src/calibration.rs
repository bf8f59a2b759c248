//! Persistent calibration record and lock-mode flag (§3 "Data model").

use servo_hal::{DefaultsSource, EepromStorage};

/// `{upper_limit: u16, lower_limit: u16, speed: u16}`, persisted
/// little-endian at a fixed EEPROM offset (§6 "Persisted state").
///
/// `lower_limit <= upper_limit` is expected but never enforced — the slew
/// engine converges either way (§3 invariant, §7 "Invalid calibration").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationRecord {
    pub upper_limit: u16,
    pub lower_limit: u16,
    pub speed: u16,
}

impl CalibrationRecord {
    pub const BYTE_LEN: usize = 6;

    pub const fn new(upper_limit: u16, lower_limit: u16, speed: u16) -> Self {
        Self {
            upper_limit,
            lower_limit,
            speed,
        }
    }

    pub fn to_bytes(self) -> [u8; Self::BYTE_LEN] {
        let mut out = [0u8; Self::BYTE_LEN];
        out[0..2].copy_from_slice(&self.upper_limit.to_le_bytes());
        out[2..4].copy_from_slice(&self.lower_limit.to_le_bytes());
        out[4..6].copy_from_slice(&self.speed.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; Self::BYTE_LEN]) -> Self {
        Self {
            upper_limit: u16::from_le_bytes([bytes[0], bytes[1]]),
            lower_limit: u16::from_le_bytes([bytes[2], bytes[3]]),
            speed: u16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }
}

/// The immutable factory copy, embedded in program memory (§3 "Defaults
/// source"). Used both for first-boot initialization and the user-reset
/// gesture.
pub const FACTORY_DEFAULTS: CalibrationRecord = CalibrationRecord::new(
    crate::variant::PWM_OPEN_LIM,
    crate::variant::PWM_CLOSED_LIM,
    4,
);
pub const FACTORY_LOCK_FLAG: bool = false;

/// EEPROM layout (§6): calibration record, then one lock-flag byte, then
/// (optionally) one checksum byte.
pub const EEPROM_CAL_OFFSET: u16 = 0;
pub const EEPROM_LOCK_OFFSET: u16 = CalibrationRecord::BYTE_LEN as u16;
#[cfg(feature = "checksum")]
pub const EEPROM_CHECKSUM_OFFSET: u16 = EEPROM_LOCK_OFFSET + 1;

#[cfg(feature = "checksum")]
const CRC: crc::Crc<u8> = crc::Crc::<u8>::new(&crc::CRC_8_SMBUS);

/// Outcome of loading calibration from EEPROM at boot (§3 supplement:
/// "Persisted record checksum"). Not a recoverable runtime error in the
/// traditional sense (§7) — just a record of which source was used, for
/// `firmware`'s startup log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationLoadError {
    /// The `checksum` feature is enabled and the stored CRC did not match;
    /// factory defaults were substituted.
    ChecksumMismatch,
}

/// Reads the calibration record and lock flag from EEPROM, falling back to
/// [`FACTORY_DEFAULTS`] / [`FACTORY_LOCK_FLAG`] when the `checksum` feature
/// is enabled and the stored checksum does not match (§3 supplement).
/// Without the `checksum` feature this never fails, matching V1/V2a/V3's
/// original behavior of trusting whatever bytes are read back (§7 "Power
/// loss during EEPROM write... accepted risk").
pub fn load(
    eeprom: &mut impl EepromStorage,
) -> (CalibrationRecord, bool, Option<CalibrationLoadError>) {
    let mut buf = [0u8; CalibrationRecord::BYTE_LEN];
    eeprom.read_block(EEPROM_CAL_OFFSET, &mut buf);
    let lock_flag = eeprom.read_byte(EEPROM_LOCK_OFFSET) != 0;

    #[cfg(feature = "checksum")]
    {
        let stored_crc = eeprom.read_byte(EEPROM_CHECKSUM_OFFSET);
        let mut digest = CRC.digest();
        digest.update(&buf);
        digest.update(&[eeprom.read_byte(EEPROM_LOCK_OFFSET)]);
        if digest.finalize() != stored_crc {
            return (
                FACTORY_DEFAULTS,
                FACTORY_LOCK_FLAG,
                Some(CalibrationLoadError::ChecksumMismatch),
            );
        }
    }

    (CalibrationRecord::from_bytes(&buf), lock_flag, None)
}

/// Writes the calibration record and lock flag to EEPROM (§4.F
/// "EEPROM_COMMIT", "LOCKED" entry/exit).
pub fn store(eeprom: &mut impl EepromStorage, record: CalibrationRecord, lock_flag: bool) {
    let bytes = record.to_bytes();
    eeprom.write_block(EEPROM_CAL_OFFSET, &bytes);
    eeprom.write_byte(EEPROM_LOCK_OFFSET, lock_flag as u8);

    #[cfg(feature = "checksum")]
    {
        let mut digest = CRC.digest();
        digest.update(&bytes);
        digest.update(&[lock_flag as u8]);
        eeprom.write_byte(EEPROM_CHECKSUM_OFFSET, digest.finalize());
    }
}

/// Reads the in-program factory-defaults record without touching EEPROM
/// (§4.F "LO_LIM... on entry (once): reload RAM calibration from the
/// in-program defaults" — RAM only; the EEPROM record is left untouched
/// until EEPROM_COMMIT).
pub fn load_defaults(defaults: &impl DefaultsSource) -> CalibrationRecord {
    let mut buf = [0u8; CalibrationRecord::BYTE_LEN];
    defaults.read_block(&mut buf);
    CalibrationRecord::from_bytes(&buf)
}

/// Copies the in-program defaults over both the RAM calibration and the
/// EEPROM record, and clears the persisted lock flag (§4.F "User-reset
/// gesture").
pub fn reset_to_defaults(
    eeprom: &mut impl EepromStorage,
    defaults: &impl DefaultsSource,
) -> CalibrationRecord {
    let mut buf = [0u8; CalibrationRecord::BYTE_LEN];
    defaults.read_block(&mut buf);
    let record = CalibrationRecord::from_bytes(&buf);
    store(eeprom, record, false);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use servo_hal::mock::InMemoryEeprom;

    #[test]
    fn byte_round_trip_is_exact() {
        let record = CalibrationRecord::new(2250, 750, 4);
        assert_eq!(CalibrationRecord::from_bytes(&record.to_bytes()), record);
    }

    #[test]
    fn store_then_load_round_trips_byte_for_byte() {
        let record = CalibrationRecord::new(2260, 720, 8);
        let mut eeprom = InMemoryEeprom::new(16);
        store(&mut eeprom, record, true);
        let (loaded, lock_flag, err) = load(&mut eeprom);
        assert_eq!(loaded, record);
        assert!(lock_flag);
        assert!(err.is_none());
    }

    #[test]
    fn load_defaults_reads_without_touching_eeprom() {
        let defaults =
            servo_hal::mock::FixedDefaults::new(FACTORY_DEFAULTS.to_bytes().to_vec());
        assert_eq!(load_defaults(&defaults), FACTORY_DEFAULTS);
    }

    #[test]
    fn reset_to_defaults_copies_factory_record_and_clears_lock() {
        let mut eeprom = InMemoryEeprom::new(16);
        store(&mut eeprom, CalibrationRecord::new(2260, 720, 8), true);
        let defaults =
            servo_hal::mock::FixedDefaults::new(FACTORY_DEFAULTS.to_bytes().to_vec());

        let record = reset_to_defaults(&mut eeprom, &defaults);
        assert_eq!(record, FACTORY_DEFAULTS);

        let (stored, lock_flag, _) = load(&mut eeprom);
        assert_eq!(stored, FACTORY_DEFAULTS);
        assert!(!lock_flag);
    }

    #[cfg(feature = "checksum")]
    #[test]
    fn checksum_mismatch_falls_back_to_factory_defaults() {
        let mut eeprom = InMemoryEeprom::new(16);
        store(&mut eeprom, CalibrationRecord::new(2260, 720, 8), true);
        eeprom.corrupt(EEPROM_CAL_OFFSET);

        let (record, lock_flag, err) = load(&mut eeprom);
        assert_eq!(record, FACTORY_DEFAULTS);
        assert_eq!(lock_flag, FACTORY_LOCK_FLAG);
        assert_eq!(err, Some(CalibrationLoadError::ChecksumMismatch));
    }

    #[cfg(feature = "checksum")]
    #[test]
    fn checksum_matches_on_clean_round_trip() {
        let mut eeprom = InMemoryEeprom::new(16);
        store(&mut eeprom, CalibrationRecord::new(2260, 720, 8), false);
        let (_, _, err) = load(&mut eeprom);
        assert!(err.is_none());
    }
}
