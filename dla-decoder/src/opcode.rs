//! Datalogger opcodes
//!
//! The first token of every log line names its record type. Two firmware
//! revisions misspelled an opcode (`MOVF` for `COVF`, `PWM` for `PRM`); both
//! spellings are accepted.

/// A recognised opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `ACL` - accelerometer sample
    Accelerometer,
    /// `BOVF` - write buffer overflow
    BufferOverflow,
    /// `CRM` - received CAN frame
    CanReceive,
    /// `COVF` / `MOVF`
    CanOverflow,
    /// `CRD` - SD card information
    CardInfo,
    /// `PRM` / `PWM` - logger parameters, not decoded
    Parameters,
    /// `MNT` - SD card mounted
    Mount,
    /// `PFM` - statistical performance measurement
    Performance,
    /// `VLT` - statistical voltage measurement
    Voltage,
    /// `DM` - SD card dismount, not decoded
    Dismount,
    /// `CTE` - CAN transmit error
    CanTransmitError,
    /// `T_RTC` - real time clock; marks the start of telemetry
    RealTimeClock,
    /// `CRE` - CAN receive error, not decoded
    CanReceiveError,
}

impl Opcode {
    /// Opcode for the synchronization sentinel token
    pub const SYNC_TOKEN: &'static str = "T_RTC";

    /// Look up an opcode token (case-sensitive)
    pub fn from_token(token: &str) -> Option<Self> {
        let opcode = match token {
            "ACL" => Opcode::Accelerometer,
            "BOVF" => Opcode::BufferOverflow,
            "CRM" => Opcode::CanReceive,
            "COVF" | "MOVF" => Opcode::CanOverflow,
            "CRD" => Opcode::CardInfo,
            "PRM" | "PWM" => Opcode::Parameters,
            "MNT" => Opcode::Mount,
            "PFM" => Opcode::Performance,
            "VLT" => Opcode::Voltage,
            "DM" => Opcode::Dismount,
            "CTE" => Opcode::CanTransmitError,
            "T_RTC" => Opcode::RealTimeClock,
            "CRE" => Opcode::CanReceiveError,
            _ => return None,
        };
        Some(opcode)
    }

    /// Numeric id from the datalogger format documentation
    pub fn id(&self) -> u8 {
        match self {
            Opcode::Accelerometer => 0,
            Opcode::BufferOverflow => 1,
            Opcode::CanReceive => 2,
            Opcode::CanOverflow => 3,
            Opcode::CardInfo => 4,
            Opcode::Parameters => 5,
            Opcode::Mount => 6,
            Opcode::Performance => 7,
            Opcode::Voltage => 8,
            Opcode::Dismount => 9,
            Opcode::CanTransmitError => 10,
            Opcode::RealTimeClock => 11,
            Opcode::CanReceiveError => 12,
        }
    }

    /// Canonical token
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Accelerometer => "ACL",
            Opcode::BufferOverflow => "BOVF",
            Opcode::CanReceive => "CRM",
            Opcode::CanOverflow => "COVF",
            Opcode::CardInfo => "CRD",
            Opcode::Parameters => "PRM",
            Opcode::Mount => "MNT",
            Opcode::Performance => "PFM",
            Opcode::Voltage => "VLT",
            Opcode::Dismount => "DM",
            Opcode::CanTransmitError => "CTE",
            Opcode::RealTimeClock => "T_RTC",
            Opcode::CanReceiveError => "CRE",
        }
    }
}
