//! Link parameters and firmware sentinels for the Bittle on NyBoard V1_0

/// Longest settle time a single queue entry may request (seconds)
pub const MAX_DURATION: u32 = 300;

/// Serial link speed expected by the NyBoard firmware
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Seconds the board needs to boot after the port is opened
pub const START_UP_WAITING_SECS: u64 = 10;

/// Floor applied to the settle time of any non-empty command (seconds)
pub const MIN_ACT_DURATION_SECS: u32 = 5;

/// Upper bound on lines read per drain, so a chatty board cannot block us
pub const MAX_READABLE_LINE: usize = 500;

/// Delay between receive-buffer polls while draining (milliseconds)
pub const REPEAT_READ_DELAY_MS: u64 = 10;

/// Lines announcing that the board finished its boot sequence
pub const BOARD_INIT_MESSAGES: &[&str] = &["DMP ready!"];

/// Lines the firmware prints when it rejects a command
pub const BOARD_ERROR_MESSAGES: &[&str] = &["wrong key!"];

/// Neutral posture sent before the port is released
pub const REST_COMMAND: &str = "d";

/// Settle time for the rest command (seconds)
pub const REST_DURATION_SECS: u32 = 3;
