pub mod auth {

    pub const TOKEN_LIFETIME_MINUTES: u64 = 60;

    /// Upper bound accepted from configuration (30 days)
    pub const MAX_TOKEN_LIFETIME_MINUTES: u64 = 60 * 24 * 30;

    pub const MIN_PASSWORD_LENGTH: usize = 8;
}

pub mod report {

    pub const DEFAULT_TIMEZONE: &str = "Europe/Warsaw";

    /// Tool name the voice agent uses to log an event during the call
    pub const DISPLAY_EVENT_TOOL: &str = "displayEvent";

    pub const EVENT_TYPE_KEY: &str = "eventType";

    pub const EVENT_VALUE_KEY: &str = "eventValue";

    pub const STORED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub const FILENAME_PREFIX: &str = "surgery_report_";
}

pub mod rooms {

    /// Seeded by the initial migration; room 1 always exists.
    pub const SEEDED: &[(&str, bool)] = &[("Sala 101", true), ("Sala 102", true), ("Sala 103", false)];
}
