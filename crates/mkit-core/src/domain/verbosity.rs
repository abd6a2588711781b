//! Verbosity - clamped 5-step log scale.

/// Ordinal log scale understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    #[default]
    Quiet = 0,
    Err = 1,
    Info = 2,
    Debug = 3,
    Debug2 = 4,
}

impl LogLevel {
    pub const MAX: u8 = LogLevel::Debug2 as u8;

    /// Out-of-range values saturate to `Debug2`.
    pub fn from_ordinal(v: u64) -> Self {
        match v {
            0 => LogLevel::Quiet,
            1 => LogLevel::Err,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Debug2,
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Value of the `log_level` setting. `Quiet` leaves the field unset.
    pub fn as_setting(self) -> Option<&'static str> {
        match self {
            LogLevel::Quiet => None,
            LogLevel::Err => Some("ERR"),
            LogLevel::Info => Some("INFO"),
            LogLevel::Debug => Some("DEBUG"),
            LogLevel::Debug2 => Some("DEBUG2"),
        }
    }
}

/// Current verbosity of a builder. Never leaves `[Quiet, Debug2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verbosity(LogLevel);

impl Verbosity {
    pub fn level(self) -> LogLevel {
        self.0
    }

    pub fn set(&mut self, v: u64) {
        self.0 = LogLevel::from_ordinal(v);
    }

    pub fn increase(&mut self) {
        self.0 = LogLevel::from_ordinal(u64::from(self.0.ordinal().saturating_add(1)));
    }

    pub fn decrease(&mut self) {
        self.0 = LogLevel::from_ordinal(u64::from(self.0.ordinal().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, LogLevel::Quiet)]
    #[case(2, LogLevel::Info)]
    #[case(4, LogLevel::Debug2)]
    #[case(5, LogLevel::Debug2)]
    #[case(u64::MAX, LogLevel::Debug2)]
    fn set_clamps(#[case] v: u64, #[case] expected: LogLevel) {
        let mut verbosity = Verbosity::default();
        verbosity.set(v);
        assert_eq!(verbosity.level(), expected);
    }

    #[rstest]
    #[case(LogLevel::Quiet, None)]
    #[case(LogLevel::Err, Some("ERR"))]
    #[case(LogLevel::Info, Some("INFO"))]
    #[case(LogLevel::Debug, Some("DEBUG"))]
    #[case(LogLevel::Debug2, Some("DEBUG2"))]
    fn setting_strings(#[case] level: LogLevel, #[case] expected: Option<&str>) {
        assert_eq!(level.as_setting(), expected);
    }

    #[test]
    fn increase_saturates_at_debug2() {
        let mut verbosity = Verbosity::default();
        for _ in 0..10 {
            verbosity.increase();
            assert!(verbosity.level().ordinal() <= LogLevel::MAX);
        }
        assert_eq!(verbosity.level(), LogLevel::Debug2);
    }

    #[test]
    fn decrease_saturates_at_quiet() {
        let mut verbosity = Verbosity::default();
        verbosity.decrease();
        assert_eq!(verbosity.level(), LogLevel::Quiet);

        verbosity.set(2);
        verbosity.decrease();
        assert_eq!(verbosity.level(), LogLevel::Err);
    }
}
