/// Last received opcode did not match any command.
pub const UNKNOWN_COMMAND: u16 = 1 << 0;

/// Last command carried a wrong argument value or length.
pub const MALFORMED_ARGUMENT: u16 = 1 << 2;

/// Last telemetry request named a channel that does not exist.
pub const INVALID_CHANNEL: u16 = 1 << 3;

/// Bits cleared by every well-formed, recognized command.
pub const COMMAND_FAULTS: u16 = UNKNOWN_COMMAND | MALFORMED_ARGUMENT;

/// Sticky fault register reported by the get board status command.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BoardStatus(pub u16);

impl BoardStatus {
    pub fn set(&mut self, bits: u16) {
        self.0 |= bits;
    }

    pub fn clear(&mut self, bits: u16) {
        self.0 &= !bits;
    }

    pub fn apply(&mut self, edit: StatusEdit) {
        match edit {
            StatusEdit::Set(bits) => self.set(bits),
            StatusEdit::Clear(bits) => self.clear(bits),
        }
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn unknown_command(self) -> bool {
        self.0 & UNKNOWN_COMMAND != 0
    }

    pub fn malformed_argument(self) -> bool {
        self.0 & MALFORMED_ARGUMENT != 0
    }

    pub fn invalid_channel(self) -> bool {
        self.0 & INVALID_CHANNEL != 0
    }
}

impl From<u16> for BoardStatus {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

/// Change made to the status register when a command is rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StatusEdit {
    Set(u16),
    Clear(u16),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_and_clear_are_independent_per_bit() {
        let mut status = BoardStatus::default();
        status.set(UNKNOWN_COMMAND | INVALID_CHANNEL);
        assert!(status.unknown_command());
        assert!(status.invalid_channel());
        assert!(!status.malformed_argument());

        status.clear(COMMAND_FAULTS);
        assert_eq!(status.bits(), INVALID_CHANNEL);
    }

    #[test]
    fn apply_edit() {
        let mut status = BoardStatus(MALFORMED_ARGUMENT);
        status.apply(StatusEdit::Clear(MALFORMED_ARGUMENT));
        assert_eq!(status.bits(), 0);
        status.apply(StatusEdit::Set(MALFORMED_ARGUMENT));
        assert_eq!(status.bits(), 0x4);
    }
}
