//! MCP23017 register map and command words
//!
//! A command is one register address followed by one data byte. The
//! 16-bit word form packs the register address into the low byte and
//! the data into the high byte, matching the order the bytes go out on
//! the wire (low byte first).
//!
//! Addresses below assume IOCON.BANK = 1, which the first configuration
//! command selects. Before that command the device uses BANK = 0
//! addressing, where 0x0A is IOCON.

/// Register addresses (IOCON.BANK = 1)
pub mod reg {
    /// Port A direction
    pub const IODIRA: u8 = 0x00;
    /// Port A interrupt-on-change enable
    pub const GPINTENA: u8 = 0x02;
    /// Port A data
    pub const GPIOA: u8 = 0x09;
    /// IOCON, as addressed while still in BANK = 0 mode
    pub const IOCON_BANK0: u8 = 0x0A;
    /// Port B direction
    pub const IODIRB: u8 = 0x10;
    /// Port B input polarity
    pub const IPOLB: u8 = 0x11;
    /// Port B interrupt-on-change enable
    pub const GPINTENB: u8 = 0x12;
    /// Port B pull-up enable
    pub const GPPUB: u8 = 0x16;
    /// Port B data
    pub const GPIOB: u8 = 0x19;

    /// Output port data register driven by `digital_write`
    pub const OUTPUT_PORT: u8 = GPIOA;
    /// Input port data register sampled by `read_port_b`
    pub const INPUT_PORT: u8 = GPIOB;
}

/// IOCON value: BANK, MIRROR, SEQOP and active-high INT
pub const IOCON_SPLIT_BANKS: u8 = 0xE2;

/// A single register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    /// Register address
    pub register: u8,
    /// Data byte
    pub value: u8,
}

impl Command {
    pub const fn new(register: u8, value: u8) -> Self {
        Self { register, value }
    }

    /// Decode a 16-bit command word
    pub const fn from_word(word: u16) -> Self {
        Self {
            register: (word & 0xFF) as u8,
            value: (word >> 8) as u8,
        }
    }

    /// Encode as a 16-bit command word
    pub const fn to_word(self) -> u16 {
        ((self.value as u16) << 8) | self.register as u16
    }

    /// Bytes in transmission order
    pub const fn to_bytes(self) -> [u8; 2] {
        [self.register, self.value]
    }
}

/// Split ports A and B into separately addressed banks
pub const SEPARATE_BANKS: Command = Command::from_word(0xE20A);
/// Port A all outputs
pub const PORT_A_OUTPUT: Command = Command::from_word(0x0000);
/// Port B all inputs
pub const PORT_B_INPUT: Command = Command::from_word(0xFF10);
/// Drive every port A pin low
pub const PORT_A_LOW: Command = Command::from_word(0x0009);
/// Drive every port A pin high
pub const PORT_A_HIGH: Command = Command::from_word(0xFF09);
/// Enable pull-ups on every port B pin
pub const PORT_B_PULLUPS: Command = Command::from_word(0xFF16);
/// Invert port B input polarity so a grounded switch reads 1
pub const PORT_B_POLARITY: Command = Command::from_word(0xFF11);
/// Interrupt on any port B change
pub const ENABLE_PORT_B_INTERRUPT: Command = Command::from_word(0xFF12);
/// No interrupts from port A
pub const DISABLE_PORT_A_INTERRUPT: Command = Command::from_word(0x0002);

/// Startup configuration, in transmission order
pub const INIT_SEQUENCE: [Command; 8] = [
    SEPARATE_BANKS,
    PORT_A_OUTPUT,
    PORT_B_INPUT,
    PORT_A_LOW,
    PORT_B_PULLUPS,
    PORT_B_POLARITY,
    ENABLE_PORT_B_INTERRUPT,
    DISABLE_PORT_A_INTERRUPT,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_layout() {
        let cmd = Command::from_word(0xE20A);
        assert_eq!(cmd.register, reg::IOCON_BANK0);
        assert_eq!(cmd.value, IOCON_SPLIT_BANKS);
        assert_eq!(cmd.to_bytes(), [0x0A, 0xE2]);
        assert_eq!(cmd.to_word(), 0xE20A);
    }

    #[test]
    fn test_init_sequence_targets() {
        assert_eq!(PORT_A_OUTPUT, Command::new(reg::IODIRA, 0x00));
        assert_eq!(PORT_B_INPUT, Command::new(reg::IODIRB, 0xFF));
        assert_eq!(PORT_A_LOW, Command::new(reg::GPIOA, 0x00));
        assert_eq!(PORT_A_HIGH, Command::new(reg::GPIOA, 0xFF));
        assert_eq!(PORT_B_PULLUPS, Command::new(reg::GPPUB, 0xFF));
        assert_eq!(PORT_B_POLARITY, Command::new(reg::IPOLB, 0xFF));
        assert_eq!(ENABLE_PORT_B_INTERRUPT, Command::new(reg::GPINTENB, 0xFF));
        assert_eq!(DISABLE_PORT_A_INTERRUPT, Command::new(reg::GPINTENA, 0x00));
    }

    #[test]
    fn test_init_sequence_registers_disjoint() {
        for (i, a) in INIT_SEQUENCE.iter().enumerate() {
            for b in &INIT_SEQUENCE[i + 1..] {
                assert_ne!(a.register, b.register);
            }
        }
    }
}
