//! MCP23017 GPIO expander driver
//!
//! The expander sits on the two-wire bus at a fixed address and is used
//! as two independent 8-bit ports:
//!
//! - Port A: outputs driving the button LEDs
//! - Port B: inputs reading the button switches, pulled up and
//!   polarity-inverted so a pressed button reads as 1
//!
//! # Bus contract
//!
//! - Register write: 2-byte write `[register, value]`
//! - Register read: 1-byte write `[register]` to select, then 1-byte read
//!
//! # Failure handling
//!
//! Runtime operations never fail from the caller's point of view: a
//! failed read yields whatever the transport left in the buffer (zero
//! when nothing arrived) and a failed write is dropped. The most recent
//! bus error is kept in [`Mcp23017::last_error`] for diagnostics. Only
//! [`Mcp23017::initialize`] reports failure, so startup can be treated
//! as fatal by the caller.

pub mod command;

use reflex_hal::I2cBus;

use command::{reg, Command, INIT_SEQUENCE};

/// Default 7-bit address (A2..A0 tied low; 0x40 in 8-bit form)
pub const DEFAULT_ADDRESS: u8 = 0x20;

/// Number of pins per port
pub const PORT_WIDTH: u8 = 8;

/// Expander configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExpanderConfig {
    /// 7-bit I2C address
    pub address: u8,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
        }
    }
}

impl ExpanderConfig {
    /// Commands sent by [`Mcp23017::initialize`], in order
    pub const fn init_sequence(&self) -> &'static [Command] {
        &INIT_SEQUENCE
    }
}

/// Errors reported by [`Mcp23017::initialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExpanderError<E> {
    /// A configuration command was not acknowledged
    Bus {
        /// First command that failed
        command: Command,
        /// Transport error for that command
        error: E,
    },
}

/// MCP23017 driver
///
/// Owns the bus handle. The output port is never mirrored in memory:
/// every pin write re-reads the register first, so the driver always
/// works from the device's own state. The read-modify-write is not
/// atomic and assumes this driver is the only writer.
pub struct Mcp23017<B: I2cBus> {
    bus: B,
    config: ExpanderConfig,
    /// Port B value from the most recent `read_port_b`
    last_snapshot: u8,
    last_error: Option<B::Error>,
    initialized: bool,
}

impl<B: I2cBus> Mcp23017<B> {
    /// Create a new, unconfigured driver
    pub fn new(bus: B, config: ExpanderConfig) -> Self {
        Self {
            bus,
            config,
            last_snapshot: 0,
            last_error: None,
            initialized: false,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    /// Consume the driver and return the bus
    pub fn release(self) -> B {
        self.bus
    }

    /// Configure the expander
    ///
    /// Sends every configuration command even if an earlier one fails,
    /// then reads port B once to clear any pending change state. There is
    /// no retry; on error the device configuration is undefined.
    pub fn initialize(&mut self) -> Result<(), ExpanderError<B::Error>> {
        let address = self.config.address;
        let mut first_failure = None;

        for &command in self.config.init_sequence() {
            if let Err(error) = self.bus.write(address, &command.to_bytes()) {
                warn!("Expander command {:#x} not acknowledged", command.to_word());
                if first_failure.is_none() {
                    first_failure = Some(ExpanderError::Bus { command, error });
                }
            }
        }

        self.read_port_b();

        match first_failure {
            Some(e) => {
                error!("Expander at {:#x} failed to configure", address);
                Err(e)
            }
            None => {
                self.initialized = true;
                info!("Expander at {:#x} configured", address);
                Ok(())
            }
        }
    }

    /// Check if the configuration sequence has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Set or clear an output pin (0-7, port A)
    ///
    /// Pins outside port A leave the outputs untouched.
    pub fn digital_write(&mut self, pin: u8, value: bool) {
        let Some(mask) = pin_mask(pin) else {
            warn!("Pin {} is not an output", pin);
            return;
        };

        let current = self.read_register(reg::OUTPUT_PORT);
        let next = if value { current | mask } else { current & !mask };
        self.write_register(reg::OUTPUT_PORT, next);

        trace!("Output port {:#x} -> {:#x}", current, next);
    }

    /// Check an input pin (0-7, port B) in the last port B snapshot
    ///
    /// Does not touch the bus; call [`read_port_b`](Self::read_port_b)
    /// to refresh the snapshot.
    pub fn digital_read(&self, pin: u8) -> bool {
        is_bit_set(self.last_snapshot, pin)
    }

    /// Sample the button inputs
    ///
    /// This is the only operation that reads live button state.
    pub fn read_port_b(&mut self) -> u8 {
        let value = self.read_register(reg::INPUT_PORT);
        self.last_snapshot = value;
        value
    }

    /// Port B value from the most recent [`read_port_b`](Self::read_port_b)
    pub fn last_snapshot(&self) -> u8 {
        self.last_snapshot
    }

    /// Turn every output off
    pub fn clear_outputs(&mut self) {
        self.write_register(reg::OUTPUT_PORT, 0x00);
    }

    /// Read a register, reporting bus errors
    ///
    /// The read is attempted even if selecting the register failed.
    pub fn read_register(&mut self, address: u8) -> u8 {
        let (value, result) = self.read_register_raw(address);
        if let Err(e) = result {
            self.record_error(e);
        }
        value
    }

    /// Read a register, returning the first bus error
    pub fn try_read_register(&mut self, address: u8) -> Result<u8, B::Error> {
        let (value, result) = self.read_register_raw(address);
        result.map(|()| value)
    }

    /// Write a register
    pub fn write_register(&mut self, address: u8, value: u8) {
        if let Err(e) = self.try_write_register(address, value) {
            self.record_error(e);
        }
    }

    /// Write a register, returning the bus error
    pub fn try_write_register(&mut self, address: u8, value: u8) -> Result<(), B::Error> {
        let command = Command::new(address, value);
        self.bus.write(self.config.address, &command.to_bytes())
    }

    /// Most recent bus error from a runtime operation
    pub fn last_error(&self) -> Option<&B::Error> {
        self.last_error.as_ref()
    }

    /// Take and clear the most recent bus error
    pub fn take_error(&mut self) -> Option<B::Error> {
        self.last_error.take()
    }

    fn read_register_raw(&mut self, address: u8) -> (u8, Result<(), B::Error>) {
        let device = self.config.address;
        let mut buf = [0u8; 1];

        let select = self.bus.write(device, &[address]);
        let read = self.bus.read(device, &mut buf);

        (buf[0], select.and(read))
    }

    fn record_error(&mut self, error: B::Error) {
        warn!("Expander bus error at {:#x}", self.config.address);
        self.last_error = Some(error);
    }
}

/// Bit mask for an 8-bit port pin
fn pin_mask(pin: u8) -> Option<u8> {
    (pin < PORT_WIDTH).then(|| 1 << pin)
}

/// Check if `bit` is set in `byte`
pub fn is_bit_set(byte: u8, bit: u8) -> bool {
    pin_mask(bit).is_some_and(|mask| byte & mask != 0)
}

/// Check if `bit` is the only bit set in `byte`
///
/// Distinguishes a single clean button press from simultaneous presses.
pub fn is_bit_set_exclusive(byte: u8, bit: u8) -> bool {
    pin_mask(bit) == Some(byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Nack;

    // Register-file model of the expander
    struct MockBus {
        regs: [u8; 0x20],
        selected: u8,
        writes: Vec<(u8, Vec<u8>)>,
        reads: usize,
        fail_writes: bool,
        fail_reads: bool,
    }

    impl MockBus {
        fn new() -> Self {
            Self {
                regs: [0; 0x20],
                selected: 0,
                writes: Vec::new(),
                reads: 0,
                fail_writes: false,
                fail_reads: false,
            }
        }
    }

    impl I2cBus for MockBus {
        type Error = Nack;

        fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Nack> {
            self.writes.push((address, data.to_vec()));
            if self.fail_writes {
                return Err(Nack);
            }
            self.selected = data[0];
            if let Some(&value) = data.get(1) {
                self.regs[self.selected as usize] = value;
            }
            Ok(())
        }

        fn read(&mut self, _address: u8, buf: &mut [u8]) -> Result<(), Nack> {
            self.reads += 1;
            if self.fail_reads {
                return Err(Nack);
            }
            buf[0] = self.regs[self.selected as usize];
            Ok(())
        }
    }

    fn configured(bus: MockBus) -> Mcp23017<MockBus> {
        let mut expander = Mcp23017::new(bus, ExpanderConfig::default());
        expander.initialize().unwrap();
        expander
    }

    #[test]
    fn test_initialize_sequence() {
        let mut expander = Mcp23017::new(MockBus::new(), ExpanderConfig::default());
        assert!(!expander.is_initialized());

        expander.initialize().unwrap();
        assert!(expander.is_initialized());

        let bus = expander.release();
        let expected: [[u8; 2]; 8] = [
            [0x0A, 0xE2],
            [0x00, 0x00],
            [0x10, 0xFF],
            [0x09, 0x00],
            [0x16, 0xFF],
            [0x11, 0xFF],
            [0x12, 0xFF],
            [0x02, 0x00],
        ];
        for (i, bytes) in expected.iter().enumerate() {
            assert_eq!(bus.writes[i], (DEFAULT_ADDRESS, bytes.to_vec()));
        }

        // Trailing port B read to clear pending state
        assert_eq!(bus.writes[8], (DEFAULT_ADDRESS, vec![reg::GPIOB]));
        assert_eq!(bus.writes.len(), 9);
        assert_eq!(bus.reads, 1);
    }

    #[test]
    fn test_initialize_sends_everything_on_failure() {
        let mut bus = MockBus::new();
        bus.fail_writes = true;
        let mut expander = Mcp23017::new(bus, ExpanderConfig { address: 0x21 });

        let result = expander.initialize();
        assert_eq!(
            result,
            Err(ExpanderError::Bus {
                command: command::SEPARATE_BANKS,
                error: Nack,
            })
        );
        assert!(!expander.is_initialized());

        let bus = expander.release();
        assert_eq!(bus.writes.len(), 9);
        assert!(bus.writes.iter().all(|(addr, _)| *addr == 0x21));
    }

    #[test]
    fn test_digital_write_preserves_other_pins() {
        let mut bus = MockBus::new();
        let mut expander = configured(bus);

        expander.digital_write(4, true);
        expander.digital_write(0, true);
        assert_eq!(expander.read_register(reg::GPIOA), 0b0001_0001);

        expander.digital_write(4, false);
        assert_eq!(expander.read_register(reg::GPIOA), 0b0000_0001);

        bus = expander.release();
        // Every write is a full-byte write to the output register
        let (_, last) = bus.writes.iter().rev().find(|(_, d)| d.len() == 2).unwrap();
        assert_eq!(last, &vec![reg::GPIOA, 0b0000_0001]);
    }

    #[test]
    fn test_digital_write_rereads_register() {
        let mut expander = configured(MockBus::new());

        // Another path changed the register behind the driver's back
        expander.write_register(reg::GPIOA, 0b1000_0000);
        expander.digital_write(1, true);
        assert_eq!(expander.read_register(reg::GPIOA), 0b1000_0010);
    }

    #[test]
    fn test_digital_write_ignores_non_output_pins() {
        let mut expander = configured(MockBus::new());
        expander.write_register(reg::GPIOA, 0x5A);

        let before = expander.release();
        let writes = before.writes.len();
        let mut expander = Mcp23017::new(before, ExpanderConfig::default());

        expander.digital_write(8, true);
        expander.digital_write(15, false);

        let bus = expander.release();
        assert_eq!(bus.writes.len(), writes);
        assert_eq!(bus.regs[reg::GPIOA as usize], 0x5A);
    }

    #[test]
    fn test_digital_read_uses_snapshot() {
        let mut expander = configured(MockBus::new());
        let mut bus = expander.release();
        bus.regs[reg::GPIOB as usize] = 0b0000_0100;
        let mut expander = Mcp23017::new(bus, ExpanderConfig::default());

        // No snapshot yet
        assert!(!expander.digital_read(2));

        assert_eq!(expander.read_port_b(), 0b0000_0100);
        assert!(expander.digital_read(2));
        assert!(!expander.digital_read(3));
        assert!(!expander.digital_read(10));

        let mut bus = expander.release();
        let reads = bus.reads;
        bus.regs[reg::GPIOB as usize] = 0;
        let expander = Mcp23017::new(bus, ExpanderConfig::default());
        // digital_read never touches the bus
        assert!(!expander.digital_read(2));
        assert_eq!(expander.release().reads, reads);
    }

    #[test]
    fn test_snapshot_persists_until_next_read() {
        let mut expander = configured(MockBus::new());
        expander.write_register(reg::GPIOB, 0b0100_0000);
        expander.read_port_b();

        expander.write_register(reg::GPIOB, 0);
        assert!(expander.digital_read(6));
        assert_eq!(expander.last_snapshot(), 0b0100_0000);

        expander.read_port_b();
        assert!(!expander.digital_read(6));
    }

    #[test]
    fn test_read_failure_is_silent() {
        let mut expander = configured(MockBus::new());
        expander.write_register(reg::GPIOB, 0xFF);

        let mut bus = expander.release();
        bus.fail_reads = true;
        let mut expander = Mcp23017::new(bus, ExpanderConfig::default());

        assert_eq!(expander.read_port_b(), 0);
        assert_eq!(expander.last_error(), Some(&Nack));
        assert_eq!(expander.take_error(), Some(Nack));
        assert_eq!(expander.last_error(), None);
        assert_eq!(expander.try_read_register(reg::GPIOB), Err(Nack));
    }

    #[test]
    fn test_clear_outputs() {
        let mut expander = configured(MockBus::new());
        expander.digital_write(3, true);
        expander.clear_outputs();
        assert_eq!(expander.read_register(reg::OUTPUT_PORT), 0);
        assert_eq!(expander.try_write_register(reg::OUTPUT_PORT, 0x01), Ok(()));
    }

    #[test]
    fn test_bit_helpers() {
        assert!(is_bit_set(0b0000_0010, 1));
        assert!(!is_bit_set(0b0000_0010, 0));
        assert!(!is_bit_set(0xFF, 8));

        assert!(is_bit_set_exclusive(0b0000_0010, 1));
        assert!(!is_bit_set_exclusive(0b0100_0010, 1));
        assert!(!is_bit_set_exclusive(0, 1));
        assert!(!is_bit_set_exclusive(0, 9));
    }

    proptest! {
        #[test]
        fn prop_write_on_off_only_touches_pin(prior in any::<u8>(), pin in 0u8..8) {
            let mut bus = MockBus::new();
            bus.regs[reg::GPIOA as usize] = prior;
            let mut expander = Mcp23017::new(bus, ExpanderConfig::default());
            let mask = 1u8 << pin;

            expander.digital_write(pin, true);
            prop_assert_eq!(expander.read_register(reg::GPIOA), prior | mask);

            expander.digital_write(pin, false);
            let after = expander.read_register(reg::GPIOA);
            prop_assert_eq!(after & !mask, prior & !mask);
            prop_assert_eq!(after & mask, 0);
            if prior & mask == 0 {
                prop_assert_eq!(after, prior);
            }
        }

        #[test]
        fn prop_exclusive_implies_set(byte in any::<u8>(), bit in 0u8..8) {
            if is_bit_set_exclusive(byte, bit) {
                prop_assert!(is_bit_set(byte, bit));
                prop_assert_eq!(byte.count_ones(), 1);
            }
        }
    }
}
