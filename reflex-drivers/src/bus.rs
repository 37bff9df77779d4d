//! embedded-hal bus adapter
//!
//! Lets any blocking `embedded-hal` 1.0 I2C implementation drive the
//! expander through [`I2cBus`].

use embedded_hal::i2c::I2c;
use reflex_hal::I2cBus;

/// [`I2cBus`] over an `embedded-hal` I2C master
pub struct HalBus<T> {
    inner: T,
}

impl<T> HalBus<T> {
    /// Wrap an `embedded-hal` I2C master
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Get access to the wrapped bus
    pub fn inner(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Return the wrapped bus
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: I2c> I2cBus for HalBus<T> {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write(address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.inner.read(address, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::{command::reg, ExpanderConfig, Mcp23017};
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    // Single-register device that NACKs any address but its own
    struct FakeI2c {
        address: u8,
        register: u8,
        selected: u8,
    }

    impl ErrorType for FakeI2c {
        type Error = ErrorKind;
    }

    impl I2c for FakeI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if address != self.address {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        self.selected = bytes[0];
                        if let Some(&value) = bytes.get(1) {
                            self.register = value;
                        }
                    }
                    Operation::Read(buf) => buf[0] = self.register,
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_expander_over_embedded_hal() {
        let fake = FakeI2c {
            address: 0x20,
            register: 0,
            selected: 0,
        };
        let mut expander = Mcp23017::new(HalBus::new(fake), ExpanderConfig::default());
        expander.initialize().unwrap();

        expander.digital_write(2, true);
        assert_eq!(expander.read_register(reg::OUTPUT_PORT), 0b0000_0100);

        let mut bus = expander.release();
        assert_eq!(bus.inner().selected, reg::OUTPUT_PORT);
    }

    #[test]
    fn test_wrong_address_reports_error() {
        let fake = FakeI2c {
            address: 0x27,
            register: 0,
            selected: 0,
        };
        let mut expander = Mcp23017::new(HalBus::new(fake), ExpanderConfig::default());

        assert!(expander.initialize().is_err());
        assert_eq!(
            expander.try_read_register(reg::INPUT_PORT),
            Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        );
        assert_eq!(expander.release().into_inner().selected, 0);
    }
}
