use embedded_hal::i2c::{self, ErrorKind, ErrorType, Operation};

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, PartialEq)]
pub struct FakeI2CMessage {
    pub address: u8,
    pub bytes: Vec<u8>,
}

#[derive(Debug, PartialEq)]
pub enum FakeI2CError {
    ReadError,
    WriteError,
}

impl i2c::Error for FakeI2CError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Records every write and answers reads by echoing the data word of the last register write.
///
/// Single-byte writes are read commands and do not change what is echoed.
pub struct FakeI2C {
    pub messages: Rc<RefCell<Vec<FakeI2CMessage>>>,
    pub should_fail: Rc<RefCell<bool>>,
}

impl FakeI2C {
    pub fn new() -> FakeI2C {
        FakeI2C {
            messages: Rc::new(RefCell::new(vec![])),
            should_fail: Rc::new(RefCell::new(false)),
        }
    }

    fn echo(&self, address: u8) -> [u8; 2] {
        self.messages
            .borrow()
            .iter()
            .rev()
            .find(|m| m.address == address && m.bytes.len() == 3)
            .map(|m| [m.bytes[1], m.bytes[2]])
            .unwrap_or_default()
    }
}

impl ErrorType for FakeI2C {
    type Error = FakeI2CError;
}

impl i2c::I2c for FakeI2C {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), FakeI2CError> {
        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    if *self.should_fail.borrow() {
                        return Err(FakeI2CError::WriteError);
                    }
                    self.messages.borrow_mut().push(FakeI2CMessage {
                        address,
                        bytes: Vec::from(*bytes),
                    });
                }
                Operation::Read(buffer) => {
                    if *self.should_fail.borrow() {
                        return Err(FakeI2CError::ReadError);
                    }
                    let echo = self.echo(address);
                    for (b, e) in buffer.iter_mut().zip(echo) {
                        *b = e;
                    }
                }
            }
        }
        Ok(())
    }
}
