//! Async I2C bus sharing.
//!
//! The pulse oximeter and the thermometer sit on the same bus, so each
//! driver gets a [`SharedI2cDevice`] handle backed by one embassy mutex.
//! The sampling loop is single-threaded, which keeps bus access serialized;
//! the mutex exists so each driver can own an `I2c` implementation without
//! owning the peripheral.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

/// One device's handle onto a shared async I2C bus.
///
/// Locks the bus for the duration of each transaction and yields to the
/// executor while the transaction is in flight.
pub struct SharedI2cDevice<'a, T> {
    bus: &'a Mutex<CriticalSectionRawMutex, T>,
}

impl<'a, T> SharedI2cDevice<'a, T> {
    #[inline]
    pub const fn new(bus: &'a Mutex<CriticalSectionRawMutex, T>) -> Self {
        Self { bus }
    }
}

impl<T> ErrorType for SharedI2cDevice<'_, T>
where
    T: ErrorType,
{
    type Error = T::Error;
}

impl<T> I2c for SharedI2cDevice<'_, T>
where
    T: I2c,
{
    #[inline]
    async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        let mut bus = self.bus.lock().await;
        bus.read(address, read).await
    }

    #[inline]
    async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        let mut bus = self.bus.lock().await;
        bus.write(address, write).await
    }

    #[inline]
    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        let mut bus = self.bus.lock().await;
        bus.write_read(address, write, read).await
    }

    #[inline]
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut bus = self.bus.lock().await;
        bus.transaction(address, operations).await
    }
}
