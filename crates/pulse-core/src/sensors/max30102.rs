//! MAX30102 pulse-oximeter driver.
//!
//! Configures the part in SpO2 mode (Red + IR) and drains its 32-deep
//! hardware FIFO into per-channel software queues. Each FIFO entry is six
//! bytes: an 18-bit Red sample followed by an 18-bit IR sample.

use super::{PpgSensor, SensorError};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use heapless::Deque;

/// Fixed 7-bit bus address of the MAX30102.
pub const ADDRESS: u8 = 0x57;

const SENSOR: &str = "MAX30102";

/// Expected PART_ID register value.
const PART_ID_VALUE: u8 = 0x15;

/// Hardware FIFO depth; the software queues mirror it.
const FIFO_DEPTH: usize = 32;

// Register map (datasheet table 1).
const REG_FIFO_WR_PTR: u8 = 0x04;
const REG_OVF_COUNTER: u8 = 0x05;
const REG_FIFO_RD_PTR: u8 = 0x06;
const REG_FIFO_DATA: u8 = 0x07;
const REG_FIFO_CONFIG: u8 = 0x08;
const REG_MODE_CONFIG: u8 = 0x09;
const REG_SPO2_CONFIG: u8 = 0x0A;
const REG_LED1_PA: u8 = 0x0C;
const REG_LED2_PA: u8 = 0x0D;
const REG_PART_ID: u8 = 0xFF;

/// MODE_CONFIG: reset bit.
const MODE_RESET: u8 = 0x40;
/// MODE_CONFIG: low-power shutdown bit.
const MODE_SHUTDOWN: u8 = 0x80;
/// MODE_CONFIG: SpO2 mode (Red + IR active).
const MODE_SPO2: u8 = 0x03;

/// FIFO_CONFIG: no sample averaging, roll over on full.
const FIFO_ROLLOVER: u8 = 0x10;

/// SPO2_CONFIG: 4096 nA ADC range, 400 sps, 411 µs pulses (18-bit).
const SPO2_CONFIG_400SPS_18BIT: u8 = 0x2F;

/// LED drive current, both channels (~7 mA).
const LED_CURRENT: u8 = 0x24;

/// Samples are 18 bits wide.
const SAMPLE_MASK: u32 = 0x3FFFF;

pub struct Max30102<I> {
    i2c: I,
    red: Deque<u32, FIFO_DEPTH>,
    ir: Deque<u32, FIFO_DEPTH>,
}

impl<I: I2c> Max30102<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            red: Deque::new(),
            ir: Deque::new(),
        }
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(ADDRESS, &[register, value])
            .await
            .map_err(|_| SensorError::Bus {
                sensor: SENSOR,
                operation: "register write",
            })
    }

    async fn read_register(&mut self, register: u8) -> Result<u8, SensorError> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(ADDRESS, &[register], &mut value)
            .await
            .map_err(|_| SensorError::Bus {
                sensor: SENSOR,
                operation: "register read",
            })?;
        Ok(value[0])
    }

    /// Probe, reset and configure the part for SpO2 sampling.
    pub async fn setup(&mut self, delay: &mut impl DelayNs) -> Result<(), SensorError> {
        let part_id = self.read_register(REG_PART_ID).await?;
        if part_id != PART_ID_VALUE {
            return Err(SensorError::WrongDevice {
                sensor: SENSOR,
                found: part_id,
            });
        }

        self.write_register(REG_MODE_CONFIG, MODE_RESET).await?;
        // The reset bit self-clears within a millisecond; give it margin.
        delay.delay_ms(10).await;

        // Clear the FIFO before enabling sampling.
        self.write_register(REG_FIFO_WR_PTR, 0x00).await?;
        self.write_register(REG_OVF_COUNTER, 0x00).await?;
        self.write_register(REG_FIFO_RD_PTR, 0x00).await?;

        self.write_register(REG_FIFO_CONFIG, FIFO_ROLLOVER).await?;
        self.write_register(REG_MODE_CONFIG, MODE_SPO2).await?;
        self.write_register(REG_SPO2_CONFIG, SPO2_CONFIG_400SPS_18BIT)
            .await?;
        self.write_register(REG_LED1_PA, LED_CURRENT).await?;
        self.write_register(REG_LED2_PA, LED_CURRENT).await?;

        Ok(())
    }

    /// Number of unread samples in the hardware FIFO.
    async fn fifo_count(&mut self) -> Result<usize, SensorError> {
        let write_ptr = self.read_register(REG_FIFO_WR_PTR).await?;
        let read_ptr = self.read_register(REG_FIFO_RD_PTR).await?;
        Ok(((write_ptr.wrapping_sub(read_ptr)) & (FIFO_DEPTH as u8 - 1)) as usize)
    }

    fn push_sample(&mut self, red: u32, ir: u32) {
        // Oldest samples give way when the node falls behind; the FIFO
        // must never block the sampling loop.
        if self.red.is_full() {
            self.red.pop_front();
        }
        if self.ir.is_full() {
            self.ir.pop_front();
        }
        let _ = self.red.push_back(red);
        let _ = self.ir.push_back(ir);
    }
}

impl<I: I2c> PpgSensor for Max30102<I> {
    async fn poll(&mut self) -> Result<(), SensorError> {
        let pending = self.fifo_count().await?;

        for _ in 0..pending {
            let mut entry = [0u8; 6];
            self.i2c
                .write_read(ADDRESS, &[REG_FIFO_DATA], &mut entry)
                .await
                .map_err(|_| SensorError::Bus {
                    sensor: SENSOR,
                    operation: "FIFO read",
                })?;

            let red = (u32::from(entry[0]) << 16 | u32::from(entry[1]) << 8 | u32::from(entry[2]))
                & SAMPLE_MASK;
            let ir = (u32::from(entry[3]) << 16 | u32::from(entry[4]) << 8 | u32::from(entry[5]))
                & SAMPLE_MASK;
            self.push_sample(red, ir);
        }

        Ok(())
    }

    fn available(&self) -> bool {
        !self.red.is_empty() && !self.ir.is_empty()
    }

    fn pop_red(&mut self) -> Option<u32> {
        self.red.pop_front()
    }

    fn pop_ir(&mut self) -> Option<u32> {
        self.ir.pop_front()
    }

    async fn shutdown(&mut self) -> Result<(), SensorError> {
        self.write_register(REG_MODE_CONFIG, MODE_SHUTDOWN | MODE_SPO2)
            .await
    }
}
