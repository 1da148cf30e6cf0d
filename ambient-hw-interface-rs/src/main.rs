//! ambient-hw-interface
//!
//! Clock and sensor dashboard firmware for the Raspberry Pi Pico (RP2040)
//! with an ILI9341 320×240 TFT. Wires the library crates into one loop:
//!
//! 1. The on-chip RTC provides the wall-clock time.
//! 2. A BH1750 and an AM2320 on the shared I2C0 bus provide illuminance,
//!    temperature and humidity.
//! 3. The dashboard task ticks at the slowest sensor's sampling period,
//!    detects which quantities changed and redraws only their panels.
//!
//! The RTC has no battery backup and there is no network time sync. A
//! stopped RTC is left unset, so the clock reads as unavailable and the
//! time and date panels stay blank until something sets it (for example a
//! debugger writing the RTC registers). The sensor panels run regardless.

#![no_std]
#![no_main]

use defmt::*;
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{I2C0, RTC, SPI0};
use embassy_rp::rtc::Rtc;
use embassy_rp::spi::{self, Spi};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9341Rgb565;
use mipidsi::options::{ColorOrder, Orientation, Rotation};
use mipidsi::Builder;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ambient::quantities::{ClockReading, ClockSource, ReadingError};
use ambient_panel_display_rs::{dashboard_task, PanelConfig, PanelDriver};
use ambient_sensors::{Am2320, Bh1750, SensorBoard, AM2320_ADDRESS, BH1750_ADDRESS};

// ---------------------------------------------------------------------------
// Interrupt binding
// ---------------------------------------------------------------------------

// Wire the I2C0 peripheral interrupt to Embassy's async handler.
bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// Shared I2C0 bus. The BH1750 and the AM2320 access it through
/// I2cDevice wrappers that serialise transactions.
static I2C_BUS: StaticCell<
    Mutex<CriticalSectionRawMutex, I2c<'static, I2C0, i2c::Async>>,
> = StaticCell::new();

/// Pixel staging buffer for the mipidsi SPI interface.
static DISPLAY_BUFFER: StaticCell<[u8; 512]> = StaticCell::new();

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// Concrete I2C type for each sensor, sharing I2C_BUS.
type SensorI2c = I2cDevice<
    'static,
    CriticalSectionRawMutex,
    I2c<'static, I2C0, i2c::Async>,
>;

type Sensors = SensorBoard<SensorI2c, SensorI2c, Delay>;

/// SPI0 with the panel's chip select.
type PanelSpi = ExclusiveDevice<Spi<'static, SPI0, spi::Blocking>, Output<'static>, Delay>;

/// ILI9341 in landscape, DC and RST on plain GPIO outputs.
type PanelDisplay = mipidsi::Display<
    SpiInterface<'static, PanelSpi, Output<'static>>,
    ILI9341Rgb565,
    Output<'static>,
>;

// ---------------------------------------------------------------------------
// Clock source
// ---------------------------------------------------------------------------

/// The RP2040 RTC as a dashboard clock.
struct RtcClock {
    rtc: Rtc<'static, RTC>,
}

impl ClockSource for RtcClock {
    fn now(&mut self) -> Result<ClockReading, ReadingError> {
        let now = self
            .rtc
            .now()
            .map_err(|_| ReadingError::ClockUnavailable)?;

        Ok(ClockReading {
            hour: now.hour,
            minute: now.minute,
            second: now.second,
            weekday_from_sunday: now.day_of_week as u8,
            day: now.day,
            month: now.month,
            year: now.year,
        })
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Thin wrapper that monomorphises the generic `dashboard_task` so it can be
/// spawned as a concrete Embassy task.
#[embassy_executor::task]
async fn panel_task(
    panel: PanelDriver<PanelDisplay, Output<'static>>,
    clock: RtcClock,
    sensors: Sensors,
    config: PanelConfig,
) {
    dashboard_task(panel, clock, sensors, config).await;
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("ambient-hw-interface starting");

    // ── Pin assignments ────────────────────────────────────────────────────
    // I2C_SDA  → GP4   (p.PIN_4)   BH1750 + AM2320, external pull-ups
    // I2C_SCL  → GP5   (p.PIN_5)
    // TFT_SCK  → GP18  (p.PIN_18)  SPI0
    // TFT_MOSI → GP19  (p.PIN_19)
    // TFT_CS   → GP17  (p.PIN_17)
    // TFT_DC   → GP20  (p.PIN_20)
    // TFT_RST  → GP21  (p.PIN_21)
    // TFT_LED  → GP22  (p.PIN_22)  backlight, active high
    // ───────────────────────────────────────────────────────────────────────

    // ── Clock ──────────────────────────────────────────────────────────────

    let rtc = Rtc::new(p.RTC);
    if !rtc.is_running() {
        warn!("RTC not set; time and date stay blank until it is");
    }
    let clock = RtcClock { rtc };

    // ── Sensors ────────────────────────────────────────────────────────────

    let i2c = I2c::new_async(
        p.I2C0,
        p.PIN_5, // SCL
        p.PIN_4, // SDA
        Irqs,
        i2c::Config::default(),
    );

    // Wrap in a mutex so both drivers can share the peripheral safely.
    let i2c_bus = I2C_BUS.init(Mutex::new(i2c));

    let sensors = SensorBoard::new(
        Bh1750::new(I2cDevice::new(i2c_bus), BH1750_ADDRESS),
        Am2320::new(I2cDevice::new(i2c_bus), Delay, AM2320_ADDRESS),
    );

    // ── Display ────────────────────────────────────────────────────────────

    let mut spi_config = spi::Config::default();
    spi_config.frequency = 40_000_000;
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config);

    let cs = Output::new(p.PIN_17, Level::High);
    let dc = Output::new(p.PIN_20, Level::Low);
    let rst = Output::new(p.PIN_21, Level::High);
    let backlight = Output::new(p.PIN_22, Level::Low);

    // Output pins cannot fail, so the chip-select setup cannot either.
    let spi_device = ExclusiveDevice::new(spi, cs, Delay).unwrap();
    let buffer = DISPLAY_BUFFER.init([0; 512]);
    let interface = SpiInterface::new(spi_device, dc, buffer);

    let display = match Builder::new(ILI9341Rgb565, interface)
        .reset_pin(rst)
        .orientation(Orientation::new().rotate(Rotation::Deg90))
        .color_order(ColorOrder::Bgr)
        .init(&mut Delay)
    {
        Ok(display) => display,
        Err(_) => {
            error!("ILI9341 init failed");
            return;
        }
    };
    info!("Display ready");

    // ── Spawn tasks ────────────────────────────────────────────────────────

    let config = PanelConfig {
        boot_lines: &["Clock: RP2040 RTC", "Light: BH1750", "Climate: AM2320"],
        ..PanelConfig::default()
    };
    let panel = PanelDriver::new(display, backlight);

    spawner.spawn(unwrap!(panel_task(panel, clock, sensors, config)));

    info!("All tasks spawned");
}
