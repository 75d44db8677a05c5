//! Boot LED animation.

use embassy_time::{Duration, Timer};
use smart_leds::hsv::{Hsv, hsv2rgb};
use smart_leds::{RGB8, SmartLedsWrite};

/// Step delay; a full sweep takes ~2.5 s.
const STEP_DELAY: Duration = Duration::from_millis(10);

/// LED brightness during the sweep (out of 255).
const SWEEP_VALUE: u8 = 80;

/// One full hue sweep on the status pixel, then off.
///
/// Purely cosmetic "device is booting" feedback; write errors are ignored
/// because a dead status LED must never stop the node.
pub async fn startup_sweep<L>(led: &mut L)
where
    L: SmartLedsWrite<Color = RGB8>,
{
    for hue in 0..=u8::MAX {
        let color = hsv2rgb(Hsv {
            hue,
            sat: 255,
            val: SWEEP_VALUE,
        });
        let _ = led.write([color]);
        Timer::after(STEP_DELAY).await;
    }

    let _ = led.write([RGB8::default()]);
}
