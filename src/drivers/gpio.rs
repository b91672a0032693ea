//! Raw ESP-IDF GPIO helpers for the dimmer pins.
//!
//! Direction and pull configuration for the sync input and the load
//! outputs, plus the register-level read/write used by the tick path.
//! On host targets every call is a no-op that reports success.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::app::ports::PinId;
use crate::error::HardwareFault;

/// `gpio_config` bit mask for `pin`.  Numbers the mask cannot hold are an
/// invalid argument, not a shift overflow.
#[cfg(target_os = "espidf")]
fn pin_mask(pin: PinId) -> Result<u64, HardwareFault> {
    u32::try_from(pin)
        .ok()
        .and_then(|p| 1u64.checked_shl(p))
        .ok_or(HardwareFault::PinConfig {
            pin,
            code: ESP_ERR_INVALID_ARG as i32,
        })
}

// ── Sync input ────────────────────────────────────────────────

/// Sync input with pull-up.  Interrupts stay disabled here; the timer
/// driver enables the rising-edge interrupt when it registers its ISR.
#[cfg(target_os = "espidf")]
pub fn configure_sync_input(pin: PinId) -> Result<(), HardwareFault> {
    let cfg = gpio_config_t {
        pin_bit_mask: pin_mask(pin)?,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: plain register configuration of a validated pin number;
    // control path only.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HardwareFault::PinConfig { pin, code: ret });
    }
    info!("gpio: sync input on GPIO {} (pull-up)", pin);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn configure_sync_input(pin: PinId) -> Result<(), HardwareFault> {
    log::info!("gpio(sim): sync input on GPIO {}", pin);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: PinId) -> bool {
    // SAFETY: gpio_get_level is a read-only register access; ISR-safe.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: PinId) -> bool {
    false
}

// ── Load outputs ──────────────────────────────────────────────

/// Push-pull output, driven low (load off) before it is handed over.
#[cfg(target_os = "espidf")]
pub fn configure_output(pin: PinId) -> Result<(), HardwareFault> {
    let cfg = gpio_config_t {
        pin_bit_mask: pin_mask(pin)?,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: as in `configure_sync_input`.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HardwareFault::PinConfig { pin, code: ret });
    }
    // SAFETY: single register write on the pin configured above.
    unsafe { gpio_set_level(pin as gpio_num_t, 0) };
    info!("gpio: output on GPIO {}", pin);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn configure_output(pin: PinId) -> Result<(), HardwareFault> {
    log::info!("gpio(sim): output on GPIO {}", pin);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: PinId, high: bool) {
    // SAFETY: gpio_set_level is a single register write; ISR-safe.
    unsafe {
        gpio_set_level(pin as gpio_num_t, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: PinId, _high: bool) {}

// ── Edge interrupt ────────────────────────────────────────────

/// Install the shared GPIO ISR service.  Already installed is not an error.
#[cfg(target_os = "espidf")]
pub fn install_isr_service() -> Result<(), HardwareFault> {
    // SAFETY: one-shot service install from the control path.  Handlers
    // are not placed in IRAM, so no IRAM flag.
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
        return Err(HardwareFault::IsrInstall(ret));
    }
    Ok(())
}
