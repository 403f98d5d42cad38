//! Radxa boards
//!
//! 40-pin header wiring; positions without a GPIO (power, ground, ADC) are
//! listed as `-`.

use super::profile::BoardProfile;
use once_cell::sync::Lazy;

const CM3_IO: [&str; 32] = [
    "GPIO0_C7", "GPIO3_C7", "GPIO0_B7", "GPIO0_C3", "GPIO3_D4", "GPIO3_D3", "GPIO3_C6", "GPIO3_D5",
    "GPIO0_B6", "GPIO0_B5", "GPIO4_A6", "-", "GPIO4_B2", "GPIO4_B0", "GPIO4_B3", "GPIO0_D1",
    "GPIO0_D0", "-", "-", "-", "-", "GPIO4_B1", "GPIO0_C5", "GPIO0_C6", "GPIO3_D0", "GPIO0_C2",
    "GPIO4_C0", "GPIO4_A7", "GPIO3_D2", "GPIO3_D1", "GPIO4_B4", "GPIO4_B5",
];

const ROCK3A_V1_3_PINS: [&str; 32] = [
    "GPIO3_C4", "GPIO3_A3", "GPIO3_C5", "GPIO0_C0", "GPIO0_B6", "GPIO3_B2", "GPIO0_C1", "GPIO0_B5",
    "GPIO1_A0", "GPIO1_A1", "GPIO4_C6", "GPIO4_D1", "GPIO4_C3", "GPIO4_C5", "GPIO4_C2", "GPIO0_D1",
    "GPIO0_D0", "-", "-", "-", "-", "GPIO2_D7", "GPIO3_A0", "GPIO3_C3", "GPIO3_A4", "-",
    "GPIO3_C2", "GPIO3_A2", "GPIO3_A6", "GPIO3_A5", "GPIO0_B4", "GPIO0_B3",
];

const ROCK5A: [&str; 32] = [
    "GPIO1_A2", "GPIO4_A1", "GPIO4_B2", "GPIO4_B4", "GPIO1_A5", "GPIO1_B0", "GPIO1_B5", "GPIO1_B3",
    "GPIO1_D7", "GPIO1_D6", "GPIO1_A3", "GPIO1_A4", "GPIO1_A1", "GPIO1_A0", "GPIO1_A2", "GPIO0_B5",
    "GPIO0_B6", "-", "-", "-", "-", "GPIO1_B2", "GPIO1_B1", "GPIO1_B4", "GPIO4_A0", "-",
    "GPIO4_B0", "GPIO4_A2", "GPIO4_A5", "GPIO4_B1", "GPIO0_C7", "GPIO0_D0",
];

pub static RADXA_CM3_IO: Lazy<BoardProfile> =
    Lazy::new(|| BoardProfile::new("radxa_cm3_io", "Radxa CM3 IO", "rk356x", &CM3_IO));

pub static ROCK3_CM3_IO: Lazy<BoardProfile> =
    Lazy::new(|| BoardProfile::new("rock3_cm3_io", "Radxa ROCK3 CM3 IO", "rk356x", &CM3_IO));

pub static RADXA_E23: Lazy<BoardProfile> = Lazy::new(|| {
    BoardProfile::new(
        "radxa_e23",
        "Radxa E23",
        "rk356x",
        &[
            "GPIO3_A1", "GPIO3_B4", "GPIO0_C4", "GPIO0_C6", "-", "-", "GPIO2_C6", "GPIO0_C5",
            "GPIO1_A0", "GPIO1_A1", "GPIO4_A6", "GPIO4_A7", "GPIO4_B2", "GPIO4_B0", "GPIO4_B3",
            "GPIO0_D1", "GPIO0_D0", "-", "-", "-", "-", "GPIO3_C1", "GPIO3_C2", "GPIO0_B7",
            "GPIO0_D5", "GPIO0_D6", "GPIO0_C3", "GPIO0_B4", "GPIO0_C1", "GPIO0_B3", "GPIO0_B6",
            "GPIO0_B5",
        ],
    )
});

pub static RADXA_E25: Lazy<BoardProfile> = Lazy::new(|| {
    let mut pins = vec![
        "GPIO3_C4", "GPIO3_A3", "GPIO3_C5", "GPIO3_C1", "GPIO2_D2", "GPIO0_C6", "GPIO3_A1",
        "GPIO3_B7", "GPIO1_A0", "GPIO1_A1", "GPIO4_C6", "GPIO3_C0", "GPIO2_D1", "GPIO2_D0",
        "GPIO2_D3", "GPIO3_C2", "GPIO3_C3",
    ];
    // mini-PCIe header: the rest is power and ground
    pins.resize(32, "-");
    BoardProfile::new("radxa_e25", "Radxa E25", "rk356x", &pins)
});

pub static RADXA_ZERO2: Lazy<BoardProfile> = Lazy::new(|| {
    BoardProfile::new(
        "radxa_zero2",
        "Radxa Zero 2",
        "a311d",
        &[
            "GPIOZ_3", "GPIOA_1", "GPIOZ_4", "GPIOZ_5", "GPIOZ_8", "GPIOZ_6", "GPIOZ_9", "GPIOZ_2",
            "GPIOA_14", "GPIOA_15", "GPIOZ_12", "-", "GPIOH_4", "GPIOH_6", "GPIOH_7", "GPIOAO_0",
            "GPIOAO_1", "-", "-", "-", "-", "GPIOAO_7", "GPIOA_4", "GPIOAO_8", "GPIOA_2",
            "GPIOAO_9", "GPIOA_0", "GPIOA_3", "GPIOA_5", "GPIOZ_7", "GPIOZ_0", "GPIOZ_1",
        ],
    )
});

pub static ROCK3A_V1_2: Lazy<BoardProfile> = Lazy::new(|| {
    BoardProfile::new(
        "rock3a_v1_2",
        "Radxa ROCK 3A v1.2",
        "rk356x",
        &[
            "GPIO3_C4", "GPIO3_A3", "GPIO3_C5", "GPIO0_C0", "GPIO3_A1", "GPIO3_B2", "GPIO0_C1",
            "GPIO3_B7", "GPIO1_A0", "GPIO1_A1", "GPIO4_C6", "GPIO4_D1", "GPIO4_C3", "GPIO4_C5",
            "GPIO4_C2", "GPIO0_D1", "GPIO0_D0", "-", "-", "-", "-", "GPIO2_D7", "GPIO3_A0",
            "GPIO3_C3", "GPIO3_A4", "GPIO3_C0", "GPIO3_C2", "GPIO3_A2", "GPIO3_A6", "GPIO3_A5",
            "GPIO0_B6", "GPIO0_B5",
        ],
    )
});

pub static ROCK3A_V1_3: Lazy<BoardProfile> = Lazy::new(|| {
    BoardProfile::new("rock3a_v1_3", "Radxa ROCK 3A v1.3", "rk356x", &ROCK3A_V1_3_PINS)
});

pub static ROCK3B: Lazy<BoardProfile> =
    Lazy::new(|| BoardProfile::new("rock3b", "Radxa ROCK 3B", "rk356x", &ROCK3A_V1_3_PINS));

pub static ROCK3C: Lazy<BoardProfile> = Lazy::new(|| {
    BoardProfile::new(
        "rock3c",
        "Radxa ROCK 3C",
        "rk356x",
        &[
            "GPIO3_A1", "GPIO3_A3", "GPIO3_A2", "GPIO3_B0", "GPIO3_B1", "GPIO3_B2", "GPIO3_C1",
            "GPIO3_C4", "GPIO1_A0", "GPIO1_A1", "GPIO4_C6", "GPIO4_D1", "GPIO4_C3", "GPIO4_C5",
            "GPIO4_C2", "GPIO0_D1", "GPIO0_D0", "-", "-", "-", "-", "GPIO3_B3", "GPIO3_B4",
            "GPIO3_C3", "GPIO3_A4", "GPIO1_A4", "GPIO3_C2", "GPIO3_A7", "GPIO3_A6", "GPIO3_A5",
            "GPIO4_B2", "GPIO4_B3",
        ],
    )
});

pub static ROCK5A_V1_1: Lazy<BoardProfile> =
    Lazy::new(|| BoardProfile::new("rock5a_v1_1", "Radxa ROCK 5A v1.1", "rk3588", &ROCK5A));

pub static ROCK5A_V1_2: Lazy<BoardProfile> = Lazy::new(|| {
    let mut pins = ROCK5A;
    pins[0] = "GPIO4_B3";
    BoardProfile::new("rock5a_v1_2", "Radxa ROCK 5A v1.2", "rk3588", &pins)
});

pub static ROCK5B: Lazy<BoardProfile> = Lazy::new(|| {
    BoardProfile::new(
        "rock5b",
        "Radxa ROCK 5B",
        "rk3588",
        &[
            "GPIO3_C1", "GPIO3_B5", "GPIO3_B7", "GPIO3_C0", "GPIO3_A4", "GPIO4_A0", "-",
            "GPIO3_C3", "GPIO4_B3", "GPIO4_B2", "GPIO1_B4", "GPIO1_B5", "GPIO1_B2", "GPIO1_B1",
            "GPIO1_B3", "GPIO0_B5", "GPIO0_B6", "-", "-", "-", "-", "GPIO1_D7", "GPIO1_B7",
            "GPIO3_A7", "GPIO3_B6", "GPIO0_A0", "GPIO3_B7", "GPIO3_B1", "GPIO3_B2", "GPIO3_B3",
            "GPIO4_C6", "GPIO4_C5",
        ],
    )
});
