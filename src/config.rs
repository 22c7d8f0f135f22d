//! System configuration and hardware constants
//!
//! Compile-time constants for the amplifier front panel. Pin mappings, clock
//! targets, bus speeds, EEPROM layout and timing live here.

/// External crystal (HSE) frequency
pub const HSE_HZ: u32 = 8_000_000;

/// Requested system clock
///
/// The SPI EEPROM cannot keep up with the full 168 MHz core, so the board
/// runs at 72 MHz.
pub const TARGET_SYSCLK_HZ: u32 = 72_000_000;

/// Extra APB1 division applied on top of the computed prescaler
pub const APB1_EXTRA_DIV: u32 = 2;

/// Extra APB2 division applied on top of the computed prescaler
pub const APB2_EXTRA_DIV: u32 = 4;

/// I2C bus frequency for the TDA7439
pub const I2C_FREQUENCY_HZ: u32 = 100_000;

/// TDA7439 7-bit I2C address (0x88 on the wire)
pub const DSP_I2C_ADDR: u8 = 0x44;

/// SPI clock for the 25AA040A EEPROM (APB2 / 256)
pub const SPI_FREQUENCY_HZ: u32 = 70_000;

/// Quiet period before a changed setting is written to EEPROM
pub const EEPROM_SAVE_DELAY_MS: u32 = 2_000;

/// Settle time between the amplifier enable and mute switches
pub const AMP_SWITCH_DELAY_MS: u32 = 250;

/// Status LED blink period while muted
pub const MUTE_BLINK_PERIOD_MS: u32 = 1_000;

/// Main loop period
pub const LOOP_PERIOD_MS: u64 = 1;

/// Largest raw value of a quadrature counter (16-bit timers)
pub const ENCODER_COUNTER_MAX: u32 = 0xFFFF;

/// Raw counts per detent
pub const ENCODER_STEP_DIVISOR: u32 = 4;

/// Number of front-panel keys
pub const KEY_COUNT: usize = 4;

/// How long a key level must hold before a change is accepted
pub const KEY_DEBOUNCE_MS: u32 = 20;

/// Words per audio stream buffer (stereo pairs interleaved)
pub const AUDIO_BLOCK_SIZE: usize = 1024;

/// Settle time after powering the audio DAC
pub const DAC_POWER_UP_MS: u32 = 50;

/// Sample rates above this need the DAC's high-rate select pin
pub const DAC_HIGH_RATE_THRESHOLD_HZ: u32 = 48_000;

/// EEPROM layout and factory defaults
pub mod eeprom {
    //! One byte per setting; erased cells (0xFF) fall back to the default

    /// Byte read from an erased cell
    pub const ERASED: u8 = 0xFF;

    /// Selected input
    pub const INPUT_CHANNEL_ADDR: u16 = 1;
    /// Master volume
    pub const VOLUME_ADDR: u16 = 2;
    /// Bass tone
    pub const BASS_ADDR: u16 = 3;
    /// Treble tone
    pub const TREBLE_ADDR: u16 = 4;
    /// Input gain
    pub const INPUT_GAIN_ADDR: u16 = 5;
    /// Output gain step
    pub const OUTPUT_GAIN_ADDR: u16 = 6;

    /// Default input
    pub const DEFAULT_INPUT_CHANNEL: u8 = 1;
    /// Default volume
    pub const DEFAULT_VOLUME: u8 = 10;
    /// Default bass (flat)
    pub const DEFAULT_BASS: u8 = 7;
    /// Default treble (flat)
    pub const DEFAULT_TREBLE: u8 = 7;
    /// Default input gain
    pub const DEFAULT_INPUT_GAIN: u8 = 0;
    /// Default output gain
    pub const DEFAULT_OUTPUT_GAIN: u8 = 0;
}

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// Blue status LED (cathode to pin)
    pub const LED_STATUS: &str = "PC1";

    /// Input 1 LED
    pub const LED_INPUT1: &str = "PA12";
    /// Input 2 LED
    pub const LED_INPUT2: &str = "PA11";
    /// Input 3 LED
    pub const LED_INPUT3: &str = "PA10";
    /// Input 4 LED
    pub const LED_INPUT4: &str = "PC9";

    /// Input 1 key (active low)
    pub const KEY1: &str = "PB15";
    /// Input 2 key (active low)
    pub const KEY2: &str = "PB14";
    /// Input 3 key (active low)
    pub const KEY3: &str = "PB13";
    /// Input 4 key (active low)
    pub const KEY4: &str = "PB12";

    /// Amplifier mute (low = muted)
    pub const AMP_MUTE: &str = "PC10";
    /// Amplifier enable (low = enabled)
    pub const AMP_ENABLE: &str = "PC11";
    /// Output gain select bit 0
    pub const AMP_GAIN0: &str = "PC12";
    /// Output gain select bit 1
    pub const AMP_GAIN1: &str = "PD2";

    /// I2C2 SCL (TDA7439)
    pub const I2C2_SCL: &str = "PB10";
    /// I2C2 SDA (TDA7439)
    pub const I2C2_SDA: &str = "PB11";

    /// SPI1 SCK (EEPROM)
    pub const SPI1_SCK: &str = "PA5";
    /// SPI1 MISO (EEPROM)
    pub const SPI1_MISO: &str = "PA6";
    /// SPI1 MOSI (EEPROM)
    pub const SPI1_MOSI: &str = "PA7";
    /// EEPROM chip select
    pub const EEPROM_CS: &str = "PC4";

    /// Volume encoder A/B
    pub const ENC_VOLUME: (&str, &str) = ("PA8", "PA9");
    /// Bass encoder A/B
    pub const ENC_BASS: (&str, &str) = ("PA15", "PB3");
    /// Treble encoder A/B
    pub const ENC_TREBLE: (&str, &str) = ("PC6", "PC7");
}

/// DMA channel assignments
pub mod dma {
    //! DMA streams reserved for the asynchronous transports

    /// DMA1 stream for the I2S audio DAC
    pub const I2S_TX_STREAM: u8 = 4;

    /// DMA2 stream for the diagnostic USART
    pub const LOGGER_TX_STREAM: u8 = 7;
}

/// Timer assignments
pub mod timers {
    //! Hardware timer assignments

    /// Volume encoder (quadrature mode)
    pub const ENCODER_VOLUME: u8 = 1;

    /// Bass encoder (quadrature mode)
    pub const ENCODER_BASS: u8 = 2;

    /// Treble encoder (quadrature mode)
    pub const ENCODER_TREBLE: u8 = 3;

    /// Embassy time driver
    pub const TIME_DRIVER: u8 = 4;
}
