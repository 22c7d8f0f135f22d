//! Amplifier Front-Panel Main Application
//!
//! Entry point for the STM32F405 amplifier firmware. Sets up the clock tree
//! from the PLL search, brings up the buses, restores the saved settings and
//! then runs one cooperative loop servicing encoders, keys, the 1 Hz blink
//! and the delayed EEPROM writes.

#![no_std]
#![no_main]

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::qei::{Qei, QeiPin};
use embassy_time::{Delay, Timer};
use {defmt_rtt as _, panic_probe as _};

use amp_firmware::amp::{AmpController, Settings};
use amp_firmware::clock::pll_calc;
use amp_firmware::config::{
    APB1_EXTRA_DIV, APB2_EXTRA_DIV, DSP_I2C_ADDR, EEPROM_SAVE_DELAY_MS, ENCODER_COUNTER_MAX,
    ENCODER_STEP_DIVISOR, HSE_HZ, I2C_FREQUENCY_HZ, LOOP_PERIOD_MS, MUTE_BLINK_PERIOD_MS,
    SPI_FREQUENCY_HZ, TARGET_SYSCLK_HZ,
};
use amp_firmware::controls::{EncoderConfig, EncoderDecoder, Keypad};
use amp_firmware::drivers::{Eeprom25aa040a, Tda7439};
use amp_firmware::hal::gpio::{AmpPower, GainSelector, Led, LedWiring, PanelLeds};
use amp_firmware::hal::rcc;
use amp_firmware::hal::timer::{MonotonicClock, SystemClock, Ticker};
use amp_firmware::types::{AmpError, Control};

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Amplifier Firmware v{}", env!("CARGO_PKG_VERSION"));

    let clocks = pll_calc::solve(HSE_HZ, TARGET_SYSCLK_HZ)
        .map(|s| s.with_extra_prescalers(APB1_EXTRA_DIV, APB2_EXTRA_DIV))
        .and_then(|s| rcc::config_for(&s).map(|config| (s, config)));
    let (solution, config) = match clocks {
        Ok((solution, config)) => (Some(solution), config),
        Err(e) => {
            error!("clock configuration failed: {}", e);
            (None, embassy_stm32::Config::default())
        }
    };
    let p = embassy_stm32::init(config);

    // Amplifier held muted and disabled from the first instruction on
    let mut power = AmpPower::new(
        Output::new(p.PC10, Level::Low, Speed::Low),
        Output::new(p.PC11, Level::High, Speed::Low),
    );
    let Some(solution) = solution else {
        halt(&mut power);
    };
    info!("Clock: {}", solution);

    let gain = GainSelector::new(
        Output::new(p.PC12, Level::High, Speed::Low),
        Output::new(p.PD2, Level::High, Speed::Low),
    );
    let leds = PanelLeds::new(
        Led::new(Output::new(p.PC1, Level::High, Speed::Low), LedWiring::Cathode),
        [
            Led::new(Output::new(p.PA12, Level::Low, Speed::Low), LedWiring::Anode),
            Led::new(Output::new(p.PA11, Level::Low, Speed::Low), LedWiring::Anode),
            Led::new(Output::new(p.PA10, Level::Low, Speed::Low), LedWiring::Anode),
            Led::new(Output::new(p.PC9, Level::Low, Speed::Low), LedWiring::Anode),
        ],
    );
    let mut keypad = Keypad::new([
        Input::new(p.PB15, Pull::Up),
        Input::new(p.PB14, Pull::Up),
        Input::new(p.PB13, Pull::Up),
        Input::new(p.PB12, Pull::Up),
    ]);

    // TDA7439 on I2C2 (PB10 = SCL, PB11 = SDA)
    let i2c = I2c::new_blocking(
        p.I2C2,
        p.PB10,
        p.PB11,
        Hertz(I2C_FREQUENCY_HZ),
        Default::default(),
    );
    let dsp = Tda7439::new(i2c, DSP_I2C_ADDR);
    info!("I2C2 initialized at {} Hz", I2C_FREQUENCY_HZ);

    // 25AA040A on SPI1 (PA5 = SCK, PA7 = MOSI, PA6 = MISO, PC4 = CS)
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(SPI_FREQUENCY_HZ);
    let spi = Spi::new_blocking(p.SPI1, p.PA5, p.PA7, p.PA6, spi_config);
    let mut eeprom = Eeprom25aa040a::new(spi, Output::new(p.PC4, Level::High, Speed::Medium));
    if let Err(e) = eeprom.start() {
        error!("EEPROM not responding: {}", e);
        halt(&mut power);
    }

    let encoder_config = EncoderConfig::new(ENCODER_COUNTER_MAX, ENCODER_STEP_DIVISOR);
    let mut volume = EncoderDecoder::new(
        Qei::new(p.TIM1, QeiPin::new_ch1(p.PA8), QeiPin::new_ch2(p.PA9)),
        encoder_config,
    );
    let mut bass = EncoderDecoder::new(
        Qei::new(p.TIM2, QeiPin::new_ch1(p.PA15), QeiPin::new_ch2(p.PB3)),
        encoder_config,
    );
    let mut treble = EncoderDecoder::new(
        Qei::new(p.TIM3, QeiPin::new_ch1(p.PC6), QeiPin::new_ch2(p.PC7)),
        encoder_config,
    );
    volume.start();
    bass.start();
    treble.start();

    let settings = Settings::new(eeprom, EEPROM_SAVE_DELAY_MS);
    let mut controller = AmpController::new(dsp, settings, power, gain, leds, Delay);
    if let Err(e) = controller.init() {
        error!("Initialization failed: {}", e);
        controller.engage_safe_state();
        park();
    }

    info!("Entering main loop");

    let clock = SystemClock;
    let mut blink = Ticker::new(MUTE_BLINK_PERIOD_MS);
    loop {
        let now = clock.now_ms();

        let turns = [
            (Control::Volume, volume.poll()),
            (Control::Bass, bass.poll()),
            (Control::Treble, treble.poll()),
        ];
        for (control, direction) in turns {
            if let Some(direction) = direction {
                report(controller.on_rotate(control, direction, now));
            }
        }

        for press in keypad.poll(now) {
            report(controller.on_key(press));
        }

        if blink.check(now) {
            controller.on_second();
        }

        if let Err(e) = controller.tick(now) {
            warn!("Settings flush failed: {}", e);
        }

        Timer::after_millis(LOOP_PERIOD_MS).await;
    }
}

fn report(result: Result<(), AmpError>) {
    if let Err(e) = result {
        warn!("Panel action failed: {}", e);
    }
}

/// Mute and disable the amplifier, then stop
fn halt(power: &mut AmpPower<Output<'static>>) -> ! {
    power.force_mute();
    park()
}

fn park() -> ! {
    error!("Halted");
    loop {
        cortex_m::asm::wfi();
    }
}
