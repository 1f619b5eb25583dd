//! SSD1306 OLED display wrapper.
//!
//! The engine redraws regions into the in-memory buffer; nothing reaches
//! the panel until [`Screen::update`] flushes it.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use room_beacon::layout::{
    centred_x, clip, content_baseline, wrap, Region, BUTTON_REGION, COLUMNS, CONTENT_LINES,
    CONTENT_REGION, LABEL_CENTRES, SCREEN_WIDTH, STATUS_REGION,
};
use room_beacon::Render;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use crate::error::Error;

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

fn text_style(color: BinaryColor) -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(color)
        .build()
}

/// Render surface: the display buffer plus a dirty flag.
pub struct Screen<I2C> {
    display: Display<I2C>,
    dirty: bool,
}

impl<I2C> Screen<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Initialise the SSD1306 display and clear the screen.
    pub fn new(i2c: I2C) -> Result<Self, Error> {
        let interface = I2CDisplayInterface::new(i2c);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display.init().map_err(|_| Error::Display)?;
        display.clear_buffer();
        display.flush().map_err(|_| Error::Display)?;
        Ok(Self {
            display,
            dirty: false,
        })
    }

    /// Push the buffer to the panel if anything was redrawn.
    pub fn update(&mut self) -> Result<(), Error> {
        if !self.dirty {
            return Ok(());
        }
        self.display.flush().map_err(|_| Error::Display)?;
        self.dirty = false;
        Ok(())
    }

    fn fill(&mut self, region: Region, color: BinaryColor) {
        let _ = Rectangle::new(
            Point::new(0, region.top),
            Size::new(SCREEN_WIDTH, region.height),
        )
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(&mut self.display);
        self.dirty = true;
    }
}

impl<I2C> Render for Screen<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Status bar: inverted, one centred line.
    fn set_status(&mut self, status: &str) {
        self.fill(STATUS_REGION, BinaryColor::On);
        let line = clip(status, COLUMNS);
        let x = centred_x(line, SCREEN_WIDTH as i32 / 2);
        let _ = Text::new(
            line,
            Point::new(x, STATUS_REGION.top + 11),
            text_style(BinaryColor::Off),
        )
        .draw(&mut self.display);
    }

    fn set_content(&mut self, content: &str) {
        self.fill(CONTENT_REGION, BinaryColor::Off);
        for (row, line) in wrap(content, COLUMNS).take(CONTENT_LINES).enumerate() {
            let _ = Text::new(
                line,
                Point::new(0, content_baseline(row)),
                text_style(BinaryColor::On),
            )
            .draw(&mut self.display);
        }
    }

    fn set_button_labels(&mut self, a: &str, b: &str, c: &str) {
        self.fill(BUTTON_REGION, BinaryColor::Off);
        for (label, centre) in [a, b, c].into_iter().zip(LABEL_CENTRES) {
            if label.is_empty() {
                continue;
            }
            let label = clip(label, COLUMNS / 3);
            let _ = Text::new(
                label,
                Point::new(centred_x(label, centre), BUTTON_REGION.top + 9),
                text_style(BinaryColor::On),
            )
            .draw(&mut self.display);
        }
    }
}
