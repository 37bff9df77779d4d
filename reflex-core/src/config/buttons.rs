//! Button wiring
//!
//! Each arcade button has a switch on an expander input pin (port B) and
//! an LED on an expander output pin (port A).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of buttons on the board
pub const BUTTON_COUNT: usize = 5;

/// Wiring for a single button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ButtonConfig {
    /// Port B bit the switch reads on
    pub input_pin: u8,
    /// Port A bit driving the button LED
    pub led_pin: u8,
}

impl ButtonConfig {
    pub const fn new(input_pin: u8, led_pin: u8) -> Self {
        Self { input_pin, led_pin }
    }
}

/// Production board wiring, left to right
pub const DEFAULT_BUTTONS: [ButtonConfig; BUTTON_COUNT] = [
    ButtonConfig::new(1, 4),
    ButtonConfig::new(2, 3),
    ButtonConfig::new(3, 2),
    ButtonConfig::new(4, 1),
    ButtonConfig::new(6, 0),
];

/// Find the button wired to an input pin
///
/// Returns the button's index in `buttons` together with its wiring.
pub fn find_by_input(buttons: &[ButtonConfig], input_pin: u8) -> Option<(usize, ButtonConfig)> {
    buttons
        .iter()
        .enumerate()
        .find(|(_, b)| b.input_pin == input_pin)
        .map(|(i, b)| (i, *b))
}

/// Port B bits occupied by button switches
pub fn input_mask(buttons: &[ButtonConfig]) -> u8 {
    buttons
        .iter()
        .filter(|b| b.input_pin < 8)
        .fold(0, |mask, b| mask | (1 << b.input_pin))
}

/// Port A bits occupied by button LEDs
pub fn led_mask(buttons: &[ButtonConfig]) -> u8 {
    buttons
        .iter()
        .filter(|b| b.led_pin < 8)
        .fold(0, |mask, b| mask | (1 << b.led_pin))
}

/// Identify a single pressed button from a port B snapshot
///
/// Lines without a button are masked off first, so a floating unwired
/// input cannot block a press. `None` when no button or more than one
/// button is down.
pub fn pressed_button(buttons: &[ButtonConfig], snapshot: u8) -> Option<(usize, ButtonConfig)> {
    let pressed = snapshot & input_mask(buttons);
    if pressed.count_ones() != 1 {
        return None;
    }
    find_by_input(buttons, pressed.trailing_zeros() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_masks() {
        assert_eq!(input_mask(&DEFAULT_BUTTONS), 0b0101_1110);
        assert_eq!(led_mask(&DEFAULT_BUTTONS), 0b0001_1111);
    }

    #[test]
    fn test_find_by_input() {
        assert_eq!(
            find_by_input(&DEFAULT_BUTTONS, 6),
            Some((4, ButtonConfig::new(6, 0)))
        );
        assert_eq!(find_by_input(&DEFAULT_BUTTONS, 5), None);
    }

    #[test]
    fn test_out_of_range_pins_ignored_in_masks() {
        let buttons = [ButtonConfig::new(9, 12), ButtonConfig::new(0, 7)];
        assert_eq!(input_mask(&buttons), 0b0000_0001);
        assert_eq!(led_mask(&buttons), 0b1000_0000);
    }

    #[test]
    fn test_pressed_button() {
        assert_eq!(
            pressed_button(&DEFAULT_BUTTONS, 0b0000_0100),
            Some((1, ButtonConfig::new(2, 3)))
        );
        // Unwired lines 0, 5 and 7 are ignored
        assert_eq!(
            pressed_button(&DEFAULT_BUTTONS, 0b1010_0001 | 0b0100_0000),
            Some((4, ButtonConfig::new(6, 0)))
        );
        assert_eq!(pressed_button(&DEFAULT_BUTTONS, 0b0000_0000), None);
        assert_eq!(pressed_button(&DEFAULT_BUTTONS, 0b0000_0110), None);
    }
}
