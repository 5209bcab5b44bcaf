use sdl2::keyboard::Keycode;

/// # Keypad
/// Chip-8 input is generated with a hexadecimal keypad.
///
/// Its layout is mapped onto the left 4 alphanumeric columns of a keyboard.
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
const KEYPAD: [(Keycode, u8); 16] = [
    (Keycode::Num1, 0x1),
    (Keycode::Num2, 0x2),
    (Keycode::Num3, 0x3),
    (Keycode::Num4, 0xC),
    (Keycode::Q, 0x4),
    (Keycode::W, 0x5),
    (Keycode::E, 0x6),
    (Keycode::R, 0xD),
    (Keycode::A, 0x7),
    (Keycode::S, 0x8),
    (Keycode::D, 0x9),
    (Keycode::F, 0xE),
    (Keycode::Z, 0xA),
    (Keycode::X, 0x0),
    (Keycode::C, 0xB),
    (Keycode::V, 0xF),
];

/// Keys that drive the emulator rather than the program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Quit,
    TogglePause,
    Reset,
}

/// The hex digit of the keypad key bound to `key`
pub fn keymap(key: Keycode) -> Option<u8> {
    KEYPAD
        .iter()
        .find(|(bound, _)| *bound == key)
        .map(|&(_, digit)| digit)
}

pub fn control(key: Keycode) -> Option<Control> {
    match key {
        Keycode::Escape => Some(Control::Quit),
        Keycode::P => Some(Control::TogglePause),
        Keycode::Backspace => Some(Control::Reset),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_every_hex_digit_once() {
        let mut digits: Vec<u8> = KEYPAD.iter().filter_map(|&(key, _)| keymap(key)).collect();
        digits.sort_unstable();
        assert_eq!(digits, (0x0..=0xF).collect::<Vec<u8>>());
    }

    #[test]
    fn test_follows_keypad_layout() {
        assert_eq!(keymap(Keycode::X), Some(0x0));
        assert_eq!(keymap(Keycode::Num4), Some(0xC));
        assert_eq!(keymap(Keycode::V), Some(0xF));
        assert_eq!(keymap(Keycode::Num5), None);
    }

    #[test]
    fn test_controls_are_not_keypad_keys() {
        for key in [Keycode::Escape, Keycode::P, Keycode::Backspace] {
            assert!(control(key).is_some());
            assert_eq!(keymap(key), None);
        }
    }
}
