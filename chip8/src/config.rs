use std::path::PathBuf;

use clap::Parser;

use g8_core::DEFAULT_CPU_FREQUENCY;

/// Runs a CHIP-8 ROM in an SDL2 window
#[derive(Parser, Debug)]
#[command(name = "g8emu", version, about)]
pub struct Config {
    /// Path to the ROM file
    pub rom: PathBuf,

    /// Integer scale factor for each pixel
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub scale: u32,

    /// Instructions executed per second; the timers always run at 60Hz
    #[arg(short, long, default_value_t = DEFAULT_CPU_FREQUENCY, value_parser = clap::value_parser!(u32).range(1..))]
    pub frequency: u32,

    /// Seed for the random number instruction, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the loaded program as address/opcode pairs and exit
    #[arg(long)]
    pub dump: bool,

    /// Don't open an audio device
    #[arg(long)]
    pub mute: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Config::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["g8emu", "pong.ch8"]).unwrap();
        assert_eq!(config.rom, PathBuf::from("pong.ch8"));
        assert_eq!(config.scale, 10);
        assert_eq!(config.frequency, DEFAULT_CPU_FREQUENCY);
        assert_eq!(config.seed, None);
        assert!(!config.dump && !config.mute);
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "g8emu", "-s", "4", "-f", "1000", "--seed", "9", "--mute", "pong.ch8",
        ])
        .unwrap();
        assert_eq!(config.scale, 4);
        assert_eq!(config.frequency, 1000);
        assert_eq!(config.seed, Some(9));
        assert!(config.mute);
    }

    #[test]
    fn test_rejects_zero_frequency() {
        assert!(Config::try_parse_from(["g8emu", "-f", "0", "pong.ch8"]).is_err());
    }
}
