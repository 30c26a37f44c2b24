mod layout;
pub use layout::FlashLayout;

use crate::Error;
use std::{fmt, str::FromStr};

/// MCU identifier assumed when the board configuration doesn't name one.
pub const DEFAULT_MCU: &str = "esp32";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Chip {
    Esp32,
    Esp32s2,
    Esp32s3,
    Esp32c3,
}

/// How a [`Chip`] was arrived at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChipOrigin {
    Recognized,
    /// The identifier matched no supported chip and the baseline was used instead.
    Defaulted { requested: Option<String> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedChip {
    pub chip: Chip,
    pub origin: ChipOrigin,
}

impl ResolvedChip {
    pub fn is_defaulted(&self) -> bool {
        matches!(self.origin, ChipOrigin::Defaulted { .. })
    }
}

impl Chip {
    pub const ALL: [Chip; 4] = [Chip::Esp32, Chip::Esp32s2, Chip::Esp32s3, Chip::Esp32c3];

    /// Name understood by the image packer's `--chip` option.
    pub fn name(self) -> &'static str {
        match self {
            Chip::Esp32 => "esp32",
            Chip::Esp32s2 => "esp32s2",
            Chip::Esp32s3 => "esp32s3",
            Chip::Esp32c3 => "esp32c3",
        }
    }

    /// Map a raw MCU identifier from the board configuration to a chip.
    ///
    /// Matching is exact but case-insensitive. A missing or empty identifier
    /// means [`DEFAULT_MCU`]. Anything else falls back to [`Chip::Esp32`] and
    /// is reported as [`ChipOrigin::Defaulted`].
    pub fn resolve(raw: Option<&str>) -> ResolvedChip {
        let mcu = match raw {
            Some(mcu) if !mcu.is_empty() => mcu.to_lowercase(),
            _ => DEFAULT_MCU.to_string(),
        };
        match Chip::ALL.iter().find(|chip| chip.name() == mcu) {
            Some(&chip) => ResolvedChip {
                chip,
                origin: ChipOrigin::Recognized,
            },
            None => {
                log::warn!(
                    "MCU {:?} is not supported, falling back to {}",
                    mcu,
                    Chip::Esp32
                );
                ResolvedChip {
                    chip: Chip::Esp32,
                    origin: ChipOrigin::Defaulted {
                        requested: raw.map(str::to_string),
                    },
                }
            }
        }
    }

    pub fn layout(self) -> FlashLayout {
        match self {
            Chip::Esp32 => FlashLayout::with_second_stage_region(),
            Chip::Esp32s2 | Chip::Esp32s3 | Chip::Esp32c3 => FlashLayout::flat(),
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chip {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_lowercase();
        Chip::ALL
            .iter()
            .copied()
            .find(|chip| chip.name() == name)
            .ok_or_else(|| Error::UnrecognizedChip(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_supported_identifier_in_any_case() {
        for chip in Chip::ALL.iter().copied() {
            let upper = chip.name().to_uppercase();
            let mixed = format!("Esp{}", &chip.name()[3..]);
            for raw in [chip.name(), upper.as_str(), mixed.as_str()].iter() {
                let resolved = Chip::resolve(Some(*raw));
                assert_eq!(resolved.chip, chip, "{}", raw);
                assert_eq!(resolved.origin, ChipOrigin::Recognized);
            }
        }
    }

    #[test]
    fn missing_mcu_is_the_baseline() {
        assert_eq!(
            Chip::resolve(None),
            ResolvedChip {
                chip: Chip::Esp32,
                origin: ChipOrigin::Recognized,
            }
        );
        assert!(!Chip::resolve(Some("")).is_defaulted());
    }

    #[test]
    fn unknown_mcu_falls_back_and_is_tagged() {
        for raw in ["esp8266", "esp32s3x", "esp32-s3", " esp32", "esp"].iter() {
            let resolved = Chip::resolve(Some(*raw));
            assert_eq!(resolved.chip, Chip::Esp32);
            assert_eq!(
                resolved.origin,
                ChipOrigin::Defaulted {
                    requested: Some(raw.to_string())
                }
            );
        }
    }

    #[test]
    fn strict_parse_rejects_unknown() {
        assert_eq!("ESP32C3".parse::<Chip>().unwrap(), Chip::Esp32c3);
        assert!(matches!(
            "rp2040".parse::<Chip>(),
            Err(Error::UnrecognizedChip(name)) if name == "rp2040"
        ));
    }

    #[test]
    fn layout_per_chip() {
        for chip in Chip::ALL.iter().copied() {
            let layout = chip.layout();
            assert_eq!(layout.partition_table, 0x8000);
            assert_eq!(layout.application, 0x10000);
            let expected_boot = if chip == Chip::Esp32 { 0x1000 } else { 0x0 };
            assert_eq!(layout.bootloader, expected_boot, "{}", chip);
        }
    }
}
