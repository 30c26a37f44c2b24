use std::fmt;

const SECOND_STAGE_BOOTLOADER: u32 = 0x1000;
const PARTITION_TABLE: u32 = 0x8000;
const APPLICATION: u32 = 0x10000;

/// Flash offsets of the three images that make up a full firmware.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FlashLayout {
    pub bootloader: u32,
    pub partition_table: u32,
    pub application: u32,
}

impl FlashLayout {
    /// The original ESP32 keeps the first 4K of flash free, so its bootloader sits at 0x1000.
    pub(crate) fn with_second_stage_region() -> Self {
        FlashLayout {
            bootloader: SECOND_STAGE_BOOTLOADER,
            partition_table: PARTITION_TABLE,
            application: APPLICATION,
        }
    }

    pub(crate) fn flat() -> Self {
        FlashLayout {
            bootloader: 0x0,
            partition_table: PARTITION_TABLE,
            application: APPLICATION,
        }
    }
}

impl fmt::Display for FlashLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bootloader {:#x}, partitions {:#x}, app {:#x}",
            self.bootloader, self.partition_table, self.application
        )
    }
}
