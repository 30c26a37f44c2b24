use crate::chip::FlashLayout;
use std::path::{Path, PathBuf};

/// File names the build system gives the bootloader and partition table images.
pub const BOOTLOADER_BIN: &str = "bootloader.bin";
pub const PARTITIONS_BIN: &str = "partitions.bin";

/// An image file to place at a flash offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSegment {
    pub addr: u32,
    pub path: PathBuf,
}

impl ImageSegment {
    pub fn new<P: Into<PathBuf>>(addr: u32, path: P) -> Self {
        ImageSegment {
            addr,
            path: path.into(),
        }
    }

    /// Offset the way the packer expects it, e.g. `0x1000`.
    pub fn addr_hex(&self) -> String {
        format!("{:#x}", self.addr)
    }
}

/// The three build outputs that are merged into one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifacts {
    pub bootloader: PathBuf,
    pub partitions: PathBuf,
    pub application: PathBuf,
}

impl BuildArtifacts {
    pub fn in_build_dir(build_dir: &Path, prog_name: &str) -> Self {
        BuildArtifacts {
            bootloader: build_dir.join(BOOTLOADER_BIN),
            partitions: build_dir.join(PARTITIONS_BIN),
            application: build_dir.join(format!("{}.bin", prog_name)),
        }
    }

    pub fn paths(&self) -> [&Path; 3] {
        [&self.bootloader, &self.partitions, &self.application]
    }

    /// Segments in packer order: bootloader, partition table, application.
    pub fn segments(&self, layout: &FlashLayout) -> Vec<ImageSegment> {
        vec![
            ImageSegment::new(layout.bootloader, &self.bootloader),
            ImageSegment::new(layout.partition_table, &self.partitions),
            ImageSegment::new(layout.application, &self.application),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Chip;

    #[test]
    fn segments_follow_layout_in_fixed_order() {
        let artifacts = BuildArtifacts::in_build_dir(Path::new("/b"), "firmware");
        let segments = artifacts.segments(&Chip::Esp32s3.layout());
        let addrs: Vec<_> = segments.iter().map(ImageSegment::addr_hex).collect();
        assert_eq!(addrs, ["0x0", "0x8000", "0x10000"]);
        assert_eq!(segments[0].path, Path::new("/b/bootloader.bin"));
        assert_eq!(segments[1].path, Path::new("/b/partitions.bin"));
        assert_eq!(segments[2].path, Path::new("/b/firmware.bin"));
    }

    #[test]
    fn application_follows_program_name() {
        let artifacts = BuildArtifacts::in_build_dir(Path::new("/b"), "app");
        assert_eq!(artifacts.application, Path::new("/b/app.bin"));
        assert_eq!(
            ImageSegment::new(Chip::Esp32.layout().bootloader, "x").addr_hex(),
            "0x1000"
        );
    }
}
