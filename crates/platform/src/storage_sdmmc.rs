//! SD card volume backed by `embedded-sdmmc`.
//!
//! Wraps an [`embedded_sdmmc::VolumeManager`] and implements [`Volume`] over
//! its raw-handle API: `mount` opens partition 0 and its root directory,
//! `open` looks files up in that root directory, `unmount` closes both.
//!
//! The block device is whatever the board provides (`SdCard` over SPI, or
//! an SDMMC peripheral adapter); this module only needs
//! [`embedded_sdmmc::BlockDevice`].

use embedded_sdmmc::{
    BlockDevice, Mode, RawDirectory, RawFile, RawVolume, TimeSource, VolumeIdx, VolumeManager,
};

use crate::storage::{OpenMode, Volume};

/// Error type for SD card volume operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SdmmcError {
    /// `open`/`read`/`close` before `mount`
    NotMounted,
    /// `mount` while already mounted
    AlreadyMounted,
    /// Partition 0 could not be opened (no card, no FAT volume)
    Mount,
    /// File not found or could not be opened
    Open,
    /// Block device or file system I/O error
    Io,
}

impl core::fmt::Display for SdmmcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotMounted => f.write_str("volume not mounted"),
            Self::AlreadyMounted => f.write_str("volume already mounted"),
            Self::Mount => f.write_str("could not mount volume 0"),
            Self::Open => f.write_str("could not open file"),
            Self::Io => f.write_str("SD card I/O error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SdmmcError {}

/// Volume handles held while mounted.
#[derive(Clone, Copy)]
struct Mounted {
    volume: RawVolume,
    root: RawDirectory,
}

/// FAT volume 0 of an SD card.
pub struct SdmmcVolume<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    manager: VolumeManager<D, T>,
    mounted: Option<Mounted>,
}

impl<D, T> SdmmcVolume<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    /// Wrap a block device. Nothing is read until [`Volume::mount`].
    pub fn new(block_device: D, time_source: T) -> Self {
        Self {
            manager: VolumeManager::new(block_device, time_source),
            mounted: None,
        }
    }

    /// `true` between a successful `mount` and `unmount`.
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    fn root(&self) -> Result<RawDirectory, SdmmcError> {
        self.mounted.map(|m| m.root).ok_or(SdmmcError::NotMounted)
    }
}

impl<D, T> Volume for SdmmcVolume<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    type Error = SdmmcError;
    type File = RawFile;

    async fn mount(&mut self) -> Result<(), Self::Error> {
        if self.mounted.is_some() {
            return Err(SdmmcError::AlreadyMounted);
        }
        let volume = self
            .manager
            .open_raw_volume(VolumeIdx(0))
            .map_err(|_| SdmmcError::Mount)?;
        let root = match self.manager.open_root_dir(volume) {
            Ok(root) => root,
            Err(_) => {
                // Release the volume slot; the mount already failed.
                let _ = self.manager.close_volume(volume);
                return Err(SdmmcError::Mount);
            }
        };
        self.mounted = Some(Mounted { volume, root });
        Ok(())
    }

    async fn unmount(&mut self) -> Result<(), Self::Error> {
        let mounted = self.mounted.take().ok_or(SdmmcError::NotMounted)?;
        self.manager
            .close_dir(mounted.root)
            .map_err(|_| SdmmcError::Io)?;
        self.manager
            .close_volume(mounted.volume)
            .map_err(|_| SdmmcError::Io)
    }

    async fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, Self::Error> {
        let root = self.root()?;
        let mode = match mode {
            OpenMode::Read => Mode::ReadOnly,
        };
        let name = path.trim_start_matches('/');
        self.manager
            .open_file_in_dir(root, name, mode)
            .map_err(|_| SdmmcError::Open)
    }

    async fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.root()?;
        self.manager.read(*file, buf).map_err(|_| SdmmcError::Io)
    }

    async fn close(&mut self, file: Self::File) -> Result<(), Self::Error> {
        self.root()?;
        self.manager.close_file(file).map_err(|_| SdmmcError::Io)
    }
}
