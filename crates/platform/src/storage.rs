//! Storage abstraction for FAT volumes
//!
//! A [`Volume`] is mounted explicitly, hands out file handles, and is
//! unmounted explicitly. Handles are plain values owned by the caller; all
//! I/O goes through the volume. This matches how `embedded-sdmmc` works and
//! keeps the trait object-free.

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenMode {
    /// Read from the start of an existing file.
    Read,
}

/// Mountable file system volume.
pub trait Volume {
    /// Error type
    type Error: core::fmt::Debug;
    /// Open-file handle.
    type File;

    /// Mount the volume. Must precede any `open`.
    fn mount(&mut self) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Unmount the volume. Handles still open become invalid.
    fn unmount(&mut self) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Open `path` (8.3 name in the root directory).
    fn open(
        &mut self,
        path: &str,
        mode: OpenMode,
    ) -> impl core::future::Future<Output = Result<Self::File, Self::Error>>;

    /// Read from the current position into `buf`. Returns the number of
    /// bytes read; `0` means end of file.
    fn read(
        &mut self,
        file: &mut Self::File,
        buf: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, Self::Error>>;

    /// Close `file`.
    fn close(
        &mut self,
        file: Self::File,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}

/// Fill `buf` completely, issuing as many reads as needed.
///
/// Returns the number of bytes read, which is less than `buf.len()` only at
/// end of file.
pub async fn read_full<V: Volume>(
    volume: &mut V,
    file: &mut V::File,
    buf: &mut [u8],
) -> Result<usize, V::Error> {
    let mut filled = 0usize;
    while let Some(rest) = buf.get_mut(filled..) {
        if rest.is_empty() {
            break;
        }
        let n = volume.read(file, rest).await?;
        if n == 0 {
            break;
        }
        filled = filled.saturating_add(n);
    }
    Ok(filled)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::MockVolume;

    #[tokio::test]
    async fn read_full_joins_short_reads() {
        let mut vol = MockVolume::new().with_file("IMG.BIN", &[1, 2, 3, 4, 5, 6, 7]);
        vol.set_read_chunk(3);
        vol.mount().await.unwrap();
        let mut f = vol.open("IMG.BIN", OpenMode::Read).await.unwrap();

        let mut buf = [0u8; 5];
        assert_eq!(read_full(&mut vol, &mut f, &mut buf).await, Ok(5));
        assert_eq!(buf, [1, 2, 3, 4, 5]);

        let mut tail = [0u8; 5];
        assert_eq!(
            read_full(&mut vol, &mut f, &mut tail).await,
            Ok(2),
            "short count only at end of file"
        );
        assert_eq!(&tail[..2], &[6, 7]);
    }
}
