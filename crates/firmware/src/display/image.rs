//! Row-by-row image streaming from a FAT volume onto [`Ili9341`].
//!
//! Files are raw big-endian RGB565, `w·2` bytes per row, no header.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use platform::storage::read_full;
use platform::{OpenMode, Volume};

use super::ili9341::{Ili9341, PANEL_HEIGHT};
use super::DisplayError;

/// Largest supported row: one full landscape line.
pub const MAX_ROW_BYTES: usize = PANEL_HEIGHT as usize * 2;

/// Errors from [`Ili9341::draw_binary_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageError<E> {
    /// Drawing a row failed.
    Display(DisplayError),
    /// Mount, open, read or close failed.
    Storage(E),
    /// The file ended before `h` full rows were read.
    ShortRead,
    /// `w·2` exceeds [`MAX_ROW_BYTES`].
    RowTooWide,
}

impl<E> From<DisplayError> for ImageError<E> {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for ImageError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Display(e) => write!(f, "display error: {e}"),
            Self::Storage(e) => write!(f, "storage error: {e:?}"),
            Self::ShortRead => write!(f, "image file ended early"),
            Self::RowTooWide => write!(f, "image row exceeds the row buffer"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for ImageError<E> {}

impl<SPI, CS, DC, RST, D> Ili9341<SPI, CS, DC, RST, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
    D: DelayNs,
{
    /// Stream the `w`×`h` image in `path` to `(x, y)`, one row at a time.
    ///
    /// Mounts `volume`, draws each row as soon as it is read, then closes
    /// the file and unmounts. A failed mount or open aborts without
    /// unmounting; a failed or short row read closes the file but leaves
    /// the volume mounted.
    #[allow(clippy::too_many_arguments)]
    pub async fn draw_binary_file<V: Volume>(
        &mut self,
        volume: &mut V,
        path: &str,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
    ) -> Result<(), ImageError<V::Error>> {
        let row_len = usize::from(w).saturating_mul(2);
        let mut row = [0u8; MAX_ROW_BYTES];
        let row = row.get_mut(..row_len).ok_or(ImageError::RowTooWide)?;

        if let Err(e) = volume.mount().await {
            #[cfg(feature = "defmt")]
            defmt::warn!("image: could not mount volume");
            return Err(ImageError::Storage(e));
        }
        let mut file = match volume.open(path, OpenMode::Read).await {
            Ok(file) => file,
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("image: failed to open {=str}", path);
                return Err(ImageError::Storage(e));
            }
        };

        for line in 0..h {
            let outcome = match read_full(volume, &mut file, row).await {
                Ok(n) if n == row_len => self
                    .draw_image(x, y.saturating_add(line), w, 1, row)
                    .map_err(ImageError::Display),
                Ok(_) => Err(ImageError::ShortRead),
                Err(e) => Err(ImageError::Storage(e)),
            };
            if let Err(e) = outcome {
                #[cfg(feature = "defmt")]
                defmt::warn!("image: aborted at row {=u16} of {=str}", line, path);
                // The row error is the one worth reporting.
                let _ = volume.close(file).await;
                return Err(e);
            }
        }

        volume.close(file).await.map_err(ImageError::Storage)?;
        volume.unmount().await.map_err(ImageError::Storage)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use platform::mocks::{BusLog, MockOutputPin, MockSpiBus, MockStorageError, MockVolume};

    type TestTft = Ili9341<MockSpiBus, MockOutputPin, MockOutputPin, MockOutputPin, NoopDelay>;

    fn tft(log: &BusLog) -> TestTft {
        Ili9341::new(log.spi(), log.pin("cs"), log.pin("dc"), log.pin("rst"), NoopDelay::new())
    }

    fn image(w: u16, h: u16) -> Vec<u8> {
        (0..u32::from(w) * u32::from(h))
            .flat_map(|i| u16::try_from(i).unwrap().to_be_bytes())
            .collect()
    }

    #[tokio::test]
    async fn rows_are_drawn_in_order_then_unmounted() {
        let log = BusLog::new();
        let mut tft = tft(&log);
        let mut vol = MockVolume::new().with_file("LOGO.BIN", &image(3, 2));
        vol.set_read_chunk(4);

        tft.draw_binary_file(&mut vol, "LOGO.BIN", 10, 20, 3, 2)
            .await
            .unwrap();

        let rows: Vec<(u8, Vec<u8>)> = log.commands("dc");
        assert_eq!(rows.len(), 6, "window + write per row");
        assert_eq!(rows[1], (0x2B, vec![0, 20, 0, 20]));
        assert_eq!(rows[2], (0x2C, vec![0, 0, 0, 1, 0, 2]));
        assert_eq!(rows[4], (0x2B, vec![0, 21, 0, 21]));
        assert_eq!(rows[5], (0x2C, vec![0, 3, 0, 4, 0, 5]));
        assert_eq!(vol.close_count(), 1);
        assert_eq!(vol.unmount_count(), 1);
    }

    #[tokio::test]
    async fn missing_file_aborts_without_unmount() {
        let log = BusLog::new();
        let mut tft = tft(&log);
        let mut vol = MockVolume::new();

        let res = tft.draw_binary_file(&mut vol, "NOPE.BIN", 0, 0, 2, 2).await;
        assert_eq!(res, Err(ImageError::Storage(MockStorageError::NotFound)));
        assert!(vol.is_mounted(), "open failure leaves the volume mounted");
        assert_eq!(vol.unmount_count(), 0);
        assert!(log.events().is_empty());
    }

    #[tokio::test]
    async fn mount_failure_touches_nothing() {
        let log = BusLog::new();
        let mut tft = tft(&log);
        let mut vol = MockVolume::new().with_file("A.BIN", &image(1, 1));
        vol.refuse_mount(true);

        let res = tft.draw_binary_file(&mut vol, "A.BIN", 0, 0, 1, 1).await;
        assert_eq!(res, Err(ImageError::Storage(MockStorageError::MountFailed)));
        assert_eq!(vol.close_count(), 0);
    }

    #[tokio::test]
    async fn truncated_file_stops_after_last_full_row() {
        let log = BusLog::new();
        let mut tft = tft(&log);
        let mut data = image(2, 3);
        data.truncate(2 * 2 * 2 + 1);
        let mut vol = MockVolume::new().with_file("CUT.BIN", &data);

        let res = tft.draw_binary_file(&mut vol, "CUT.BIN", 0, 0, 2, 3).await;
        assert_eq!(res, Err(ImageError::ShortRead));
        let writes = log.commands("dc").iter().filter(|(c, _)| *c == 0x2C).count();
        assert_eq!(writes, 2, "two complete rows drawn");
        assert_eq!(vol.close_count(), 1, "file closed on read failure");
        assert_eq!(vol.unmount_count(), 0);
    }

    #[tokio::test]
    async fn read_error_is_reported() {
        let log = BusLog::new();
        let mut tft = tft(&log);
        let mut vol = MockVolume::new().with_file("A.BIN", &image(2, 4));
        vol.fail_reads_after(1);

        let res = tft.draw_binary_file(&mut vol, "A.BIN", 0, 0, 2, 4).await;
        assert_eq!(res, Err(ImageError::Storage(MockStorageError::Io)));
    }

    #[tokio::test]
    async fn oversized_row_is_rejected_up_front() {
        let log = BusLog::new();
        let mut tft = tft(&log);
        let mut vol = MockVolume::new();
        let res = tft.draw_binary_file(&mut vol, "A.BIN", 0, 0, 321, 1).await;
        assert_eq!(res, Err(ImageError::RowTooWide));
        assert_eq!(vol.mount_count(), 0);
    }
}
