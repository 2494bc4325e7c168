//! # All-sky images
//!
//! [`ImageSample`] pairs a capture instant with its grayscale raster. Samples are produced by an
//! [`ImageSource`] and never mutated afterwards; animation frames only borrow them.
//!
//! Two sources are provided here, both reading the archive's on-disk layout
//! (`YYYY/MM/DD/YYYYMMDD_HHMMSS.jpg`) or a single file. The HTTP archive lives in
//! [`crate::remote`].
use camino::{Utf8Path, Utf8PathBuf};
use hifitime::Epoch;
use image::GrayImage;

use crate::{
    desipoint_errors::DesipointError,
    time::{display_timestamp, image_date_path, image_file_stem},
};

/// One camera exposure.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSample {
    pub capture: Epoch,
    pub raster: GrayImage,
}

impl ImageSample {
    pub fn new(capture: Epoch, raster: GrayImage) -> Self {
        ImageSample { capture, raster }
    }

    /// Decode an encoded image (JPEG or PNG) into an 8-bit grayscale sample.
    ///
    /// Arguments
    /// ---------
    /// * `capture`: capture instant of the image
    /// * `bytes`: encoded image
    ///
    /// Return
    /// ------
    /// * the sample, or [`DesipointError::ImageDecode`] if the bytes are not a supported image
    pub fn decode(capture: Epoch, bytes: &[u8]) -> Result<Self, DesipointError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|err| DesipointError::ImageDecode {
                slot: display_timestamp(capture),
                reason: err.to_string(),
            })?;
        Ok(ImageSample::new(capture, decoded.to_luma8()))
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// Square raster of `size` pixels, the frame the camera calibration was made on.
    pub fn has_frame_size(&self, size: u32) -> bool {
        self.width() == size && self.height() == size
    }
}

/// Relative path of the image captured at `capture` in the archive layout.
pub fn archive_relative_path(capture: Epoch) -> String {
    format!(
        "{}/{}.jpg",
        image_date_path(capture),
        image_file_stem(capture)
    )
}

/// Retrieval of the image captured at a given slot.
pub trait ImageSource {
    /// Fetch the image captured at `capture`.
    ///
    /// A slot without an image yields [`DesipointError::ImageNotFound`].
    fn fetch_image(&self, capture: Epoch) -> Result<ImageSample, DesipointError>;
}

/// A local mirror of the archive.
#[derive(Debug, Clone)]
pub struct LocalImageDirectory {
    root: Utf8PathBuf,
}

impl LocalImageDirectory {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        LocalImageDirectory { root: root.into() }
    }

    pub fn path_for(&self, capture: Epoch) -> Utf8PathBuf {
        self.root.join(archive_relative_path(capture))
    }
}

impl ImageSource for LocalImageDirectory {
    fn fetch_image(&self, capture: Epoch) -> Result<ImageSample, DesipointError> {
        let path = self.path_for(capture);
        if !path.is_file() {
            return Err(DesipointError::ImageNotFound(path.to_string()));
        }
        ImageSample::decode(capture, &std::fs::read(&path)?)
    }
}

/// One image file used for whatever slot is requested.
#[derive(Debug, Clone)]
pub struct SingleImageFile {
    path: Utf8PathBuf,
}

impl SingleImageFile {
    pub fn new(path: &Utf8Path) -> Self {
        SingleImageFile {
            path: path.to_path_buf(),
        }
    }
}

impl ImageSource for SingleImageFile {
    fn fetch_image(&self, capture: Epoch) -> Result<ImageSample, DesipointError> {
        if !self.path.is_file() {
            return Err(DesipointError::ImageNotFound(self.path.to_string()));
        }
        ImageSample::decode(capture, &std::fs::read(&self.path)?)
    }
}

#[cfg(test)]
mod images_test {
    use super::*;
    use image::{ImageFormat, Luma};
    use std::io::Cursor;

    fn capture() -> Epoch {
        Epoch::from_gregorian_utc_hms(2020, 3, 16, 2, 30, 5)
    }

    fn png_bytes() -> Vec<u8> {
        let raster = GrayImage::from_pixel(8, 8, Luma([200u8]));
        let mut bytes = Vec::new();
        raster
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_archive_relative_path() {
        assert_eq!(
            archive_relative_path(capture()),
            "2020/03/16/20200316_023005.jpg"
        );
    }

    #[test]
    fn test_decode() {
        let sample = ImageSample::decode(capture(), &png_bytes()).unwrap();
        assert_eq!((sample.width(), sample.height()), (8, 8));
        assert_eq!(sample.raster.get_pixel(3, 3), &Luma([200u8]));
        assert!(sample.has_frame_size(8));
        assert!(!sample.has_frame_size(crate::constants::SPACEWATCH_FRAME_SIZE));

        let wide = ImageSample::new(capture(), GrayImage::new(16, 8));
        assert!(!wide.has_frame_size(16));
    }

    #[test]
    fn test_decode_html_page_fails() {
        let err = ImageSample::decode(capture(), b"<html>404 Not Found</html>").unwrap_err();
        assert!(matches!(err, DesipointError::ImageDecode { .. }));
    }

    #[test]
    fn test_local_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let source = LocalImageDirectory::new(root);

        let path = source.path_for(capture());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, png_bytes()).unwrap();

        let sample = source.fetch_image(capture()).unwrap();
        assert_eq!(sample.capture, capture());

        let missing = capture() + crate::time::seconds(120);
        assert!(matches!(
            source.fetch_image(missing),
            Err(DesipointError::ImageNotFound(_))
        ));
    }
}
