use crate::error::{Error, Result};
use crate::types::SampleWidth;
use crate::utils::file_utils::read_binary_file_mmap;
use bon::bon;
use ndarray::Array2;
use std::path::Path;

/// A decoded frame, `height x width`. 8-bit samples are widened to `u16`.
pub type Frame = Array2<u16>;

/// Random access over a headerless raw recording: frames are stored back to
/// back, row-major, one sample per pixel, little-endian when two bytes wide.
pub struct FrameStore {
    mmap_data: memmap2::Mmap,
    num_frames: usize,
    height: usize,
    width: usize,
    sample_width: SampleWidth,
}

#[bon]
impl FrameStore {
    /// Open a recording. Fails when the file is shorter than `num_frames` frames.
    #[builder]
    pub fn new(
        path: &Path,
        num_frames: usize,
        frame_shape: (usize, usize),
        sample_width: SampleWidth,
    ) -> Result<Self> {
        let mmap_data = read_binary_file_mmap(path)?;
        let (height, width) = frame_shape;

        let store = Self {
            mmap_data,
            num_frames,
            height,
            width,
            sample_width,
        };

        let expected = (store.frame_bytes() * num_frames) as u64;
        let actual = store.mmap_data.len() as u64;
        if actual < expected {
            return Err(Error::RecordingTooShort { expected, actual });
        }

        tracing::debug!(
            path = %path.display(),
            num_frames,
            height,
            width,
            bytes_per_sample = sample_width.bytes(),
            "Opened raw recording"
        );

        Ok(store)
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// `(height, width)` in samples.
    pub fn frame_shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn frame_bytes(&self) -> usize {
        self.height * self.width * self.sample_width.bytes()
    }

    /// Decode frame `idx`.
    pub fn frame(&self, idx: usize) -> Result<Frame> {
        if idx >= self.num_frames {
            return Err(Error::FrameOutOfRange {
                index: idx,
                num_frames: self.num_frames,
            });
        }

        let start = idx * self.frame_bytes();
        let raw = &self.mmap_data[start..start + self.frame_bytes()];

        let samples: Vec<u16> = match self.sample_width {
            SampleWidth::One => raw.iter().map(|&b| b as u16).collect(),
            SampleWidth::Two => raw
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        };

        Array2::from_shape_vec((self.height, self.width), samples)
            .map_err(|e| Error::Config(format!("frame shape mismatch: {}", e)))
    }

    /// Decode every frame in index order.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            store: self,
            next: 0,
        }
    }
}

/// Forward-only iterator over the frames of a [`FrameStore`].
pub struct Frames<'a> {
    store: &'a FrameStore,
    next: usize,
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.store.num_frames {
            return None;
        }
        let frame = self.store.frame(self.next);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.store.num_frames - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write raw bytes to a temporary recording file.
    pub(crate) fn write_recording(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_frames_8bit() -> Result<()> {
        let bytes: Vec<u8> = (0..24).collect();
        let file = write_recording(&bytes);
        let store = FrameStore::builder()
            .path(file.path())
            .num_frames(2)
            .frame_shape((3, 4))
            .sample_width(SampleWidth::One)
            .build()?;

        assert_eq!(store.frame_shape(), (3, 4));
        let second = store.frame(1)?;
        assert_eq!(second.dim(), store.frame_shape());
        assert_eq!(second[[0, 0]], 12);
        assert_eq!(second[[2, 3]], 23);
        Ok(())
    }

    #[test]
    fn test_frames_16bit_little_endian() -> Result<()> {
        // One 1x2 frame: 0x0102, 0x0fff (12-bit max)
        let file = write_recording(&[0x02, 0x01, 0xff, 0x0f]);
        let store = FrameStore::builder()
            .path(file.path())
            .num_frames(1)
            .frame_shape((1, 2))
            .sample_width(SampleWidth::Two)
            .build()?;

        let frame = store.frame(0)?;
        assert_eq!(frame[[0, 0]], 0x0102);
        assert_eq!(frame[[0, 1]], 0x0fff);
        Ok(())
    }

    #[test]
    fn test_frame_out_of_range() -> Result<()> {
        let file = write_recording(&[0u8; 8]);
        let store = FrameStore::builder()
            .path(file.path())
            .num_frames(2)
            .frame_shape((2, 2))
            .sample_width(SampleWidth::One)
            .build()?;

        assert!(store.frame(1).is_ok());
        match store.frame(2) {
            Err(Error::FrameOutOfRange { index, num_frames }) => {
                assert_eq!(index, 2);
                assert_eq!(num_frames, 2);
            }
            other => panic!("expected out of range error, got {:?}", other.map(|f| f.dim())),
        }
        Ok(())
    }

    #[test]
    fn test_iteration_is_ordered_and_finite() -> Result<()> {
        let bytes: Vec<u8> = (0..3).flat_map(|i| [i as u8; 4]).collect();
        let file = write_recording(&bytes);
        let store = FrameStore::builder()
            .path(file.path())
            .num_frames(3)
            .frame_shape((2, 2))
            .sample_width(SampleWidth::One)
            .build()?;

        let mut frames = store.frames();
        assert_eq!(frames.len(), 3);
        let firsts: Vec<u16> = frames
            .by_ref()
            .map(|f| f.map(|f| f[[1, 1]]))
            .collect::<Result<_>>()?;
        assert_eq!(firsts, vec![0, 1, 2]);
        assert!(frames.next().is_none());
        Ok(())
    }

    #[test]
    fn test_truncated_recording_rejected() {
        let file = write_recording(&[0u8; 7]);
        let result = FrameStore::builder()
            .path(file.path())
            .num_frames(2)
            .frame_shape((2, 2))
            .sample_width(SampleWidth::One)
            .build();
        assert!(matches!(
            result,
            Err(Error::RecordingTooShort { expected: 8, actual: 7 })
        ));
    }
}
