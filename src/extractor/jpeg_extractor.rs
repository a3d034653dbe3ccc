use memchr::memmem::Finder;

/// JPEG start-of-image marker. Every JPEG stream begins with these two bytes.
const SOI_MARKER: &[u8] = &[0xFF, 0xD8];

/// Locates the JPEG stream embedded in a Snapmatic container buffer.
///
/// A Snapmatic file is an opaque proprietary header followed by a plain
/// JPEG byte stream. The extractor scans for the first start-of-image
/// marker and hands back the tail of the buffer from that point; nothing
/// past the marker is parsed or validated.
#[derive(Debug, Clone)]
pub struct JpegExtractor {
    soi_finder: Finder<'static>,
}

impl JpegExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            soi_finder: Finder::new(SOI_MARKER),
        }
    }

    /// Offset of the first start-of-image marker, if any.
    #[must_use]
    pub fn find_marker(&self, buffer: &[u8]) -> Option<usize> {
        self.soi_finder.find(buffer)
    }

    /// Slice from the first marker (inclusive) through the end of the
    /// buffer. Returns `None` when the buffer holds no marker; absence is
    /// never papered over by returning the input unchanged.
    #[must_use]
    pub fn extract<'a>(&self, buffer: &'a [u8]) -> Option<&'a [u8]> {
        self.find_marker(buffer).map(|offset| &buffer[offset..])
    }
}

impl Default for JpegExtractor {
    fn default() -> Self {
        Self::new()
    }
}
