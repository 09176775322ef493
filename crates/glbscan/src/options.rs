/// Configuration options for the container decoder.
///
/// These options relax or tighten the container framing checks. The JSON
/// walker itself has no knobs: it always extracts the same fields and always
/// skips keys it does not know.
///
/// # Examples
///
/// ```rust
/// use glbscan::{DecodeOptions, Decoder};
///
/// let decoder = Decoder::new(DecodeOptions {
///     allow_missing_bin_chunk: true,
///     ..Default::default()
/// });
/// # let _ = decoder;
/// ```
///
/// # Default
///
/// All options default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Whether a container may end right after its JSON chunk.
    ///
    /// Containers whose buffers all live behind URIs carry no binary chunk.
    /// When `false`, a missing `BIN` chunk is a format error; when `true`,
    /// the decoded document reports an empty binary chunk instead.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_missing_bin_chunk: bool,

    /// Whether the total length recorded in the container header must match
    /// the length of the buffer handed to the decoder.
    ///
    /// # Default
    ///
    /// `false`
    pub verify_total_length: bool,

    #[cfg(any(test, feature = "fuzzing"))]
    /// Panic on decode errors instead of returning them.
    ///
    /// Enabled only in test builds to produce backtraces on parse failures.
    pub panic_on_error: bool,
}
