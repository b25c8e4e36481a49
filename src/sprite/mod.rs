/// Sprite image handling
///
/// This module handles:
/// - Decoding stored `data:` URIs back into image bytes
/// - Exporting the original bytes and nearest-neighbor resized PNGs
/// - Writing exports to disk

pub mod export;
