//! Segmentation and conversion error enums.
use std::collections::TryReserveError;

/// Error for superpixel segmentation and buffer conversion.
#[derive(Clone, Debug)]
pub enum ScError {
    /// The image `width` and/or `height` is equal to `0`.
    InvalidImageDimension,
    /// The requested superpixel region size is equal to `0`.
    ZeroRegionSize,
    /// The calculated grid interval does not fit in a `u32`.
    InvalidGridInterval,
    /// The compactness weight is not a finite, positive number.
    InvalidCompactness,
    /// The pixel buffer length does not match the image dimensions.
    MismatchedPixelBuffer {
        /// Number of elements the dimensions call for.
        expected: usize,
        /// Number of elements supplied.
        actual: usize,
    },
    /// A row stride is smaller than the row it has to hold.
    InvalidStride,
    /// A YUV plane is too short for its dimensions and stride.
    MismatchedPlane(Plane),
    /// An error occured while initializing or perturbing superpixel seeds.
    SeedError(SeedErrorKind),
    /// Space could not be reserved for a buffer.
    Reserve(TryReserveError),
    /// A general error occurred.
    General(&'static str),
}

/// The plane of a YUV 4:2:0 image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plane {
    /// Luma plane.
    Y,
    /// Blue-difference chroma plane.
    U,
    /// Red-difference chroma plane.
    V,
}

impl std::fmt::Display for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Y => write!(f, "Y"),
            Self::U => write!(f, "U"),
            Self::V => write!(f, "V"),
        }
    }
}

impl std::fmt::Display for ScError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidImageDimension => write!(f, "Image dimension cannot be 0"),
            Self::ZeroRegionSize => write!(f, "Superpixel region size cannot be 0"),
            Self::InvalidGridInterval => write!(f, "Grid interval larger than u32"),
            Self::InvalidCompactness => {
                write!(f, "Compactness must be a finite number greater than 0")
            }
            Self::MismatchedPixelBuffer { expected, actual } => write!(
                f,
                "Pixel buffer length {actual} does not match image dimensions ({expected})"
            ),
            Self::InvalidStride => write!(f, "Row stride is smaller than the image row"),
            Self::MismatchedPlane(plane) => {
                write!(f, "{plane} plane is too short for the image dimensions")
            }
            Self::SeedError(e) => write!(f, "{e}"),
            Self::Reserve(e) => write!(f, "{e}"),
            Self::General(e) => write!(f, "{e}"),
        }
    }
}

/// Errors that can occur while initializing the superpixel seeds.
#[derive(Clone, Debug)]
pub enum SeedErrorKind {
    /// Index out of bounds for seed initialization.
    InvalidImageIndex,
    /// The total number of seeds is too large to be stored in a vector.
    InvalidTotalSeeds,
    /// An integer conversion error occurred while perturbing superpixel seeds.
    PerturbConversion,
}

impl std::fmt::Display for SeedErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidImageIndex => {
                write!(f, "Invalid image index for seed initialization")
            }
            Self::InvalidTotalSeeds => write!(f, "Total number of seeds too large"),
            Self::PerturbConversion => write!(f, "Could not convert integer in seed perturbation"),
        }
    }
}

impl std::error::Error for ScError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Reserve(e) => Some(e),
            Self::InvalidImageDimension
            | Self::ZeroRegionSize
            | Self::InvalidGridInterval
            | Self::InvalidCompactness
            | Self::MismatchedPixelBuffer { .. }
            | Self::InvalidStride
            | Self::MismatchedPlane(_)
            | Self::SeedError(_)
            | Self::General(_) => None,
        }
    }
}

impl std::convert::From<TryReserveError> for ScError {
    fn from(error: TryReserveError) -> Self {
        Self::Reserve(error)
    }
}

impl std::convert::From<&'static str> for ScError {
    fn from(error: &'static str) -> Self {
        Self::General(error)
    }
}
