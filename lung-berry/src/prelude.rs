//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::consts::{FeatureIndex, FEATURE_NAMES, NUM_FEATURES};

pub use crate::numerics::{eigen_features, symmetric_eigenvalues, EigenTriple, SymmetricMatrix3};

pub use crate::filter::{
    mask_uncertain, normalized_convolution, Applicability, FeatureExtractor, FilterError,
    VolumePipeline,
};

pub use crate::stats::{determine_edges, DenseHistogram, EdgeError, FeatureSamples};

pub use crate::roi::{
    DenseRoiSampler, RandomRoiSampler, Region, RoiSize, SampleError, Seed, UniformDraw, VoxelDraw,
};

pub use crate::io::hr2::{read_hr2, Hr2Error, Hr2Header, Hr2Volume};
pub use crate::io::TextError;

pub use crate::bag::{BagBuilder, BagError, BagSpec};
