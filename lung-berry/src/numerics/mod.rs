//! 数值计算.
//!
//! 目前只有对称 3x3 矩阵 (Hessian) 的特征值求解及其派生特征.

pub mod eigen;

pub use eigen::{eigen_features, symmetric_eigenvalues, EigenTriple, SymmetricMatrix3};
