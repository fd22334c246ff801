//! 对称 3x3 矩阵的闭式特征值求解, 以及由特征值派生的特征组合.

// ref: https://en.wikipedia.org/wiki/Eigenvalue_algorithm#3%C3%973_matrices

/// 对称 3x3 矩阵, 只保存上三角的 6 个独立元素
/// `(A11, A12, A13, A22, A23, A33)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SymmetricMatrix3<T>([T; 6]);

/// 对称矩阵的 3 个实特征值, 满足 `|e0| >= |e1| >= |e2|`.
///
/// 只能由 [`SymmetricMatrix3::eigenvalues`] 产生.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EigenTriple<T>([T; 3]);

impl<T: Copy> SymmetricMatrix3<T> {
    /// 由上三角元素 `[A11, A12, A13, A22, A23, A33]` 构建.
    #[inline]
    pub const fn new(upper: [T; 6]) -> Self {
        Self(upper)
    }

    /// 上三角元素.
    #[inline]
    pub fn upper(&self) -> [T; 6] {
        self.0
    }
}

impl<T: Copy> From<[T; 6]> for SymmetricMatrix3<T> {
    #[inline]
    fn from(upper: [T; 6]) -> Self {
        Self(upper)
    }
}

impl<T: Copy> EigenTriple<T> {
    /// 按绝对值降序排列的特征值.
    #[inline]
    pub fn values(&self) -> [T; 3] {
        self.0
    }
}

/// 对角矩阵: 通过固定的两两比较级联, 按绝对值降序排列对角元.
///
/// 相等时的次序与级联本身的分支一致, 不是通用排序.
macro_rules! diagonal_cascade {
    ($a11: expr, $a22: expr, $a33: expr) => {{
        let (a11, a22, a33) = ($a11, $a22, $a33);
        if a11.abs() > a22.abs() {
            if a11.abs() > a33.abs() {
                if a22.abs() > a33.abs() {
                    [a11, a22, a33]
                } else {
                    [a11, a33, a22]
                }
            } else {
                [a33, a11, a22]
            }
        } else if a22.abs() > a33.abs() {
            if a11.abs() > a33.abs() {
                [a22, a11, a33]
            } else {
                [a22, a33, a11]
            }
        } else {
            [a33, a22, a11]
        }
    }};
}

macro_rules! impl_symmetric_solver {
    ($fp: ty, $pi: expr) => {
        impl SymmetricMatrix3<$fp> {
            /// 求 3 个实特征值, 按绝对值降序排列.
            ///
            /// 纯函数, 不会失败. 非对角情形使用三角函数闭式解, 第二个特征值由
            /// 迹恒等式求得, 以保证三者之和与迹在数值上一致.
            pub fn eigenvalues(&self) -> EigenTriple<$fp> {
                let [a11, a12, a13, a22, a23, a33] = self.0;

                let p1 = a12 * a12 + a13 * a13 + a23 * a23;
                if p1 == 0.0 {
                    return EigenTriple(diagonal_cascade!(a11, a22, a33));
                }

                let q = (a11 + a22 + a33) / 3.0;
                let p2 = (a11 - q) * (a11 - q) + (a22 - q) * (a22 - q) + (a33 - q) * (a33 - q)
                    + 2.0 * p1;
                let p = (p2 / 6.0).sqrt();

                // B = (A - qI) / p
                let b11 = (a11 - q) / p;
                let b12 = a12 / p;
                let b13 = a13 / p;
                let b22 = (a22 - q) / p;
                let b23 = a23 / p;
                let b33 = (a33 - q) / p;
                let r = (b11 * b22 * b33 + 2.0 * b12 * b13 * b23
                    - b23 * b23 * b11
                    - b13 * b13 * b22
                    - b12 * b12 * b33)
                    / 2.0;

                // 理论上 -1 <= r <= 1, 但舍入误差可能使其稍稍越界.
                let phi = if r <= -1.0 {
                    $pi / 3.0
                } else if r >= 1.0 {
                    0.0
                } else {
                    r.acos() / 3.0
                };

                let mut e0 = q + 2.0 * p * phi.cos();
                let mut e2 = q + 2.0 * p * (phi + $pi * (2.0 / 3.0)).cos();
                let mut e1 = 3.0 * q - e0 - e2;

                if e0.abs() < e2.abs() {
                    std::mem::swap(&mut e0, &mut e2);
                }
                if e1.abs() < e2.abs() {
                    std::mem::swap(&mut e1, &mut e2);
                }
                EigenTriple([e0, e1, e2])
            }

            /// 特征值及其组合: `[e0, e1, e2, 迹, 行列式, Frobenius 范数]`.
            #[inline]
            pub fn eigen_features(&self) -> [$fp; 6] {
                self.eigenvalues().features()
            }
        }

        impl EigenTriple<$fp> {
            /// 三个特征值之和.
            #[inline]
            pub fn trace(&self) -> $fp {
                self.0.iter().sum()
            }

            /// 三个特征值之积.
            #[inline]
            pub fn determinant(&self) -> $fp {
                self.0.iter().product()
            }

            /// `sqrt(e0^2 + e1^2 + e2^2)`.
            #[inline]
            pub fn frobenius_norm(&self) -> $fp {
                self.0.iter().map(|e| e * e).sum::<$fp>().sqrt()
            }

            /// `[e0, e1, e2, 迹, 行列式, Frobenius 范数]`.
            #[inline]
            pub fn features(&self) -> [$fp; 6] {
                let [e0, e1, e2] = self.0;
                [
                    e0,
                    e1,
                    e2,
                    self.trace(),
                    self.determinant(),
                    self.frobenius_norm(),
                ]
            }
        }
    };
}

impl_symmetric_solver!(f32, std::f32::consts::PI);
impl_symmetric_solver!(f64, std::f64::consts::PI);

/// 求对称矩阵 `upper` (上三角 6 元素) 的特征值, 按绝对值降序排列.
#[inline]
pub fn symmetric_eigenvalues(upper: [f64; 6]) -> [f64; 3] {
    SymmetricMatrix3::new(upper).eigenvalues().values()
}

/// 特征值特征: `[e0, e1, e2, 迹, 行列式, Frobenius 范数]`.
#[inline]
pub fn eigen_features(upper: [f32; 6]) -> [f32; 6] {
    SymmetricMatrix3::new(upper).eigen_features()
}
