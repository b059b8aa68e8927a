//! 平铺策略: 把一个体积分解为可枚举、可寻址的 tile 网格.
//!
//! 索引算术统一由 [`TileGrid`](crate::TileGrid) 承担, 各策略以组合方式
//! 嵌入网格, 只负责由网格坐标生成自己的包围盒.

use std::fmt;

use crate::aabb::Aabb;

mod rect;
mod windowed;

pub use rect::RectangularTiling;
pub use windowed::WindowedTiling;

/// 平铺构造参数错误.
///
/// 全部在构造时报出, 不会等到处理中途才暴露; 每个变体都携带出错的轴与
/// 具体数值, 便于直接定位配置问题.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitTilingError {
    /// tile 形状 (chunk / core / context) 在某轴上为 0.
    EmptyTileShape {
        /// 出错的轴.
        axis: usize,
    },

    /// 平铺的目标范围为空盒.
    EmptySubvolume {
        /// 目标范围.
        subvolume: Aabb,
    },

    /// 子体积未完全处于图像范围内.
    SubvolumeOutOfImage {
        /// 子体积.
        subvolume: Aabb,
        /// 图像范围.
        image: Aabb,
    },

    /// context 形状比 core 形状小, 无法扩张.
    ContextSmallerThanCore {
        /// 出错的轴.
        axis: usize,
        /// core 形状在该轴上的长度.
        core: usize,
        /// context 形状在该轴上的长度.
        context: usize,
    },

    /// context 与 core 之差为奇数, 无法中心对齐地对称扩张.
    OddHalo {
        /// 出错的轴.
        axis: usize,
        /// core 形状在该轴上的长度.
        core: usize,
        /// context 形状在该轴上的长度.
        context: usize,
    },

    /// 网格间距为 0, 网格线无法前进.
    ZeroStride {
        /// 出错的轴.
        axis: usize,
    },

    /// 网格间距大于 core 形状, 相邻 tile 之间会留下未覆盖的缝隙.
    StrideExceedsCore {
        /// 出错的轴.
        axis: usize,
        /// 网格间距在该轴上的值.
        stride: usize,
        /// core 形状在该轴上的长度.
        core: usize,
    },
}

impl fmt::Display for InitTilingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTileShape { axis } => {
                write!(f, "tile 形状在第 {axis} 轴上为 0")
            }
            Self::EmptySubvolume { subvolume } => {
                write!(f, "平铺目标范围为空盒: {subvolume:?}")
            }
            Self::SubvolumeOutOfImage { subvolume, image } => {
                write!(f, "子体积 {subvolume:?} 未完全处于图像范围 {image:?} 内")
            }
            Self::ContextSmallerThanCore {
                axis,
                core,
                context,
            } => {
                write!(
                    f,
                    "第 {axis} 轴上 context ({context}) 比 core ({core}) 小"
                )
            }
            Self::OddHalo {
                axis,
                core,
                context,
            } => {
                write!(
                    f,
                    "第 {axis} 轴上 context ({context}) 与 core ({core}) 之差为奇数, \
                     无法对称扩张"
                )
            }
            Self::ZeroStride { axis } => {
                write!(f, "第 {axis} 轴网格间距为 0")
            }
            Self::StrideExceedsCore { axis, stride, core } => {
                write!(
                    f,
                    "第 {axis} 轴网格间距 ({stride}) 大于 core ({core}), tile 间会留下缝隙"
                )
            }
        }
    }
}

impl std::error::Error for InitTilingError {}
