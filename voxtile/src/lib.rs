#![warn(missing_docs)]

//! 核心库. 为无法整体装入内存的大型 3D 体视显微图像提供滑动窗口平铺的
//! 坐标计算, 以及对体视数据的边界安全画布读写.
//!
//! 处理流程由外部驱动: 驱动方取得 [`Tiler`] 的 tile 总数, 逐索引读取
//! context tile, 交给外部处理单元 (一个固定形状的稠密 3D 预测/滤波核),
//! 再把 core 形状的结果按索引写回输出画布. 本 crate 只做确定性的坐标
//! 变换与数组拷贝, 不含任何线程调度、网络结构或文件格式逻辑; 对分块
//! 磁盘格式 (HDF5/N5/zarr) 的访问属于外部协作者, 通过
//! [`CanvasRead`]/[`CanvasWrite`] 这一窄接口接入.
//!
//! # 组成
//!
//! 1. [`Aabb`] — 轴对齐包围盒, 全部坐标计算的叶子类型.
//! 2. [`TileGrid`] — 网格线表与平铺索引 ⇄ 网格坐标互换.
//! 3. [`RectangularTiling`] — 图像对齐、互不重叠的固定形状分块.
//! 4. [`WindowedTiling`] — 滑动窗口平铺, 每个 tile 有 core 盒与对称
//!    扩张后的 context 盒, 支持子体积限定、重叠步距与 contained 模式.
//! 5. [`Canvas`] / [`AbsoluteCanvas`] — 裁剪-反射补齐读取与裁剪写入.
//! 6. [`Tiler`] — 将平铺与两块画布组合为按索引的 tile 读写.
//!
//! # 注意
//!
//! 1. 所有包围盒均为低角点包含、高角点不包含的半开盒, 坐标允许为负
//!    (context 盒可伸出图像边界).
//! 2. 在调用契约被违反时 (如写回形状错误的 tile), 程序会直接 panic,
//!    而不会导致内存错误. As what Rust promises.

/// 三维索引 / 形状, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 三维有符号坐标向量. 包围盒可伸出图像边界, 因此分量可为负.
pub type Coord3d = [i64; 3];

mod aabb;
mod canvas;
mod grid;
mod tiler;
mod tiling;

pub use aabb::{Aabb, Padding};
pub use canvas::{
    AbsoluteCanvas, Canvas, CanvasRead, CanvasWrite, EmptyRegionError, InitCanvasError,
};
pub use grid::{OutOfRangeError, TileGrid};
pub use tiler::{TileIoError, Tiler, VolumeTiler};
pub use tiling::{InitTilingError, RectangularTiling, WindowedTiling};

pub mod consts;
pub mod prelude;
