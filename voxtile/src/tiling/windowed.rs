//! 滑动窗口平铺.

use super::InitTilingError;
use crate::aabb::Aabb;
use crate::grid::{OutOfRangeError, TileGrid};
use crate::{Coord3d, Idx3d};

/// 滑动窗口平铺: 每个 tile 拥有较小的 core 盒与中心对齐、对称扩张后的
/// 较大 context 盒.
///
/// core 盒是处理单元写回结果的区域; context 盒是产出这一结果所需的输入
/// 区域, 在 core 的基础上每轴向两侧各扩张 `(context - core) / 2`
/// (差值须为偶数, 否则无法中心对齐). 两种盒都 **允许伸出图像边界**,
/// 越界部分的读写由 canvas 负责反射补齐或裁剪, 平铺本身从不截断它们.
///
/// 平铺可限定在图像的一个子体积内; 网格间距缺省等于 core 形状
/// (tile 互不重叠), 也可以取更小的 stride 产生互相重叠的窗口.
#[derive(Clone, Debug)]
pub struct WindowedTiling {
    grid: TileGrid,
    image: Aabb,
    subvolume: Aabb,
    core_shape: Idx3d,
    context_shape: Idx3d,
    stride: Idx3d,
    /// 每轴单侧 halo 宽度, 即 `(context - core) / 2`.
    delta: Coord3d,
}

impl WindowedTiling {
    /// 以 core 形状为间距平铺 `subvolume` (缺省为整幅图像).
    ///
    /// 每轴网格线为 `sub.low, sub.low + core, ...`, 严格小于 `sub.high`;
    /// 因此 core 盒互不重叠, 其并集完整覆盖子体积 (末尾的盒可能伸出
    /// 子体积乃至图像边界).
    pub fn new(
        image_shape: Idx3d,
        subvolume: Option<Aabb>,
        core_shape: Idx3d,
        context_shape: Idx3d,
    ) -> Result<Self, InitTilingError> {
        let (image, subvolume, delta) =
            Self::check_params(image_shape, subvolume, core_shape, context_shape, core_shape)?;
        let grid = TileGrid::with_step(subvolume, core_shape)?;
        Ok(Self {
            grid,
            image,
            subvolume,
            core_shape,
            context_shape,
            stride: core_shape,
            delta,
        })
    }

    /// 以 `stride` 为间距平铺 `subvolume` (缺省为整幅图像), 产生互相
    /// 重叠的滑动窗口.
    ///
    /// 网格线从子体积低角点 (`contained` 模式下再向内缩进一个 halo)
    /// 出发, 每次前进 `stride`; 缺省模式在 core 盒首次越过子体积高边界
    /// 后停止, `contained` 模式在 context 盒首次触到高边界后停止.
    /// 触发停止条件的那条网格线同样保留, 以保证完整覆盖.
    ///
    /// `contained` 模式保证 context 盒不伸出子体积, 代价是边缘体素不被
    /// 任何 core 盒覆盖; 缺省模式覆盖每个体素, 但边缘 context 盒会伸出
    /// 边界, 读取时由 canvas 反射补齐. 两种模式的取舍由调用方根据下游
    /// 用途决定.
    pub fn with_stride(
        image_shape: Idx3d,
        subvolume: Option<Aabb>,
        core_shape: Idx3d,
        context_shape: Idx3d,
        stride: Idx3d,
        contained: bool,
    ) -> Result<Self, InitTilingError> {
        let (image, subvolume, delta) =
            Self::check_params(image_shape, subvolume, core_shape, context_shape, stride)?;
        let core = [
            core_shape.0 as i64,
            core_shape.1 as i64,
            core_shape.2 as i64,
        ];
        let step = [stride.0 as i64, stride.1 as i64, stride.2 as i64];

        let mut lines: [Vec<i64>; 3] = Default::default();
        for d in 0..3 {
            let mut pos = if contained {
                subvolume.low()[d] + delta[d]
            } else {
                subvolume.low()[d]
            };
            loop {
                lines[d].push(pos);
                let exceeded = if contained {
                    pos + core[d] + delta[d] >= subvolume.high()[d]
                } else {
                    pos + core[d] > subvolume.high()[d]
                };
                if exceeded {
                    break;
                }
                pos += step[d];
            }
        }
        let grid = TileGrid::from_lines(subvolume, lines);
        Ok(Self {
            grid,
            image,
            subvolume,
            core_shape,
            context_shape,
            stride,
            delta,
        })
    }

    /// 统一的构造参数检查. 返回图像范围盒、已补缺省的子体积与每轴单侧
    /// halo 宽度.
    fn check_params(
        image_shape: Idx3d,
        subvolume: Option<Aabb>,
        core_shape: Idx3d,
        context_shape: Idx3d,
        stride: Idx3d,
    ) -> Result<(Aabb, Aabb, Coord3d), InitTilingError> {
        let image = Aabb::from_shape(image_shape);
        let subvolume = subvolume.unwrap_or(image);
        if subvolume.is_empty() {
            return Err(InitTilingError::EmptySubvolume { subvolume });
        }
        if !image.contains(&subvolume) {
            return Err(InitTilingError::SubvolumeOutOfImage { subvolume, image });
        }

        let core = [core_shape.0, core_shape.1, core_shape.2];
        let context = [context_shape.0, context_shape.1, context_shape.2];
        let stride = [stride.0, stride.1, stride.2];
        let mut delta = [0i64; 3];
        for axis in 0..3 {
            if core[axis] == 0 || context[axis] == 0 {
                return Err(InitTilingError::EmptyTileShape { axis });
            }
            if context[axis] < core[axis] {
                return Err(InitTilingError::ContextSmallerThanCore {
                    axis,
                    core: core[axis],
                    context: context[axis],
                });
            }
            if (context[axis] - core[axis]) % 2 != 0 {
                return Err(InitTilingError::OddHalo {
                    axis,
                    core: core[axis],
                    context: context[axis],
                });
            }
            if stride[axis] == 0 {
                return Err(InitTilingError::ZeroStride { axis });
            }
            if stride[axis] > core[axis] {
                return Err(InitTilingError::StrideExceedsCore {
                    axis,
                    stride: stride[axis],
                    core: core[axis],
                });
            }
            delta[axis] = ((context[axis] - core[axis]) / 2) as i64;
        }
        Ok((image, subvolume, delta))
    }

    /// 内部网格, 提供索引算术.
    #[inline]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// tile 总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    /// 是否不含任何 tile. 构造保证每轴至少一条网格线, 该方法只为满足惯例.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// 平铺形状, 即每轴 tile 数.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.grid.shape()
    }

    /// core 形状.
    #[inline]
    pub fn core_shape(&self) -> Idx3d {
        self.core_shape
    }

    /// context 形状.
    #[inline]
    pub fn context_shape(&self) -> Idx3d {
        self.context_shape
    }

    /// 网格间距.
    #[inline]
    pub fn stride(&self) -> Idx3d {
        self.stride
    }

    /// 每轴单侧 halo 宽度, 即 `(context - core) / 2`.
    #[inline]
    pub fn halo(&self) -> Coord3d {
        self.delta
    }

    /// 被平铺的子体积.
    #[inline]
    pub fn subvolume(&self) -> Aabb {
        self.subvolume
    }

    /// 整幅图像的范围盒.
    #[inline]
    pub fn image_extent(&self) -> Aabb {
        self.image
    }

    /// 将平铺索引转换为网格坐标.
    #[inline]
    pub fn index_to_coords(&self, index: usize) -> Result<Idx3d, OutOfRangeError> {
        self.grid.index_to_coords(index)
    }

    /// 将网格坐标转换为平铺索引.
    #[inline]
    pub fn coords_to_index(&self, coords: Idx3d) -> Result<usize, OutOfRangeError> {
        self.grid.coords_to_index(coords)
    }

    /// 第 `index` 个 tile 的 core 盒.
    ///
    /// 形状恒等于 core 形状, 从不截断; 可能伸出图像边界.
    pub fn core_tile_at(&self, index: usize) -> Result<Aabb, OutOfRangeError> {
        Ok(self.core_tile_at_coords(self.grid.index_to_coords(index)?))
    }

    /// 第 `index` 个 tile 的 context 盒: core 盒每轴向两侧各扩张一个
    /// halo.
    ///
    /// 形状恒等于 context 形状; 可能伸出图像边界.
    pub fn context_tile_at(&self, index: usize) -> Result<Aabb, OutOfRangeError> {
        Ok(self
            .core_tile_at_coords(self.grid.index_to_coords(index)?)
            .expand(self.delta))
    }

    /// 由网格坐标直接生成 core 盒. 坐标须已通过越界检查.
    fn core_tile_at_coords(&self, coords: Idx3d) -> Aabb {
        let low = self.grid.origin(coords);
        let (cx, cy, cz) = self.core_shape;
        Aabb::new(
            low,
            [low[0] + cx as i64, low[1] + cy as i64, low[2] + cz as i64],
        )
    }

    /// 与第 `index` 个 tile 共面的相邻 tile 索引, 顺序为
    /// `[x-, x+, y-, y+, z-, z+]`; 相邻位置超出网格范围时为 `None`.
    ///
    /// 供需要检测或缝合相邻推理 tile 接缝的调用方使用 (缝合本身不在
    /// 本 crate 职责内).
    pub fn adjacent_tiles(&self, index: usize) -> Result<[Option<usize>; 6], OutOfRangeError> {
        let (x, y, z) = self.grid.index_to_coords(index)?;
        let coords = [x, y, z];
        let mut ans = [None; 6];
        for d in 0..3 {
            let mut lo = coords;
            ans[2 * d] = match lo[d].checked_sub(1) {
                Some(v) => {
                    lo[d] = v;
                    self.grid.coords_to_index((lo[0], lo[1], lo[2])).ok()
                }
                None => None,
            };
            let mut hi = coords;
            hi[d] += 1;
            ans[2 * d + 1] = self.grid.coords_to_index((hi[0], hi[1], hi[2])).ok();
        }
        Ok(ans)
    }

    /// 服务所有 context tile 所需的完整读取范围: 首个 tile 的 context
    /// 低角点到末个 tile 的 context 高角点.
    ///
    /// 可能伸出图像边界; 适合用于规划一次性的批量预取.
    pub fn input_volume(&self) -> Aabb {
        let (nx, ny, nz) = self.grid.shape();
        let first = self.core_tile_at_coords((0, 0, 0)).expand(self.delta);
        let last = self
            .core_tile_at_coords((nx - 1, ny - 1, nz - 1))
            .expand(self.delta);
        Aabb::new(first.low(), last.high())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;

    /// 图像 (10, 10, 10), core (4, 4, 4), context (6, 6, 6) 的参考场景.
    fn tiling_10_4_6() -> WindowedTiling {
        WindowedTiling::new((10, 10, 10), None, (4, 4, 4), (6, 6, 6)).unwrap()
    }

    #[test]
    fn test_reference_scenario() {
        let t = tiling_10_4_6();
        // 每轴网格线 0, 4, 8 (8 是最后一条 < 10 的起点).
        assert_eq!(t.shape(), (3, 3, 3));
        assert_eq!(t.len(), 27);
        assert_eq!(t.halo(), [1, 1, 1]);

        assert_eq!(
            t.core_tile_at(0).unwrap(),
            Aabb::from_corners(0, 0, 0, 4, 4, 4)
        );
        assert_eq!(
            t.context_tile_at(0).unwrap(),
            Aabb::from_corners(-1, -1, -1, 5, 5, 5)
        );
    }

    #[test]
    fn test_tile_shapes_never_truncated() {
        let t = tiling_10_4_6();
        for i in 0..t.len() {
            assert_eq!(t.core_tile_at(i).unwrap().shape(), (4, 4, 4));
            assert_eq!(t.context_tile_at(i).unwrap().shape(), (6, 6, 6));
        }
        // 末个 tile 伸出图像边界, 形状依然完整.
        assert_eq!(
            t.core_tile_at(26).unwrap(),
            Aabb::from_corners(8, 8, 8, 12, 12, 12)
        );
        assert_eq!(
            t.context_tile_at(26).unwrap(),
            Aabb::from_corners(7, 7, 7, 13, 13, 13)
        );
    }

    #[test]
    fn test_cores_disjoint_and_cover_subvolume() {
        let sub = Aabb::from_corners(2, 2, 2, 9, 9, 9);
        let t = WindowedTiling::new((12, 12, 12), Some(sub), (3, 3, 3), (5, 5, 5)).unwrap();

        // 对每个体素统计覆盖次数: 子体积内应恰为 1 次.
        let mut hits = Array3::<u8>::zeros((12, 12, 12));
        for i in 0..t.len() {
            let core = t.core_tile_at(i).unwrap();
            let (clipped, _) = core.clip_to(&Aabb::from_shape((12, 12, 12)));
            let (lo, hi) = (clipped.low(), clipped.high());
            for x in lo[0]..hi[0] {
                for y in lo[1]..hi[1] {
                    for z in lo[2]..hi[2] {
                        hits[(x as usize, y as usize, z as usize)] += 1;
                    }
                }
            }
        }
        let (slo, shi) = (sub.low(), sub.high());
        for x in slo[0]..shi[0] {
            for y in slo[1]..shi[1] {
                for z in slo[2]..shi[2] {
                    assert_eq!(hits[(x as usize, y as usize, z as usize)], 1);
                }
            }
        }
    }

    #[test]
    fn test_subvolume_tiling_origins() {
        let sub = Aabb::from_corners(5, 5, 5, 15, 15, 15);
        let t = WindowedTiling::new((20, 20, 20), Some(sub), (4, 4, 4), (6, 6, 6)).unwrap();
        assert_eq!(t.shape(), (3, 3, 3));
        assert_eq!(
            t.core_tile_at(0).unwrap(),
            Aabb::from_corners(5, 5, 5, 9, 9, 9)
        );
        assert_eq!(
            t.context_tile_at(0).unwrap(),
            Aabb::from_corners(4, 4, 4, 10, 10, 10)
        );
    }

    #[test]
    fn test_overlapping_stride() {
        // stride 2, core 4: 网格线 0, 2, 4, 6, 8 (附带一条在停止条件上
        // 的末线), 相邻窗口互相重叠.
        let t =
            WindowedTiling::with_stride((10, 10, 10), None, (4, 4, 4), (8, 8, 8), (2, 2, 2), false)
                .unwrap();
        assert_eq!(t.shape(), (5, 5, 5));
        assert_eq!(
            t.core_tile_at(0).unwrap(),
            Aabb::from_corners(0, 0, 0, 4, 4, 4)
        );
        let second = t.coords_to_index((0, 0, 1)).unwrap();
        assert_eq!(
            t.core_tile_at(second).unwrap(),
            Aabb::from_corners(0, 0, 2, 4, 4, 6)
        );
    }

    #[test]
    fn test_walk_keeps_final_line_on_exact_division() {
        // 8 恰被 stride 4 整除: 末条网格线 8 的 core 盒完全在图像外,
        // 但依然保留, 保证覆盖不漏.
        let t =
            WindowedTiling::with_stride((8, 8, 8), None, (4, 4, 4), (4, 4, 4), (4, 4, 4), false)
                .unwrap();
        assert_eq!(t.shape(), (3, 3, 3));
        assert_eq!(
            t.core_tile_at(26).unwrap(),
            Aabb::from_corners(8, 8, 8, 12, 12, 12)
        );
    }

    #[test]
    fn test_contained_mode_keeps_context_inside() {
        let t =
            WindowedTiling::with_stride((10, 10, 10), None, (4, 4, 4), (8, 8, 8), (2, 2, 2), true)
                .unwrap();
        // 网格线从 halo (2) 开始: 2, 4.
        assert_eq!(t.shape(), (2, 2, 2));
        let image = Aabb::from_shape((10, 10, 10));
        for i in 0..t.len() {
            assert!(image.contains(&t.context_tile_at(i).unwrap()));
        }
    }

    #[test]
    fn test_strided_subvolume_walk() {
        let sub = Aabb::from_corners(2, 2, 2, 10, 10, 10);
        let t = WindowedTiling::with_stride(
            (12, 12, 12),
            Some(sub),
            (4, 4, 4),
            (4, 4, 4),
            (2, 2, 2),
            false,
        )
        .unwrap();
        // 网格线 2, 4, 6, 8: 8 + 4 > 10 触发停止但被保留.
        assert_eq!(t.shape(), (4, 4, 4));
        assert_eq!(
            t.core_tile_at(0).unwrap(),
            Aabb::from_corners(2, 2, 2, 6, 6, 6)
        );
    }

    #[test]
    fn test_adjacent_tiles() {
        let t = tiling_10_4_6();
        // 网格中心 (1, 1, 1), 六个相邻 tile 都存在.
        let center = t.coords_to_index((1, 1, 1)).unwrap();
        assert_eq!(
            t.adjacent_tiles(center).unwrap(),
            [Some(4), Some(22), Some(10), Some(16), Some(12), Some(14)]
        );
        // 角落 (0, 0, 0): 低位侧三个方向都越界.
        assert_eq!(
            t.adjacent_tiles(0).unwrap(),
            [None, Some(9), None, Some(3), None, Some(1)]
        );
    }

    #[test]
    fn test_input_volume() {
        let t = tiling_10_4_6();
        assert_eq!(
            t.input_volume(),
            Aabb::from_corners(-1, -1, -1, 13, 13, 13)
        );
    }

    #[test]
    fn test_index_round_trip() {
        let t = tiling_10_4_6();
        for i in 0..t.len() {
            assert_eq!(
                t.coords_to_index(t.index_to_coords(i).unwrap()).unwrap(),
                i
            );
        }
    }

    #[test]
    fn test_odd_halo_rejected() {
        // (5 - 4) = 1 为奇数, 无法对称扩张.
        assert_eq!(
            WindowedTiling::new((10, 10, 10), None, (4, 4, 4), (5, 5, 5)).unwrap_err(),
            InitTilingError::OddHalo {
                axis: 0,
                core: 4,
                context: 5
            }
        );
    }

    #[test]
    fn test_other_init_errors() {
        assert_eq!(
            WindowedTiling::new((10, 10, 10), None, (4, 4, 4), (2, 2, 2)).unwrap_err(),
            InitTilingError::ContextSmallerThanCore {
                axis: 0,
                core: 4,
                context: 2
            }
        );
        assert_eq!(
            WindowedTiling::with_stride(
                (10, 10, 10),
                None,
                (4, 4, 4),
                (6, 6, 6),
                (5, 4, 4),
                false
            )
            .unwrap_err(),
            InitTilingError::StrideExceedsCore {
                axis: 0,
                stride: 5,
                core: 4
            }
        );
        assert_eq!(
            WindowedTiling::with_stride(
                (10, 10, 10),
                None,
                (4, 4, 4),
                (6, 6, 6),
                (4, 0, 4),
                false
            )
            .unwrap_err(),
            InitTilingError::ZeroStride { axis: 1 }
        );
        assert!(matches!(
            WindowedTiling::new(
                (10, 10, 10),
                Some(Aabb::from_corners(0, 0, 0, 11, 10, 10)),
                (4, 4, 4),
                (6, 6, 6)
            )
            .unwrap_err(),
            InitTilingError::SubvolumeOutOfImage { .. }
        ));
        assert!(matches!(
            WindowedTiling::new(
                (10, 10, 10),
                Some(Aabb::from_corners(2, 2, 2, 2, 10, 10)),
                (4, 4, 4),
                (6, 6, 6)
            )
            .unwrap_err(),
            InitTilingError::EmptySubvolume { .. }
        ));
    }
}
