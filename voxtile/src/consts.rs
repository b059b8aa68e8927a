//! 通用常量.

use crate::Idx3d;

/// valid 卷积 3D U-Net 输出 (core) 体积的缺省形状.
pub const DEFAULT_CORE_SHAPE: Idx3d = (132, 132, 132);

/// valid 卷积 3D U-Net 输入 (context) 体积的缺省形状.
pub const DEFAULT_CONTEXT_SHAPE: Idx3d = (220, 220, 220);

/// 缺省形状下每轴单侧的 halo 宽度, 即 `(220 - 132) / 2`.
pub const DEFAULT_HALO: usize = 44;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WindowedTiling;

    #[test]
    fn test_default_shapes_are_consistent() {
        assert_eq!(
            (DEFAULT_CONTEXT_SHAPE.0 - DEFAULT_CORE_SHAPE.0) / 2,
            DEFAULT_HALO
        );
        // 缺省形状能直接构造平铺 (差为偶数, context >= core).
        let t = WindowedTiling::new(
            (300, 300, 300),
            None,
            DEFAULT_CORE_SHAPE,
            DEFAULT_CONTEXT_SHAPE,
        )
        .unwrap();
        assert_eq!(t.halo(), [DEFAULT_HALO as i64; 3]);
    }
}
