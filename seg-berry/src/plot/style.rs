//! 绘图样式配置与作用域样式上下文.
//!
//! 样式是一个显式配置对象 ([`PlotStyle`]), 由调用方传入或通过
//! [`scoped`] 安装为线程局部的当前样式. [`StyleGuard`] 在析构时
//! 恢复先前样式, 即使渲染中途失败或 panic 也不会泄漏样式状态.

use plotters::style::RGBColor;
use std::cell::RefCell;

/// 亮色模式下的 10 色曲线调色板.
pub const PALETTE_LIGHT: [RGBColor; 10] = [
    RGBColor(0xF7, 0x25, 0x85),
    RGBColor(0x72, 0x09, 0xB7),
    RGBColor(0x43, 0x61, 0xEE),
    RGBColor(0x4C, 0xC9, 0xF0),
    RGBColor(0x3A, 0x0C, 0xA3),
    RGBColor(0xFF, 0x00, 0x00),
    RGBColor(0xF0, 0xA5, 0x00),
    RGBColor(0xFF, 0xD7, 0x00),
    RGBColor(0xFF, 0x7A, 0x00),
    RGBColor(0xFF, 0x4D, 0x00),
];

/// 取颜色的逐通道反色. 暗色模式下的调色板由亮色版逐色取反得到.
#[inline]
pub fn invert_color(c: RGBColor) -> RGBColor {
    RGBColor(u8::MAX - c.0, u8::MAX - c.1, u8::MAX - c.2)
}

/// 绘图样式配置: 调色板, 暗色模式, 分辨率与字号.
///
/// 所有渲染入口都从当前样式读取这些参数, 不依赖任何全局可变常量.
#[derive(Debug, Clone)]
pub struct PlotStyle {
    /// 曲线调色板 (亮色版). 暗色模式下逐色取反后使用.
    pub palette: Vec<RGBColor>,

    /// 是否使用暗色背景.
    pub dark_mode: bool,

    /// 每英寸像素数. 图幅以英寸指定, 乘以该值得到位图分辨率.
    pub dpi: u32,

    /// 基础字号. 标题/轴标/图例字号按固定倍率由此派生.
    pub font_size: u32,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            palette: PALETTE_LIGHT.to_vec(),
            dark_mode: false,
            dpi: 200,
            font_size: 15,
        }
    }
}

impl PlotStyle {
    /// 标题字号 (基础字号的 1.75 倍).
    #[inline]
    pub fn title_font(&self) -> u32 {
        (self.font_size as f64 * 1.75) as u32
    }

    /// 轴标字号 (基础字号的 1.25 倍).
    #[inline]
    pub fn label_font(&self) -> u32 {
        (self.font_size as f64 * 1.25) as u32
    }

    /// 图例字号 (基础字号的 0.75 倍).
    #[inline]
    pub fn legend_font(&self) -> u32 {
        (self.font_size as f64 * 0.75) as u32
    }

    /// 取第 `i` 条曲线的颜色, 超出调色板长度时循环使用.
    ///
    /// 调色板不可为空, 否则程序 panic.
    #[inline]
    pub fn color(&self, i: usize) -> RGBColor {
        assert!(!self.palette.is_empty(), "调色板不可为空");
        let c = self.palette[i % self.palette.len()];
        if self.dark_mode {
            invert_color(c)
        } else {
            c
        }
    }

    /// 画布背景色.
    #[inline]
    pub fn background(&self) -> RGBColor {
        if self.dark_mode {
            RGBColor(0, 0, 0)
        } else {
            RGBColor(u8::MAX, u8::MAX, u8::MAX)
        }
    }

    /// 文字与轴线颜色.
    #[inline]
    pub fn foreground(&self) -> RGBColor {
        if self.dark_mode {
            RGBColor(u8::MAX, u8::MAX, u8::MAX)
        } else {
            RGBColor(0, 0, 0)
        }
    }

    /// 将以英寸计的图幅换算为位图分辨率.
    #[inline]
    pub fn fig_size(&self, w_inch: f64, h_inch: f64) -> (u32, u32) {
        (
            (w_inch * self.dpi as f64) as u32,
            (h_inch * self.dpi as f64) as u32,
        )
    }
}

thread_local! {
    static CURRENT: RefCell<PlotStyle> = RefCell::new(PlotStyle::default());
}

/// 当前样式的一份快照.
pub fn current() -> PlotStyle {
    CURRENT.with(|c| c.borrow().clone())
}

/// 将 `style` 安装为当前线程的绘图样式, 返回作用域守卫.
///
/// 守卫析构时 (无论正常离开还是 unwind) 恢复先前样式.
#[must_use = "样式在守卫存活期间才生效"]
pub fn scoped(style: PlotStyle) -> StyleGuard {
    let prev = CURRENT.with(|c| c.replace(style));
    StyleGuard { prev: Some(prev) }
}

/// 作用域样式守卫. 见 [`scoped`].
#[derive(Debug)]
pub struct StyleGuard {
    prev: Option<PlotStyle>,
}

impl Drop for StyleGuard {
    fn drop(&mut self) {
        if let Some(prev) = self.prev.take() {
            CURRENT.with(|c| *c.borrow_mut() = prev);
        }
    }
}
