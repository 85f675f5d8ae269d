use serde::{Deserialize, Serialize};

/// Rendering choices requested by the caller before flags are derived.
/// 呼叫端在推導算繪旗標前所提出的選項。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderRequest {
    pub portrait: bool,
    pub landscape: bool,
    pub auto_rotate: bool,
    pub fill_page: bool,
    pub fit_to_page: bool,
    pub document_scaling: bool,
}

/// Requested content alignment on the sheet. Zero means "keep the defaults".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alignment(u32);

impl Alignment {
    pub const CENTER_HORIZONTAL: Self = Self(1 << 0);
    pub const CENTER_VERTICAL: Self = Self(1 << 1);
    pub const CENTER_HORIZONTAL_ON_ORIENTATION: Self = Self(1 << 2);
    pub const CENTER: Self = Self(Self::CENTER_HORIZONTAL.0 | Self::CENTER_VERTICAL.0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

/// Render flag word handed to the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderFlags(u32);

impl RenderFlags {
    pub const PORTRAIT_MODE: Self = Self(1 << 0);
    pub const LANDSCAPE_MODE: Self = Self(1 << 1);
    pub const AUTO_ROTATE: Self = Self(1 << 2);
    pub const CENTER_HORIZONTAL: Self = Self(1 << 3);
    pub const CENTER_VERTICAL: Self = Self(1 << 4);
    pub const CENTER_ON_ORIENTATION: Self = Self(1 << 5);
    pub const AUTO_SCALE: Self = Self(1 << 6);
    pub const AUTO_FIT: Self = Self(1 << 7);
    pub const DOCUMENT_SCALING: Self = Self(1 << 8);

    /// Fill the page, centred on both axes.
    pub const AUTO_SCALE_RENDER_FLAGS: Self = Self(
        Self::AUTO_SCALE.0 | Self::CENTER_HORIZONTAL.0 | Self::CENTER_VERTICAL.0,
    );
    /// Fit the content inside the page, centred on both axes.
    pub const AUTO_FIT_RENDER_FLAGS: Self =
        Self(Self::AUTO_FIT.0 | Self::CENTER_HORIZONTAL.0 | Self::CENTER_VERTICAL.0);

    const CENTERING: Self = Self(
        Self::CENTER_HORIZONTAL.0 | Self::CENTER_VERTICAL.0 | Self::CENTER_ON_ORIENTATION.0,
    );

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Derives the flag word from `base` and the caller's request.
    ///
    /// Orientation is exclusive with priority portrait, landscape, auto-rotate.
    /// Fill-page wins over fit-to-page; document scaling only applies with fit-to-page.
    /// A non-zero alignment replaces the centring bits carried by `base` or the
    /// scaling mode.
    /// 依呼叫端要求與基礎旗標推導出最終的算繪旗標。
    pub fn from_request(base: Self, request: &RenderRequest, alignment: Alignment) -> Self {
        let mut flags = base;

        if request.portrait {
            flags.insert(Self::PORTRAIT_MODE);
        } else if request.landscape {
            flags.insert(Self::LANDSCAPE_MODE);
        } else if request.auto_rotate {
            flags.insert(Self::AUTO_ROTATE);
        }

        if request.fill_page {
            flags.insert(Self::AUTO_SCALE_RENDER_FLAGS);
        } else if request.fit_to_page {
            flags.insert(Self::AUTO_FIT_RENDER_FLAGS);
            if request.document_scaling {
                flags.insert(Self::DOCUMENT_SCALING);
            }
        }

        if alignment.bits() != 0 {
            flags.remove(Self::CENTERING);
            if alignment.intersects(Alignment::CENTER_HORIZONTAL) {
                flags.insert(Self::CENTER_HORIZONTAL);
            }
            if alignment.intersects(Alignment::CENTER_VERTICAL) {
                flags.insert(Self::CENTER_VERTICAL);
            }
            if alignment.intersects(Alignment::CENTER_HORIZONTAL_ON_ORIENTATION) {
                flags.insert(Self::CENTER_ON_ORIENTATION);
            }
            if alignment.bits() & Alignment::CENTER.bits() == Alignment::CENTER.bits() {
                flags.remove(Self::CENTER_ON_ORIENTATION);
                flags.insert(Self::CENTER_HORIZONTAL);
                flags.insert(Self::CENTER_VERTICAL);
            }
        }

        flags
    }

    pub const fn fit_to_page(self) -> bool {
        self.contains(Self::AUTO_FIT_RENDER_FLAGS)
    }

    pub const fn fill_page(self) -> bool {
        self.contains(Self::AUTO_SCALE_RENDER_FLAGS)
    }

    pub const fn auto_rotate(self) -> bool {
        self.contains(Self::AUTO_ROTATE)
    }

    pub const fn portrait(self) -> bool {
        self.contains(Self::PORTRAIT_MODE)
    }

    pub const fn landscape(self) -> bool {
        self.contains(Self::LANDSCAPE_MODE)
    }
}
