pub type Channel = f64;
pub type Sample = u8;
pub type PixelBuffer = Vec<PixelColor>;

pub const SAMPLES_PER_PIXEL: usize = 3;
pub const SAMPLE_MAX: Channel = 255.0;

// BT.601 luma weights
pub const KR: Channel = 0.299;
pub const KG: Channel = 0.587;
pub const KB: Channel = 0.114;

/// Display-referred RGB, nominally in [0, 1]. Values are not clamped until
/// they are turned back into samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    pub r: Channel,
    pub g: Channel,
    pub b: Channel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct YCbCr {
    pub y: Channel,
    pub cb: Channel,
    pub cr: Channel,
}

impl Rgb {
    pub fn from_rgb8(r: Sample, g: Sample, b: Sample) -> Rgb {
        Rgb {
            r: r as Channel / SAMPLE_MAX,
            g: g as Channel / SAMPLE_MAX,
            b: b as Channel / SAMPLE_MAX,
        }
    }

    pub fn to_ycbcr(self) -> YCbCr {
        let Rgb { r, g, b } = self;
        let y = KR * r + KG * g + KB * b;
        YCbCr {
            y,
            cb: (b - y) / (1.0 - KB) / 2.0,
            cr: (r - y) / (1.0 - KR) / 2.0,
        }
    }

    pub fn to_rgb8(self) -> [Sample; SAMPLES_PER_PIXEL] {
        [to_sample8(self.r), to_sample8(self.g), to_sample8(self.b)]
    }
}

impl YCbCr {
    pub fn to_rgb(self) -> Rgb {
        let YCbCr { y, cb, cr } = self;
        let r = 2.0 * cr * (1.0 - KR) + y;
        let b = 2.0 * cb * (1.0 - KB) + y;
        // g is solved from the luma equation using the r and b just computed
        let g = (y - KB * b - KR * r) / KG;
        return Rgb { r, g, b };
    }
}

/// Scales a channel back to an 8 bit sample, rounding to nearest.
pub fn to_sample8(channel: Channel) -> Sample {
    (channel * SAMPLE_MAX).round().clamp(0.0, SAMPLE_MAX) as Sample
}

/// A pixel held in exactly one colour representation at a time.
///
/// Reading the other representation goes through [`PixelColor::rgb`] or
/// [`PixelColor::ycbcr`], which derive it from whichever form is current,
/// so a stale RGB triple can never be observed after a luma edit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PixelColor {
    Rgb(Rgb),
    YCbCr(YCbCr),
}

impl Default for PixelColor {
    fn default() -> Self {
        PixelColor::Rgb(Rgb::default())
    }
}

impl PixelColor {
    pub fn from_rgb8(r: Sample, g: Sample, b: Sample) -> PixelColor {
        PixelColor::Rgb(Rgb::from_rgb8(r, g, b))
    }

    /// Switches to the YCbCr form. A pixel already in YCbCr is left as is.
    pub fn to_ycbcr(&mut self) -> YCbCr {
        let ycbcr = self.ycbcr();
        *self = PixelColor::YCbCr(ycbcr);
        ycbcr
    }

    /// Switches to the RGB form. A pixel already in RGB is left as is.
    pub fn to_rgb(&mut self) -> Rgb {
        let rgb = self.rgb();
        *self = PixelColor::Rgb(rgb);
        rgb
    }

    pub fn rgb(&self) -> Rgb {
        match *self {
            PixelColor::Rgb(rgb) => rgb,
            PixelColor::YCbCr(ycbcr) => ycbcr.to_rgb(),
        }
    }

    pub fn ycbcr(&self) -> YCbCr {
        match *self {
            PixelColor::Rgb(rgb) => rgb.to_ycbcr(),
            PixelColor::YCbCr(ycbcr) => ycbcr,
        }
    }

    pub fn luminance(&self) -> Channel {
        self.ycbcr().y
    }

    pub fn to_rgb8(&self) -> [Sample; SAMPLES_PER_PIXEL] {
        self.rgb().to_rgb8()
    }
}
