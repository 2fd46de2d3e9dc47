//! Value to pixel and value to colour mappings used by the chart exporter.

use plotters::style::RGBColor;

/// Generate "nice" tick values in [min, max] with roughly max_ticks steps.
pub fn nice_ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    let range = if max > min { max - min } else { 1.0 };
    if max_ticks == 0 {
        return vec![min];
    }
    let step = nice_step(range, max_ticks);
    let start = (min / step).floor() * step;
    let mut ticks = Vec::new();
    let mut v = start;
    while v <= max + step * 0.001 {
        if v >= min - step * 0.001 {
            ticks.push(v);
        }
        v += step;
        if ticks.len() > max_ticks + 2 {
            break;
        }
    }
    if ticks.is_empty() {
        ticks.push(min);
    }
    ticks
}

/// Step of 1, 2 or 5 times a power of ten that splits `range` into about `count` parts.
fn nice_step(range: f64, count: usize) -> f64 {
    let raw_step = range / (count as f64).max(1.0);
    let mag = 10.0_f64.powf(raw_step.log10().floor());
    let norm = if mag > 0.0 { raw_step / mag } else { raw_step };
    let step = if norm <= 1.0 {
        mag
    } else if norm <= 2.0 {
        2.0 * mag
    } else if norm <= 5.0 {
        5.0 * mag
    } else {
        10.0 * mag
    };
    step.max(f64::EPSILON)
}

/// Continuous linear mapping from a value domain to a pixel range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Extend the domain outwards to multiples of a nice step.
    pub fn nice(self, count: usize) -> Self {
        let (lo, hi) = self.domain;
        if hi <= lo || !hi.is_finite() || !lo.is_finite() {
            return self;
        }
        let step = nice_step(hi - lo, count);
        Self {
            domain: ((lo / step).floor() * step, (hi / step).ceil() * step),
            range: self.range,
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return r0;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        nice_ticks(self.domain.0, self.domain.1, count)
    }
}

/// Evenly spaced bands for categorical positions, with inner and outer padding
/// expressed as fractions of the step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandScale {
    count: usize,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
}

impl BandScale {
    pub fn new(count: usize, range: (f64, f64)) -> Self {
        Self {
            count,
            range,
            padding_inner: 0.0,
            padding_outer: 0.0,
        }
    }

    pub fn padding(self, p: f64) -> Self {
        self.padding_inner(p).padding_outer(p)
    }

    pub fn padding_inner(mut self, p: f64) -> Self {
        self.padding_inner = p.clamp(0.0, 1.0);
        self
    }

    pub fn padding_outer(mut self, p: f64) -> Self {
        self.padding_outer = p.max(0.0);
        self
    }

    pub fn step(&self) -> f64 {
        let (r0, r1) = self.range;
        let n = self.count as f64;
        (r1 - r0) / (n - self.padding_inner + self.padding_outer * 2.0).max(1.0)
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding_inner)
    }

    /// Left edge of band `i`.
    pub fn start(&self, i: usize) -> f64 {
        let (r0, r1) = self.range;
        let step = self.step();
        let used = step * (self.count as f64 - self.padding_inner);
        r0 + (r1 - r0 - used) / 2.0 + step * i as f64
    }

    pub fn center(&self, i: usize) -> f64 {
        self.start(i) + self.bandwidth() / 2.0
    }
}

const BLUES: [(u8, u8, u8); 9] = [
    (0xf7, 0xfb, 0xff),
    (0xde, 0xeb, 0xf7),
    (0xc6, 0xdb, 0xef),
    (0x9e, 0xca, 0xe1),
    (0x6b, 0xae, 0xd6),
    (0x42, 0x92, 0xc6),
    (0x21, 0x71, 0xb5),
    (0x08, 0x51, 0x9c),
    (0x08, 0x30, 0x6b),
];

/// Sequential white to dark blue ramp at `t` in [0, 1].
pub fn blues(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let pos = t * (BLUES.len() - 1) as f64;
    let i = (pos.floor() as usize).min(BLUES.len() - 2);
    let f = pos - i as f64;
    let (a, b) = (BLUES[i], BLUES[i + 1]);
    let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

/// Maps values in [0, max] onto [`blues`]. A non-positive max is treated as 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SequentialScale {
    max: f64,
}

impl SequentialScale {
    pub fn new(max: f64) -> Self {
        Self {
            max: if max > 0.0 { max } else { 1.0 },
        }
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn color(&self, v: f64) -> RGBColor {
        blues(v / self.max)
    }
}

/// Categorical colours assigned by position in a fixed domain.
#[derive(Clone, Debug, PartialEq)]
pub struct OrdinalScale {
    domain: Vec<String>,
    colors: Vec<RGBColor>,
}

impl OrdinalScale {
    pub fn new(domain: Vec<String>, colors: Vec<RGBColor>) -> Self {
        Self { domain, colors }
    }

    /// Colour for `key`; keys outside the domain get `None`. The palette wraps.
    pub fn color(&self, key: &str) -> Option<RGBColor> {
        if self.colors.is_empty() {
            return None;
        }
        let i = self.domain.iter().position(|k| k == key)?;
        Some(self.colors[i % self.colors.len()])
    }
}
