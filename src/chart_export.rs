//! Chart export to SVG and PNG with plotters.
//!
//! Everything is drawn as pixel-space elements on a plain drawing area; positions come
//! from the scales in [`crate::scale`] rather than from a plotters chart context.
//! Text needs a font renderer that only the SVG backend brings along, so bitmap output
//! is drawn without labels.

use std::f64::consts::{FRAC_PI_2, PI};
use std::path::Path;

use color_eyre::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::charts::enforcement::JURISDICTION_ORDER;
use crate::charts::stages::STAGE_ORDER;
use crate::charts::{BarView, ChartView, GroupedBarView, LineView, MapView, PieView, Slice};
use crate::cli::ExportFormat;
use crate::config::Theme;
use crate::dashboard::Content;
use crate::format::{format_percent, format_tick};
use crate::geo::Projection;
use crate::scale::{BandScale, LinearScale, OrdinalScale, SequentialScale};

const TITLE_HEIGHT: f64 = 32.0;
const MARGIN: f64 = 12.0;
const AXIS_LEFT: f64 = 56.0;
const AXIS_BOTTOM: f64 = 40.0;
const Y_TICKS: usize = 5;
const MAX_X_LABELS: usize = 12;
const TABLE_ROW: f64 = 16.0;

pub const EMPTY_MESSAGE: &str = "No data to display.";

/// Pixel rectangle the marks are drawn into.
#[derive(Clone, Copy, Debug)]
struct Plot {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Plot {
    fn width(&self) -> f64 {
        self.right - self.left
    }

    fn height(&self) -> f64 {
        self.bottom - self.top
    }

    fn split_x(&self, fraction: f64) -> (Plot, Plot) {
        let mid = self.left + self.width() * fraction;
        (Plot { right: mid, ..*self }, Plot { left: mid, ..*self })
    }
}

fn px((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

/// Points along a circular arc from `a0` to `a1` (radians, clockwise on screen).
fn arc(center: (f64, f64), radius: f64, a0: f64, a1: f64) -> Vec<(f64, f64)> {
    let steps = (((a1 - a0).abs() / (PI / 90.0)).ceil() as usize).max(1);
    (0..=steps)
        .map(|i| {
            let a = a0 + (a1 - a0) * i as f64 / steps as f64;
            (center.0 + radius * a.cos(), center.1 + radius * a.sin())
        })
        .collect()
}

struct Canvas<'a, DB: DrawingBackend> {
    area: &'a DrawingArea<DB, Shift>,
    theme: &'a Theme,
    labels: bool,
}

impl<'a, DB> Canvas<'a, DB>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    fn text(
        &self,
        text: &str,
        at: (f64, f64),
        size: f64,
        color: &RGBColor,
        anchor: (HPos, VPos),
    ) -> Result<()> {
        if !self.labels || text.is_empty() {
            return Ok(());
        }
        let style = FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
            .color(color)
            .pos(Pos::new(anchor.0, anchor.1));
        self.area.draw(&Text::new(text.to_string(), px(at), style))?;
        Ok(())
    }

    fn rect(&self, from: (f64, f64), to: (f64, f64), style: ShapeStyle) -> Result<()> {
        self.area.draw(&Rectangle::new([px(from), px(to)], style))?;
        Ok(())
    }

    fn path(&self, points: &[(f64, f64)], style: ShapeStyle) -> Result<()> {
        let points: Vec<(i32, i32)> = points.iter().copied().map(px).collect();
        self.area.draw(&PathElement::new(points, style))?;
        Ok(())
    }

    fn polygon(&self, points: &[(f64, f64)], style: ShapeStyle) -> Result<()> {
        let points: Vec<(i32, i32)> = points.iter().copied().map(px).collect();
        self.area.draw(&Polygon::new(points, style))?;
        Ok(())
    }

    fn circle(&self, center: (f64, f64), radius: i32, style: ShapeStyle) -> Result<()> {
        self.area.draw(&Circle::new(px(center), radius, style))?;
        Ok(())
    }

    fn lines(&self, lines: &[String], at: (f64, f64), anchor: HPos) -> Result<()> {
        for (i, line) in lines.iter().enumerate() {
            let y = at.1 + i as f64 * TABLE_ROW;
            self.text(line, (at.0, y), 12.0, &self.theme.text, (anchor, VPos::Top))?;
        }
        Ok(())
    }

    /// Horizontal grid with tick labels for `scale`, plus the baseline.
    fn y_axis(&self, plot: Plot, scale: &LinearScale, label: &str) -> Result<()> {
        let grid = self.theme.grid.stroke_width(1);
        for tick in scale.ticks(Y_TICKS) {
            let y = scale.map(tick);
            self.path(&[(plot.left, y), (plot.right, y)], grid)?;
            self.text(
                &format_tick(tick),
                (plot.left - 6.0, y),
                11.0,
                &self.theme.muted,
                (HPos::Right, VPos::Center),
            )?;
        }
        self.path(
            &[(plot.left, plot.bottom), (plot.right, plot.bottom)],
            self.theme.muted.stroke_width(1),
        )?;
        self.text(
            label,
            (plot.left, plot.top - 4.0),
            11.0,
            &self.theme.muted,
            (HPos::Left, VPos::Bottom),
        )
    }

    /// Category labels under a band axis, thinned out when they would crowd.
    fn x_labels<S: AsRef<str>>(&self, plot: Plot, bands: &BandScale, keys: &[S]) -> Result<()> {
        let every = keys.len().div_ceil(MAX_X_LABELS).max(1);
        for (i, key) in keys.iter().enumerate().step_by(every) {
            self.text(
                key.as_ref(),
                (bands.center(i), plot.bottom + 6.0),
                11.0,
                &self.theme.text,
                (HPos::Center, VPos::Top),
            )?;
        }
        Ok(())
    }

    fn legend(&self, entries: &[(String, RGBColor)], at: (f64, f64)) -> Result<()> {
        if !self.labels {
            return Ok(());
        }
        for (i, (label, color)) in entries.iter().enumerate() {
            let y = at.1 + i as f64 * TABLE_ROW;
            self.rect((at.0, y + 2.0), (at.0 + 10.0, y + 12.0), color.filled())?;
            self.text(
                label,
                (at.0 + 14.0, y),
                11.0,
                &self.theme.text,
                (HPos::Left, VPos::Top),
            )?;
        }
        Ok(())
    }
}

fn value_scale(max: f64, plot: Plot) -> LinearScale {
    let top = if max > 0.0 { max * 1.1 } else { 1.0 };
    LinearScale::new((0.0, top), (plot.bottom, plot.top)).nice(Y_TICKS)
}

fn draw_line<DB>(canvas: &Canvas<DB>, plot: Plot, view: &LineView) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let max = view.points.iter().map(|p| p.value).fold(0.0, f64::max);
    let y = value_scale(max, plot);
    canvas.y_axis(plot, &y, &view.y_label)?;

    let bands = BandScale::new(view.points.len(), (plot.left, plot.right)).padding(0.5);
    let points: Vec<(f64, f64)> = view
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| (bands.center(i), y.map(p.value)))
        .collect();
    canvas.path(&points, canvas.theme.line.stroke_width(2))?;
    for &point in &points {
        canvas.circle(point, 4, canvas.theme.line.filled())?;
    }
    let years: Vec<String> = view.points.iter().map(|p| p.year.to_string()).collect();
    canvas.x_labels(plot, &bands, &years)
}

fn draw_bars<DB>(canvas: &Canvas<DB>, plot: Plot, view: &BarView) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let max = view.bars.iter().map(|b| b.value).fold(0.0, f64::max);
    let y = value_scale(max, plot);
    canvas.y_axis(plot, &y, &view.y_label)?;

    let bands = BandScale::new(view.bars.len(), (plot.left, plot.right))
        .padding_inner(0.2)
        .padding_outer(0.1);
    for (i, bar) in view.bars.iter().enumerate() {
        let color = match &view.highlight {
            Some(key) if *key != bar.key => canvas.theme.muted,
            _ => canvas.theme.bar,
        };
        let x0 = bands.start(i);
        canvas.rect(
            (x0, y.map(bar.value)),
            (x0 + bands.bandwidth(), plot.bottom),
            color.filled(),
        )?;
    }
    let keys: Vec<&str> = view.bars.iter().map(|b| b.key.as_str()).collect();
    canvas.x_labels(plot, &bands, &keys)?;
    canvas.text(
        &view.x_label,
        ((plot.left + plot.right) / 2.0, plot.bottom + 22.0),
        11.0,
        &canvas.theme.muted,
        (HPos::Center, VPos::Top),
    )?;
    if let Some(kpi) = &view.kpi {
        canvas.lines(&kpi.lines(), (plot.right, plot.top), HPos::Right)?;
    }
    Ok(())
}

/// Colour scale keyed by the fixed jurisdiction order so colours survive filtering.
fn jurisdiction_colors(series: &[String], theme: &Theme) -> OrdinalScale {
    let mut domain: Vec<String> = JURISDICTION_ORDER.iter().map(|j| j.to_string()).collect();
    let extra: Vec<String> = series
        .iter()
        .filter(|s| !JURISDICTION_ORDER.contains(&s.as_str()))
        .cloned()
        .collect();
    domain.extend(extra);
    OrdinalScale::new(domain, theme.jurisdiction_colors.clone())
}

fn draw_grouped<DB>(canvas: &Canvas<DB>, plot: Plot, view: &GroupedBarView) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let max = view
        .groups
        .iter()
        .flat_map(|g| g.bars.iter())
        .map(|b| b.value)
        .fold(0.0, f64::max);
    let y = value_scale(max, plot);
    canvas.y_axis(plot, &y, &view.y_label)?;

    let colors = jurisdiction_colors(&view.series, canvas.theme);
    let groups = BandScale::new(view.groups.len(), (plot.left, plot.right)).padding(0.2);
    for (gi, group) in view.groups.iter().enumerate() {
        let start = groups.start(gi);
        let inner =
            BandScale::new(group.bars.len(), (start, start + groups.bandwidth())).padding_inner(0.05);
        for (bi, bar) in group.bars.iter().enumerate() {
            let color = colors.color(&bar.key).unwrap_or(canvas.theme.bar);
            let x0 = inner.start(bi);
            canvas.rect(
                (x0, y.map(bar.value)),
                (x0 + inner.bandwidth(), plot.bottom),
                color.filled(),
            )?;
        }
    }
    let labels: Vec<&str> = view.groups.iter().map(|g| g.label.as_str()).collect();
    canvas.x_labels(plot, &groups, &labels)?;

    let legend: Vec<(String, RGBColor)> = view
        .series
        .iter()
        .map(|s| (s.clone(), colors.color(s).unwrap_or(canvas.theme.bar)))
        .collect();
    canvas.legend(&legend, (plot.right - 56.0, plot.top))
}

/// Slices clockwise from twelve o'clock. `inner` > 0 makes a donut.
fn draw_slices<DB>(
    canvas: &Canvas<DB>,
    center: (f64, f64),
    outer: f64,
    inner: f64,
    slices: &[Slice],
    color: impl Fn(usize, &Slice) -> RGBColor,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let total: f64 = slices.iter().map(|s| s.value).sum();
    if total <= 0.0 || outer <= 0.0 {
        return Ok(());
    }
    let mut angle = -FRAC_PI_2;
    for (i, slice) in slices.iter().enumerate() {
        let sweep = slice.value / total * 2.0 * PI;
        let end = angle + sweep;
        let mut shape = arc(center, outer, angle, end);
        if inner > 0.0 {
            shape.extend(arc(center, inner, end, angle));
        } else {
            shape.insert(0, center);
        }
        canvas.polygon(&shape, color(i, slice).filled())?;
        canvas.polygon(&shape, canvas.theme.background.stroke_width(1))?;

        if sweep > 0.3 {
            let mid = angle + sweep / 2.0;
            let r = if inner > 0.0 { (outer + inner) / 2.0 } else { outer * 0.65 };
            canvas.text(
                &format_percent(slice.percent),
                (center.0 + r * mid.cos(), center.1 + r * mid.sin()),
                11.0,
                &canvas.theme.background,
                (HPos::Center, VPos::Center),
            )?;
        }
        angle = end;
    }
    Ok(())
}

fn draw_pie<DB>(canvas: &Canvas<DB>, plot: Plot, view: &PieView) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let stages = OrdinalScale::new(
        STAGE_ORDER.iter().map(|s| s.to_string()).collect(),
        canvas.theme.stage_colors.clone(),
    );
    let palette = &canvas.theme.palette;
    let color = |i: usize, s: &Slice| stages.color(&s.key).unwrap_or(palette[i % palette.len()]);

    let (pie, legend) = plot.split_x(0.55);
    let radius = (pie.width().min(pie.height()) / 2.0 - MARGIN).max(0.0);
    let center = ((pie.left + pie.right) / 2.0, (pie.top + pie.bottom) / 2.0);
    draw_slices(canvas, center, radius, 0.0, &view.slices, color)?;

    let entries: Vec<(String, RGBColor)> = view
        .slices
        .iter()
        .enumerate()
        .map(|(i, s)| (s.key.clone(), color(i, s)))
        .collect();
    canvas.legend(&entries, (legend.left, legend.top + MARGIN))
}

fn draw_map<DB>(canvas: &Canvas<DB>, plot: Plot, view: &MapView) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (map, side) = plot.split_x(0.62);
    let colors = SequentialScale::new(view.color_max);

    if let Some(bounds) = view.boundaries.bounds() {
        let projection = Projection::fit(bounds, map.left, map.top, map.width(), map.height());
        let outline = canvas.theme.background.stroke_width(1);
        for (region, shown) in view.boundaries.regions().iter().zip(&view.regions) {
            let fill = colors.color(shown.value).filled();
            for ring in region.exteriors() {
                let points: Vec<(f64, f64)> = ring
                    .iter()
                    .map(|&(lon, lat)| projection.project(lon, lat))
                    .collect();
                canvas.polygon(&points, fill)?;
                canvas.path(&points, outline)?;
            }
        }
    }

    let mut y = side.top;
    let summary = match (&view.kpi, &view.note) {
        (Some(kpi), _) => kpi.lines(),
        (None, Some(note)) => vec![note.clone()],
        (None, None) => Vec::new(),
    };
    canvas.lines(&summary, (side.left + MARGIN, y), HPos::Left)?;
    if canvas.labels {
        y += summary.len() as f64 * TABLE_ROW + MARGIN;
    }

    let donut = ((side.height() - (y - side.top)) * 0.45)
        .min(side.width())
        .max(0.0);
    let radius = donut / 2.0;
    let center = ((side.left + side.right) / 2.0, y + radius);
    let keys: Vec<String> = view.shares.iter().map(|s| s.key.clone()).collect();
    let palette = OrdinalScale::new(keys, canvas.theme.palette.clone());
    draw_slices(canvas, center, radius, radius * 0.55, &view.shares, |_, s| {
        palette.color(&s.key).unwrap_or(canvas.theme.bar)
    })?;
    y += donut + MARGIN;

    let rows = ((side.bottom - y) / TABLE_ROW).floor().max(0.0) as usize;
    let table: Vec<String> = view
        .shares
        .iter()
        .take(rows)
        .map(|s| {
            format!(
                "{}  {}  {}",
                s.key,
                format_tick(s.value),
                format_percent(s.percent)
            )
        })
        .collect();
    canvas.lines(&table, (side.left + MARGIN, y), HPos::Left)
}

fn draw_message<DB>(canvas: &Canvas<DB>, plot: Plot, message: &str) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    canvas.text(
        message,
        ((plot.left + plot.right) / 2.0, (plot.top + plot.bottom) / 2.0),
        14.0,
        &canvas.theme.muted,
        (HPos::Center, VPos::Center),
    )
}

/// Draw `content` under `title` onto `area`. With `labels` off no text is drawn.
pub fn draw_content<DB>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    content: &Content,
    theme: &Theme,
    labels: bool,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    area.fill(&theme.background)?;
    let canvas = Canvas {
        area,
        theme,
        labels,
    };
    let (w, h) = area.dim_in_pixel();
    let (w, h) = (w as f64, h as f64);
    canvas.text(
        title,
        (MARGIN, MARGIN),
        16.0,
        &theme.text,
        (HPos::Left, VPos::Top),
    )?;

    let full = Plot {
        left: MARGIN,
        top: TITLE_HEIGHT + MARGIN,
        right: w - MARGIN,
        bottom: h - MARGIN,
    };
    let axes = Plot {
        left: AXIS_LEFT,
        top: TITLE_HEIGHT + MARGIN + 8.0,
        right: w - MARGIN * 2.0,
        bottom: h - AXIS_BOTTOM,
    };
    if axes.width() <= 0.0 || axes.height() <= 0.0 {
        return Ok(());
    }

    match content {
        Content::Empty(message) => draw_message(&canvas, full, message)?,
        Content::View(view) if view.is_empty() => draw_message(&canvas, full, EMPTY_MESSAGE)?,
        Content::View(ChartView::Line(view)) => draw_line(&canvas, axes, view)?,
        Content::View(ChartView::Bar(view)) => draw_bars(&canvas, axes, view)?,
        Content::View(ChartView::GroupedBar(view)) => draw_grouped(&canvas, axes, view)?,
        Content::View(ChartView::Pie(view)) => draw_pie(&canvas, full, view)?,
        Content::View(ChartView::Choropleth(view)) => draw_map(&canvas, full, view)?,
    }
    area.present()?;
    Ok(())
}

/// Render to an in-memory SVG document.
pub fn svg_string(title: &str, content: &Content, theme: &Theme, size: (u32, u32)) -> Result<String> {
    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, size).into_drawing_area();
        draw_content(&root, title, content, theme, true)?;
    }
    Ok(buffer)
}

/// Write one chart file. PNG output carries shapes only.
pub fn write_chart(
    path: &Path,
    format: ExportFormat,
    title: &str,
    content: &Content,
    theme: &Theme,
    size: (u32, u32),
) -> Result<()> {
    match format {
        ExportFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_content(&root, title, content, theme, true)
        }
        ExportFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_content(&root, title, content, theme, false)
        }
    }
}
