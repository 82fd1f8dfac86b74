use anyhow::{anyhow, Context, Result};
use image::{imageops, DynamicImage, ImageFormat, RgbaImage};
use std::fmt::Write;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_skia::Pixmap;
use usvg::{fontdb, Options, Tree};

use super::layout::wrap_text;
use super::templates::{spec_for, FieldSpec, FontSpec, TemplateSpec};
use super::CertificateData;

/// A4 at 300 DPI, used when a template reports no usable size.
pub const DEFAULT_WIDTH: u32 = 3508;
pub const DEFAULT_HEIGHT: u32 = 2480;

/// One `<text>` element of the overlay, in absolute pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub x: f32,
    pub y: f32,
    pub font: FontSpec,
    pub lines: Vec<String>,
    pub line_height: f32,
}

/// Renders certificates from the PNG templates in one directory.
#[derive(Clone)]
pub struct CertificateRenderer {
    templates_dir: PathBuf,
    fontdb: Arc<fontdb::Database>,
}

impl CertificateRenderer {
    pub fn new(templates_dir: impl Into<PathBuf>, fonts_dir: Option<&Path>) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = fonts_dir {
            db.load_fonts_dir(dir);
        }
        db.set_sans_serif_family("Arial");
        db.set_cursive_family("Dancing Script");
        tracing::info!("Certificate renderer loaded {} font faces", db.len());

        Self {
            templates_dir: templates_dir.into(),
            fontdb: Arc::new(db),
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Draws `data` onto the template named `template` and returns PNG bytes.
    pub fn render(&self, template: &str, data: &CertificateData) -> Result<Vec<u8>> {
        let path = self.templates_dir.join(template);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("failed to read template: {}", path.display()))?;
        let base = image::load_from_memory(&bytes)
            .with_context(|| format!("failed to decode template: {}", path.display()))?;
        let (width, height) = canvas_size(base.width(), base.height());

        let spec = spec_for(template);
        let blocks = layout(spec, width as f32, height as f32, data);
        let svg = overlay_svg(&blocks, spec.text_color, width, height);
        let layer = self.rasterize(&svg, width, height)?;

        let mut canvas = base.to_rgba8();
        imageops::overlay(&mut canvas, &layer, 0, 0);

        let mut out = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .context("failed to encode certificate")?;
        tracing::debug!(template, width, height, bytes = out.len(), "rendered certificate");
        Ok(out)
    }

    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<RgbaImage> {
        let options = Options {
            fontdb: self.fontdb.clone(),
            ..Options::default()
        };
        let tree = Tree::from_str(svg, &options).context("failed to parse certificate overlay")?;
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("invalid canvas size {}x{}", width, height))?;
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

        // tiny-skia stores premultiplied alpha; `image` expects straight alpha.
        let mut layer = RgbaImage::new(width, height);
        for (dst, src) in layer.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(layer)
    }
}

pub fn canvas_size(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        (DEFAULT_WIDTH, DEFAULT_HEIGHT)
    } else {
        (width, height)
    }
}

/// Positions the four fields for a `width` x `height` template.
pub fn layout(spec: &TemplateSpec, width: f32, height: f32, data: &CertificateData) -> Vec<TextBlock> {
    let single = |field: &FieldSpec, text: &str| TextBlock {
        x: field.x.resolve(width),
        y: height * field.y,
        font: field.font,
        lines: vec![text.to_string()],
        line_height: field.font.size,
    };

    let course = &spec.course;
    let lines = wrap_text(
        &data.course,
        width * course.max_width,
        course.field.font.size,
    );
    let (size, y) = if lines.len() > 1 {
        (
            course.wrapped_size,
            course.wrapped_y.unwrap_or(course.field.y),
        )
    } else {
        (course.field.font.size, course.field.y)
    };
    let course_block = TextBlock {
        x: course.field.x.resolve(width),
        y: height * y,
        font: FontSpec {
            size,
            ..course.field.font
        },
        lines,
        line_height: course.line_height,
    };

    vec![
        single(&spec.name, &data.name),
        course_block,
        single(&spec.instructor, &data.instructor),
        single(&spec.date, &data.date),
    ]
}

pub fn overlay_svg(blocks: &[TextBlock], fill: &str, width: u32, height: u32) -> String {
    let mut svg = format!(
        r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
        w = width,
        h = height
    );
    for block in blocks {
        let weight = if block.font.bold {
            r#" font-weight="bold""#
        } else {
            ""
        };
        let _ = write!(
            svg,
            r#"<text x="{x}" y="{y}" fill="{fill}" text-anchor="middle" font-family="{family}"{weight} font-size="{size}">"#,
            x = block.x,
            y = block.y,
            fill = fill,
            family = escape_xml(block.font.family),
            weight = weight,
            size = block.font.size,
        );
        for (idx, line) in block.lines.iter().enumerate() {
            let dy = if idx == 0 { 0.0 } else { block.line_height };
            let _ = write!(
                svg,
                r#"<tspan x="{}" dy="{}">{}</tspan>"#,
                block.x,
                dy,
                escape_xml(line)
            );
        }
        svg.push_str("</text>");
    }
    svg.push_str("</svg>");
    svg
}

fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
