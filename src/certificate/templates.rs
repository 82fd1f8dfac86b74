//! Placement table for the known certificate templates.
//!
//! Positions are fractions of the template's width/height so the same entry
//! works for any resolution. Font sizes are absolute pixels.

pub const SANS_FAMILY: &str = "Arial, sans-serif";
pub const SCRIPT_FAMILY: &str = "'Dancing Script', 'Brush Script MT', cursive";

/// Share of the image width the course title may occupy.
pub const COURSE_MAX_WIDTH: f32 = 0.8;
pub const COURSE_LINE_HEIGHT: f32 = 240.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HorizontalAnchor {
    Center,
    /// Fraction of the image width; text is centered on it.
    At(f32),
}

impl HorizontalAnchor {
    pub fn resolve(self, width: f32) -> f32 {
        match self {
            HorizontalAnchor::Center => width / 2.0,
            HorizontalAnchor::At(fraction) => width * fraction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub family: &'static str,
    pub bold: bool,
    pub size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub x: HorizontalAnchor,
    pub y: f32,
    pub font: FontSpec,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseSpec {
    pub field: FieldSpec,
    pub max_width: f32,
    pub line_height: f32,
    /// Font size once the title wraps onto several lines.
    pub wrapped_size: f32,
    /// Y fraction once the title wraps; `None` keeps the single-line anchor.
    pub wrapped_y: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateSpec {
    pub text_color: &'static str,
    pub name: FieldSpec,
    pub course: CourseSpec,
    pub instructor: FieldSpec,
    pub date: FieldSpec,
}

const BLACK: &str = "#000000";
const WHITE: &str = "#FFFFFF";

const SMALL: FontSpec = FontSpec {
    family: SANS_FAMILY,
    bold: true,
    size: 160.0,
};

const fn script(size: f32) -> FontSpec {
    FontSpec {
        family: SCRIPT_FAMILY,
        bold: false,
        size,
    }
}

const fn course(y: f32, wrapped_y: f32) -> CourseSpec {
    CourseSpec {
        field: FieldSpec {
            x: HorizontalAnchor::Center,
            y,
            font: FontSpec {
                family: SANS_FAMILY,
                bold: true,
                size: 280.0,
            },
        },
        max_width: COURSE_MAX_WIDTH,
        line_height: COURSE_LINE_HEIGHT,
        wrapped_size: 200.0,
        wrapped_y: Some(wrapped_y),
    }
}

const fn signature_line(x: f32, y: f32) -> FieldSpec {
    FieldSpec {
        x: HorizontalAnchor::At(x),
        y,
        font: SMALL,
    }
}

const fn name(y: f32, size: f32) -> FieldSpec {
    FieldSpec {
        x: HorizontalAnchor::Center,
        y,
        font: script(size),
    }
}

static TEMPLATES: [(&str, TemplateSpec); 4] = [
    (
        "1.png",
        TemplateSpec {
            text_color: BLACK,
            name: name(0.58, 500.0),
            course: course(0.72, 0.70),
            instructor: signature_line(0.255, 0.84),
            date: signature_line(0.75, 0.84),
        },
    ),
    (
        "2.png",
        TemplateSpec {
            text_color: BLACK,
            name: name(0.545, 500.0),
            course: course(0.69, 0.67),
            instructor: signature_line(0.375, 0.85),
            date: signature_line(0.632, 0.85),
        },
    ),
    (
        "3.png",
        TemplateSpec {
            text_color: BLACK,
            name: name(0.52, 400.0),
            course: course(0.67, 0.65),
            instructor: signature_line(0.25, 0.79),
            date: signature_line(0.765, 0.79),
        },
    ),
    (
        "4.png",
        TemplateSpec {
            text_color: WHITE,
            name: name(0.49, 400.0),
            course: course(0.65, 0.63),
            instructor: signature_line(0.316, 0.785),
            date: signature_line(0.685, 0.785),
        },
    ),
];

/// Coarser layout for templates that are not in the table.
static FALLBACK: TemplateSpec = TemplateSpec {
    text_color: BLACK,
    name: FieldSpec {
        x: HorizontalAnchor::Center,
        y: 0.45,
        font: FontSpec {
            family: SANS_FAMILY,
            bold: true,
            size: 300.0,
        },
    },
    course: CourseSpec {
        field: FieldSpec {
            x: HorizontalAnchor::Center,
            y: 0.55,
            font: FontSpec {
                family: SANS_FAMILY,
                bold: true,
                size: 280.0,
            },
        },
        max_width: COURSE_MAX_WIDTH,
        line_height: COURSE_LINE_HEIGHT,
        wrapped_size: 120.0,
        wrapped_y: None,
    },
    instructor: signature_line(0.3, 0.75),
    date: signature_line(0.7, 0.75),
};

pub fn spec_for(template: &str) -> &'static TemplateSpec {
    TEMPLATES
        .iter()
        .find(|(id, _)| *id == template)
        .map(|(_, spec)| spec)
        .unwrap_or(&FALLBACK)
}
