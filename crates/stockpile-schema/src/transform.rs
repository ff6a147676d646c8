//! Content transforms applied to collection entries.
//!
//! Compact form: comma-separated clauses in the fixed order `rotate`, `flip`,
//! `resize`, `format`, for example `"rotate 90, resize 640x480, format webp"`.

use crate::conform::Schema;
use crate::normalize::{constraint_error, shorthand_error, Notation, NotationError};
use serde::{Deserialize, Serialize};
use std::fmt;

const KIND: &str = "transform";

/// Clause keywords in their required order.
const CLAUSES: [&str; 4] = ["rotate", "flip", "resize", "format"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flip {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Avif,
}

impl Flip {
    fn as_str(self) -> &'static str {
        match self {
            Flip::Horizontal => "horizontal",
            Flip::Vertical => "vertical",
        }
    }
}

impl ImageFormat {
    fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
            ImageFormat::Avif => "avif",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
}

/// Canonical transform. At least one field is set; nothing is defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flip: Option<Flip>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<Resize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
}

impl TransformSpec {
    pub fn is_identity(&self) -> bool {
        self.rotate.is_none()
            && self.flip.is_none()
            && self.resize.is_none()
            && self.format.is_none()
    }
}

/// Renders the compact shorthand.
impl fmt::Display for TransformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clauses = Vec::with_capacity(CLAUSES.len());
        if let Some(deg) = self.rotate {
            clauses.push(format!("rotate {deg}"));
        }
        if let Some(flip) = self.flip {
            clauses.push(format!("flip {}", flip.as_str()));
        }
        if let Some(r) = self.resize {
            clauses.push(format!("resize {}x{}", r.width, r.height));
        }
        if let Some(fmt) = self.format {
            clauses.push(format!("format {}", fmt.as_str()));
        }
        f.write_str(&clauses.join(", "))
    }
}

impl Schema for TransformSpec {
    const NAME: &'static str = KIND;
}

impl Notation for TransformSpec {
    fn parse_compact(input: &str) -> Result<Self, NotationError> {
        if input.trim().is_empty() {
            return Err(shorthand_error(KIND, "empty transform"));
        }

        let mut spec = TransformSpec::default();
        let mut last: Option<usize> = None;
        for clause in input.split(',').map(str::trim) {
            let Some((keyword, value)) = clause.split_once(char::is_whitespace) else {
                return Err(shorthand_error(
                    KIND,
                    format!("clause '{clause}' must be '<keyword> <value>'"),
                ));
            };
            let value = value.trim();
            let Some(pos) = CLAUSES.iter().position(|k| *k == keyword) else {
                return Err(shorthand_error(
                    KIND,
                    format!("unknown clause '{keyword}', expected one of {}", CLAUSES.join(", ")),
                ));
            };
            if last.is_some_and(|prev| pos <= prev) {
                return Err(shorthand_error(
                    KIND,
                    format!(
                        "clause '{keyword}' is repeated or out of order (order is {})",
                        CLAUSES.join(", ")
                    ),
                ));
            }
            last = Some(pos);

            match keyword {
                "rotate" => spec.rotate = Some(parse_rotate(value)?),
                "flip" => spec.flip = Some(parse_flip(value)?),
                "resize" => spec.resize = Some(parse_resize(value)?),
                _ => spec.format = Some(parse_format(value)?),
            }
        }
        Ok(spec)
    }

    fn validate(&self) -> Result<(), NotationError> {
        if self.is_identity() {
            return Err(constraint_error(KIND, "at least one transform must be set"));
        }
        if let Some(deg) = self.rotate {
            if !matches!(deg, 0 | 90 | 180 | 270) {
                return Err(constraint_error(
                    KIND,
                    format!("rotate must be one of 0, 90, 180, 270, got {deg}"),
                ));
            }
        }
        if let Some(r) = self.resize {
            if r.width == 0 || r.height == 0 {
                return Err(constraint_error(
                    KIND,
                    format!("resize {}x{} must have positive dimensions", r.width, r.height),
                ));
            }
        }
        Ok(())
    }
}

fn parse_rotate(value: &str) -> Result<u16, NotationError> {
    value
        .parse()
        .map_err(|_| shorthand_error(KIND, format!("rotate '{value}' is not a number of degrees")))
}

fn parse_flip(value: &str) -> Result<Flip, NotationError> {
    match value {
        "horizontal" => Ok(Flip::Horizontal),
        "vertical" => Ok(Flip::Vertical),
        other => Err(shorthand_error(
            KIND,
            format!("flip '{other}', expected horizontal or vertical"),
        )),
    }
}

fn parse_resize(value: &str) -> Result<Resize, NotationError> {
    let invalid = || shorthand_error(KIND, format!("resize '{value}', expected <width>x<height>"));
    let (w, h) = value.split_once('x').ok_or_else(invalid)?;
    Ok(Resize {
        width: w.trim().parse().map_err(|_| invalid())?,
        height: h.trim().parse().map_err(|_| invalid())?,
    })
}

fn parse_format(value: &str) -> Result<ImageFormat, NotationError> {
    match value {
        "png" => Ok(ImageFormat::Png),
        "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
        "webp" => Ok(ImageFormat::Webp),
        "avif" => Ok(ImageFormat::Avif),
        other => Err(shorthand_error(
            KIND,
            format!("format '{other}', expected png, jpeg, webp or avif"),
        )),
    }
}
