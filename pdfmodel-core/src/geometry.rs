//! Page-space geometry: points and the rectangles stored as `[llx lly urx ury]`

use crate::error::{PdfError, Result};
use crate::objects::Object;

/// A point in default user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin point (0, 0)
    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// A rectangle normalised so that `lower_left` is below and left of `upper_right`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub lower_left: Point,
    pub upper_right: Point,
}

impl Rectangle {
    /// US Letter, the page size assumed when a page has no `/MediaBox`.
    pub const LETTER: Rectangle = Rectangle {
        lower_left: Point { x: 0.0, y: 0.0 },
        upper_right: Point { x: 612.0, y: 792.0 },
    };

    pub fn new(lower_left: Point, upper_right: Point) -> Self {
        Self {
            lower_left: Point::new(
                lower_left.x.min(upper_right.x),
                lower_left.y.min(upper_right.y),
            ),
            upper_right: Point::new(
                lower_left.x.max(upper_right.x),
                lower_left.y.max(upper_right.y),
            ),
        }
    }

    pub fn from_position_and_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Point::new(x, y), Point::new(x + width, y + height))
    }

    /// Reads a four-number rectangle array. Corners may come in any order.
    pub fn from_object(object: &Object) -> Result<Self> {
        let items = object.as_array().ok_or(PdfError::TypeMismatch {
            expected: "Array",
            found: object.object_type().as_str(),
        })?;
        let numbers: Vec<f64> = items.iter().filter_map(Object::as_f64).collect();
        match numbers.as_slice() {
            [llx, lly, urx, ury] if numbers.len() == items.len() => Ok(Self::new(
                Point::new(*llx, *lly),
                Point::new(*urx, *ury),
            )),
            _ => Err(PdfError::InvalidStructure(format!(
                "rectangle needs 4 numbers, found {} entries",
                items.len()
            ))),
        }
    }

    pub fn to_object(&self) -> Object {
        Object::Array(vec![
            self.lower_left.x.into(),
            self.lower_left.y.into(),
            self.upper_right.x.into(),
            self.upper_right.y.into(),
        ])
    }

    pub fn left(&self) -> f64 {
        self.lower_left.x
    }

    pub fn bottom(&self) -> f64 {
        self.lower_left.y
    }

    pub fn width(&self) -> f64 {
        self.upper_right.x - self.lower_left.x
    }

    pub fn height(&self) -> f64 {
        self.upper_right.y - self.lower_left.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.lower_left.x + self.upper_right.x) / 2.0,
            (self.lower_left.y + self.upper_right.y) / 2.0,
        )
    }

    /// Overlapping area of both rectangles, `None` when they do not meet.
    pub fn intersect(&self, other: &Rectangle) -> Option<Rectangle> {
        let llx = self.lower_left.x.max(other.lower_left.x);
        let lly = self.lower_left.y.max(other.lower_left.y);
        let urx = self.upper_right.x.min(other.upper_right.x);
        let ury = self.upper_right.y.min(other.upper_right.y);
        (llx <= urx && lly <= ury).then(|| Rectangle::new(Point::new(llx, lly), Point::new(urx, ury)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point() {
        let p = Point::new(10.0, 20.0);
        assert_eq!(p.x, 10.0);
        assert_eq!(p.y, 20.0);
        assert_eq!(Point::origin(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_rectangle_is_normalised() {
        let rect = Rectangle::new(Point::new(110.0, 120.0), Point::new(10.0, 20.0));
        assert_eq!(rect.left(), 10.0);
        assert_eq!(rect.bottom(), 20.0);
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 100.0);
        assert_eq!(rect.center(), Point::new(60.0, 70.0));
    }

    #[test]
    fn test_from_object() {
        let object = Object::Array(vec![0.into(), 0.into(), 595.into(), 841.5.into()]);
        let rect = Rectangle::from_object(&object).unwrap();
        assert_eq!(rect.width(), 595.0);
        assert_eq!(rect.height(), 841.5);
        assert_eq!(Rectangle::from_object(&rect.to_object()).unwrap(), rect);
    }

    #[test]
    fn test_from_object_rejects_short_arrays() {
        let object = Object::Array(vec![0.into(), 0.into(), 595.into()]);
        assert!(Rectangle::from_object(&object).is_err());
        assert!(Rectangle::from_object(&Object::Integer(3)).is_err());
        let named = Object::Array(vec![0.into(), 0.into(), 1.into(), Object::name("x")]);
        assert!(Rectangle::from_object(&named).is_err());
    }

    #[test]
    fn test_intersect() {
        let a = Rectangle::from_position_and_size(0.0, 0.0, 100.0, 100.0);
        let b = Rectangle::from_position_and_size(50.0, 50.0, 100.0, 100.0);
        let overlap = a.intersect(&b).unwrap();
        assert_eq!(overlap, Rectangle::from_position_and_size(50.0, 50.0, 50.0, 50.0));

        let far = Rectangle::from_position_and_size(500.0, 500.0, 10.0, 10.0);
        assert!(a.intersect(&far).is_none());
    }
}
