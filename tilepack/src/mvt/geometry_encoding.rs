use geo::{Coord, LineString, Polygon};
use geozero::mvt::tile::GeomType;

use super::EncodeError;
use crate::feature::Geometry;
use crate::tiling::project::ring_area;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
enum Command {
    MoveTo = 1,
    LineTo = 2,
    ClosePath = 7,
}

/// Packs a command id and its repeat count into one integer.
fn command_integer(command: Command, count: u32) -> u32 {
    (command as u32 & 0x7) | (count << 3)
}

/// Zig-zag encodes a signed coordinate delta.
fn parameter_integer(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Pen position carried across all parts of a feature, as command parameters are relative.
#[derive(Default)]
struct Cursor {
    x: i32,
    y: i32,
    encoded: Vec<u32>,
}

impl Cursor {
    fn command(&mut self, command: Command, count: usize) {
        self.encoded.push(command_integer(command, count as u32));
    }

    fn move_to(&mut self, c: Coord<i32>) {
        self.encoded.push(parameter_integer(c.x - self.x));
        self.encoded.push(parameter_integer(c.y - self.y));
        self.x = c.x;
        self.y = c.y;
    }

    fn line(&mut self, coords: &[Coord<i32>]) -> Result<(), EncodeError> {
        let [first, rest @ ..] = coords else {
            return Err(EncodeError::TooFewCoordinates("line string"));
        };
        if rest.is_empty() {
            return Err(EncodeError::TooFewCoordinates("line string"));
        }
        self.command(Command::MoveTo, 1);
        self.move_to(*first);
        self.command(Command::LineTo, rest.len());
        for c in rest {
            self.move_to(*c);
        }
        Ok(())
    }

    /// Writes a closed ring without its closing coordinate, reversed if needed so that
    /// exterior rings turn clockwise and holes counter-clockwise.
    fn ring(&mut self, ring: &LineString<i32>, exterior: bool) -> Result<(), EncodeError> {
        if ring.0.len() < 4 {
            return Err(EncodeError::TooFewCoordinates("polygon ring"));
        }
        let mut coords = ring.0[..ring.0.len() - 1].to_vec();
        if (ring_area(ring) > 0.0) != exterior {
            coords.reverse();
        }
        self.command(Command::MoveTo, 1);
        self.move_to(coords[0]);
        self.command(Command::LineTo, coords.len() - 1);
        for c in &coords[1..] {
            self.move_to(*c);
        }
        self.command(Command::ClosePath, 1);
        Ok(())
    }

    fn polygon(&mut self, polygon: &Polygon<i32>) -> Result<(), EncodeError> {
        self.ring(polygon.exterior(), true)?;
        for hole in polygon.interiors() {
            self.ring(hole, false)?;
        }
        Ok(())
    }
}

/// Encodes a projected geometry into vector tile commands.
pub fn encode_geometry(geometry: &Geometry<i32>) -> Result<(GeomType, Vec<u32>), EncodeError> {
    let mut cursor = Cursor::default();
    let geom_type = match geometry {
        Geometry::Point(p) => {
            cursor.command(Command::MoveTo, 1);
            cursor.move_to(p.0);
            GeomType::Point
        }
        Geometry::MultiPoint(mp) => {
            if mp.0.is_empty() {
                return Err(EncodeError::TooFewCoordinates("multi point"));
            }
            cursor.command(Command::MoveTo, mp.0.len());
            for p in mp {
                cursor.move_to(p.0);
            }
            GeomType::Point
        }
        Geometry::LineString(ls) => {
            cursor.line(&ls.0)?;
            GeomType::Linestring
        }
        Geometry::MultiLineString(mls) => {
            for ls in mls {
                cursor.line(&ls.0)?;
            }
            GeomType::Linestring
        }
        Geometry::Polygon(p) => {
            cursor.polygon(p)?;
            GeomType::Polygon
        }
        Geometry::MultiPolygon(mp) => {
            for p in mp {
                cursor.polygon(p)?;
            }
            GeomType::Polygon
        }
    };
    Ok((geom_type, cursor.encoded))
}
