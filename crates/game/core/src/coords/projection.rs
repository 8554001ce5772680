use crate::config::IsoConfig;

use super::{IsoCoords, Position3D};

/// Paint-order key. Sorting ascending gives back-to-front order.
///
/// Cells further down-right (`x + y`) paint later, then higher elevation,
/// then `x` as a final tiebreak so the order is total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DepthKey {
    pub diagonal: i64,
    pub elevation: i32,
    pub column: i32,
}

/// Axis-aligned screen rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ScreenBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl ScreenBounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> IsoCoords {
        IsoCoords::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, point: IsoCoords) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }
}

/// 2:1 isometric projection between grid cells and screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IsoProjection {
    config: IsoConfig,
}

impl IsoProjection {
    pub const fn new() -> Self {
        Self {
            config: IsoConfig::new(),
        }
    }

    pub const fn with_config(config: IsoConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &IsoConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: IsoConfig) {
        self.config = config;
    }

    /// Projects a grid position onto the screen.
    pub fn to_screen(&self, pos: Position3D) -> IsoCoords {
        let c = &self.config;
        let x = (pos.x - pos.y) as f32 * c.half_width() + c.offset_x;
        let y = (pos.x + pos.y) as f32 * c.half_height() + c.offset_y - pos.z as f32 * c.tile_depth;
        IsoCoords::new(x, y)
    }

    /// Inverse projection at an assumed elevation `z`.
    ///
    /// A screen point is ambiguous across elevations, so the caller must
    /// state which layer it is picking on.
    pub fn to_grid(&self, screen: IsoCoords, z: i32) -> Position3D {
        let c = &self.config;
        let adjusted_x = screen.x - c.offset_x;
        let adjusted_y = screen.y - c.offset_y + z as f32 * c.tile_depth;

        let across = adjusted_x / c.half_width();
        let down = adjusted_y / c.half_height();

        let x = ((across + down) / 2.0).floor() as i32;
        let y = ((down - across) / 2.0).floor() as i32;
        Position3D::new(x, y, z)
    }

    pub fn depth_key(&self, pos: Position3D) -> DepthKey {
        DepthKey {
            diagonal: pos.x as i64 + pos.y as i64,
            elevation: pos.z,
            column: pos.x,
        }
    }

    /// Integer z-index for hosts that sort by a single number.
    ///
    /// Only monotone with [`Self::depth_key`] while `0 ≤ z < 10`.
    pub fn z_index(&self, pos: Position3D) -> i32 {
        (pos.x + pos.y) * 10 + pos.z
    }

    /// Fractional depth, `(x + y) + 0.1 z`.
    pub fn precise_depth(&self, pos: Position3D) -> f32 {
        (pos.x + pos.y) as f32 + pos.z as f32 * 0.1
    }

    /// Whether a screen point picks a cell inside a `width` × `height` grid.
    pub fn is_valid_screen(&self, screen: IsoCoords, width: i32, height: i32, z: i32) -> bool {
        let cell = self.to_grid(screen, z);
        cell.x >= 0 && cell.x < width && cell.y >= 0 && cell.y < height
    }

    pub fn path_to_screen(&self, path: &[Position3D]) -> Vec<IsoCoords> {
        path.iter().map(|&pos| self.to_screen(pos)).collect()
    }

    /// Sprite rotation (radians) for something travelling from `from` to `to`.
    pub fn facing_angle(&self, from: Position3D, to: Position3D) -> f32 {
        let dx = (to.x - from.x) as f32;
        let dy = (to.y - from.y) as f32;
        dy.atan2(dx) - std::f32::consts::FRAC_PI_4
    }

    /// Top-left corner for a sprite whose feet stand on the centre of `pos`.
    pub fn centered_sprite_position(&self, pos: Position3D, width: f32, height: f32) -> IsoCoords {
        let anchor = self.to_screen(pos);
        IsoCoords::new(
            anchor.x - width / 2.0,
            anchor.y - height + self.config.half_height(),
        )
    }

    /// Screen-space bounding box of a set of positions.
    ///
    /// Returns a zero rectangle at the origin for an empty set.
    pub fn bounds(&self, positions: &[Position3D]) -> ScreenBounds {
        let mut points = positions.iter().map(|&pos| self.to_screen(pos));
        let Some(first) = points.next() else {
            return ScreenBounds::default();
        };

        points.fold(
            ScreenBounds {
                min_x: first.x,
                max_x: first.x,
                min_y: first.y,
                max_y: first.y,
            },
            |acc, p| ScreenBounds {
                min_x: acc.min_x.min(p.x),
                max_x: acc.max_x.max(p.x),
                min_y: acc.min_y.min(p.y),
                max_y: acc.max_y.max(p.y),
            },
        )
    }

    pub fn screen_distance(&self, a: IsoCoords, b: IsoCoords) -> f32 {
        a.distance(b)
    }

    pub fn lerp(&self, from: IsoCoords, to: IsoCoords, t: f32) -> IsoCoords {
        from.lerp(to, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_offset() {
        let projection = IsoProjection::new();
        let origin = projection.to_screen(Position3D::ORIGIN);
        assert_eq!(origin, IsoCoords::new(640.0, 100.0));

        let lifted = projection.to_screen(Position3D::new(2, 1, 1));
        assert_eq!(lifted, IsoCoords::new(640.0 + 32.0, 100.0 + 48.0 - 16.0));
    }

    #[test]
    fn test_roundtrip_for_fixed_elevation() {
        let projection = IsoProjection::new();
        for z in [-2, 0, 3] {
            for x in -5..25 {
                for y in -5..25 {
                    let pos = Position3D::new(x, y, z);
                    let screen = projection.to_screen(pos);
                    assert_eq!(projection.to_grid(screen, z), pos, "roundtrip failed for {pos}");
                }
            }
        }
    }

    #[test]
    fn test_roundtrip_with_custom_config() {
        let projection = IsoProjection::with_config(IsoConfig {
            tile_width: 100.0,
            tile_height: 50.0,
            tile_depth: 20.0,
            offset_x: -13.0,
            offset_y: 7.0,
        });
        for x in 0..12 {
            for y in 0..12 {
                let pos = Position3D::new(x, y, 2);
                assert_eq!(projection.to_grid(projection.to_screen(pos), 2), pos);
            }
        }
    }

    #[test]
    fn test_depth_ordering_follows_diagonal() {
        let projection = IsoProjection::new();
        for ax in 0..8 {
            for ay in 0..8 {
                for bx in 0..8 {
                    for by in 0..8 {
                        let a = Position3D::new(ax, ay, 1);
                        let b = Position3D::new(bx, by, 1);
                        if ax + ay > bx + by {
                            assert!(projection.depth_key(a) > projection.depth_key(b));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_depth_elevation_breaks_diagonal_ties() {
        let projection = IsoProjection::new();
        let low = Position3D::new(3, 3, 0);
        let high = Position3D::new(3, 3, 2);
        assert!(projection.depth_key(high) > projection.depth_key(low));
        assert!(projection.precise_depth(high) > projection.precise_depth(low));
        assert!(projection.z_index(high) > projection.z_index(low));
    }

    #[test]
    fn test_bounds() {
        let projection = IsoProjection::new();
        assert_eq!(projection.bounds(&[]), ScreenBounds::default());

        let bounds = projection.bounds(&[Position3D::new(0, 0, 0), Position3D::new(19, 19, 0)]);
        assert_eq!(bounds.min_x, 640.0);
        assert_eq!(bounds.max_x, 640.0);
        assert_eq!(bounds.min_y, 100.0);
        assert_eq!(bounds.max_y, 100.0 + 38.0 * 16.0);

        let wide = projection.bounds(&[Position3D::new(19, 0, 0), Position3D::new(0, 19, 0)]);
        assert_eq!(wide.width(), 38.0 * 32.0);
        assert_eq!(wide.center(), IsoCoords::new(640.0, 100.0 + 19.0 * 16.0));
    }

    #[test]
    fn test_is_valid_screen() {
        let projection = IsoProjection::new();
        let inside = projection.to_screen(Position3D::new(4, 4, 0));
        let outside = projection.to_screen(Position3D::new(-1, 4, 0));
        assert!(projection.is_valid_screen(inside, 20, 20, 0));
        assert!(!projection.is_valid_screen(outside, 20, 20, 0));
    }

    #[test]
    fn test_centered_sprite_position() {
        let projection = IsoProjection::new();
        let top_left = projection.centered_sprite_position(Position3D::ORIGIN, 32.0, 48.0);
        assert_eq!(top_left, IsoCoords::new(624.0, 100.0 - 48.0 + 16.0));
    }
}
