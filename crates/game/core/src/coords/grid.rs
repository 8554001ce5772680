use arrayvec::ArrayVec;

use super::Position3D;

/// Which cells count as adjacent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Neighborhood {
    /// Cardinal neighbours only.
    Four,
    /// Cardinal plus diagonal neighbours.
    #[default]
    Eight,
}

const CARDINAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Adjacent cells on the same elevation, cardinal directions first.
pub fn neighbors(pos: Position3D, neighborhood: Neighborhood) -> ArrayVec<Position3D, 8> {
    let mut out = ArrayVec::new();
    let diagonals: &[(i32, i32)] = match neighborhood {
        Neighborhood::Four => &[],
        Neighborhood::Eight => &DIAGONAL,
    };
    for &(dx, dy) in CARDINAL.iter().chain(diagonals) {
        out.push(Position3D::new(pos.x + dx, pos.y + dy, pos.z));
    }
    out
}

/// All positions within a 3D Manhattan radius of `center`.
pub fn positions_in_range(center: Position3D, range: u32, include_center: bool) -> Vec<Position3D> {
    let r = range as i32;
    let mut out = Vec::new();
    for x in center.x - r..=center.x + r {
        for y in center.y - r..=center.y + r {
            for z in center.z - r..=center.z + r {
                let pos = Position3D::new(x, y, z);
                let distance = pos.manhattan(center);
                if distance <= range && (include_center || distance > 0) {
                    out.push(pos);
                }
            }
        }
    }
    out
}

/// Ground cells within a planar Manhattan radius, at `center.z`.
pub fn cells_within(center: Position3D, range: u32, include_center: bool) -> Vec<Position3D> {
    let r = range as i32;
    let mut out = Vec::new();
    for x in center.x - r..=center.x + r {
        for y in center.y - r..=center.y + r {
            let pos = Position3D::new(x, y, center.z);
            let distance = pos.planar_distance(center);
            if distance <= range && (include_center || distance > 0) {
                out.push(pos);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors() {
        let pos = Position3D::new(5, 5, 1);
        let four = neighbors(pos, Neighborhood::Four);
        assert_eq!(four.len(), 4);
        assert!(four.iter().all(|n| n.planar_distance(pos) == 1 && n.z == 1));

        let eight = neighbors(pos, Neighborhood::Eight);
        assert_eq!(eight.len(), 8);
        assert!(eight.contains(&Position3D::new(6, 6, 1)));
        assert!(!eight.contains(&pos));
    }

    #[test]
    fn test_positions_in_range_counts() {
        // Octahedral number for radius 1 and 2: 7 and 25 including the centre.
        assert_eq!(positions_in_range(Position3D::ORIGIN, 1, true).len(), 7);
        assert_eq!(positions_in_range(Position3D::ORIGIN, 2, true).len(), 25);
        assert_eq!(positions_in_range(Position3D::ORIGIN, 2, false).len(), 24);
        assert!(positions_in_range(Position3D::ORIGIN, 0, false).is_empty());
    }

    #[test]
    fn test_cells_within_is_diamond() {
        let center = Position3D::new(3, 3, 2);
        let cells = cells_within(center, 2, true);
        assert_eq!(cells.len(), 13);
        assert!(cells.iter().all(|c| c.z == 2 && c.planar_distance(center) <= 2));
    }
}
