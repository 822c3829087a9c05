use serde::{Deserialize, Serialize};

pub const PARTITION_SIZE: i32 = 16;

/// Integer cell coordinate in world space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn adjacent(self, face: Face) -> Self {
        let (dx, dy, dz) = face.offset();
        self.offset(dx, dy, dz)
    }

    pub fn partition(self) -> PartitionPos {
        PartitionPos {
            x: self.x.div_euclid(PARTITION_SIZE),
            z: self.z.div_euclid(PARTITION_SIZE),
        }
    }

    /// Fractional center of the cell.
    pub fn center(self) -> WorldPos {
        WorldPos {
            x: self.x as f64 + 0.5,
            y: self.y as f64 + 0.5,
            z: self.z as f64 + 0.5,
        }
    }

    /// `"({x}:{y}:{z})"`, the coordinate fragment used in store keys.
    pub fn id_string(self) -> String {
        format!("({}:{}:{})", self.x, self.y, self.z)
    }

    pub fn parse_id(text: &str) -> Option<Self> {
        let inner = text.strip_prefix('(')?.strip_suffix(')')?;
        let mut parts = inner.splitn(3, ':');
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        let z = parts.next()?.parse().ok()?;
        Some(Self { x, y, z })
    }
}

/// Integer (x, z) identity of a fixed-footprint spatial partition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct PartitionPos {
    pub x: i32,
    pub z: i32,
}

impl PartitionPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World-space anchor cell of the partition at the given height.
    pub fn anchor(self, y: i32) -> CellPos {
        CellPos::new(self.x * PARTITION_SIZE, y, self.z * PARTITION_SIZE)
    }

    /// Cell at the partition's footprint center at the given height.
    pub fn center_cell(self, y: i32) -> CellPos {
        CellPos::new(
            self.x * PARTITION_SIZE + PARTITION_SIZE / 2,
            y,
            self.z * PARTITION_SIZE + PARTITION_SIZE / 2,
        )
    }

    pub fn of_world(pos: WorldPos) -> Self {
        CellPos::new(pos.x.floor() as i32, pos.y.floor() as i32, pos.z.floor() as i32).partition()
    }

    /// `"({x}:{z})"`, the coordinate fragment used in visited-flag keys.
    pub fn id_string(self) -> String {
        format!("({}:{})", self.x, self.z)
    }

    pub fn parse_id(text: &str) -> Option<Self> {
        let inner = text.strip_prefix('(')?.strip_suffix(')')?;
        let mut parts = inner.splitn(2, ':');
        let x = parts.next()?.parse().ok()?;
        let z = parts.next()?.parse().ok()?;
        Some(Self { x, z })
    }
}

/// Fractional position in world space (actor positions, hit locations).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct WorldPos {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldPos {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn floor_cell(self) -> CellPos {
        CellPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

/// Small world-space vector (item ejection impulses).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct WorldVec {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldVec {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

pub fn distance_sq(a: WorldPos, b: WorldPos) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx) + (dy * dy) + (dz * dz)
}

/// Axis-aligned inclusive cell box. Constructors normalize so `min <= max`
/// per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellBox {
    pub min: CellPos,
    pub max: CellPos,
}

impl CellBox {
    pub fn spanning(a: CellPos, b: CellPos) -> Self {
        Self {
            min: CellPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: CellPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Cells intersecting the cube of `radius` around a fractional center.
    pub fn around(center: WorldPos, radius: f64) -> Self {
        let min = WorldPos::new(center.x - radius, center.y - radius, center.z - radius);
        let max = WorldPos::new(center.x + radius, center.y + radius, center.z + radius);
        Self::spanning(min.floor_cell(), max.floor_cell())
    }

    pub fn single(at: CellPos) -> Self {
        Self { min: at, max: at }
    }

    pub fn contains(&self, cell: CellPos) -> bool {
        cell.x >= self.min.x
            && cell.x <= self.max.x
            && cell.y >= self.min.y
            && cell.y <= self.max.y
            && cell.z >= self.min.z
            && cell.z <= self.max.z
    }

    pub fn cell_count(&self) -> u64 {
        let dx = (self.max.x - self.min.x) as u64 + 1;
        let dy = (self.max.y - self.min.y) as u64 + 1;
        let dz = (self.max.z - self.min.z) as u64 + 1;
        dx * dy * dz
    }

    pub fn cells(&self) -> Vec<CellPos> {
        let mut out = Vec::with_capacity(self.cell_count() as usize);
        for x in self.min.x..=self.max.x {
            for y in self.min.y..=self.max.y {
                for z in self.min.z..=self.max.z {
                    out.push(CellPos::new(x, y, z));
                }
            }
        }
        out
    }

    pub fn is_single_cell(&self) -> bool {
        self.min == self.max
    }
}

/// Cell face, used for adjacency resolution on interactions and hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Face {
    Up,
    Down,
    North,
    South,
    East,
    West,
}

impl Face {
    /// Offset toward the neighbor the face points at. North is -z, east +x.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Up => (0, 1, 0),
            Self::Down => (0, -1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::East => (1, 0, 0),
            Self::West => (-1, 0, 0),
        }
    }
}

/// Partitions within Euclidean `radius` of `center`, radius-squared compare,
/// row-major deterministic order.
pub fn partitions_within(center: PartitionPos, radius: i32) -> Vec<PartitionPos> {
    let mut out = Vec::new();
    if radius < 0 {
        return out;
    }
    let radius_sq = radius * radius;
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            if dx * dx + dz * dz > radius_sq {
                continue;
            }
            out.push(PartitionPos::new(center.x + dx, center.z + dz));
        }
    }
    out
}
